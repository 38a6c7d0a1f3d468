//! rollcall-runner: headless draw server for Rollcall.
//!
//! Reads one JSON request per line on stdin and writes one JSON
//! response per line on stdout. Logs go to stderr (RUST_LOG).
//!
//! Usage:
//!   rollcall-runner --data-dir ./data --db rollcall.db
//!   rollcall-runner --seed 12345 --workers 8 --db :memory:
//!
//! Requests:
//!   {"type":"get","id":1,"auth":"...","client":"xyzzy","allow":"BBA...","mode":"starting"}
//!   {"type":"status","id":2}
//!   {"type":"reload","id":3}
//!   {"type":"quit"}

use anyhow::{Context, Result};
use rollcall_core::{
    clock::SystemClock,
    command::DrawRequest,
    config::{DeskConfig, ServiceSettings},
    sequence::DrawMode,
    service::DrawService,
    store::SqliteStore,
};
use serde_json::{json, Value};
use std::env;
use std::io::{self, BufRead, Write};
use std::sync::{mpsc, Mutex};
use std::thread;

#[derive(serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum IpcCommand {
    Get {
        #[serde(default)]
        id: Option<Value>,
        #[serde(default)]
        auth: Option<String>,
        client: String,
        #[serde(default)]
        allow: Option<String>,
        #[serde(default)]
        mode: DrawMode,
    },
    Status {
        #[serde(default)]
        id: Option<Value>,
    },
    Reload {
        #[serde(default)]
        id: Option<Value>,
    },
    Quit,
}

/// Work handed to the pool. `Quit` never gets this far.
#[derive(Debug)]
enum Job {
    Get {
        id: Option<Value>,
        auth: Option<String>,
        request: DrawRequest,
    },
    Status {
        id: Option<Value>,
    },
    Reload {
        id: Option<Value>,
    },
}

impl IpcCommand {
    fn into_job(self) -> Option<Job> {
        match self {
            IpcCommand::Get { id, auth, client, allow, mode } => Some(Job::Get {
                id,
                auth,
                request: DrawRequest { client, allow, mode },
            }),
            IpcCommand::Status { id } => Some(Job::Status { id }),
            IpcCommand::Reload { id } => Some(Job::Reload { id }),
            IpcCommand::Quit => None,
        }
    }
}

/// Everything a worker needs to answer a request.
struct Shared<'a> {
    service: &'a DrawService,
    settings: &'a ServiceSettings,
    data_dir: &'a str,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let seed = parse_arg(&args, "--seed", wall_clock_seed());
    let workers = parse_arg(&args, "--workers", 4usize).max(1);
    let db = string_arg(&args, "--db", "rollcall.db");
    let data_dir = string_arg(&args, "--data-dir", "./data");

    log::info!("rollcall-runner: seed={seed} workers={workers} db={db} data_dir={data_dir}");

    let config = DeskConfig::load(data_dir).context("loading configuration")?;
    if config.settings.auth_token.is_empty() {
        log::warn!("no auth_token configured, every draw request will be rejected");
    }

    let store = SqliteStore::open(db)?;
    store.migrate()?;

    let service = DrawService::bootstrap(&config, Box::new(store), Box::new(SystemClock), seed)
        .context("refusing to start with an inconsistent configuration")?;

    let shared = Shared {
        service: &service,
        settings: &config.settings,
        data_dir,
    };
    serve(&shared, workers)
}

/// Fan stdin lines out to a fixed pool of workers.
fn serve(shared: &Shared<'_>, workers: usize) -> Result<()> {
    let (tx, rx) = mpsc::channel::<Job>();
    let rx = Mutex::new(rx);

    thread::scope(|s| -> Result<()> {
        // Owned by this closure so every exit path closes the channel,
        // which lets workers drain in-flight requests and stop.
        let tx = tx;

        for _ in 0..workers {
            s.spawn(|| loop {
                let job = match rx.lock() {
                    Ok(guard) => guard.recv(),
                    Err(_) => break,
                };
                let Ok(job) = job else { break };
                if let Err(e) = emit(&answer(shared, job)) {
                    log::error!("failed to write response: {e}");
                }
            });
        }

        for line in io::stdin().lock().lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let cmd: IpcCommand = match serde_json::from_str(&line) {
                Ok(c) => c,
                Err(e) => {
                    emit(&error_response(None, "bad-request", e.to_string()))?;
                    continue;
                }
            };
            let Some(job) = cmd.into_job() else { break };
            if tx.send(job).is_err() {
                break;
            }
        }
        Ok(())
    })
}

fn answer(shared: &Shared<'_>, job: Job) -> Value {
    match job {
        Job::Get { id, auth, request } => {
            let auth_ok = shared.settings.authenticates(auth.as_deref());
            match shared.service.handle_get(&request, auth_ok) {
                Ok(reply) => json!({
                    "id": id,
                    "status": "ok",
                    "value": reply.value,
                    "weights": reply.weights,
                    "reply": reply.to_string(),
                }),
                Err(e) => {
                    if !e.is_request_error() {
                        log::error!("get for '{}' failed: {e}", request.client);
                    }
                    error_response(id, e.tag(), e.to_string())
                }
            }
        }
        Job::Status { id } => match shared.service.status() {
            Ok(clients) => json!({ "id": id, "status": "ok", "clients": clients }),
            Err(e) => error_response(id, e.tag(), e.to_string()),
        },
        Job::Reload { id } => {
            let reloaded = DeskConfig::load(shared.data_dir)
                .and_then(|config| Ok(shared.service.reload_ledgers(&config)?));
            match reloaded {
                Ok(count) => json!({ "id": id, "status": "ok", "reloaded": count }),
                Err(e) => {
                    log::error!("reload failed, keeping previous weights: {e:#}");
                    error_response(id, "error", format!("{e:#}"))
                }
            }
        }
    }
}

fn error_response(id: Option<Value>, tag: &str, message: String) -> Value {
    json!({ "id": id, "status": "error", "error": tag, "message": message })
}

/// One response per line; the stdout lock keeps lines from interleaving.
fn emit(response: &Value) -> Result<()> {
    let mut handle = io::stdout().lock();
    writeln!(handle, "{response}")?;
    handle.flush()?;
    Ok(())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}

fn string_arg<'a>(args: &'a [String], flag: &str, default: &'a str) -> &'a str {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
        .unwrap_or(default)
}

fn wall_clock_seed() -> u64 {
    chrono::Utc::now().timestamp().unsigned_abs()
}
