//! Persisted-state store.
//!
//! RULE: Only store.rs talks to the database.
//! The service calls store methods, it never executes SQL directly.
//! The store is a restart checkpoint, never consulted per request.

use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::{params, Connection, OptionalExtension};

use crate::{
    error::{DeskError, DeskResult},
    snapshot::DrawState,
    types::ClientId,
};

/// Durable per-client checkpoint of draw state.
pub trait StateStore: Send + Sync {
    fn load(&self, client: &str) -> DeskResult<Option<DrawState>>;

    /// Must not return Ok until the state is durable.
    fn save(&self, client: &str, state: &DrawState) -> DeskResult<()>;

    /// Every client identifier with a stored checkpoint.
    fn clients(&self) -> DeskResult<Vec<ClientId>>;
}

impl<S: StateStore + ?Sized> StateStore for Arc<S> {
    fn load(&self, client: &str) -> DeskResult<Option<DrawState>> {
        (**self).load(client)
    }

    fn save(&self, client: &str, state: &DrawState) -> DeskResult<()> {
        (**self).save(client, state)
    }

    fn clients(&self) -> DeskResult<Vec<ClientId>> {
        (**self).clients()
    }
}

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) the state database at `path`.
    pub fn open(path: &str) -> DeskResult<Self> {
        if path == ":memory:" {
            return Self::in_memory();
        }
        let conn = Connection::open(path)?;
        // WAL mode: a commit is durable without blocking readers.
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch("PRAGMA synchronous=FULL;")?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> DeskResult<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> DeskResult<()> {
        self.conn()?
            .execute_batch(include_str!("../../migrations/001_draw_state.sql"))?;
        Ok(())
    }

    fn conn(&self) -> DeskResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| DeskError::LockPoisoned {
            client: "<store>".to_string(),
        })
    }
}

impl StateStore for SqliteStore {
    fn load(&self, client: &str) -> DeskResult<Option<DrawState>> {
        let row = self
            .conn()?
            .query_row(
                "SELECT cursor, buffer_json FROM draw_state WHERE client = ?1",
                params![client],
                |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)),
            )
            .optional()?;

        match row {
            None => Ok(None),
            Some((cursor, buffer_json)) => {
                let cursor = u64::try_from(cursor).map_err(|_| DeskError::CorruptState {
                    client: client.to_string(),
                    reason: format!("negative cursor {cursor}"),
                })?;
                Ok(Some(DrawState {
                    cursor,
                    buffer: serde_json::from_str(&buffer_json)?,
                }))
            }
        }
    }

    fn save(&self, client: &str, state: &DrawState) -> DeskResult<()> {
        let buffer_json = serde_json::to_string(&state.buffer)?;
        let saved_at = chrono::Utc::now().to_rfc3339();
        self.conn()?.execute(
            "INSERT INTO draw_state (client, cursor, buffer_json, saved_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(client) DO UPDATE SET
                cursor = excluded.cursor,
                buffer_json = excluded.buffer_json,
                saved_at = excluded.saved_at",
            params![client, state.cursor as i64, buffer_json, saved_at],
        )?;
        Ok(())
    }

    fn clients(&self) -> DeskResult<Vec<ClientId>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT client FROM draw_state ORDER BY client ASC")?;
        let clients = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(clients)
    }
}
