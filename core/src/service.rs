//! The draw service: one request in, one value (or typed error) out.
//!
//! REQUEST ORDER (fixed, never reordered):
//!   1. Authentication gate (supplied by the caller)
//!   2. Client lookup
//!   3. Schedule gate
//!   4. Allow-list decode and validation
//!   5. Draw on a working copy of the client's slot
//!   6. Durable save of the working copy
//!   7. Commit the working copy in memory
//!
//! RULES:
//!   - Nothing is returned to a caller unless it was saved first.
//!   - A failed save leaves memory equal to the last successful save.
//!   - The save is the only blocking I/O on the request path.

use std::collections::HashSet;

use chrono::{DateTime, Utc};

use crate::{
    allow::AllowList,
    clock::{Clock, LocalTime},
    codec,
    command::{DrawReply, DrawRequest},
    config::DeskConfig,
    error::{DeskError, DeskResult},
    ledger::WeightVector,
    registry::{replay_record, ClientProfile, ClientRegistry, DrawSlot},
    rng::RngBank,
    sequence::DrawSequence,
    status::ClientStatus,
    store::StateStore,
};

pub struct DrawService {
    registry: ClientRegistry,
    store: Box<dyn StateStore>,
    clock: Box<dyn Clock>,
    local: LocalTime,
    value_count: usize,
}

impl DrawService {
    /// Explicit initialization phase.
    ///
    /// Replays every ledger, restores every persisted sequence, tops up
    /// reservations and checkpoints each client. Any configuration
    /// problem aborts startup.
    pub fn bootstrap(
        config: &DeskConfig,
        store: Box<dyn StateStore>,
        clock: Box<dyn Clock>,
        seed: u64,
    ) -> DeskResult<Self> {
        let local = config.local_time()?;
        let settings = &config.settings;
        let now = local.to_local(clock.now());
        let bank = RngBank::new(seed);

        let registered: HashSet<&str> = config.clients.iter().map(|c| c.client.as_str()).collect();
        if let Some(client) = store
            .clients()?
            .into_iter()
            .find(|c| !registered.contains(c.as_str()))
        {
            return Err(DeskError::UnknownPersistedClient { client });
        }

        let mut registry = ClientRegistry::new();
        for record in &config.clients {
            let profile = ClientProfile::from_record(record, &config.lesson_start_times)?;
            let weights = replay_record(record, now, settings.value_count)?;
            let sequence = match store.load(&record.client)? {
                Some(state) => DrawSequence::restore(
                    &record.client,
                    weights,
                    settings.reservation_size,
                    state,
                )?,
                None => {
                    log::info!("bootstrap: no saved state for '{}', starting fresh", record.client);
                    DrawSequence::new(weights, settings.reservation_size)?
                }
            };
            let rng = bank.for_client(&record.client);
            registry.insert(profile, DrawSlot { sequence, rng })?;
        }

        for entry in registry.iter() {
            let mut slot = entry.lock()?;
            let DrawSlot { sequence, rng } = &mut *slot;
            sequence.reserve(rng);
            store.save(&entry.profile().client, &sequence.state())?;
            log::info!(
                "bootstrap: client '{}' ({}) cursor={} pending={} plan=[{}]",
                entry.profile().client,
                entry.profile().name,
                sequence.cursor(),
                sequence.len(),
                entry.profile().plan
            );
        }

        log::info!("bootstrap: {} clients registered", registry.len());
        Ok(Self {
            registry,
            store,
            clock,
            local,
            value_count: settings.value_count,
        })
    }

    /// Serve a draw at the current moment.
    pub fn handle_get(&self, request: &DrawRequest, auth_ok: bool) -> DeskResult<DrawReply> {
        self.handle_get_at(request, auth_ok, self.clock.now())
    }

    /// Serve a draw as if it arrived at `moment`.
    pub fn handle_get_at(
        &self,
        request: &DrawRequest,
        auth_ok: bool,
        moment: DateTime<Utc>,
    ) -> DeskResult<DrawReply> {
        if !auth_ok {
            return Err(DeskError::InvalidAuthentication);
        }

        let client = request.client.as_str();
        let entry = self
            .registry
            .get(client)
            .ok_or_else(|| DeskError::InvalidClient {
                client: client.to_string(),
            })?;

        let local = self.local.to_local(moment);
        if !entry.profile().plan.is_active(local) {
            return Err(DeskError::ClientNotActive {
                client: client.to_string(),
            });
        }

        let allow = AllowList::decode(request.allow.as_deref(), self.value_count)?;

        let mut slot = entry.lock()?;
        allow.ensure_reachable(slot.sequence.weights())?;

        let mut draft: DrawSlot = slot.clone();
        let value = {
            let DrawSlot { sequence, rng } = &mut draft;
            sequence.next_matching(&allow, request.mode, rng)?
        };
        let weights = encode_weights(draft.sequence.weights())?;

        let mutated = draft.sequence.cursor() != slot.sequence.cursor()
            || draft.sequence.len() != slot.sequence.len();
        if mutated {
            if let Err(e) = self.store.save(client, &draft.sequence.state()) {
                log::error!("draw: save failed for '{client}', discarding draw: {e}");
                return Err(DeskError::Persistence {
                    client: client.to_string(),
                    source: Box::new(e),
                });
            }
        }

        log::debug!(
            "draw: client '{client}' mode={:?} value={value} cursor {} -> {}",
            request.mode,
            slot.sequence.cursor(),
            draft.sequence.cursor()
        );
        *slot = draft;

        Ok(DrawReply { value, weights })
    }

    /// Recompute every client's weights from `config` at the current moment.
    ///
    /// All-or-nothing: if any ledger fails, no client's weights change.
    /// Returns the number of clients updated.
    pub fn reload_ledgers(&self, config: &DeskConfig) -> DeskResult<usize> {
        if config.settings.value_count != self.value_count {
            return Err(DeskError::InvalidConfig(format!(
                "value_count cannot change from {} to {} without a restart",
                self.value_count, config.settings.value_count
            )));
        }

        let now = self.local.to_local(self.clock.now());
        let mut recomputed = Vec::with_capacity(config.clients.len());
        for record in &config.clients {
            if !self.registry.contains(&record.client) {
                log::warn!("reload: ignoring unregistered client '{}'", record.client);
                continue;
            }
            recomputed.push((record.client.as_str(), replay_record(record, now, self.value_count)?));
        }

        for (client, weights) in &recomputed {
            if let Some(entry) = self.registry.get(client) {
                entry.lock()?.sequence.set_weights(weights.clone())?;
                log::info!("reload: client '{client}' weights={}", encode_weights(weights)?);
            }
        }
        Ok(recomputed.len())
    }

    /// Status rows for every client, in roster order.
    pub fn status(&self) -> DeskResult<Vec<ClientStatus>> {
        self.registry
            .iter()
            .map(|entry| -> DeskResult<ClientStatus> {
                let slot = entry.lock()?;
                let profile = entry.profile();
                Ok(ClientStatus {
                    id: profile.id,
                    name: profile.name.clone(),
                    client: profile.client.clone(),
                    plan: profile.plan.to_string(),
                    cursor: slot.sequence.cursor(),
                    pending: slot.sequence.pending().collect(),
                    weights: encode_weights(slot.sequence.weights())?,
                })
            })
            .collect()
    }
}

fn encode_weights(weights: &WeightVector) -> DeskResult<String> {
    Ok(codec::encode(weights.as_slice().iter().map(|&w| w as usize))?)
}
