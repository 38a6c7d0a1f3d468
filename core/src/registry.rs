//! Client registry: the owned table of registered clients.
//!
//! RULE: Each client's mutable draw state sits behind its own lock.
//! Requests for one client are serialized; different clients never
//! contend with each other.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use chrono::{NaiveDateTime, NaiveTime};

use crate::{
    config::ClientRecord,
    error::{DeskError, DeskResult},
    ledger::{self, WeightVector},
    rng::DrawRng,
    schedule::WeeklyPlan,
    sequence::DrawSequence,
    types::ClientId,
};

/// Read-only facts about a client, fixed for the run.
#[derive(Debug, Clone)]
pub struct ClientProfile {
    pub id: u64,
    pub name: String,
    pub client: ClientId,
    pub plan: WeeklyPlan,
}

impl ClientProfile {
    pub fn from_record(record: &ClientRecord, start_times: &[NaiveTime]) -> DeskResult<Self> {
        let plan = WeeklyPlan::from_slots(start_times, &record.plan).map_err(|reason| {
            DeskError::InvalidPlan {
                client: record.client.clone(),
                reason,
            }
        })?;
        Ok(Self {
            id: record.id,
            name: record.name.clone(),
            client: record.client.clone(),
            plan,
        })
    }
}

/// Replay a client's ledger as of `now` (local time).
pub fn replay_record(
    record: &ClientRecord,
    now: NaiveDateTime,
    value_count: usize,
) -> DeskResult<WeightVector> {
    let ledger_err = |source| DeskError::Ledger {
        client: record.client.clone(),
        source,
    };
    let transactions = ledger::parse_ledger(&record.transactions).map_err(ledger_err)?;
    ledger::replay(&transactions, now, value_count).map_err(ledger_err)
}

/// Mutable per-client draw state. Cloned as a working copy per request.
#[derive(Debug, Clone)]
pub struct DrawSlot {
    pub sequence: DrawSequence,
    pub rng: DrawRng,
}

pub struct ClientEntry {
    profile: ClientProfile,
    slot: Mutex<DrawSlot>,
}

impl ClientEntry {
    pub fn profile(&self) -> &ClientProfile {
        &self.profile
    }

    pub fn lock(&self) -> DeskResult<MutexGuard<'_, DrawSlot>> {
        self.slot.lock().map_err(|_| DeskError::LockPoisoned {
            client: self.profile.client.clone(),
        })
    }
}

#[derive(Default)]
pub struct ClientRegistry {
    entries: HashMap<ClientId, ClientEntry>,
    /// Roster order, for stable listings.
    order: Vec<ClientId>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, profile: ClientProfile, slot: DrawSlot) -> DeskResult<()> {
        let client = profile.client.clone();
        if self.entries.contains_key(&client) {
            return Err(DeskError::InvalidConfig(format!(
                "client identifier '{client}' is registered twice"
            )));
        }
        self.entries.insert(
            client.clone(),
            ClientEntry {
                profile,
                slot: Mutex::new(slot),
            },
        );
        self.order.push(client);
        Ok(())
    }

    pub fn get(&self, client: &str) -> Option<&ClientEntry> {
        self.entries.get(client)
    }

    pub fn contains(&self, client: &str) -> bool {
        self.entries.contains_key(client)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Entries in roster order.
    pub fn iter(&self) -> impl Iterator<Item = &ClientEntry> + '_ {
        self.order.iter().filter_map(|client| self.entries.get(client))
    }
}
