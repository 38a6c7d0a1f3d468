//! Deterministic random number generation.
//!
//! RULE: Nothing in the draw path may call any platform RNG.
//! All randomness flows through DrawRng instances derived
//! from the single master seed handed to the service at bootstrap.
//!
//! Each client gets its own RNG stream, seeded deterministically
//! from (master_seed XOR stable_hash(client_id)). This means:
//!   - Registering a new client never changes existing clients' streams.
//!   - Each client's stream is fully reproducible in isolation.

use rand::SeedableRng;
use rand_pcg::Pcg64Mcg;

use crate::types::{Value, Weight};

/// A deterministic RNG owned by a single client slot.
#[derive(Clone, Debug)]
pub struct DrawRng {
    inner: Pcg64Mcg,
}

impl DrawRng {
    pub fn new(seed: u64) -> Self {
        Self {
            inner: Pcg64Mcg::seed_from_u64(seed),
        }
    }

    /// Draw a raw u64 (full range).
    pub fn next_u64(&mut self) -> u64 {
        use rand::RngCore;
        self.inner.next_u64()
    }

    /// Roll a u64 in [0, n).
    pub fn next_u64_below(&mut self, n: u64) -> u64 {
        use rand::Rng;
        assert!(n > 0, "n must be > 0");
        self.inner.gen_range(0..n)
    }

    /// Pick an index with probability proportional to its weight.
    /// Panics if every weight is zero. Callers must check.
    pub fn weighted_index(&mut self, weights: &[Weight]) -> Value {
        let total: u64 = weights.iter().map(|&w| u64::from(w)).sum();
        let mut roll = self.next_u64_below(total);
        for (value, &weight) in weights.iter().enumerate() {
            let weight = u64::from(weight);
            if roll < weight {
                return value;
            }
            roll -= weight;
        }
        unreachable!("roll below total always lands on a weight")
    }
}

/// Hands out per-client RNG streams derived from one master seed.
#[derive(Clone, Copy, Debug)]
pub struct RngBank {
    master_seed: u64,
}

impl RngBank {
    pub fn new(master_seed: u64) -> Self {
        Self { master_seed }
    }

    pub fn for_client(&self, client: &str) -> DrawRng {
        let derived_seed = self.master_seed ^ client_hash(client).wrapping_mul(0x9e37_79b9_7f4a_7c15);
        DrawRng::new(derived_seed)
    }
}

/// Stable FNV-1a hash of a client identifier.
/// std's hasher is randomized per process, which would break replay.
fn client_hash(client: &str) -> u64 {
    client.bytes().fold(0xcbf2_9ce4_8422_2325, |hash, byte| {
        (hash ^ u64::from(byte)).wrapping_mul(0x0000_0100_0000_01b3)
    })
}
