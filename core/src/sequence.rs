//! Weighted draw sequence.
//!
//! INVARIANTS:
//!   - Adjacent buffer entries are never equal.
//!   - After any consuming draw the buffer is topped back up to
//!     the reservation target.
//!   - The cursor counts every consumed value, including values
//!     discarded by an allow-list.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::{
    allow::AllowList,
    error::{DeskError, DeskResult},
    ledger::WeightVector,
    rng::DrawRng,
    snapshot::DrawState,
    types::Value,
};

/// How the first draw of a request treats the buffer head.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrawMode {
    /// First draw of a session: the head is offered without consuming it.
    Starting,
    /// Every draw consumes.
    #[default]
    Continuing,
}

#[derive(Debug, Clone)]
pub struct DrawSequence {
    weights: WeightVector,
    buffer: VecDeque<Value>,
    cursor: u64,
    target: usize,
}

impl DrawSequence {
    /// Empty sequence. Call `reserve` before drawing.
    pub fn new(weights: WeightVector, target: usize) -> DeskResult<Self> {
        if weights.support().take(2).count() < 2 {
            // A single drawable value can never satisfy the no-repeat rule.
            return Err(DeskError::InvalidConfig(
                "weight vector needs at least two drawable values".into(),
            ));
        }
        if target == 0 {
            return Err(DeskError::InvalidConfig(
                "reservation size must be at least 1".into(),
            ));
        }
        Ok(Self {
            weights,
            buffer: VecDeque::with_capacity(target + 1),
            cursor: 0,
            target,
        })
    }

    /// Resume from persisted state. Fails if the state breaks an invariant.
    pub fn restore(
        client: &str,
        weights: WeightVector,
        target: usize,
        state: DrawState,
    ) -> DeskResult<Self> {
        let corrupt = |reason: String| DeskError::CorruptState {
            client: client.to_string(),
            reason,
        };

        if let Some(&bad) = state.buffer.iter().find(|&&v| v >= weights.len()) {
            return Err(corrupt(format!(
                "value {bad} outside 0..{}",
                weights.len()
            )));
        }
        if let Some(pos) = state.buffer.windows(2).position(|w| w[0] == w[1]) {
            return Err(corrupt(format!(
                "value {} repeated at positions {pos} and {}",
                state.buffer[pos],
                pos + 1
            )));
        }

        let mut seq = Self::new(weights, target)?;
        seq.cursor = state.cursor;
        seq.buffer.extend(state.buffer);
        Ok(seq)
    }

    /// Top the buffer up to the reservation target.
    pub fn reserve(&mut self, rng: &mut DrawRng) {
        let weights = self.weights.as_slice();
        while self.buffer.len() < self.target {
            let mut x = rng.weighted_index(weights);
            while self.buffer.back() == Some(&x) {
                x = rng.weighted_index(weights);
            }
            self.buffer.push_back(x);
        }
    }

    /// Upcoming value, without consuming it.
    pub fn peek(&self) -> Option<Value> {
        self.buffer.front().copied()
    }

    /// Consume the head, advance the cursor and refill.
    pub fn advance(&mut self, rng: &mut DrawRng) -> Value {
        if self.buffer.is_empty() {
            self.reserve(rng);
        }
        // reserve() never leaves the buffer empty since target >= 1.
        let Some(x) = self.buffer.pop_front() else {
            unreachable!("buffer empty after reserve")
        };
        self.cursor += 1;
        self.reserve(rng);
        x
    }

    /// Draw until a value in `allow` comes up.
    ///
    /// Rejected draws are consumed for good. In `Starting` mode the
    /// head is offered first without consuming it.
    pub fn next_matching(
        &mut self,
        allow: &AllowList,
        mode: DrawMode,
        rng: &mut DrawRng,
    ) -> DeskResult<Value> {
        allow.ensure_reachable(&self.weights)?;

        if mode == DrawMode::Starting {
            if self.buffer.is_empty() {
                self.reserve(rng);
            }
            if let Some(head) = self.peek().filter(|&v| allow.contains(v)) {
                return Ok(head);
            }
        }

        loop {
            let x = self.advance(rng);
            if allow.contains(x) {
                return Ok(x);
            }
            log::trace!("sequence: discarded {x} (not allowed)");
        }
    }

    /// Swap in a recomputed weight vector. Pending draws are kept.
    pub fn set_weights(&mut self, weights: WeightVector) -> DeskResult<()> {
        if weights.len() != self.weights.len() {
            return Err(DeskError::InvalidConfig(format!(
                "weight vector length changed from {} to {}",
                self.weights.len(),
                weights.len()
            )));
        }
        self.weights = weights;
        Ok(())
    }

    pub fn weights(&self) -> &WeightVector {
        &self.weights
    }

    pub fn cursor(&self) -> u64 {
        self.cursor
    }

    pub fn pending(&self) -> impl Iterator<Item = Value> + '_ {
        self.buffer.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn state(&self) -> DrawState {
        DrawState {
            cursor: self.cursor,
            buffer: self.buffer.iter().copied().collect(),
        }
    }
}
