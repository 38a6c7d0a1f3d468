//! Ledger replay: turns an ordered list of weight-adjustment
//! transactions into a validated weight vector.
//!
//! RULES:
//!   - Transactions apply in listed order.
//!   - An expired transaction is skipped entirely, with a warning.
//!   - Every weight touched by a transaction must stay in (0, 64).
//!     A breach means the ledger is corrupt and is never clamped.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::{
    error::LedgerError,
    types::{Value, Weight, DEFAULT_WEIGHT, WEIGHT_CEILING},
};

/// Per-value relative draw probabilities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeightVector(Vec<Weight>);

impl WeightVector {
    /// Every value at the default weight.
    pub fn uniform(len: usize) -> Self {
        Self(vec![DEFAULT_WEIGHT; len])
    }

    /// Wrap raw weights, rejecting any outside (0, 64).
    pub fn from_weights(weights: Vec<Weight>) -> Option<Self> {
        weights
            .iter()
            .all(|&w| w > 0 && w < WEIGHT_CEILING)
            .then_some(Self(weights))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, value: Value) -> Option<Weight> {
        self.0.get(value).copied()
    }

    pub fn as_slice(&self) -> &[Weight] {
        &self.0
    }

    pub fn total(&self) -> u64 {
        self.0.iter().map(|&w| u64::from(w)).sum()
    }

    /// Values that can actually be drawn.
    pub fn support(&self) -> impl Iterator<Item = Value> + '_ {
        self.0
            .iter()
            .enumerate()
            .filter(|(_, w)| **w > 0)
            .map(|(v, _)| v)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Take `amount` away from value `from`.
    Delete { amount: u32, from: usize },
    /// Shift `amount` from value `from` to value `to`.
    Move { amount: u32, from: usize, to: usize },
}

/// One ledger entry. Indices are kept 1-based, as written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub command: Command,
    pub expires: NaiveDate,
    line: String,
}

impl Transaction {
    pub fn line(&self) -> &str {
        &self.line
    }

    /// Expiration instant: local midnight at the start of `expires`.
    pub fn expires_at(&self) -> NaiveDateTime {
        self.expires.and_time(NaiveTime::MIN)
    }

    pub fn is_expired(&self, now: NaiveDateTime) -> bool {
        self.expires_at() < now
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.line)
    }
}

impl FromStr for Transaction {
    type Err = LedgerError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let malformed = |reason: &str| LedgerError::Malformed {
            line: line.to_string(),
            reason: reason.to_string(),
        };

        let (body, date) = line
            .trim()
            .rsplit_once(", ")
            .ok_or_else(|| malformed("expected '<command>, <YYYY-MM-DD>'"))?;
        let expires = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
            .map_err(|e| malformed(&format!("bad expiration date: {e}")))?;

        let number = |token: &str| -> Result<u32, LedgerError> {
            token
                .parse::<u32>()
                .map_err(|_| malformed(&format!("expected a number, got {token:?}")))
        };

        let tokens: Vec<&str> = body.split_whitespace().collect();
        let command = match tokens.as_slice() {
            ["delete", amount, "from", from] => Command::Delete {
                amount: number(amount)?,
                from: number(from)? as usize,
            },
            ["move", amount, "from", from, "to", to] => Command::Move {
                amount: number(amount)?,
                from: number(from)? as usize,
                to: number(to)? as usize,
            },
            _ => return Err(malformed("unknown command")),
        };

        Ok(Self {
            command,
            expires,
            line: line.trim().to_string(),
        })
    }
}

/// Parse every line of a ledger. The first malformed line aborts.
pub fn parse_ledger<S: AsRef<str>>(lines: &[S]) -> Result<Vec<Transaction>, LedgerError> {
    lines.iter().map(|line| line.as_ref().parse()).collect()
}

/// Replay `transactions` as of `now` over `len` values.
pub fn replay(
    transactions: &[Transaction],
    now: NaiveDateTime,
    len: usize,
) -> Result<WeightVector, LedgerError> {
    let mut weights: Vec<i64> = vec![i64::from(DEFAULT_WEIGHT); len];

    for tx in transactions {
        if tx.is_expired(now) {
            log::warn!("ledger: skipping expired transaction {:?}, please remove it", tx.line());
            continue;
        }

        match tx.command {
            Command::Delete { amount, from } => {
                let a = slot(tx, from, len)?;
                weights[a] -= i64::from(amount);
                check_bounds(tx, a, weights[a])?;
            }
            Command::Move { amount, from, to } => {
                let a = slot(tx, from, len)?;
                let b = slot(tx, to, len)?;
                weights[a] -= i64::from(amount);
                weights[b] += i64::from(amount);
                check_bounds(tx, a, weights[a])?;
                check_bounds(tx, b, weights[b])?;
            }
        }
    }

    // check_bounds has already pinned every touched weight below 64.
    Ok(WeightVector(weights.into_iter().map(|w| w as Weight).collect()))
}

/// Convert a 1-based ledger index to a 0-based value.
fn slot(tx: &Transaction, index: usize, len: usize) -> Result<usize, LedgerError> {
    if (1..=len).contains(&index) {
        Ok(index - 1)
    } else {
        Err(LedgerError::IndexOutOfRange {
            line: tx.line.clone(),
            index,
            len,
        })
    }
}

fn check_bounds(tx: &Transaction, value: usize, weight: i64) -> Result<(), LedgerError> {
    if weight > 0 && weight < i64::from(WEIGHT_CEILING) {
        Ok(())
    } else {
        Err(LedgerError::WeightOutOfBounds {
            line: tx.line.clone(),
            index: value + 1,
            weight,
        })
    }
}
