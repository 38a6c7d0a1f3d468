//! Rollcall: weighted, schedule-gated, non-repeating draws per client.
//!
//! Leaves first:
//!   ledger   → weight vector from an ordered transaction ledger
//!   sequence → persistent weighted draw buffer with a cursor
//!   schedule → weekday/lesson-window gate
//!   codec    → compact text encoding of small integers
//!   service  → request orchestration over all of the above

pub mod allow;
pub mod clock;
pub mod codec;
pub mod command;
pub mod config;
pub mod error;
pub mod ledger;
pub mod registry;
pub mod rng;
pub mod schedule;
pub mod sequence;
pub mod service;
pub mod snapshot;
pub mod status;
pub mod store;
pub mod types;
