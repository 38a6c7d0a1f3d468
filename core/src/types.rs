//! Shared primitive types and constants used across the whole service.

/// A value in the draw range `0..value_count`.
pub type Value = usize;

/// A relative draw weight for one value.
pub type Weight = u32;

/// The identifier a client presents on every request.
pub type ClientId = String;

/// Size of the draw range when the service config does not override it.
pub const DEFAULT_VALUE_COUNT: usize = 40;

/// Starting weight for every value before the ledger is replayed.
pub const DEFAULT_WEIGHT: Weight = 10;

/// Exclusive upper bound for any weight. Weights must stay in `(0, WEIGHT_CEILING)`.
pub const WEIGHT_CEILING: Weight = 64;

/// Default number of pending draws kept in each client's buffer.
pub const DEFAULT_RESERVATION_SIZE: usize = 500;

/// Length of one lesson in minutes.
pub const LESSON_MINUTES: i64 = 45;

/// Zone the lessons happen in unless service settings name another.
pub const DEFAULT_TIMEZONE: &str = "Europe/Warsaw";
