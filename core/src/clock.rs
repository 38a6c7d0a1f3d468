//! Wall-clock access and conversion to the service's local time.
//!
//! Lesson plans and ledger expirations are written in local wall-clock
//! terms, so every moment is converted through the configured time zone
//! (daylight saving included) before it reaches the schedule gate or the
//! ledger replayer.

use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, NaiveDateTime, Utc};
use chrono_tz::Tz;

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// The real clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to (tests and replay tooling).
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self { now: Mutex::new(now) }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = now;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Time zone of the place the lessons happen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalTime {
    zone: Tz,
}

impl LocalTime {
    pub fn new(zone: Tz) -> Self {
        Self { zone }
    }

    /// Zone by IANA name, e.g. "Europe/Warsaw". None for unknown names.
    pub fn named(name: &str) -> Option<Self> {
        name.parse::<Tz>().ok().map(Self::new)
    }

    pub fn zone(&self) -> Tz {
        self.zone
    }

    pub fn to_local(&self, moment: DateTime<Utc>) -> NaiveDateTime {
        moment.with_timezone(&self.zone).naive_local()
    }
}
