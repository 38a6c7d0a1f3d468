//! Schedule gate: may a client draw at a given moment?
//!
//! A plan is a table of lesson slots per weekday. Consecutive active
//! slots collapse into a single window running from the first slot's
//! start to the last slot's end. Bounds are inclusive on both ends.

use std::fmt;

use chrono::{Datelike, Duration, NaiveDateTime, NaiveTime, Timelike, Weekday};
use serde::{Deserialize, Serialize};

use crate::types::LESSON_MINUTES;

const DAYS: usize = 7;
const DAY_ABBR: [&str; DAYS] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

/// One cell of the configured timetable: a flag or a lesson label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SlotEntry {
    Flag(bool),
    Label(String),
}

impl SlotEntry {
    pub fn is_active(&self) -> bool {
        match self {
            Self::Flag(flag) => *flag,
            Self::Label(label) => !label.trim().is_empty(),
        }
    }
}

/// Closed interval `[start, end]` on a single day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LessonWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl LessonWindow {
    pub fn contains(&self, time: NaiveTime) -> bool {
        self.start <= time && time <= self.end
    }
}

impl fmt::Display for LessonWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{:02}-{}:{:02}",
            self.start.hour(),
            self.start.minute(),
            self.end.hour(),
            self.end.minute()
        )
    }
}

/// End of the lesson that starts at `start`, or None if it would cross midnight.
pub fn lesson_end(start: NaiveTime) -> Option<NaiveTime> {
    let (end, wrapped) = start.overflowing_add_signed(Duration::minutes(LESSON_MINUTES));
    (wrapped == 0).then_some(end)
}

/// Lesson windows for each weekday, Monday first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WeeklyPlan {
    days: [Vec<LessonWindow>; DAYS],
}

impl WeeklyPlan {
    /// Collapse a per-slot table into windows.
    ///
    /// `start_times[k]` is the start of slot `k`, shared by every day.
    /// Missing trailing days are treated as free days.
    pub fn from_slots(
        start_times: &[NaiveTime],
        table: &[Vec<Option<SlotEntry>>],
    ) -> Result<Self, String> {
        if table.len() > DAYS {
            return Err(format!("plan lists {} days, a week has {DAYS}", table.len()));
        }

        let mut plan = Self::default();
        for (day, slots) in table.iter().enumerate() {
            if slots.len() > start_times.len() {
                return Err(format!(
                    "{} lists {} slots but only {} lesson start times are configured",
                    DAY_ABBR[day],
                    slots.len(),
                    start_times.len()
                ));
            }
            let active = |k: usize| slots[k].as_ref().is_some_and(SlotEntry::is_active);

            let mut k = 0;
            while k < slots.len() {
                if !active(k) {
                    k += 1;
                    continue;
                }
                let first = k;
                while k < slots.len() && active(k) {
                    k += 1;
                }
                let last_start = start_times[k - 1];
                let end = lesson_end(last_start).ok_or_else(|| {
                    format!("lesson starting at {last_start} on {} runs past midnight", DAY_ABBR[day])
                })?;
                plan.days[day].push(LessonWindow {
                    start: start_times[first],
                    end,
                });
            }
        }
        Ok(plan)
    }

    /// Add a window directly. Used by tests and tooling.
    pub fn with_window(mut self, weekday: Weekday, window: LessonWindow) -> Self {
        self.days[weekday.num_days_from_monday() as usize].push(window);
        self
    }

    pub fn windows(&self, weekday: Weekday) -> &[LessonWindow] {
        &self.days[weekday.num_days_from_monday() as usize]
    }

    /// True iff `moment` falls inside any window of its weekday.
    pub fn is_active(&self, moment: NaiveDateTime) -> bool {
        let time = moment.time();
        self.windows(moment.weekday())
            .iter()
            .any(|window| window.contains(time))
    }
}

impl fmt::Display for WeeklyPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first_day = true;
        for (day, windows) in self.days.iter().enumerate() {
            if windows.is_empty() {
                continue;
            }
            if !first_day {
                f.write_str("; ")?;
            }
            first_day = false;
            write!(f, "{}", DAY_ABBR[day])?;
            for (i, window) in windows.iter().enumerate() {
                let sep = if i == 0 { " " } else { ", " };
                write!(f, "{sep}{window}")?;
            }
        }
        Ok(())
    }
}

/// Parse an `HH:MM` lesson start time.
pub fn parse_start_time(text: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(text.trim(), "%H:%M")
        .map_err(|e| format!("bad lesson start time {text:?}: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn lesson_lasts_45_minutes() {
        assert_eq!(lesson_end(t(8, 0)), Some(t(8, 45)));
        assert_eq!(lesson_end(t(23, 30)), None);
    }

    #[test]
    fn labels_and_flags() {
        assert!(SlotEntry::Flag(true).is_active());
        assert!(!SlotEntry::Flag(false).is_active());
        assert!(SlotEntry::Label("math".into()).is_active());
        assert!(!SlotEntry::Label("  ".into()).is_active());
    }

    #[test]
    fn renders_windows() {
        let plan = WeeklyPlan::default()
            .with_window(Weekday::Mon, LessonWindow { start: t(9, 0), end: t(9, 45) })
            .with_window(Weekday::Mon, LessonWindow { start: t(11, 0), end: t(12, 40) })
            .with_window(Weekday::Thu, LessonWindow { start: t(8, 0), end: t(8, 45) });
        assert_eq!(plan.to_string(), "Mon 9:00-9:45, 11:00-12:40; Thu 8:00-8:45");
    }
}
