use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use rollcall_core::schedule::{LessonWindow, SlotEntry, WeeklyPlan};

fn t(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

/// 2024-01-01 was a Monday.
fn monday(h: u32, m: u32, s: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(h, m, s)
        .unwrap()
}

fn hourly_starts() -> Vec<NaiveTime> {
    (8..=14).map(|h| t(h, 0)).collect()
}

fn on() -> Option<SlotEntry> {
    Some(SlotEntry::Flag(true))
}

#[test]
fn monday_morning_window() {
    let plan = WeeklyPlan::default().with_window(Weekday::Mon, LessonWindow { start: t(9, 0), end: t(9, 45) });
    assert!(plan.is_active(monday(9, 30, 0)));
    assert!(!plan.is_active(monday(10, 0, 0)));
}

#[test]
fn bounds_are_inclusive() {
    let plan = WeeklyPlan::default().with_window(Weekday::Mon, LessonWindow { start: t(9, 0), end: t(9, 45) });
    assert!(plan.is_active(monday(9, 0, 0)));
    assert!(plan.is_active(monday(9, 45, 0)));
    assert!(!plan.is_active(monday(8, 59, 59)));
    assert!(!plan.is_active(monday(9, 45, 1)));
}

#[test]
fn other_weekdays_are_closed() {
    let plan = WeeklyPlan::default().with_window(Weekday::Mon, LessonWindow { start: t(9, 0), end: t(9, 45) });
    for offset in 1..7 {
        let moment = monday(9, 30, 0) + chrono::Duration::days(offset);
        assert!(!plan.is_active(moment), "active on {}", moment.format("%A"));
    }
    // Same weekday one week later behaves the same.
    assert!(plan.is_active(monday(9, 30, 0) + chrono::Duration::days(7)));
}

#[test]
fn consecutive_slots_collapse_into_one_window() {
    let table = vec![vec![None, on(), Some(SlotEntry::Label("math".into())), on(), None, on()]];
    let plan = WeeklyPlan::from_slots(&hourly_starts(), &table).unwrap();
    assert_eq!(
        plan.windows(Weekday::Mon),
        &[
            LessonWindow { start: t(9, 0), end: t(11, 45) },
            LessonWindow { start: t(13, 0), end: t(13, 45) },
        ]
    );
    // Breaks between lessons inside a run are covered; gaps between runs are not.
    assert!(plan.is_active(monday(10, 50, 0)));
    assert!(!plan.is_active(monday(12, 30, 0)));
}

#[test]
fn inactive_entries() {
    let table = vec![
        vec![Some(SlotEntry::Flag(false)), None, Some(SlotEntry::Label(String::new()))],
        vec![on()],
    ];
    let plan = WeeklyPlan::from_slots(&hourly_starts(), &table).unwrap();
    assert!(plan.windows(Weekday::Mon).is_empty());
    assert_eq!(plan.windows(Weekday::Tue).len(), 1);
    assert!(plan.windows(Weekday::Sun).is_empty());
}

#[test]
fn malformed_tables_are_rejected() {
    let eight_days = vec![vec![]; 8];
    assert!(WeeklyPlan::from_slots(&hourly_starts(), &eight_days).is_err());

    let too_many_slots = vec![vec![on(); 8]];
    assert!(WeeklyPlan::from_slots(&hourly_starts(), &too_many_slots).is_err());

    let late = vec![t(23, 30)];
    assert!(WeeklyPlan::from_slots(&late, &[vec![on()]]).is_err());
}

#[test]
fn gate_ignores_call_history() {
    let table = vec![vec![on(), on()], vec![], vec![None, None, on()]];
    let plan = WeeklyPlan::from_slots(&hourly_starts(), &table).unwrap();
    let moments: Vec<NaiveDateTime> = (0..7 * 24)
        .map(|h| monday(0, 0, 0) + chrono::Duration::minutes(h * 60 + 20))
        .collect();
    let forward: Vec<bool> = moments.iter().map(|&m| plan.is_active(m)).collect();
    let backward: Vec<bool> = moments.iter().rev().map(|&m| plan.is_active(m)).collect();
    assert_eq!(forward, backward.into_iter().rev().collect::<Vec<_>>());
    assert_eq!(forward.iter().filter(|&&a| a).count(), 3);
}
