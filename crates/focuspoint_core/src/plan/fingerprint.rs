//! crates/focuspoint_core/src/plan/fingerprint.rs
//!
//! The cache key of a day plan: a canonical rendering of exactly the inputs the
//! plan was generated from.

use crate::domain::{ScheduleEvent, UserSettings};
use crate::time::ClockTime;
use chrono::NaiveDate;
use serde::Serialize;

#[derive(Serialize, PartialEq, Eq, PartialOrd, Ord)]
struct Block<'a> {
    s: ClockTime,
    e: ClockTime,
    t: &'a str,
}

#[derive(Serialize)]
struct Inputs<'a> {
    schedule: Vec<Block<'a>>,
    settings: SettingsInputs<'a>,
}

#[derive(Serialize)]
struct SettingsInputs<'a> {
    w: ClockTime,
    b: ClockTime,
    c: u32,
    r: Vec<Block<'a>>,
}

/// Fingerprint of the plan inputs for `date`.
///
/// Covers the day's events (title, start, end) and wake time, bed time,
/// commute time and routine activities (title, start, end). Blocks are sorted,
/// so insertion order does not matter. No other field participates.
pub fn fingerprint(date: NaiveDate, schedule: &[ScheduleEvent], settings: &UserSettings) -> String {
    let mut day: Vec<Block<'_>> = schedule
        .iter()
        .filter(|e| e.date == date)
        .map(|e| Block { s: e.start_time, e: e.end_time, t: &e.title })
        .collect();
    day.sort();

    let mut routines: Vec<Block<'_>> = settings
        .routine_activities
        .iter()
        .map(|r| Block { s: r.start_time, e: r.end_time, t: &r.title })
        .collect();
    routines.sort();

    let inputs = Inputs {
        schedule: day,
        settings: SettingsInputs {
            w: settings.wake_up_time,
            b: settings.bed_time,
            c: settings.commute_time,
            r: routines,
        },
    };
    // Plain structs with string-keyed fields cannot fail to serialize.
    serde_json::to_string(&inputs).unwrap_or_default()
}
