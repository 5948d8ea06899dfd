//! crates/focuspoint_core/src/review.rs
//!
//! Spaced repetition for tasks the student is memorising.

use crate::domain::{SpacedRepetition, Task};
use chrono::{Duration, NaiveDate};

pub const MAX_LEVEL: u8 = 3;

/// Days until the next review at each level.
pub fn interval_days(level: u8) -> i64 {
    match level {
        0 => 0,
        1 => 1,
        2 => 3,
        _ => 7,
    }
}

/// Schedules the next review. Remembering moves one level up; forgetting
/// drops back to the one-day interval.
pub fn review(current: Option<&SpacedRepetition>, remembered: bool, today: NaiveDate) -> SpacedRepetition {
    let level = match (current.map(|s| s.level), remembered) {
        (Some(level), true) => level.saturating_add(1).min(MAX_LEVEL),
        (None, true) => 1,
        (_, false) => 1,
    };
    SpacedRepetition {
        level,
        next_review_date: today + Duration::days(interval_days(level)),
    }
}

/// Incomplete tasks whose review falls on or before `today`.
pub fn due_for_review(tasks: &[Task], today: NaiveDate) -> Vec<&Task> {
    tasks
        .iter()
        .filter(|t| !t.is_completed)
        .filter(|t| {
            t.spaced_repetition
                .as_ref()
                .is_some_and(|s| s.next_review_date <= today)
        })
        .collect()
}
