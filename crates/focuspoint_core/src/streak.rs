//! crates/focuspoint_core/src/streak.rs
//!
//! Daily login streak: counts consecutive calendar days the app was opened.

use chrono::NaiveDate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Streak {
    pub count: u32,
    pub last_login: Option<NaiveDate>,
}

/// Advances the streak for a login on `today`.
///
/// Same day is a no-op, the next day increments, anything else (a gap, no
/// previous login, or a clock that moved backwards) restarts at 1.
pub fn advance(streak: Streak, today: NaiveDate) -> Streak {
    let count = match streak.last_login.map(|last| (today - last).num_days()) {
        Some(0) => return streak,
        Some(1) => streak.count.saturating_add(1),
        _ => 1,
    };
    Streak {
        count,
        last_login: Some(today),
    }
}
