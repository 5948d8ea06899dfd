//! crates/focuspoint_core/src/schedule.rs
//!
//! Read-side helpers over the schedule: one day's events, the routines that
//! apply to it, slot suggestions, and turning a recognized timetable into events.

use crate::domain::{
    EventKind, NewScheduleEvent, RecognizedLesson, RoutineActivity, ScheduleEvent, UserSettings,
};
use crate::time::ClockTime;
use chrono::{Datelike, Duration, NaiveDate, Weekday};

/// Standard lesson length used for slot suggestions.
pub const LESSON_MINUTES: u32 = 45;

/// The events on `date`, ordered by start time.
pub fn events_on(schedule: &[ScheduleEvent], date: NaiveDate) -> Vec<&ScheduleEvent> {
    let mut day: Vec<_> = schedule.iter().filter(|e| e.date == date).collect();
    day.sort_by_key(|e| (e.start_time, e.end_time));
    day
}

/// Routine activities that recur on the weekday of `date`.
pub fn routines_on(settings: &UserSettings, date: NaiveDate) -> Vec<&RoutineActivity> {
    let weekday = date.weekday();
    settings
        .routine_activities
        .iter()
        .filter(|r| r.days.is_empty() || r.days.contains(&weekday))
        .collect()
}

/// Proposes the next slot on `date`: right after the latest-ending event,
/// one lesson long. An empty day starts at 08:30.
pub fn suggest_slot(schedule: &[ScheduleEvent], date: NaiveDate) -> (ClockTime, ClockTime) {
    let start = schedule
        .iter()
        .filter(|e| e.date == date)
        .map(|e| e.end_time)
        .max()
        .unwrap_or(ClockTime::hm(8, 30));
    (start, start.add_minutes(LESSON_MINUTES))
}

/// Maps a weekday label to a weekday. Accepts English and Russian names or
/// abbreviations, and ISO numbers 1 (Monday) to 7.
pub fn parse_weekday(label: &str) -> Option<Weekday> {
    let label = label.trim().to_lowercase();
    if let Ok(n) = label.parse::<u8>() {
        return match n {
            1 => Some(Weekday::Mon),
            2 => Some(Weekday::Tue),
            3 => Some(Weekday::Wed),
            4 => Some(Weekday::Thu),
            5 => Some(Weekday::Fri),
            6 => Some(Weekday::Sat),
            7 => Some(Weekday::Sun),
            _ => None,
        };
    }
    const NAMES: [(&[&str], Weekday); 7] = [
        (&["mon", "пн", "пон"], Weekday::Mon),
        (&["tue", "вт", "вто"], Weekday::Tue),
        (&["wed", "ср", "сре"], Weekday::Wed),
        (&["thu", "чт", "чет"], Weekday::Thu),
        (&["fri", "пт", "пят"], Weekday::Fri),
        (&["sat", "сб", "суб"], Weekday::Sat),
        (&["sun", "вс", "вос"], Weekday::Sun),
    ];
    NAMES
        .iter()
        .find(|(prefixes, _)| prefixes.iter().any(|p| label.starts_with(p)))
        .map(|(_, day)| *day)
}

/// Dates recognized lessons inside the week that contains `week_start`.
/// Lessons with no readable day land on `week_start` itself.
pub fn lessons_to_events(week_start: NaiveDate, lessons: &[RecognizedLesson]) -> Vec<NewScheduleEvent> {
    let monday = week_start - Duration::days(week_start.weekday().num_days_from_monday() as i64);
    lessons
        .iter()
        .map(|lesson| {
            let date = lesson
                .day
                .as_deref()
                .and_then(parse_weekday)
                .map(|d| monday + Duration::days(d.num_days_from_monday() as i64))
                .unwrap_or(week_start);
            let mut event = NewScheduleEvent::new(
                lesson.title.clone(),
                date,
                lesson.start,
                lesson.end,
                EventKind::School,
            );
            event.room = lesson.room.clone();
            event
        })
        .collect()
}
