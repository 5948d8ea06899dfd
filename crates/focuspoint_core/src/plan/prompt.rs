//! crates/focuspoint_core/src/plan/prompt.rs

use crate::domain::{ScheduleEvent, UserSettings};
use crate::schedule::{events_on, routines_on};
use chrono::NaiveDate;
use std::fmt::Write;

/// Builds the day-plan request for `date` from the schedule and settings.
pub fn build_plan_prompt(date: NaiveDate, schedule: &[ScheduleEvent], settings: &UserSettings) -> String {
    let mut p = String::new();
    let _ = writeln!(
        p,
        "You are a planning assistant for a school student. Build a realistic plan for {} ({}).",
        date.format("%Y-%m-%d"),
        date.format("%A")
    );
    p.push_str("\nThe student's day:\n");
    let _ = writeln!(p, "- Wakes up at {}, goes to bed at {}.", settings.wake_up_time, settings.bed_time);
    let _ = writeln!(
        p,
        "- Meals: breakfast {}, lunch {}, dinner {}.",
        settings.breakfast_time, settings.lunch_time, settings.dinner_time
    );
    if settings.commute_time > 0 {
        let _ = writeln!(p, "- The commute to school takes {} minutes.", settings.commute_time);
    }

    let day = events_on(schedule, date);
    if day.is_empty() {
        p.push_str("- No fixed events on this day.\n");
    } else {
        p.push_str("- Fixed events:\n");
        for event in day {
            let _ = write!(p, "  - {}-{} {}", event.start_time, event.end_time, event.title);
            if let Some(room) = &event.room {
                let _ = write!(p, " (room {room})");
            }
            p.push('\n');
        }
    }

    let routines = routines_on(settings, date);
    if !routines.is_empty() {
        p.push_str("- Regular activities:\n");
        for routine in routines {
            let _ = writeln!(p, "  - {}-{} {}", routine.start_time, routine.end_time, routine.title);
        }
    }

    p.push_str(
        "\nKeep every fixed event and regular activity at its time. Fill the free time with rest, \
         homework and useful activities, and mark the blocks you suggest as recommendations.\n\
         Write titles and the analysis in the same language as the event titles.\n\
         Reply with JSON only, no markdown, in exactly this shape:\n\
         {\"plan\":[{\"start\":\"HH:mm\",\"end\":\"HH:mm\",\"title\":\"...\",\
         \"type\":\"rest|productivity|activity|routine|school|sleep|meal\",\
         \"isRecommendation\":true}],\"analysis\":\"two or three sentences about the day\"}\n",
    );
    p
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{EventKind, RoutineActivity};
    use crate::time::ClockTime;
    use chrono::Weekday;
    use uuid::Uuid;

    #[test]
    fn prompt_lists_day_events_and_matching_routines() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();
        let schedule = vec![ScheduleEvent {
            id: Uuid::new_v4(),
            title: "Physics".into(),
            date,
            start_time: ClockTime::hm(9, 0),
            end_time: ClockTime::hm(9, 45),
            kind: EventKind::School,
            task_id: None,
            subtasks: Vec::new(),
            room: Some("12".into()),
        }];
        let mut settings = UserSettings::default();
        settings.routine_activities = vec![
            RoutineActivity {
                id: Uuid::new_v4(),
                title: "Swimming".into(),
                start_time: ClockTime::hm(17, 0),
                end_time: ClockTime::hm(18, 0),
                days: vec![Weekday::Mon],
            },
            RoutineActivity {
                id: Uuid::new_v4(),
                title: "Chess".into(),
                start_time: ClockTime::hm(17, 0),
                end_time: ClockTime::hm(18, 0),
                days: vec![Weekday::Fri],
            },
        ];

        let prompt = build_plan_prompt(date, &schedule, &settings);
        assert!(prompt.contains("2024-06-10 (Monday)"));
        assert!(prompt.contains("09:00-09:45 Physics (room 12)"));
        assert!(prompt.contains("Swimming"));
        assert!(!prompt.contains("Chess"));
        assert!(prompt.contains("\"plan\""));
    }
}
