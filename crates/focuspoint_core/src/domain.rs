//! crates/focuspoint_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! Field names serialize in camelCase so the local blob and the remote profile
//! record keep the same shape across clients.

use crate::plan::PlanCache;
use crate::time::ClockTime;
use chrono::{DateTime, NaiveDate, Utc, Weekday};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

//=========================================================================================
// Accounts
//=========================================================================================

/// The signed-in user, used throughout the app.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub user_id: Uuid,
    pub email: Option<String>,
}

// Only used internally for login/signup - contains sensitive data
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user_id: Uuid,
    pub email: String,
    pub hashed_password: String,
}

// Represents a browser login session (auth cookie)
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub id: String,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

//=========================================================================================
// Tasks
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskKind {
    Homework,
    Project,
    Exam,
    Other,
}

/// Review schedule for a task that is being memorised.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpacedRepetition {
    /// 0 = new, 1 = one day, 2 = three days, 3 = a week.
    pub level: u8,
    pub next_review_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<NaiveDate>,
    pub is_completed: bool,
    #[serde(rename = "type")]
    pub kind: TaskKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spaced_repetition: Option<SpacedRepetition>,
}

/// Everything the caller supplies when creating a task.
#[derive(Debug, Clone)]
pub struct NewTask {
    pub title: String,
    pub subject: Option<String>,
    pub deadline: Option<NaiveDate>,
    pub kind: TaskKind,
    pub spaced_repetition: Option<SpacedRepetition>,
}

impl NewTask {
    pub fn new(title: impl Into<String>, kind: TaskKind) -> Self {
        Self {
            title: title.into(),
            subject: None,
            deadline: None,
            kind,
            spaced_repetition: None,
        }
    }
}

//=========================================================================================
// Schedule
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    School,
    Sleep,
    Activity,
    Study,
    Break,
    Routine,
    Meal,
}

/// One block of time on one calendar date. Overlaps are allowed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleEvent {
    pub id: Uuid,
    pub title: String,
    pub date: NaiveDate,
    pub start_time: ClockTime,
    pub end_time: ClockTime,
    #[serde(rename = "type")]
    pub kind: EventKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<Uuid>,
    /// Display order matters.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subtasks: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewScheduleEvent {
    pub title: String,
    pub date: NaiveDate,
    pub start_time: ClockTime,
    pub end_time: ClockTime,
    pub kind: EventKind,
    pub task_id: Option<Uuid>,
    pub subtasks: Vec<String>,
    pub room: Option<String>,
}

impl NewScheduleEvent {
    pub fn new(
        title: impl Into<String>,
        date: NaiveDate,
        start_time: ClockTime,
        end_time: ClockTime,
        kind: EventKind,
    ) -> Self {
        Self {
            title: title.into(),
            date,
            start_time,
            end_time,
            kind,
            task_id: None,
            subtasks: Vec::new(),
            room: None,
        }
    }
}

/// Partial update of a schedule event; `None` keeps the current value.
#[derive(Debug, Clone, Default)]
pub struct ScheduleEventPatch {
    pub title: Option<String>,
    pub date: Option<NaiveDate>,
    pub start_time: Option<ClockTime>,
    pub end_time: Option<ClockTime>,
    pub kind: Option<EventKind>,
    pub task_id: Option<Uuid>,
    pub subtasks: Option<Vec<String>>,
    pub room: Option<String>,
}

impl ScheduleEventPatch {
    pub fn apply(self, event: &mut ScheduleEvent) {
        if let Some(title) = self.title {
            event.title = title;
        }
        if let Some(date) = self.date {
            event.date = date;
        }
        if let Some(start) = self.start_time {
            event.start_time = start;
        }
        if let Some(end) = self.end_time {
            event.end_time = end;
        }
        if let Some(kind) = self.kind {
            event.kind = kind;
        }
        if let Some(task_id) = self.task_id {
            event.task_id = Some(task_id);
        }
        if let Some(subtasks) = self.subtasks {
            event.subtasks = subtasks;
        }
        if let Some(room) = self.room {
            event.room = Some(room);
        }
    }
}

/// A lesson read off a timetable photo by the vision model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecognizedLesson {
    pub title: String,
    pub start: ClockTime,
    pub end: ClockTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room: Option<String>,
    #[serde(
        default,
        deserialize_with = "string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub day: Option<String>,
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

//=========================================================================================
// Settings
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutineActivity {
    pub id: Uuid,
    pub title: String,
    pub start_time: ClockTime,
    pub end_time: ClockTime,
    /// Empty means every day.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub days: Vec<Weekday>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserSettings {
    pub wake_up_time: ClockTime,
    pub bed_time: ClockTime,
    pub breakfast_time: ClockTime,
    pub lunch_time: ClockTime,
    pub dinner_time: ClockTime,
    pub school_start: ClockTime,
    pub school_end: ClockTime,
    /// Minutes spent getting to school.
    pub commute_time: u32,
    pub routine_activities: Vec<RoutineActivity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grade: Option<String>,
}

impl Default for UserSettings {
    fn default() -> Self {
        let at = ClockTime::hm;
        Self {
            wake_up_time: at(7, 0),
            bed_time: at(23, 0),
            breakfast_time: at(7, 30),
            lunch_time: at(14, 30),
            dinner_time: at(19, 0),
            school_start: at(8, 0),
            school_end: at(14, 0),
            commute_time: 0,
            routine_activities: Vec::new(),
            group: None,
            grade: None,
        }
    }
}

/// Shallow patch of the settings record; `None` fields never erase.
#[derive(Debug, Clone, Default)]
pub struct SettingsPatch {
    pub wake_up_time: Option<ClockTime>,
    pub bed_time: Option<ClockTime>,
    pub breakfast_time: Option<ClockTime>,
    pub lunch_time: Option<ClockTime>,
    pub dinner_time: Option<ClockTime>,
    pub school_start: Option<ClockTime>,
    pub school_end: Option<ClockTime>,
    pub commute_time: Option<u32>,
    pub routine_activities: Option<Vec<RoutineActivity>>,
    pub group: Option<String>,
    pub grade: Option<String>,
}

impl SettingsPatch {
    pub fn apply(self, settings: &mut UserSettings) {
        macro_rules! merge {
            ($($field:ident),*) => {
                $(if let Some(value) = self.$field {
                    settings.$field = value;
                })*
            };
        }
        merge!(
            wake_up_time,
            bed_time,
            breakfast_time,
            lunch_time,
            dinner_time,
            school_start,
            school_end,
            commute_time,
            routine_activities
        );
        if let Some(group) = self.group {
            settings.group = Some(group);
        }
        if let Some(grade) = self.grade {
            settings.grade = Some(grade);
        }
    }
}

//=========================================================================================
// Notes
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteKind {
    Video,
    Text,
    File,
}

/// A markdown note produced by the video-to-notes feature. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    #[serde(rename = "type")]
    pub kind: NoteKind,
}

/// Where a video to summarise comes from.
#[derive(Debug, Clone)]
pub enum VideoSource {
    Url(String),
    Upload { file_name: String, bytes: Vec<u8> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoSummary {
    pub summary: String,
    pub title: String,
}

//=========================================================================================
// AI day plans
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanItemKind {
    Rest,
    Productivity,
    Activity,
    Routine,
    School,
    Sleep,
    Meal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanItem {
    pub id: Uuid,
    pub start: ClockTime,
    pub end: ClockTime,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: PlanItemKind,
    pub is_recommendation: bool,
    pub is_completed: bool,
}

/// A user edit of a plan item.
#[derive(Debug, Clone, Default)]
pub struct PlanItemPatch {
    pub start: Option<ClockTime>,
    pub end: Option<ClockTime>,
    pub title: Option<String>,
    pub kind: Option<PlanItemKind>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiPlan {
    /// Assumed chronological.
    pub items: Vec<PlanItem>,
    pub analysis: String,
    pub last_generated: DateTime<Utc>,
    pub fingerprint: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Model,
}

/// One earlier message of a conversation with the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub text: String,
}

//=========================================================================================
// Store snapshot and remote record
//=========================================================================================

/// Visibility of overlays. Saved with the snapshot, never synced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UiFlags {
    pub chat_open: bool,
    pub add_task_open: bool,
    pub add_event_open: bool,
}

/// Everything the client holds, serialized as one blob.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Snapshot {
    pub has_onboarded: bool,
    pub user: Option<User>,
    pub tasks: Vec<Task>,
    pub schedule: Vec<ScheduleEvent>,
    pub notes: Vec<Note>,
    pub settings: UserSettings,
    pub ai_plans: PlanCache,
    pub streak: u32,
    pub last_login_date: Option<NaiveDate>,
    pub ui: UiFlags,
}

/// The per-user row mirrored to the remote profile store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileRecord {
    pub settings: UserSettings,
    pub tasks: Vec<Task>,
    pub schedule: Vec<ScheduleEvent>,
    pub notes: Vec<Note>,
    pub ai_plans: PlanCache,
    pub streak: u32,
    pub last_login_date: Option<NaiveDate>,
    pub has_onboarded: bool,
    pub updated_at: DateTime<Utc>,
}

impl ProfileRecord {
    pub fn from_snapshot(snapshot: &Snapshot, updated_at: DateTime<Utc>) -> Self {
        Self {
            settings: snapshot.settings.clone(),
            tasks: snapshot.tasks.clone(),
            schedule: snapshot.schedule.clone(),
            notes: snapshot.notes.clone(),
            ai_plans: snapshot.ai_plans.clone(),
            streak: snapshot.streak,
            last_login_date: snapshot.last_login_date,
            has_onboarded: snapshot.has_onboarded,
            updated_at,
        }
    }

    /// Overwrites the user-scoped parts of `snapshot`, keeping identity and UI flags.
    pub fn apply_to(self, snapshot: &mut Snapshot) {
        snapshot.settings = self.settings;
        snapshot.tasks = self.tasks;
        snapshot.schedule = self.schedule;
        snapshot.notes = self.notes;
        snapshot.ai_plans = self.ai_plans;
        snapshot.streak = self.streak;
        snapshot.last_login_date = self.last_login_date;
        snapshot.has_onboarded = self.has_onboarded;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_patch_keeps_untouched_fields() {
        let mut settings = UserSettings {
            wake_up_time: "06:45".parse().unwrap(),
            ..UserSettings::default()
        };
        SettingsPatch {
            bed_time: Some("22:00".parse().unwrap()),
            ..SettingsPatch::default()
        }
        .apply(&mut settings);

        assert_eq!(settings.wake_up_time.to_string(), "06:45");
        assert_eq!(settings.bed_time.to_string(), "22:00");
    }

    #[test]
    fn recognized_lesson_accepts_numeric_day() {
        let lesson: RecognizedLesson = serde_json::from_str(
            r#"{"title":"Физика","start":"08:30","end":"09:15","day":2}"#,
        )
        .unwrap();
        assert_eq!(lesson.day.as_deref(), Some("2"));
        assert_eq!(lesson.room, None);
    }

    #[test]
    fn task_serializes_kind_as_type() {
        let task = Task {
            id: Uuid::nil(),
            title: "Essay".into(),
            subject: None,
            deadline: None,
            is_completed: false,
            kind: TaskKind::Project,
            spaced_repetition: None,
        };
        let json = serde_json::to_value(&task).unwrap();
        assert_eq!(json["type"], "project");
        assert_eq!(json["isCompleted"], false);
    }
}
