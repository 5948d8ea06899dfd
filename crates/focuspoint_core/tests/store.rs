mod common;

use common::{day, memory_store_on, BrokenSession, FakeProfiles, FakeSummarizer, ReadOnlyDisk};
use focuspoint_core::{
    AiError, Clock, ClockTime, EventKind, FixedClock, InMemorySnapshotStore, JsonFileSnapshotStore,
    NewScheduleEvent, NewTask, NoteKind, ProfileRecord, RecognizedLesson, ScheduleEventPatch,
    SettingsPatch, Snapshot, SnapshotStore, Store, StoreError, SyncOutbox, TaskKind, UiFlags, User,
    UserSettings, VideoSource,
};
use proptest::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

fn json_store(path: &std::path::Path, clock: Arc<FixedClock>) -> Store {
    Store::open(
        Box::new(JsonFileSnapshotStore::new(path)),
        SyncOutbox::detached(),
        clock as Arc<dyn Clock>,
        None,
    )
    .unwrap()
}

#[test]
fn mutations_survive_a_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");
    let clock = Arc::new(FixedClock::on(day(2024, 6, 10)));

    let mut store = json_store(&path, clock.clone());
    let id = store.add_task(NewTask::new("Read chapter 4", TaskKind::Homework)).unwrap();
    store.toggle_task(id).unwrap();
    store
        .add_schedule_event(NewScheduleEvent::new(
            "Math",
            day(2024, 6, 10),
            ClockTime::hm(8, 30),
            ClockTime::hm(9, 15),
            EventKind::School,
        ))
        .unwrap();
    store.complete_onboarding().unwrap();
    let in_memory = store.snapshot().clone();
    drop(store);

    let reopened = json_store(&path, clock);
    assert_eq!(reopened.snapshot(), &in_memory);
    assert!(reopened.tasks()[0].is_completed);
    assert!(reopened.has_onboarded());
}

#[derive(Debug, Clone)]
enum TaskOp {
    Add,
    Toggle(usize),
    Remove(usize),
}

fn task_op() -> impl Strategy<Value = TaskOp> {
    prop_oneof![
        Just(TaskOp::Add),
        (0usize..8).prop_map(TaskOp::Toggle),
        (0usize..8).prop_map(TaskOp::Remove),
    ]
}

proptest! {
    #[test]
    fn task_list_tracks_adds_removes_and_toggle_parity(ops in prop::collection::vec(task_op(), 0..40)) {
        let (mut store, _clock) = memory_store_on(day(2024, 6, 10));
        let mut added: Vec<Uuid> = Vec::new();
        let mut removed: Vec<Uuid> = Vec::new();
        let mut toggles: HashMap<Uuid, usize> = HashMap::new();

        for op in ops {
            match op {
                TaskOp::Add => {
                    let id = store.add_task(NewTask::new(format!("task {}", added.len()), TaskKind::Other)).unwrap();
                    added.push(id);
                }
                TaskOp::Toggle(i) if !added.is_empty() => {
                    let id = added[i % added.len()];
                    let found = store.toggle_task(id).unwrap();
                    prop_assert_eq!(found, !removed.contains(&id));
                    if found {
                        *toggles.entry(id).or_default() += 1;
                    }
                }
                TaskOp::Remove(i) if !added.is_empty() => {
                    let id = added[i % added.len()];
                    let found = store.remove_task(id).unwrap();
                    prop_assert_eq!(found, !removed.contains(&id));
                    removed.push(id);
                }
                _ => {}
            }
        }

        let expected: Vec<Uuid> = added.iter().copied().filter(|id| !removed.contains(id)).collect();
        let actual: Vec<Uuid> = store.tasks().iter().map(|t| t.id).collect();
        prop_assert_eq!(actual, expected);
        for task in store.tasks() {
            let flips = toggles.get(&task.id).copied().unwrap_or(0);
            prop_assert_eq!(task.is_completed, flips % 2 == 1);
        }
    }
}

#[test]
fn settings_patch_only_touches_given_fields() {
    let (mut store, _clock) = memory_store_on(day(2024, 6, 10));
    store
        .update_settings(SettingsPatch { wake_up_time: Some(ClockTime::hm(6, 45)), ..Default::default() })
        .unwrap();
    store
        .update_settings(SettingsPatch { bed_time: Some(ClockTime::hm(22, 0)), ..Default::default() })
        .unwrap();

    let settings = store.settings();
    assert_eq!(settings.wake_up_time, ClockTime::hm(6, 45));
    assert_eq!(settings.bed_time, ClockTime::hm(22, 0));
    assert_eq!(settings.lunch_time, UserSettings::default().lunch_time);
}

#[test]
fn streak_follows_calendar_days() {
    let (mut store, clock) = memory_store_on(day(2024, 6, 10));
    assert_eq!(store.update_streak().unwrap(), 1);

    clock.advance_days(1);
    assert_eq!(store.update_streak().unwrap(), 2);
    assert_eq!(store.last_login_date(), Some(day(2024, 6, 11)));

    // Same day again: nothing changes.
    assert_eq!(store.update_streak().unwrap(), 2);

    clock.advance_days(5);
    assert_eq!(store.update_streak().unwrap(), 1);
    assert_eq!(store.last_login_date(), Some(day(2024, 6, 16)));
}

#[tokio::test]
async fn logout_clears_state_even_when_sign_out_fails() {
    let clock: Arc<dyn Clock> = Arc::new(FixedClock::on(day(2024, 6, 10)));
    let mut store = Store::open(
        Box::new(InMemorySnapshotStore::default()),
        SyncOutbox::detached(),
        clock,
        Some(Arc::new(BrokenSession)),
    )
    .unwrap();
    store.set_user(Some(User { user_id: Uuid::new_v4(), email: Some("a@b.c".into()) })).unwrap();
    store.add_task(NewTask::new("Essay", TaskKind::Project)).unwrap();
    store
        .add_schedule_event(NewScheduleEvent::new(
            "Art",
            day(2024, 6, 10),
            ClockTime::hm(10, 0),
            ClockTime::hm(10, 45),
            EventKind::School,
        ))
        .unwrap();
    store.add_note("Title", "Body", NoteKind::Text, None).unwrap();
    store.update_streak().unwrap();
    store.complete_onboarding().unwrap();

    store.logout().await.unwrap();

    assert!(store.tasks().is_empty());
    assert!(store.schedule().is_empty());
    assert!(store.notes().is_empty());
    assert!(store.snapshot().ai_plans.is_empty());
    assert_eq!(store.streak(), 0);
    assert_eq!(store.last_login_date(), None);
    assert!(!store.has_onboarded());
    assert!(store.user().is_none());
}

#[test]
fn failed_local_write_is_returned_and_memory_keeps_the_change() {
    let clock: Arc<dyn Clock> = Arc::new(FixedClock::on(day(2024, 6, 10)));
    let mut store = Store::open(Box::new(ReadOnlyDisk), SyncOutbox::detached(), clock, None).unwrap();

    let err = store.add_task(NewTask::new("Lost?", TaskKind::Other)).unwrap_err();
    assert!(matches!(err, StoreError::Persistence(_)));
    assert_eq!(store.tasks().len(), 1);
}

#[test]
fn school_schedule_import_replaces_school_events_only() {
    let (mut store, _clock) = memory_store_on(day(2024, 6, 10));
    store
        .add_schedule_event(NewScheduleEvent::new(
            "Old lesson",
            day(2024, 6, 3),
            ClockTime::hm(8, 0),
            ClockTime::hm(8, 45),
            EventKind::School,
        ))
        .unwrap();
    let gym = store
        .add_schedule_event(NewScheduleEvent::new(
            "Gym",
            day(2024, 6, 11),
            ClockTime::hm(18, 0),
            ClockTime::hm(19, 0),
            EventKind::Activity,
        ))
        .unwrap();

    let lessons = vec![
        RecognizedLesson {
            title: "Biology".into(),
            start: ClockTime::hm(8, 30),
            end: ClockTime::hm(9, 15),
            room: Some("31".into()),
            day: Some("Tuesday".into()),
        },
        RecognizedLesson {
            title: "Chemistry".into(),
            start: ClockTime::hm(9, 25),
            end: ClockTime::hm(10, 10),
            room: None,
            day: Some("5".into()),
        },
    ];
    let ids = store.import_recognized_schedule(day(2024, 6, 10), &lessons).unwrap();
    assert_eq!(ids.len(), 2);

    let titles: Vec<_> = store.schedule().iter().map(|e| e.title.as_str()).collect();
    assert_eq!(titles, vec!["Gym", "Biology", "Chemistry"]);
    assert_eq!(store.events_on(day(2024, 6, 11)).len(), 2);
    assert_eq!(store.events_on(day(2024, 6, 14))[0].title, "Chemistry");

    store.clear_school_schedule().unwrap();
    assert_eq!(store.schedule().len(), 1);
    assert_eq!(store.schedule()[0].id, gym);
}

#[test]
fn schedule_event_patch_and_removal() {
    let (mut store, _clock) = memory_store_on(day(2024, 6, 10));
    let id = store
        .add_schedule_event(NewScheduleEvent::new(
            "Study",
            day(2024, 6, 10),
            ClockTime::hm(16, 0),
            ClockTime::hm(17, 0),
            EventKind::Study,
        ))
        .unwrap();
    assert!(store
        .update_schedule_event(
            id,
            ScheduleEventPatch {
                end_time: Some(ClockTime::hm(17, 30)),
                subtasks: Some(vec!["outline".into(), "draft".into()]),
                ..Default::default()
            },
        )
        .unwrap());

    let event = &store.schedule()[0];
    assert_eq!(event.title, "Study");
    assert_eq!(event.end_time, ClockTime::hm(17, 30));
    assert_eq!(event.subtasks, vec!["outline", "draft"]);

    assert!(store.remove_schedule_event(id).unwrap());
    assert!(!store.remove_schedule_event(id).unwrap());
    assert!(!store.update_schedule_event(id, ScheduleEventPatch::default()).unwrap());
}

#[test]
fn reviewing_a_task_schedules_the_next_review() {
    let (mut store, clock) = memory_store_on(day(2024, 6, 10));
    let id = store.add_task(NewTask::new("Irregular verbs", TaskKind::Exam)).unwrap();

    let next = store.review_task(id, true).unwrap().unwrap();
    assert_eq!((next.level, next.next_review_date), (1, day(2024, 6, 11)));
    assert!(store.due_reviews().is_empty());

    clock.advance_days(1);
    assert_eq!(store.due_reviews().len(), 1);
    assert!(store.review_task(Uuid::new_v4(), true).unwrap().is_none());
}

#[tokio::test]
async fn video_summary_becomes_a_note() {
    let (mut store, _clock) = memory_store_on(day(2024, 6, 10));
    let url = "https://youtu.be/abc123".to_string();
    let id = store.summarize_video(VideoSource::Url(url.clone()), &FakeSummarizer).await.unwrap();

    let note = &store.notes()[0];
    assert_eq!(note.id, id);
    assert_eq!(note.title, "Photosynthesis");
    assert_eq!(note.kind, NoteKind::Video);
    assert_eq!(note.source_url.as_deref(), Some(url.as_str()));

    let err = store
        .summarize_video(VideoSource::Upload { file_name: "a.mp4".into(), bytes: vec![1, 2] }, &FakeSummarizer)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Ai(AiError::RateLimited(_))));
    assert_eq!(store.notes().len(), 1);

    assert!(store.remove_note(id).unwrap());
    assert!(store.notes().is_empty());
}

#[tokio::test]
async fn hydrate_overwrites_user_data_but_keeps_identity() {
    let user = User { user_id: Uuid::new_v4(), email: None };
    let remote = FakeProfiles::default();
    let mut remote_snapshot = Snapshot { streak: 12, has_onboarded: true, ..Snapshot::default() };
    remote_snapshot.settings.commute_time = 25;
    remote
        .rows
        .lock()
        .unwrap()
        .insert(user.user_id, ProfileRecord::from_snapshot(&remote_snapshot, chrono::Utc::now()));

    let (mut store, _clock) = memory_store_on(day(2024, 6, 10));
    store.add_task(NewTask::new("local only", TaskKind::Other)).unwrap();
    store.set_ui(UiFlags { chat_open: true, ..Default::default() }).unwrap();

    // No user yet: nothing to pull.
    assert!(!store.hydrate_from_remote(&remote).await.unwrap());

    store.set_user(Some(user.clone())).unwrap();
    assert!(store.hydrate_from_remote(&remote).await.unwrap());
    assert_eq!(store.streak(), 12);
    assert_eq!(store.settings().commute_time, 25);
    assert!(store.tasks().is_empty());
    assert_eq!(store.user(), Some(&user));
    assert!(store.ui().chat_open);

    let offline = FakeProfiles { fail: true, ..Default::default() };
    assert!(!store.hydrate_from_remote(&offline).await.unwrap());
    assert_eq!(store.streak(), 12);
}

#[test]
fn ui_flags_are_saved_with_the_snapshot() {
    let disk = InMemorySnapshotStore::default();
    disk.save(&Snapshot { ui: UiFlags { add_event_open: true, ..Default::default() }, ..Snapshot::default() })
        .unwrap();
    let clock: Arc<dyn Clock> = Arc::new(FixedClock::on(day(2024, 6, 10)));
    let store = Store::open(Box::new(disk), SyncOutbox::detached(), clock, None).unwrap();
    assert!(store.ui().add_event_open);
}
