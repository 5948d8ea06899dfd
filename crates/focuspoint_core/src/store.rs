//! crates/focuspoint_core/src/store.rs
//!
//! The client state store. Every mutation updates memory first, then writes the
//! whole snapshot to local storage, then (when a user is signed in) queues a
//! remote sync. A failed local write is returned to the caller with the memory
//! change still applied; sync failures never reach the caller.

use crate::clock::Clock;
use crate::domain::{
    AiPlan, EventKind, NewScheduleEvent, NewTask, Note, NoteKind, PlanItemPatch, ProfileRecord,
    RecognizedLesson, ScheduleEvent, ScheduleEventPatch, SettingsPatch, Snapshot,
    SpacedRepetition, Task, UiFlags, User, UserSettings, VideoSource,
};
use crate::error::{AiError, StoreResult};
use crate::outbox::{SyncOutbox, SyncRecord};
use crate::persistence::SnapshotStore;
use crate::plan::PlanSource;
use crate::ports::{ProfileRepository, SessionService, TextGenerationService, VideoSummaryService};
use crate::{review, schedule, streak};
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

pub struct Store {
    snapshot: Snapshot,
    local: Box<dyn SnapshotStore>,
    outbox: SyncOutbox,
    clock: Arc<dyn Clock>,
    session: Option<Arc<dyn SessionService>>,
}

impl Store {
    /// Loads the saved snapshot, or starts empty when nothing was saved.
    pub fn open(
        local: Box<dyn SnapshotStore>,
        outbox: SyncOutbox,
        clock: Arc<dyn Clock>,
        session: Option<Arc<dyn SessionService>>,
    ) -> StoreResult<Self> {
        let snapshot = local.load()?.unwrap_or_default();
        debug!(
            tasks = snapshot.tasks.len(),
            events = snapshot.schedule.len(),
            "Store opened"
        );
        Ok(Self { snapshot, local, outbox, clock, session })
    }

    //-------------------------------------------------------------------------------------
    // Reads
    //-------------------------------------------------------------------------------------

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn user(&self) -> Option<&User> {
        self.snapshot.user.as_ref()
    }

    pub fn has_onboarded(&self) -> bool {
        self.snapshot.has_onboarded
    }

    pub fn tasks(&self) -> &[Task] {
        &self.snapshot.tasks
    }

    pub fn schedule(&self) -> &[ScheduleEvent] {
        &self.snapshot.schedule
    }

    pub fn events_on(&self, date: NaiveDate) -> Vec<&ScheduleEvent> {
        schedule::events_on(&self.snapshot.schedule, date)
    }

    pub fn notes(&self) -> &[Note] {
        &self.snapshot.notes
    }

    pub fn settings(&self) -> &UserSettings {
        &self.snapshot.settings
    }

    pub fn plan(&self, date: NaiveDate) -> Option<&AiPlan> {
        self.snapshot.ai_plans.get(date)
    }

    pub fn streak(&self) -> u32 {
        self.snapshot.streak
    }

    pub fn last_login_date(&self) -> Option<NaiveDate> {
        self.snapshot.last_login_date
    }

    pub fn ui(&self) -> &UiFlags {
        &self.snapshot.ui
    }

    /// Tasks whose spaced-repetition review is due today.
    pub fn due_reviews(&self) -> Vec<&Task> {
        review::due_for_review(&self.snapshot.tasks, self.clock.today())
    }

    //-------------------------------------------------------------------------------------
    // Account and onboarding
    //-------------------------------------------------------------------------------------

    /// Records the signed-in identity. Local only: the next mutation syncs
    /// under this user, and [`Store::hydrate_from_remote`] pulls their data.
    pub fn set_user(&mut self, user: Option<User>) -> StoreResult<()> {
        self.snapshot.user = user;
        self.persist_local()
    }

    pub fn complete_onboarding(&mut self) -> StoreResult<()> {
        self.snapshot.has_onboarded = true;
        self.commit()
    }

    /// Clears all user data, then signs out remotely. A remote sign-out failure
    /// is logged; local state is cleared regardless.
    pub async fn logout(&mut self) -> StoreResult<()> {
        let s = &mut self.snapshot;
        s.tasks.clear();
        s.schedule.clear();
        s.notes.clear();
        s.ai_plans.clear();
        s.streak = 0;
        s.last_login_date = None;
        s.has_onboarded = false;
        s.user = None;
        let saved = self.persist_local();

        if let Some(session) = &self.session {
            if let Err(e) = session.sign_out().await {
                warn!(error = %e, "Remote sign-out failed");
            }
        }
        info!("Logged out, local state cleared.");
        saved
    }

    /// Replaces local user data with the remote profile, last writer wins.
    /// Remote errors are logged and leave local state as it was.
    pub async fn hydrate_from_remote(&mut self, repo: &dyn ProfileRepository) -> StoreResult<bool> {
        let Some(user_id) = self.snapshot.user.as_ref().map(|u| u.user_id) else {
            return Ok(false);
        };
        let record = match repo.load_profile(user_id).await {
            Ok(Some(record)) => record,
            Ok(None) => {
                debug!(%user_id, "No remote profile yet");
                return Ok(false);
            }
            Err(e) => {
                warn!(%user_id, error = %e, "Failed to load remote profile");
                return Ok(false);
            }
        };
        record.apply_to(&mut self.snapshot);
        self.persist_local()?;
        info!(%user_id, "Local state hydrated from remote profile");
        Ok(true)
    }

    //-------------------------------------------------------------------------------------
    // Tasks
    //-------------------------------------------------------------------------------------

    pub fn add_task(&mut self, task: NewTask) -> StoreResult<Uuid> {
        let id = Uuid::new_v4();
        self.snapshot.tasks.push(Task {
            id,
            title: task.title,
            subject: task.subject,
            deadline: task.deadline,
            is_completed: false,
            kind: task.kind,
            spaced_repetition: task.spaced_repetition,
        });
        self.commit()?;
        Ok(id)
    }

    /// Flips completion. Returns `false` for an unknown id, without writing.
    pub fn toggle_task(&mut self, id: Uuid) -> StoreResult<bool> {
        let Some(task) = self.snapshot.tasks.iter_mut().find(|t| t.id == id) else {
            return Ok(false);
        };
        task.is_completed = !task.is_completed;
        self.commit()?;
        Ok(true)
    }

    pub fn remove_task(&mut self, id: Uuid) -> StoreResult<bool> {
        let before = self.snapshot.tasks.len();
        self.snapshot.tasks.retain(|t| t.id != id);
        if self.snapshot.tasks.len() == before {
            return Ok(false);
        }
        self.commit()?;
        Ok(true)
    }

    /// Records a spaced-repetition review of a task.
    pub fn review_task(&mut self, id: Uuid, remembered: bool) -> StoreResult<Option<SpacedRepetition>> {
        let today = self.clock.today();
        let Some(task) = self.snapshot.tasks.iter_mut().find(|t| t.id == id) else {
            return Ok(None);
        };
        let next = review::review(task.spaced_repetition.as_ref(), remembered, today);
        task.spaced_repetition = Some(next.clone());
        self.commit()?;
        Ok(Some(next))
    }

    //-------------------------------------------------------------------------------------
    // Schedule
    //-------------------------------------------------------------------------------------

    pub fn add_schedule_event(&mut self, event: NewScheduleEvent) -> StoreResult<Uuid> {
        let id = Self::push_event(&mut self.snapshot.schedule, event);
        self.commit()?;
        Ok(id)
    }

    pub fn update_schedule_event(&mut self, id: Uuid, patch: ScheduleEventPatch) -> StoreResult<bool> {
        let Some(event) = self.snapshot.schedule.iter_mut().find(|e| e.id == id) else {
            return Ok(false);
        };
        patch.apply(event);
        self.commit()?;
        Ok(true)
    }

    pub fn remove_schedule_event(&mut self, id: Uuid) -> StoreResult<bool> {
        let before = self.snapshot.schedule.len();
        self.snapshot.schedule.retain(|e| e.id != id);
        if self.snapshot.schedule.len() == before {
            return Ok(false);
        }
        self.commit()?;
        Ok(true)
    }

    /// Removes every school event on every date.
    pub fn clear_school_schedule(&mut self) -> StoreResult<()> {
        self.snapshot.schedule.retain(|e| e.kind != EventKind::School);
        self.commit()
    }

    /// Replaces school events with recognized lessons dated inside the week of
    /// `week_start`, as a single write.
    pub fn import_recognized_schedule(
        &mut self,
        week_start: NaiveDate,
        lessons: &[RecognizedLesson],
    ) -> StoreResult<Vec<Uuid>> {
        let events = &mut self.snapshot.schedule;
        events.retain(|e| e.kind != EventKind::School);
        let ids = schedule::lessons_to_events(week_start, lessons)
            .into_iter()
            .map(|event| Self::push_event(events, event))
            .collect();
        info!(count = lessons.len(), %week_start, "Imported recognized timetable");
        self.commit()?;
        Ok(ids)
    }

    fn push_event(schedule: &mut Vec<ScheduleEvent>, event: NewScheduleEvent) -> Uuid {
        let id = Uuid::new_v4();
        schedule.push(ScheduleEvent {
            id,
            title: event.title,
            date: event.date,
            start_time: event.start_time,
            end_time: event.end_time,
            kind: event.kind,
            task_id: event.task_id,
            subtasks: event.subtasks,
            room: event.room,
        });
        id
    }

    //-------------------------------------------------------------------------------------
    // Settings, streak, UI
    //-------------------------------------------------------------------------------------

    pub fn update_settings(&mut self, patch: SettingsPatch) -> StoreResult<()> {
        patch.apply(&mut self.snapshot.settings);
        self.commit()
    }

    /// Counts today's login. Returns the resulting streak.
    pub fn update_streak(&mut self) -> StoreResult<u32> {
        let current = streak::Streak {
            count: self.snapshot.streak,
            last_login: self.snapshot.last_login_date,
        };
        let next = streak::advance(current, self.clock.today());
        if next == current {
            return Ok(next.count);
        }
        self.snapshot.streak = next.count;
        self.snapshot.last_login_date = next.last_login;
        self.commit()?;
        Ok(next.count)
    }

    pub fn set_ui(&mut self, ui: UiFlags) -> StoreResult<()> {
        self.snapshot.ui = ui;
        self.persist_local()
    }

    //-------------------------------------------------------------------------------------
    // Notes
    //-------------------------------------------------------------------------------------

    pub fn add_note(
        &mut self,
        title: impl Into<String>,
        content: impl Into<String>,
        kind: NoteKind,
        source_url: Option<String>,
    ) -> StoreResult<Uuid> {
        let id = Uuid::new_v4();
        self.snapshot.notes.push(Note {
            id,
            title: title.into(),
            content: content.into(),
            created_at: self.clock.now(),
            source_url,
            kind,
        });
        self.commit()?;
        Ok(id)
    }

    pub fn remove_note(&mut self, id: Uuid) -> StoreResult<bool> {
        let before = self.snapshot.notes.len();
        self.snapshot.notes.retain(|n| n.id != id);
        if self.snapshot.notes.len() == before {
            return Ok(false);
        }
        self.commit()?;
        Ok(true)
    }

    /// Summarises a video into a new note.
    pub async fn summarize_video(
        &mut self,
        source: VideoSource,
        summarizer: &dyn VideoSummaryService,
    ) -> StoreResult<Uuid> {
        let source_url = match &source {
            VideoSource::Url(url) => Some(url.clone()),
            VideoSource::Upload { .. } => None,
        };
        let summary = summarizer.summarize_video(source).await.map_err(AiError::from)?;
        self.add_note(summary.title, summary.summary, NoteKind::Video, source_url)
    }

    //-------------------------------------------------------------------------------------
    // AI day plans
    //-------------------------------------------------------------------------------------

    /// Makes sure a current plan exists for `date`. Read it with [`Store::plan`].
    pub async fn ensure_plan(
        &mut self,
        date: NaiveDate,
        force_refresh: bool,
        generator: &dyn TextGenerationService,
    ) -> StoreResult<PlanSource> {
        let now = self.clock.now();
        let s = &mut self.snapshot;
        let source = s
            .ai_plans
            .ensure_plan(date, &s.schedule, &s.settings, force_refresh, generator, now)
            .await?;
        if source == PlanSource::Generated {
            self.persist_local()?;
        }
        Ok(source)
    }

    pub fn toggle_plan_item(&mut self, date: NaiveDate, item_id: Uuid) -> StoreResult<bool> {
        let found = self.snapshot.ai_plans.toggle_item(date, item_id);
        self.persist_if(found)
    }

    pub fn edit_plan_item(&mut self, date: NaiveDate, item_id: Uuid, patch: PlanItemPatch) -> StoreResult<bool> {
        let found = self.snapshot.ai_plans.edit_item(date, item_id, patch);
        self.persist_if(found)
    }

    pub fn remove_plan_item(&mut self, date: NaiveDate, item_id: Uuid) -> StoreResult<bool> {
        let found = self.snapshot.ai_plans.remove_item(date, item_id);
        self.persist_if(found)
    }

    //-------------------------------------------------------------------------------------
    // Write path
    //-------------------------------------------------------------------------------------

    fn persist_local(&self) -> StoreResult<()> {
        self.local.save(&self.snapshot).inspect_err(|e| {
            warn!(error = %e, "Failed to persist snapshot locally");
        })?;
        Ok(())
    }

    fn persist_if(&self, changed: bool) -> StoreResult<bool> {
        if changed {
            self.persist_local()?;
        }
        Ok(changed)
    }

    /// Local write, then a sync for the signed-in user.
    fn commit(&self) -> StoreResult<()> {
        self.persist_local()?;
        if let Some(user) = &self.snapshot.user {
            self.outbox.enqueue(SyncRecord {
                user_id: user.user_id,
                record: ProfileRecord::from_snapshot(&self.snapshot, self.clock.now()),
            });
        }
        Ok(())
    }
}
