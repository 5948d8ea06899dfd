//! crates/focuspoint_core/src/lib.rs
//!
//! Domain model, offline-first client store and the ports the hosting service
//! implements.

pub mod clock;
pub mod domain;
pub mod error;
pub mod outbox;
pub mod persistence;
pub mod plan;
pub mod ports;
pub mod review;
pub mod schedule;
pub mod store;
pub mod streak;
pub mod time;

pub use clock::{Clock, FixedClock, SystemClock};
pub use domain::{
    AiPlan, AuthSession, ChatRole, ChatTurn, EventKind, NewScheduleEvent, NewTask, Note, NoteKind,
    PlanItem, PlanItemKind, PlanItemPatch, ProfileRecord, RecognizedLesson, RoutineActivity,
    ScheduleEvent, ScheduleEventPatch, SettingsPatch, Snapshot, SpacedRepetition, Task, TaskKind,
    UiFlags, User, UserCredentials, UserSettings, VideoSource, VideoSummary,
};
pub use error::{AiError, PersistenceError, StoreError, StoreResult};
pub use outbox::{SyncOutbox, SyncRecord, SyncWorker};
pub use persistence::{InMemorySnapshotStore, JsonFileSnapshotStore, SnapshotStore};
pub use plan::{PlanCache, PlanSource};
pub use ports::{
    AccountRepository, PortError, PortResult, ProfileRepository, ScheduleRecognitionService,
    SessionService, SpeechToTextService, TextGenerationService, VideoSummaryService,
    VideoTranscriptService,
};
pub use store::Store;
pub use time::ClockTime;
