#![allow(dead_code)]

use async_trait::async_trait;
use chrono::NaiveDate;
use focuspoint_core::{
    ChatTurn, Clock, FixedClock, InMemorySnapshotStore, PersistenceError, PortError, PortResult,
    ProfileRecord, ProfileRepository, SessionService, Snapshot, SnapshotStore, Store, SyncOutbox,
    TextGenerationService, VideoSource, VideoSummary, VideoSummaryService,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

pub const PLAN_REPLY: &str = r#"```json
{"plan":[{"start":"15:00","end":"16:00","title":"Homework","type":"productivity","isRecommendation":true},],"analysis":"Light day"}
```"#;

pub fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Answers every prompt with the same reply and counts calls.
pub struct CountingGenerator {
    reply: PortResult<String>,
    calls: AtomicUsize,
}

impl CountingGenerator {
    pub fn replying(reply: &str) -> Self {
        Self { reply: Ok(reply.to_string()), calls: AtomicUsize::new(0) }
    }

    pub fn failing(error: PortError) -> Self {
        Self { reply: Err(error), calls: AtomicUsize::new(0) }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextGenerationService for CountingGenerator {
    async fn generate_text(&self, _prompt: &str, _history: &[ChatTurn]) -> PortResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.reply {
            Ok(text) => Ok(text.clone()),
            Err(PortError::RateLimited(m)) => Err(PortError::RateLimited(m.clone())),
            Err(PortError::Unavailable(m)) => Err(PortError::Unavailable(m.clone())),
            Err(e) => Err(PortError::Unexpected(e.to_string())),
        }
    }
}

/// A sign-out that always fails.
pub struct BrokenSession;

#[async_trait]
impl SessionService for BrokenSession {
    async fn sign_out(&self) -> PortResult<()> {
        Err(PortError::Unavailable("network down".into()))
    }
}

/// In-memory remote profile table.
#[derive(Default)]
pub struct FakeProfiles {
    pub rows: Mutex<HashMap<Uuid, ProfileRecord>>,
    pub fail: bool,
}

#[async_trait]
impl ProfileRepository for FakeProfiles {
    async fn load_profile(&self, user_id: Uuid) -> PortResult<Option<ProfileRecord>> {
        if self.fail {
            return Err(PortError::Unavailable("offline".into()));
        }
        Ok(self.rows.lock().unwrap().get(&user_id).cloned())
    }

    async fn upsert_profile(&self, user_id: Uuid, record: &ProfileRecord) -> PortResult<()> {
        if self.fail {
            return Err(PortError::Unavailable("offline".into()));
        }
        self.rows.lock().unwrap().insert(user_id, record.clone());
        Ok(())
    }
}

pub struct FakeSummarizer;

#[async_trait]
impl VideoSummaryService for FakeSummarizer {
    async fn summarize_video(&self, source: VideoSource) -> PortResult<VideoSummary> {
        match source {
            VideoSource::Url(url) => Ok(VideoSummary {
                summary: format!("# Notes\n\nFrom {url}"),
                title: "Photosynthesis".into(),
            }),
            VideoSource::Upload { .. } => Err(PortError::RateLimited("quota".into())),
        }
    }
}

/// Loads fine, refuses every write.
pub struct ReadOnlyDisk;

impl SnapshotStore for ReadOnlyDisk {
    fn load(&self) -> Result<Option<Snapshot>, PersistenceError> {
        Ok(None)
    }

    fn save(&self, _snapshot: &Snapshot) -> Result<(), PersistenceError> {
        Err(PersistenceError::Io(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "read-only",
        )))
    }
}

pub fn memory_store_on(date: NaiveDate) -> (Store, Arc<FixedClock>) {
    let clock = Arc::new(FixedClock::on(date));
    let store = Store::open(
        Box::new(InMemorySnapshotStore::default()),
        SyncOutbox::detached(),
        clock.clone() as Arc<dyn Clock>,
        None,
    )
    .unwrap();
    (store, clock)
}
