pub mod db;
pub mod gemini;
pub mod media;
pub mod remote;
pub mod sst;
pub mod summary;
pub mod unavailable;
pub mod vision;

pub use db::DbAdapter;
pub use gemini::{gemini_client, GeminiTextAdapter};
pub use media::{MediaFetcher, VideoMedia};
pub use remote::RemoteAccount;
pub use sst::WhisperSstAdapter;
pub use summary::TranscriptSummaryAdapter;
pub use unavailable::UnavailableAi;
pub use vision::GeminiScheduleAdapter;
