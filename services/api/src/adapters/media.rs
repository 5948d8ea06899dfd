//! services/api/src/adapters/media.rs
//!
//! Fetches published captions or the audio track of a video with `yt-dlp`,
//! plus the text helpers used on transcripts.

use async_trait::async_trait;
use focuspoint_core::ports::{PortError, PortResult};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::process::Output;
use std::sync::LazyLock;
use tokio::process::Command;
use tracing::{debug, info, warn};
use uuid::Uuid;

const AUDIO_FORMAT: &str = "bestaudio[abr<=96]/bestaudio";
/// Caption languages in order of preference.
const CAPTION_LANGS: [&str; 2] = ["ru", "en"];

static TIMECODE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[\d{2}:\d{2}\.\d{3}\s*-->\s*\d{2}:\d{2}\.\d{3}\]").expect("valid timecode regex")
});
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid tag regex"));
static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid ws regex"));
static VIDEO_ID_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?:v=|/)([0-9A-Za-z_-]{11})",
        r"(?:be/)([0-9A-Za-z_-]{11})",
        r"(?:embed/)([0-9A-Za-z_-]{11})",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid video id regex"))
    .collect()
});

/// Removes `[mm:ss.mmm --> mm:ss.mmm]` timecodes and collapses whitespace.
pub fn clean_transcript(text: &str) -> String {
    let text = text.replace('\u{a0}', " ");
    let text = TIMECODE_RE.replace_all(&text, "");
    WHITESPACE_RE.replace_all(&text, " ").trim().to_string()
}

/// Spoken text of a WebVTT caption file. Headers, cue timings and inline
/// tags are dropped, and the rolling repeats of auto-generated captions
/// collapse into one line.
pub fn vtt_to_text(vtt: &str) -> String {
    let mut lines: Vec<String> = Vec::new();
    for line in vtt.lines().map(str::trim) {
        if line.is_empty()
            || line.starts_with("WEBVTT")
            || line.starts_with("Kind:")
            || line.starts_with("Language:")
            || line.starts_with("NOTE")
            || line.contains("-->")
            || line.chars().all(|c| c.is_ascii_digit())
        {
            continue;
        }
        let text = TAG_RE
            .replace_all(line, "")
            .replace("&nbsp;", " ")
            .replace("&lt;", "<")
            .replace("&gt;", ">")
            .replace("&amp;", "&");
        let text = text.trim();
        if text.is_empty() || lines.last().is_some_and(|prev| prev == text) {
            continue;
        }
        lines.push(text.to_string());
    }
    clean_transcript(&lines.join(" "))
}

/// Russian captions first, then English, then anything else yt-dlp wrote.
fn pick_caption(files: &[PathBuf]) -> Option<&PathBuf> {
    files.iter().min_by_key(|path| {
        let name = path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
        CAPTION_LANGS
            .iter()
            .position(|lang| name.ends_with(&format!(".{lang}.vtt")))
            .unwrap_or(CAPTION_LANGS.len())
    })
}

/// The 11-character YouTube video id, if the URL carries one.
pub fn extract_video_id(url: &str) -> Option<String> {
    VIDEO_ID_PATTERNS
        .iter()
        .find_map(|re| re.captures(url))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// An audio file fetched from the web. The bytes are read into memory and the
/// file on disk is removed.
#[derive(Debug)]
pub struct DownloadedAudio {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Where a linked video's words come from.
#[async_trait]
pub trait VideoMedia: Send + Sync {
    /// Published captions as plain text, or `None` when the video has none.
    async fn fetch_captions(&self, url: &str) -> PortResult<Option<String>>;

    async fn download_audio(&self, url: &str) -> PortResult<DownloadedAudio>;
}

#[derive(Clone, Debug)]
pub struct MediaFetcher {
    ytdlp_path: PathBuf,
    media_dir: PathBuf,
}

impl MediaFetcher {
    pub fn new(ytdlp_path: PathBuf, media_dir: PathBuf) -> Self {
        Self { ytdlp_path, media_dir }
    }

    fn output_template(&self, file_id: Uuid) -> PathBuf {
        self.media_dir.join(format!("{file_id}.%(ext)s"))
    }

    /// Runs yt-dlp for one URL, writing into the media dir under `file_id`.
    async fn run_ytdlp(&self, args: &[&str], file_id: Uuid, url: &str) -> PortResult<Output> {
        Command::new(&self.ytdlp_path)
            .args(args)
            .arg("--no-playlist")
            .arg("--no-warnings")
            .arg("-o")
            .arg(self.output_template(file_id))
            .arg(url)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => {
                    PortError::Unavailable(format!("{} is not installed", self.ytdlp_path.display()))
                }
                _ => PortError::Unexpected(format!("Failed to start yt-dlp: {e}")),
            })
    }

    /// Caption files yt-dlp wrote for `file_id`, sorted by name.
    async fn caption_files(&self, file_id: Uuid) -> PortResult<Vec<PathBuf>> {
        let prefix = format!("{file_id}.");
        let mut entries = tokio::fs::read_dir(&self.media_dir).await.map_err(|e| {
            PortError::Unexpected(format!("Failed to list {}: {e}", self.media_dir.display()))
        })?;
        let mut files = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| PortError::Unexpected(format!("Failed to list media: {e}")))?
        {
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with(&prefix) && name.ends_with(".vtt") {
                files.push(entry.path());
            }
        }
        files.sort();
        Ok(files)
    }
}

#[async_trait]
impl VideoMedia for MediaFetcher {
    async fn fetch_captions(&self, url: &str) -> PortResult<Option<String>> {
        let file_id = Uuid::new_v4();
        debug!(url, %file_id, "Looking for published captions");

        let langs = CAPTION_LANGS.join(",");
        let output = self
            .run_ytdlp(
                &[
                    "--skip-download",
                    "--write-subs",
                    "--write-auto-subs",
                    "--sub-langs",
                    langs.as_str(),
                    "--sub-format",
                    "vtt",
                ],
                file_id,
                url,
            )
            .await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!(status = %output.status, stderr = %stderr.trim(), "yt-dlp could not fetch captions");
        }

        let files = self.caption_files(file_id).await?;
        let text = match pick_caption(&files) {
            Some(path) => match tokio::fs::read_to_string(path).await {
                Ok(raw) => Some(vtt_to_text(&raw)),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Failed to read captions");
                    None
                }
            },
            None => None,
        };
        for path in &files {
            remove_quietly(path).await;
        }
        Ok(text.filter(|t| !t.is_empty()))
    }

    async fn download_audio(&self, url: &str) -> PortResult<DownloadedAudio> {
        let file_id = Uuid::new_v4();
        info!(url, %file_id, "Downloading audio");

        let output = self
            .run_ytdlp(
                &["-f", AUDIO_FORMAT, "--print", "after_move:filepath"],
                file_id,
                url,
            )
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(PortError::Unexpected(format!(
                "yt-dlp exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let path = stdout
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .last()
            .map(PathBuf::from)
            .ok_or_else(|| PortError::Unexpected("yt-dlp did not report a file".to_string()))?;

        let bytes = read_and_remove(&path).await?;

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| format!("{file_id}.m4a"));
        debug!(file_name = %file_name, size = bytes.len(), "Audio downloaded");
        Ok(DownloadedAudio { file_name, bytes })
    }
}

/// Reads a downloaded file into memory. The file is removed whether or not
/// the read succeeds.
async fn read_and_remove(path: &Path) -> PortResult<Vec<u8>> {
    let read = tokio::fs::read(path).await;
    remove_quietly(path).await;
    read.map_err(|e| PortError::Unexpected(format!("Failed to read {}: {e}", path.display())))
}

async fn remove_quietly(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        warn!(path = %path.display(), error = %e, "Failed to remove downloaded media");
    }
}
