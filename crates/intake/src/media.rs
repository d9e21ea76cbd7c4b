//! Media attachment pipeline.
//!
//! Turns a user-selected image into a size-bounded, self-describing payload
//! (`data:<mime>;base64,<body>`) that can travel inside the JSON submission.
//!
//! Flow per slot:
//!   1. `MediaPipeline::select` classifies the selection synchronously:
//!      cleared, rejected (over the ceiling, never read) or pending.
//!   2. A pending selection carries a per-slot token; `PendingRead::read`
//!      does the I/O and encoding without touching any session state.
//!   3. `MediaPipeline::accepts` compares the outcome's token with the
//!      slot's latest one. Older outcomes are dropped so a slow read can
//!      never overwrite a newer selection (last-write-wins).

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};
use thiserror::Error;
use tracing::debug;

/// 2 MiB.
pub const DEFAULT_MAX_MEDIA_BYTES: u64 = 2 * 1024 * 1024;

/// The six attachment fields of the participant track.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
pub enum MediaSlot {
    #[serde(rename = "headShot1")]
    #[strum(serialize = "headShot1")]
    HeadShot1,
    #[serde(rename = "headShot2")]
    #[strum(serialize = "headShot2")]
    HeadShot2,
    #[serde(rename = "bodyShot1")]
    #[strum(serialize = "bodyShot1")]
    BodyShot1,
    #[serde(rename = "bodyShot2")]
    #[strum(serialize = "bodyShot2")]
    BodyShot2,
    #[serde(rename = "additionalImage1")]
    #[strum(serialize = "additionalImage1")]
    AdditionalImage1,
    #[serde(rename = "additionalImage2")]
    #[strum(serialize = "additionalImage2")]
    AdditionalImage2,
}

impl MediaSlot {
    /// Field name of the slot in the store and on the wire.
    pub fn field(self) -> &'static str {
        self.into()
    }

    pub fn label(self) -> &'static str {
        match self {
            MediaSlot::HeadShot1 => "Head Shot 1",
            MediaSlot::HeadShot2 => "Head Shot 2",
            MediaSlot::BodyShot1 => "Body Shot 1",
            MediaSlot::BodyShot2 => "Body Shot 2",
            MediaSlot::AdditionalImage1 => "Additional Image 1",
            MediaSlot::AdditionalImage2 => "Additional Image 2",
        }
    }

    /// Slots that must be filled before submission.
    pub fn is_mandatory(self) -> bool {
        matches!(self, MediaSlot::HeadShot1 | MediaSlot::BodyShot1)
    }
}

#[derive(Error, Debug)]
pub enum MediaError {
    #[error("file is {size} bytes, limit is {limit} bytes")]
    TooLarge { size: u64, limit: u64 },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("malformed payload: {0}")]
    MalformedPayload(String),
}

/// Encoded image, `data:<mime>;base64,<body>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MediaPayload(String);

impl MediaPayload {
    const PREFIX: &'static str = "data:";
    const MARKER: &'static str = ";base64,";

    pub fn encode(mime: &str, bytes: &[u8]) -> Self {
        Self(format!(
            "{}{mime}{}{}",
            Self::PREFIX,
            Self::MARKER,
            STANDARD.encode(bytes)
        ))
    }

    /// Accept an already encoded payload (e.g. from a saved snapshot).
    pub fn parse(raw: &str) -> Result<Self, MediaError> {
        let payload = Self(raw.to_string());
        payload.decode()?;
        Ok(payload)
    }

    /// Like `parse`, but holds the payload to the same rules as a picked
    /// file: `image/*` only, decoded size at most `limit`.
    pub fn parse_image(raw: &str, limit: u64) -> Result<Self, MediaError> {
        let payload = Self(raw.to_string());
        let (mime, bytes) = payload.decode()?;
        if !mime.starts_with("image/") {
            return Err(MediaError::UnsupportedFormat(mime));
        }
        if bytes.len() as u64 > limit {
            return Err(MediaError::TooLarge {
                size: bytes.len() as u64,
                limit,
            });
        }
        Ok(payload)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn mime(&self) -> Option<&str> {
        self.split().map(|(mime, _)| mime)
    }

    /// Original MIME type and bytes.
    pub fn decode(&self) -> Result<(String, Vec<u8>), MediaError> {
        let (mime, body) = self
            .split()
            .ok_or_else(|| MediaError::MalformedPayload("expected data:<mime>;base64,<body>".into()))?;
        let bytes = STANDARD
            .decode(body)
            .map_err(|e| MediaError::MalformedPayload(e.to_string()))?;
        Ok((mime.to_string(), bytes))
    }

    fn split(&self) -> Option<(&str, &str)> {
        let rest = self.0.strip_prefix(Self::PREFIX)?;
        let (mime, body) = rest.split_once(Self::MARKER)?;
        if mime.is_empty() {
            return None;
        }
        Some((mime, body))
    }
}

/// A file the user picked. Size is known up front; contents are read lazily.
#[async_trait]
pub trait MediaSource: Send + Sync {
    fn name(&self) -> &str;
    fn size(&self) -> u64;
    async fn read(&self) -> std::io::Result<Vec<u8>>;
}

/// File on the local filesystem.
#[derive(Debug, Clone)]
pub struct LocalFile {
    path: PathBuf,
    name: String,
    size: u64,
}

impl LocalFile {
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, MediaError> {
        let path = path.as_ref().to_path_buf();
        let meta = tokio::fs::metadata(&path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self {
            path,
            name,
            size: meta.len(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl MediaSource for LocalFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn size(&self) -> u64 {
        self.size
    }

    async fn read(&self) -> std::io::Result<Vec<u8>> {
        tokio::fs::read(&self.path).await
    }
}

/// Bytes already in memory (drag & drop buffers, tests).
#[derive(Debug, Clone)]
pub struct InMemoryFile {
    name: String,
    bytes: Vec<u8>,
}

impl InMemoryFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }
}

#[async_trait]
impl MediaSource for InMemoryFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    async fn read(&self) -> std::io::Result<Vec<u8>> {
        Ok(self.bytes.clone())
    }
}

/// Result of a selection, decided without any I/O.
pub enum Selection {
    /// No file chosen; the slot is now absent.
    Cleared,
    /// Over the ceiling; the slot is now absent and the file was not read.
    Rejected { size: u64, limit: u64 },
    /// Read must be driven by the caller.
    Pending(PendingRead),
}

/// One in-flight read, tagged with the token it was issued under.
pub struct PendingRead {
    slot: MediaSlot,
    token: u64,
    limit: u64,
    source: Arc<dyn MediaSource>,
}

impl PendingRead {
    pub fn slot(&self) -> MediaSlot {
        self.slot
    }

    pub fn token(&self) -> u64 {
        self.token
    }

    /// Read and encode. Never touches session state.
    pub async fn read(self) -> ReadOutcome {
        let result = encode_source(self.source.as_ref(), self.limit).await;
        ReadOutcome {
            slot: self.slot,
            token: self.token,
            result,
        }
    }
}

/// Terminal outcome of a `PendingRead`.
#[derive(Debug)]
pub struct ReadOutcome {
    pub slot: MediaSlot,
    pub token: u64,
    pub result: Result<MediaPayload, MediaError>,
}

async fn encode_source(source: &dyn MediaSource, limit: u64) -> Result<MediaPayload, MediaError> {
    let mime = mime_guess::from_path(source.name())
        .first()
        .filter(|m| m.type_() == mime_guess::mime::IMAGE)
        .ok_or_else(|| MediaError::UnsupportedFormat(source.name().to_string()))?;

    let bytes = source.read().await?;
    // The advertised size may be stale by the time the read finishes.
    if bytes.len() as u64 > limit {
        return Err(MediaError::TooLarge {
            size: bytes.len() as u64,
            limit,
        });
    }
    Ok(MediaPayload::encode(mime.essence_str(), &bytes))
}

/// Per-slot request bookkeeping. Holds no payloads itself.
#[derive(Debug, Clone)]
pub struct MediaPipeline {
    max_bytes: u64,
    latest: HashMap<MediaSlot, u64>,
    next_token: u64,
}

impl MediaPipeline {
    pub fn new(max_bytes: u64) -> Self {
        Self {
            max_bytes,
            latest: HashMap::new(),
            next_token: 1,
        }
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    /// Register a new selection for `slot`. Every call supersedes whatever
    /// read was pending for that slot, including clears and rejections.
    pub fn select(&mut self, slot: MediaSlot, file: Option<Arc<dyn MediaSource>>) -> Selection {
        let token = self.issue(slot);
        let Some(source) = file else {
            return Selection::Cleared;
        };

        let size = source.size();
        if size > self.max_bytes {
            return Selection::Rejected {
                size,
                limit: self.max_bytes,
            };
        }

        Selection::Pending(PendingRead {
            slot,
            token,
            limit: self.max_bytes,
            source,
        })
    }

    /// Whether `outcome` belongs to the latest selection of its slot.
    pub fn accepts(&self, outcome: &ReadOutcome) -> bool {
        let current = self.latest.get(&outcome.slot).copied();
        if current != Some(outcome.token) {
            debug!(
                slot = %outcome.slot,
                token = outcome.token,
                latest = ?current,
                "discarding superseded media read"
            );
            return false;
        }
        true
    }

    /// Supersede every pending read (session reset).
    pub fn invalidate_all(&mut self) {
        let slots: Vec<_> = self.latest.keys().copied().collect();
        for slot in slots {
            self.issue(slot);
        }
    }

    fn issue(&mut self, slot: MediaSlot) -> u64 {
        let token = self.next_token;
        self.next_token += 1;
        self.latest.insert(slot, token);
        token
    }
}

impl Default for MediaPipeline {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_MEDIA_BYTES)
    }
}
