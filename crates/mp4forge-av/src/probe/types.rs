//! Media information types.

use serde::{Deserialize, Serialize};

/// Codec and container metadata for one file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaInfo {
    /// Streams in the order the probe tool reported them.
    pub streams: Vec<StreamInfo>,
    /// Container description.
    pub format: FormatInfo,
}

/// One elementary stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamInfo {
    /// Stream index within the container.
    pub index: u32,
    /// Short codec name (e.g. "h264", "aac").
    pub codec_name: String,
    /// Descriptive codec name.
    pub codec_long_name: String,
    /// Stream kind.
    pub kind: StreamKind,
}

/// Stream type classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamKind {
    Audio,
    Video,
    Other,
}

/// Container information.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatInfo {
    pub filename: String,
    /// Short container name (e.g. "mov,mp4,m4a,3gp,3g2,mj2").
    pub format_name: String,
    pub format_long_name: String,
}

impl MediaInfo {
    /// Codec of the first stream of the given kind.
    ///
    /// Later streams of the same kind are ignored. Returns `None` when no
    /// such stream exists or its codec name is empty.
    pub fn first_codec(&self, kind: StreamKind) -> Option<&str> {
        self.streams
            .iter()
            .find(|s| s.kind == kind)
            .map(|s| s.codec_name.as_str())
            .filter(|name| !name.is_empty())
    }

    /// Codec of the first audio stream.
    pub fn audio_codec(&self) -> Option<&str> {
        self.first_codec(StreamKind::Audio)
    }

    /// Codec of the first video stream.
    pub fn video_codec(&self) -> Option<&str> {
        self.first_codec(StreamKind::Video)
    }
}

impl std::fmt::Display for StreamKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StreamKind::Audio => write!(f, "audio"),
            StreamKind::Video => write!(f, "video"),
            StreamKind::Other => write!(f, "other"),
        }
    }
}
