//! Transcoding to the canonical H.264/AAC target.
//!
//! The [`Encoder`] trait is the seam between conversion logic and the encode
//! tool. [`FfmpegEncoder`] is the production implementation.

mod ffmpeg;

pub use ffmpeg::{build_args, FfmpegEncoder};

use async_trait::async_trait;
use std::path::Path;

use crate::Result;

/// Video codec family every output is encoded to, as ffprobe names it.
pub const TARGET_VIDEO_CODEC: &str = "h264";

/// ffmpeg encoder producing [`TARGET_VIDEO_CODEC`].
pub const VIDEO_ENCODER: &str = "libx264";

/// Audio codec family every output carries, as ffprobe names it. Any
/// configured AAC encoder (`aac`, `libfdk_aac`) produces this.
pub const TARGET_AUDIO_CODEC: &str = "aac";

/// Video encoding knobs. The codec family itself is fixed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoParams {
    /// Constant rate factor (lower = higher quality).
    pub crf: String,
    /// x264 speed preset (e.g. "medium", "slow").
    pub preset: String,
}

/// Audio target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioParams {
    /// ffmpeg audio encoder (e.g. "aac", "libfdk_aac").
    pub codec: String,
    /// Bitrate in ffmpeg notation (e.g. "192k").
    pub bitrate: String,
    /// Output channel count.
    pub channels: u32,
}

/// Full set of encoding parameters for one transcode.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EncodeParams {
    pub video: VideoParams,
    pub audio: AudioParams,
}

impl Default for VideoParams {
    fn default() -> Self {
        Self {
            crf: "19".to_string(),
            preset: "medium".to_string(),
        }
    }
}

impl Default for AudioParams {
    fn default() -> Self {
        Self {
            codec: "aac".to_string(),
            bitrate: "192k".to_string(),
            channels: 2,
        }
    }
}

/// A transcoder that writes `input` re-encoded to `output`.
#[async_trait]
pub trait Encoder: Send + Sync {
    /// Human-readable name identifying this encoder implementation.
    fn name(&self) -> &'static str;

    /// Encode `input` into `output`. Success is judged by the tool's exit
    /// status alone.
    async fn encode(&self, input: &Path, output: &Path, params: &EncodeParams) -> Result<()>;
}
