use mp4forge_av::{AudioParams, EncodeParams, VideoParams};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Process-wide settings. Built once at startup, then shared read-only
/// behind an `Arc` by every worker and the watcher.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PoolConfig {
    /// Number of concurrent conversion workers.
    #[serde(default = "default_workers")]
    pub workers: usize,

    #[serde(default)]
    pub video: VideoConfig,

    #[serde(default)]
    pub audio: AudioConfig,

    /// Remove (or move) the source once its output is safely in place.
    #[serde(default)]
    pub delete_original: bool,

    /// Descend into subdirectories below each input directory.
    #[serde(default)]
    pub recursive: bool,

    /// Where outputs go. `None` puts each output next to its source.
    #[serde(default)]
    pub output_dir: Option<PathBuf>,

    #[serde(default)]
    pub tools: ToolsConfig,
}

fn default_workers() -> usize {
    4
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            video: VideoConfig::default(),
            audio: AudioConfig::default(),
            delete_original: false,
            recursive: false,
            output_dir: None,
            tools: ToolsConfig::default(),
        }
    }
}

impl PoolConfig {
    /// Output directory override, if any. An empty path counts as unset.
    pub fn output_dir(&self) -> Option<&Path> {
        self.output_dir
            .as_deref()
            .filter(|dir| !dir.as_os_str().is_empty())
    }

    /// Encoder parameters derived from the video and audio sections.
    pub fn encode_params(&self) -> EncodeParams {
        EncodeParams {
            video: VideoParams {
                crf: self.video.crf.clone(),
                preset: self.video.preset.clone(),
            },
            audio: AudioParams {
                codec: self.audio.codec.clone(),
                bitrate: self.audio.bitrate.clone(),
                channels: self.audio.channels,
            },
        }
    }
}

/// H.264 encoding knobs. The codec itself is not configurable.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VideoConfig {
    /// x264 CRF (lower = higher quality, default: "19")
    #[serde(default = "default_crf")]
    pub crf: String,

    /// x264 preset (default: "medium")
    #[serde(default = "default_preset")]
    pub preset: String,
}

fn default_crf() -> String {
    "19".to_string()
}

fn default_preset() -> String {
    "medium".to_string()
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            crf: default_crf(),
            preset: default_preset(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AudioConfig {
    /// ffmpeg AAC encoder to use (default: "aac"). Compliance is judged on
    /// the AAC family, whichever encoder produced it.
    #[serde(default = "default_audio_codec")]
    pub codec: String,

    /// Audio bitrate (default: "192k")
    #[serde(default = "default_audio_bitrate")]
    pub bitrate: String,

    /// Output channels (default: 2)
    #[serde(default = "default_audio_channels")]
    pub channels: u32,
}

fn default_audio_codec() -> String {
    "aac".to_string()
}

fn default_audio_bitrate() -> String {
    "192k".to_string()
}

fn default_audio_channels() -> u32 {
    2
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            codec: default_audio_codec(),
            bitrate: default_audio_bitrate(),
            channels: default_audio_channels(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ToolsConfig {
    #[serde(default)]
    pub ffmpeg_path: Option<PathBuf>,

    #[serde(default)]
    pub ffprobe_path: Option<PathBuf>,

    /// Upper bound on a single encode, in seconds.
    #[serde(default)]
    pub encode_timeout_secs: Option<u64>,
}

impl ToolsConfig {
    pub fn encode_timeout(&self) -> Option<Duration> {
        self.encode_timeout_secs.map(Duration::from_secs)
    }
}
