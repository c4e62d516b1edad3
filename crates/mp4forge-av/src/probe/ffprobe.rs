//! FFprobe-based [`Prober`] implementation.
//!
//! Shells out to `ffprobe -v quiet -print_format json -show_format -show_streams`
//! and maps the JSON output into [`MediaInfo`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use super::types::{FormatInfo, MediaInfo, StreamInfo, StreamKind};
use super::Prober;
use crate::command::ToolCommand;
use crate::{Error, Result};

/// Probing a file should take seconds; anything longer is a stuck tool.
const PROBE_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    streams: Vec<FfprobeStream>,
    #[serde(default)]
    format: Option<FfprobeFormat>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    #[serde(default)]
    index: u32,
    codec_name: Option<String>,
    codec_long_name: Option<String>,
    codec_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    #[serde(default)]
    filename: String,
    #[serde(default)]
    format_name: String,
    #[serde(default)]
    format_long_name: String,
}

/// A prober backed by the `ffprobe` CLI.
#[derive(Debug, Clone)]
pub struct FfprobeProber {
    /// Path to the ffprobe binary.
    ffprobe_path: PathBuf,
}

impl FfprobeProber {
    /// Create a new prober using the given ffprobe path.
    pub fn new(ffprobe_path: PathBuf) -> Self {
        Self { ffprobe_path }
    }
}

#[async_trait]
impl Prober for FfprobeProber {
    fn name(&self) -> &'static str {
        "ffprobe"
    }

    async fn probe(&self, path: &Path) -> Result<MediaInfo> {
        let mut cmd = ToolCommand::new(self.ffprobe_path.clone());
        cmd.timeout(PROBE_TIMEOUT);
        cmd.args([
            "-v",
            "quiet",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
        ]);
        cmd.arg(path.to_string_lossy().as_ref());

        let output = cmd.execute().await?;
        parse_ffprobe_json(&output.stdout)
    }
}

/// Parse ffprobe's JSON output into [`MediaInfo`].
///
/// Streams keep ffprobe's ordering. Unknown `codec_type` values (subtitle,
/// data, attachment) map to [`StreamKind::Other`].
pub fn parse_ffprobe_json(json: &str) -> Result<MediaInfo> {
    if json.trim().is_empty() {
        return Err(Error::parse_error("ffprobe", "empty output"));
    }

    let output: FfprobeOutput = serde_json::from_str(json)?;

    let streams = output
        .streams
        .into_iter()
        .map(|s| StreamInfo {
            index: s.index,
            codec_name: s.codec_name.unwrap_or_default(),
            codec_long_name: s.codec_long_name.unwrap_or_default(),
            kind: match s.codec_type.as_deref() {
                Some("audio") => StreamKind::Audio,
                Some("video") => StreamKind::Video,
                _ => StreamKind::Other,
            },
        })
        .collect();

    let format = output
        .format
        .map(|f| FormatInfo {
            filename: f.filename,
            format_name: f.format_name,
            format_long_name: f.format_long_name,
        })
        .unwrap_or_default();

    Ok(MediaInfo { streams, format })
}
