//! ffmpeg-backed [`Encoder`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;

use super::{EncodeParams, Encoder, VIDEO_ENCODER};
use crate::command::ToolCommand;
use crate::Result;

/// Default encode timeout: 24 hours, to handle very large files.
const DEFAULT_ENCODE_TIMEOUT: Duration = Duration::from_secs(86400);

/// An encoder backed by the `ffmpeg` CLI.
#[derive(Debug, Clone)]
pub struct FfmpegEncoder {
    /// Path to the ffmpeg binary.
    ffmpeg_path: PathBuf,
    timeout: Duration,
}

impl FfmpegEncoder {
    /// Create a new encoder using the given ffmpeg path.
    pub fn new(ffmpeg_path: PathBuf) -> Self {
        Self {
            ffmpeg_path,
            timeout: DEFAULT_ENCODE_TIMEOUT,
        }
    }

    /// Override the maximum time a single encode may run.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Build the ffmpeg argument list for one transcode.
///
/// `-y` lets a retry overwrite a temporary file left by an earlier failure.
pub fn build_args(input: &Path, output: &Path, params: &EncodeParams) -> Vec<String> {
    let mut args: Vec<String> = vec!["-y".into(), "-i".into()];
    args.push(input.to_string_lossy().into_owned());

    args.extend(
        [
            "-c:v",
            VIDEO_ENCODER,
            "-crf",
            params.video.crf.as_str(),
            "-preset",
            params.video.preset.as_str(),
        ]
        .map(String::from),
    );

    let channels = params.audio.channels.to_string();
    args.extend(
        [
            "-c:a",
            params.audio.codec.as_str(),
            "-b:a",
            params.audio.bitrate.as_str(),
            "-ac",
            channels.as_str(),
        ]
        .map(String::from),
    );

    args.push(output.to_string_lossy().into_owned());
    args
}

#[async_trait]
impl Encoder for FfmpegEncoder {
    fn name(&self) -> &'static str {
        "ffmpeg"
    }

    async fn encode(&self, input: &Path, output: &Path, params: &EncodeParams) -> Result<()> {
        tracing::debug!(
            "ffmpeg encode: {:?} -> {:?} (encoder={}, crf={}, preset={})",
            input,
            output,
            VIDEO_ENCODER,
            params.video.crf,
            params.video.preset,
        );

        let mut cmd = ToolCommand::new(self.ffmpeg_path.clone());
        cmd.timeout(self.timeout);
        cmd.args(build_args(input, output, params));
        cmd.execute().await?;

        Ok(())
    }
}
