//! Shared fakes for integration tests.
//!
//! [`FakeProber`] answers from a table keyed by file name, and
//! [`FakeEncoder`] writes a marker naming its input instead of spawning
//! ffmpeg while recording every call it receives.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::Mutex;

use mp4forge::config::PoolConfig;
use mp4forge::conversion::Converter;
use mp4forge_av::{EncodeParams, Encoder, FormatInfo, MediaInfo, Prober, StreamInfo, StreamKind};

/// Bytes the fake encoder writes when encoding the file named `source`.
pub fn encoded(source: &str) -> Vec<u8> {
    format!("encoded {source}").into_bytes()
}

/// Hidden files left in `dir` (in-progress or abandoned encodes).
pub fn hidden_files(dir: &Path) -> Vec<PathBuf> {
    let mut found: Vec<PathBuf> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().path())
        .filter(|p| p.file_name().unwrap().to_string_lossy().starts_with('.'))
        .collect();
    found.sort();
    found
}

/// Media info with one video and one audio stream.
pub fn media(audio: &str, video: &str) -> MediaInfo {
    let stream = |index, codec: &str, kind| StreamInfo {
        index,
        codec_name: codec.to_string(),
        codec_long_name: String::new(),
        kind,
    };
    MediaInfo {
        streams: vec![
            stream(0, video, StreamKind::Video),
            stream(1, audio, StreamKind::Audio),
        ],
        format: FormatInfo::default(),
    }
}

/// Prober answering from a table keyed by file name. Unknown names fail.
#[derive(Default)]
pub struct FakeProber {
    answers: Mutex<HashMap<String, MediaInfo>>,
}

impl FakeProber {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, file_name: &str, info: MediaInfo) -> Self {
        self.answers.lock().insert(file_name.to_string(), info);
        self
    }
}

#[async_trait]
impl Prober for FakeProber {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn probe(&self, path: &Path) -> mp4forge_av::Result<MediaInfo> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.answers
            .lock()
            .get(&name)
            .cloned()
            .ok_or_else(|| mp4forge_av::Error::tool_failed("fake", format!("no answer for {name}")))
    }
}

/// One recorded encode call.
#[derive(Debug, Clone)]
pub struct EncodeCall {
    pub input: PathBuf,
    pub output: PathBuf,
    pub started: Instant,
    pub finished: Instant,
}

/// Encoder that writes [`encoded`] for its input to the output path.
#[derive(Default)]
pub struct FakeEncoder {
    calls: Mutex<Vec<EncodeCall>>,
    fail: bool,
    delay: Option<Duration>,
}

impl FakeEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write a partial output, then report failure.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<EncodeCall> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl Encoder for FakeEncoder {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn encode(
        &self,
        input: &Path,
        output: &Path,
        _params: &EncodeParams,
    ) -> mp4forge_av::Result<()> {
        let started = Instant::now();

        let name = input
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let result = if self.fail {
            tokio::fs::write(output, b"partial").await?;
            Err(mp4forge_av::Error::tool_failed("fake", "exit status: 1"))
        } else {
            // Written before the delay so a concurrent job sharing this
            // path would be visible.
            tokio::fs::write(output, encoded(&name)).await?;
            Ok(())
        };

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        self.calls.lock().push(EncodeCall {
            input: input.to_path_buf(),
            output: output.to_path_buf(),
            started,
            finished: Instant::now(),
        });
        result
    }
}

/// Build a converter over the given fakes.
pub fn converter(
    config: PoolConfig,
    prober: FakeProber,
    encoder: Arc<FakeEncoder>,
) -> Arc<Converter> {
    Arc::new(Converter::new(Arc::new(config), Arc::new(prober), encoder))
}
