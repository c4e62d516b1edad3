//! # mp4forge-av
//!
//! External tool plumbing for mp4forge.
//!
//! This crate provides:
//!
//! - **Command execution** ([`ToolCommand`]) -- async builder with timeout
//!   support for running external processes.
//! - **Tool lookup** ([`tools::locate`]) -- resolve ffmpeg/ffprobe from
//!   configuration or `PATH`.
//! - **Probing** ([`Prober`], [`FfprobeProber`]) -- codec and container
//!   metadata as [`MediaInfo`].
//! - **Encoding** ([`Encoder`], [`FfmpegEncoder`]) -- H.264/AAC transcode
//!   driven by [`EncodeParams`].
//!
//! Both [`Prober`] and [`Encoder`] are traits so callers can substitute fakes
//! in tests.

pub mod command;
pub mod encode;
mod error;
pub mod probe;
pub mod tools;

// Re-exports
pub use command::{ToolCommand, ToolOutput};
pub use encode::{AudioParams, EncodeParams, Encoder, FfmpegEncoder, VideoParams};
pub use error::{Error, Result};
pub use probe::{FfprobeProber, FormatInfo, MediaInfo, Prober, StreamInfo, StreamKind};
