//! mp4forge - concurrent media conversion to H.264/AAC MP4
//!
//! This library crate exposes the conversion engine for the binary and for
//! integration testing.

pub mod config;
pub mod conversion;
pub mod discover;
pub mod pool;
pub mod shutdown;
pub mod watch;
