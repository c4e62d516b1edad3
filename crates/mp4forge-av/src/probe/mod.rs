//! Media file probing.
//!
//! The [`Prober`] trait is the seam between conversion logic and the probe
//! tool. [`FfprobeProber`] is the production implementation.

mod ffprobe;
mod types;

pub use ffprobe::{parse_ffprobe_json, FfprobeProber};
pub use types::*;

use async_trait::async_trait;
use std::path::Path;

use crate::Result;

/// A media file prober capable of extracting codec metadata.
///
/// Implementations must be safe to share across worker tasks.
#[async_trait]
pub trait Prober: Send + Sync {
    /// Human-readable name identifying this prober implementation.
    fn name(&self) -> &'static str;

    /// Probe a media file at the given path.
    ///
    /// Each call produces a fresh [`MediaInfo`]; nothing is cached.
    async fn probe(&self, path: &Path) -> Result<MediaInfo>;
}
