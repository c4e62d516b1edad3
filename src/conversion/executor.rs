//! Conversion decision and execution for a single job.

use anyhow::{Context, Result};
use mp4forge_av::encode::{TARGET_AUDIO_CODEC, TARGET_VIDEO_CODEC};
use mp4forge_av::{EncodeParams, Encoder, MediaInfo, Prober};
use mp4forge_common::paths::{has_canonical_extension, output_path, temp_path};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::types::{CompliantAction, ConversionOutcome, Job, OutcomeStatus};
use crate::config::PoolConfig;

/// Runs one job end to end: probe, decide, then skip or transcode.
///
/// Holds no per-job state; every path it touches is derived from the job it
/// is given, so a single instance is shared by all workers.
pub struct Converter {
    config: Arc<PoolConfig>,
    prober: Arc<dyn Prober>,
    encoder: Arc<dyn Encoder>,
    params: EncodeParams,
}

impl Converter {
    pub fn new(config: Arc<PoolConfig>, prober: Arc<dyn Prober>, encoder: Arc<dyn Encoder>) -> Self {
        let params = config.encode_params();
        Self {
            config,
            prober,
            encoder,
            params,
        }
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Process one job. Never fails: problems are reported in the outcome.
    pub async fn process(&self, job: &Job) -> ConversionOutcome {
        let Some(output) = output_path(&job.path, self.config.output_dir()) else {
            return ConversionOutcome {
                job_id: job.id,
                source: job.path.clone(),
                output: job.path.clone(),
                status: OutcomeStatus::Failed("source path has no file name".to_string()),
            };
        };

        let status = match self.convert(job, &output).await {
            Ok(status) => status,
            Err(e) => OutcomeStatus::Failed(format!("{e:#}")),
        };

        ConversionOutcome {
            job_id: job.id,
            source: job.path.clone(),
            output,
            status,
        }
    }

    /// Whether a file already matches the target and can skip the encoder.
    ///
    /// A missing audio or video stream counts as a mismatch.
    pub fn is_compliant(&self, source: &Path, info: &MediaInfo) -> bool {
        info.audio_codec() == Some(TARGET_AUDIO_CODEC)
            && info.video_codec() == Some(TARGET_VIDEO_CODEC)
            && has_canonical_extension(source)
    }

    async fn convert(&self, job: &Job, output: &Path) -> Result<OutcomeStatus> {
        let info = self
            .prober
            .probe(&job.path)
            .await
            .with_context(|| format!("failed to probe {:?}", job.path))?;

        debug!(
            job_id = %job.id,
            audio = ?info.audio_codec(),
            video = ?info.video_codec(),
            container = %info.format.format_name,
            "Probed {:?}",
            job.path
        );

        if self.is_compliant(&job.path, &info) {
            info!(job_id = %job.id, "Conversion unnecessary for {:?}", job.path);
            let action = self.keep_original(&job.path, output).await?;
            return Ok(OutcomeStatus::Compliant(action));
        }

        self.transcode(job, output).await?;
        Ok(OutcomeStatus::Transcoded)
    }

    /// Skip path: put the untouched source at the output name.
    async fn keep_original(&self, source: &Path, output: &Path) -> Result<CompliantAction> {
        // Copying a file onto itself would truncate it.
        if same_file(source, output).await {
            return Ok(CompliantAction::Unchanged);
        }

        if self.config.delete_original {
            tokio::fs::rename(source, output)
                .await
                .with_context(|| format!("failed to move {:?} to {:?}", source, output))?;
            Ok(CompliantAction::Relocated)
        } else {
            tokio::fs::copy(source, output)
                .await
                .with_context(|| format!("failed to copy {:?} to {:?}", source, output))?;
            Ok(CompliantAction::Copied)
        }
    }

    /// Transcode path: encode to a hidden sibling, then rename into place.
    ///
    /// On encoder failure the temporary file is left for inspection and the
    /// source is kept regardless of `delete_original`.
    async fn transcode(&self, job: &Job, output: &Path) -> Result<()> {
        let source = job.path.as_path();
        let tmp = temp_path(source, output, job.id).context("output path has no file name")?;
        // Must be checked before the rename, which may land on the source.
        let overwrites_source = same_file(source, output).await;

        info!(job_id = %job.id, "Converting {:?} to {:?}...", source, output);

        self.encoder
            .encode(source, &tmp, &self.params)
            .await
            .with_context(|| format!("unable to convert {:?} (partial output at {:?})", source, tmp))?;

        tokio::fs::rename(&tmp, output)
            .await
            .with_context(|| format!("failed to move {:?} to {:?}", tmp, output))?;

        info!(job_id = %job.id, "Finished converting {:?} to {:?}", source, output);

        if self.config.delete_original {
            if overwrites_source {
                debug!(job_id = %job.id, "Output replaced the source in place");
            } else {
                info!(job_id = %job.id, "Removing original {:?}", source);
                if let Err(e) = tokio::fs::remove_file(source).await {
                    warn!(job_id = %job.id, "Failed to remove original {:?}: {}", source, e);
                }
            }
        }

        Ok(())
    }
}

/// Path equality that also catches different spellings of one file.
async fn same_file(a: &Path, b: &Path) -> bool {
    if a == b {
        return true;
    }
    match (
        tokio::fs::canonicalize(a).await,
        tokio::fs::canonicalize(b).await,
    ) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
