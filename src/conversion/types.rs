use mp4forge_common::JobId;
use std::path::PathBuf;

/// A single file awaiting conversion. Owned by exactly one worker once
/// dequeued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub id: JobId,
    pub path: PathBuf,
}

impl Job {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            id: JobId::new(),
            path: path.into(),
        }
    }
}

/// What the skip path did with a file that already matched the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompliantAction {
    /// Source renamed onto the output path (delete-original set).
    Relocated,
    /// Source copied to the output path.
    Copied,
    /// Source already is the output; nothing touched.
    Unchanged,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutcomeStatus {
    /// No encode needed.
    Compliant(CompliantAction),
    /// A new file was produced by the encoder.
    Transcoded,
    /// The job was abandoned.
    Failed(String),
}

/// Result of processing one [`Job`]. Only used for logging and counters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionOutcome {
    pub job_id: JobId,
    pub source: PathBuf,
    /// Final output path (the computed target, even on failure).
    pub output: PathBuf,
    pub status: OutcomeStatus,
}

impl ConversionOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self.status, OutcomeStatus::Failed(_))
    }
}

impl std::fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutcomeStatus::Compliant(CompliantAction::Relocated) => write!(f, "relocated"),
            OutcomeStatus::Compliant(CompliantAction::Copied) => write!(f, "copied"),
            OutcomeStatus::Compliant(CompliantAction::Unchanged) => write!(f, "unchanged"),
            OutcomeStatus::Transcoded => write!(f, "transcoded"),
            OutcomeStatus::Failed(reason) => write!(f, "failed: {}", reason),
        }
    }
}
