//! Per-file conversion.
//!
//! Decides whether a file needs transcoding and carries out that decision:
//!
//! - Files already H.264/AAC in an `.mp4` container are moved or copied to
//!   their output name without re-encoding.
//! - Everything else is encoded to a hidden temporary file beside the source
//!   and renamed into place only after the encoder succeeds.
//!
//! The source is never removed before its replacement exists.

mod executor;
mod types;

pub use executor::Converter;
pub use types::{CompliantAction, ConversionOutcome, Job, OutcomeStatus};
