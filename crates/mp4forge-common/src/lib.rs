//! mp4forge-common: path rules and identifiers shared across mp4forge.
//!
//! - **Path rules**: which files the watcher picks up, the canonical output
//!   container, and how output and temporary paths are derived from a source.
//! - **Typed IDs**: [`JobId`] for correlating log lines of a single job.
//!
//! # Examples
//!
//! ```
//! use mp4forge_common::paths::{is_media_candidate, output_path};
//! use std::path::Path;
//!
//! assert!(is_media_candidate(Path::new("/incoming/movie.mkv")));
//! assert!(!is_media_candidate(Path::new("/incoming/.movie.mkv")));
//!
//! let out = output_path(Path::new("/incoming/movie.mkv"), None).unwrap();
//! assert_eq!(out, Path::new("/incoming/movie.mp4"));
//! ```

pub mod ids;
pub mod paths;

pub use ids::JobId;
