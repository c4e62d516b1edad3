//! Path rules for media files.
//!
//! Everything here is pure string/path manipulation: no filesystem access.
//! Extension comparisons are case-sensitive, so `movie.MKV` is not a
//! candidate.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::JobId;

/// Container extensions the watcher accepts.
const MEDIA_EXTENSIONS: &[&str] = &["mp4", "avi", "mkv"];

/// Extension every processed file ends up with.
pub const CANONICAL_EXTENSION: &str = "mp4";

/// Prefix marking hidden files (and our in-progress temporary outputs).
const HIDDEN_PREFIX: char = '.';

/// Check whether a path names a media file the watcher should enqueue.
///
/// True iff the base name is not hidden and its extension is one of the
/// accepted containers.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use mp4forge_common::paths::is_media_candidate;
///
/// assert!(is_media_candidate(Path::new("show.avi")));
/// assert!(!is_media_candidate(Path::new("notes.txt")));
/// assert!(!is_media_candidate(Path::new(".show.mp4")));
/// ```
pub fn is_media_candidate(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    if name.starts_with(HIDDEN_PREFIX) {
        return false;
    }

    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| MEDIA_EXTENSIONS.contains(&ext))
        .unwrap_or(false)
}

/// Check whether a path already carries the canonical output extension.
pub fn has_canonical_extension(path: &Path) -> bool {
    path.extension().and_then(|ext| ext.to_str()) == Some(CANONICAL_EXTENSION)
}

/// Compute the final output path for a source file.
///
/// The source extension is replaced with [`CANONICAL_EXTENSION`]. The file
/// lands next to the source unless `output_dir` is given, in which case only
/// the base name is kept. Returns `None` if the source has no file name.
pub fn output_path(source: &Path, output_dir: Option<&Path>) -> Option<PathBuf> {
    let stem = source.file_stem()?;
    let mut file_name = OsString::from(stem);
    file_name.push(".");
    file_name.push(CANONICAL_EXTENSION);

    let dir = match output_dir {
        Some(dir) => dir,
        None => source.parent().unwrap_or_else(|| Path::new("")),
    };
    Some(dir.join(file_name))
}

/// Compute the hidden temporary path an encode writes to before it is
/// renamed onto `output`.
///
/// The name is `.<output stem>.<job id>.mp4`: two sources that map to the
/// same output (`a.avi`, `a.mkv`) still get separate temporary files. It
/// always lives in the source's directory so the final rename stays on one
/// filesystem.
pub fn temp_path(source: &Path, output: &Path, job_id: JobId) -> Option<PathBuf> {
    let stem = output.file_stem()?;
    let mut hidden = OsString::from(HIDDEN_PREFIX.to_string());
    hidden.push(stem);
    hidden.push(format!(".{job_id}.{CANONICAL_EXTENSION}"));

    let dir = source.parent().unwrap_or_else(|| Path::new(""));
    Some(dir.join(hidden))
}
