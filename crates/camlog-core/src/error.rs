//! Error type for the merge engine.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MergeError {
    #[error("invalid input directory: {}", .0.display())]
    InvalidInputDirectory(PathBuf),
    #[error("invalid output path: {}", .0.display())]
    InvalidOutputPath(PathBuf),
    #[error("invalid duplicate pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
    #[error(
        "failed to merge session {session} (partial output left in {}): {source}",
        partial.display()
    )]
    SessionFailed {
        session: String,
        partial: PathBuf,
        source: Box<MergeError>,
    },
    #[error("failed to read {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to write {}: {source}", path.display())]
    Write { path: PathBuf, source: io::Error },
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}
