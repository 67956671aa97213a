//! Chronological merge engine for camera subsystem text logs.
//!
//! This crate contains:
//! - Line filtering and timestamp precision normalization
//! - Session discovery: grouping offline log files by session and thread
//! - Merge strategies: in-memory sort and streaming k-way merge
//! - The directory-level merge, including the second pass over other logs

pub mod discovery;
mod engine;
mod error;
pub mod filter;
pub mod lines;
pub mod merge;
pub mod normalize;
pub mod progress;

pub use discovery::{Discovery, LogFile, NumericId, Session, discover};
pub use engine::{MergeOptions, MergeSummary, Merger, merge, temp_path};
pub use error::MergeError;
pub use merge::{SizePolicy, StrategyKind};
pub use normalize::Normalizer;
pub use progress::{NoProgress, ProgressEvent, ProgressSink};
