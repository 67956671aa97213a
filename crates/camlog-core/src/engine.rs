//! Directory-level merge.
//!
//! Session files are merged session by session into a `~`-prefixed
//! temporary file next to the output. If the directory also holds other log
//! files, a second pass merges that temporary file with the normalized other
//! files into the output and deletes the temporary file. Otherwise the
//! temporary file is renamed to the output.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::discovery::{Discovery, LogFile, Session, discover};
use crate::error::MergeError;
use crate::lines::{LineSource, LineStream, LineWriter};
use crate::merge::{DEFAULT_SIZE_THRESHOLD, SizePolicy, StrategyKind};
use crate::normalize::{CANONICAL_PRECISION, DEFAULT_DUPLICATE_PATTERN, Normalizer};
use crate::progress::{NoProgress, ProgressEvent, ProgressSink};

/// Tunables for a merge run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOptions {
    /// Sessions up to this many bytes are merged in memory.
    pub size_threshold: u64,
    /// Fractional-second digits other files are padded to.
    pub fractional_digits: usize,
    /// Regex for duplicate diagnostic lines dropped from other files.
    pub duplicate_pattern: String,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            size_threshold: DEFAULT_SIZE_THRESHOLD,
            fractional_digits: CANONICAL_PRECISION,
            duplicate_pattern: DEFAULT_DUPLICATE_PATTERN.to_string(),
        }
    }
}

/// Outcome of a successful merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeSummary {
    pub output: PathBuf,
    pub sessions: usize,
    pub session_files: usize,
    pub other_files: usize,
    pub lines_written: u64,
    pub elapsed: Duration,
}

/// Merges `input_dir` into `output` with default options and no progress output.
pub fn merge(input_dir: &Path, output: &Path) -> Result<MergeSummary, MergeError> {
    Merger::new(&MergeOptions::default())?.run(input_dir, output)
}

/// Returns the temporary path used by the first pass: `~` + the output's name,
/// in the output's directory.
pub fn temp_path(output: &Path) -> Result<PathBuf, MergeError> {
    let name = output
        .file_name()
        .ok_or_else(|| MergeError::InvalidOutputPath(output.to_path_buf()))?;
    let mut temp_name = OsString::from("~");
    temp_name.push(name);
    Ok(output.with_file_name(temp_name))
}

/// Whether a session's writes truncate or extend the pass-one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputMode {
    Create,
    Append,
}

/// One session's merge.
struct MergeTask<'s> {
    session: &'s Session,
    strategy: StrategyKind,
    mode: OutputMode,
}

impl MergeTask<'_> {
    fn run(&self, target: &Path, progress: &dyn ProgressSink) -> Result<u64, MergeError> {
        let streams = open_all(self.session.files())?;
        let mut out = match self.mode {
            OutputMode::Create => LineWriter::create(target)?,
            OutputMode::Append => LineWriter::append(target)?,
        };
        self.strategy.merge(streams, &mut out, progress)?;
        out.finish()
    }
}

/// Opens every file up front; already opened files close if one fails.
fn open_all<'a>(
    files: impl Iterator<Item = &'a LogFile>,
) -> Result<Vec<LineStream<'static>>, MergeError> {
    files
        .map(|file| -> Result<LineStream<'static>, MergeError> {
            let source = LineSource::open(&file.path)?;
            Ok(Box::new(source) as LineStream<'static>)
        })
        .collect()
}

/// Runs merges with fixed options and a progress sink.
pub struct Merger<'p> {
    policy: SizePolicy,
    normalizer: Normalizer,
    progress: &'p dyn ProgressSink,
}

impl Merger<'static> {
    pub fn new(options: &MergeOptions) -> Result<Self, MergeError> {
        Ok(Self {
            policy: SizePolicy::new(options.size_threshold),
            normalizer: Normalizer::new(options.fractional_digits, &options.duplicate_pattern)?,
            progress: &NoProgress,
        })
    }
}

impl Merger<'_> {
    #[must_use]
    pub fn with_progress<'q>(self, progress: &'q dyn ProgressSink) -> Merger<'q> {
        Merger {
            policy: self.policy,
            normalizer: self.normalizer,
            progress,
        }
    }

    /// Merges every log in `input_dir` into `output`.
    ///
    /// Fails before touching any file if the input directory is missing or
    /// `output` has no file name. A failure during a session merge aborts the
    /// run and leaves the partial first-pass file on disk.
    pub fn run(&self, input_dir: &Path, output: &Path) -> Result<MergeSummary, MergeError> {
        let started = Instant::now();
        let temp = temp_path(output)?;

        let mut discovery = discover(input_dir)?;
        discovery.exclude(output);
        discovery.exclude(&temp);
        self.report_discovery(&discovery);

        if discovery.is_empty() {
            tracing::warn!(dir = %input_dir.display(), "no log files to merge");
        }

        let mut lines_written = self.merge_sessions(&discovery.sessions, &temp)?;

        if discovery.others.is_empty() {
            fs::rename(&temp, output).map_err(|source| MergeError::Write {
                path: output.to_path_buf(),
                source,
            })?;
        } else {
            let pass_started = Instant::now();
            self.progress.emit(&ProgressEvent::MergingOthers {
                files: discovery.others.len(),
            });
            let result = self.merge_others(&temp, &discovery.others, output);
            self.remove_temp(&temp);
            lines_written = result?;

            let elapsed = pass_started.elapsed();
            tracing::info!(files = discovery.others.len(), ?elapsed, "merged other files");
            self.progress.emit(&ProgressEvent::OthersDone { elapsed });
        }

        let elapsed = started.elapsed();
        tracing::info!(output = %output.display(), lines = lines_written, ?elapsed, "merge complete");
        self.progress.emit(&ProgressEvent::Complete {
            output: output.to_path_buf(),
            elapsed,
        });

        Ok(MergeSummary {
            output: output.to_path_buf(),
            sessions: discovery.sessions.len(),
            session_files: discovery.session_file_count(),
            other_files: discovery.others.len(),
            lines_written,
            elapsed,
        })
    }

    fn report_discovery(&self, discovery: &Discovery) {
        for path in &discovery.skipped {
            self.progress
                .emit(&ProgressEvent::Skipped { path: path.clone() });
        }
        self.progress.emit(&ProgressEvent::Discovered {
            session_files: discovery.session_file_count(),
            sessions: discovery.sessions.len(),
            other_files: discovery.others.len(),
        });
    }

    /// First pass: sessions in ascending id order, concatenated into `target`.
    fn merge_sessions(&self, sessions: &[Session], target: &Path) -> Result<u64, MergeError> {
        if sessions.is_empty() {
            return LineWriter::create(target)?.finish();
        }

        let mut written = 0;
        for (idx, session) in sessions.iter().enumerate() {
            let started = Instant::now();
            let size = session.byte_size();
            let task = MergeTask {
                session,
                strategy: self.policy.select(size),
                mode: if idx == 0 {
                    OutputMode::Create
                } else {
                    OutputMode::Append
                },
            };

            tracing::info!(
                session = %session.id,
                files = session.file_count(),
                bytes = size,
                strategy = %task.strategy,
                "merging session"
            );
            self.progress.emit(&ProgressEvent::MergingSession {
                session: session.id.clone(),
                strategy: task.strategy,
            });

            written += task.run(target, self.progress).map_err(|e| {
                tracing::warn!(
                    session = %session.id,
                    partial = %target.display(),
                    error = %e,
                    "session merge failed, partial output left on disk"
                );
                MergeError::SessionFailed {
                    session: session.id.to_string(),
                    partial: target.to_path_buf(),
                    source: Box::new(e),
                }
            })?;

            self.progress.emit(&ProgressEvent::SessionDone {
                session: session.id.clone(),
                elapsed: started.elapsed(),
            });
        }
        Ok(written)
    }

    /// Second pass: the first-pass file plus normalized other files.
    fn merge_others(
        &self,
        merged: &Path,
        others: &[LogFile],
        output: &Path,
    ) -> Result<u64, MergeError> {
        let mut streams: Vec<LineStream<'_>> = Vec::with_capacity(others.len() + 1);
        streams.push(Box::new(LineSource::open(merged)?));
        for file in others {
            streams.push(Box::new(self.normalizer.lines(LineSource::open(&file.path)?)));
        }

        let mut out = LineWriter::create(output)?;
        StrategyKind::Streaming.merge(streams, &mut out, self.progress)?;
        out.finish()
    }

    fn remove_temp(&self, temp: &Path) {
        if let Err(e) = fs::remove_file(temp) {
            tracing::warn!(path = %temp.display(), error = %e, "failed to delete temporary merge file");
            self.progress.emit(&ProgressEvent::CleanupFailed {
                path: temp.to_path_buf(),
            });
        }
    }
}
