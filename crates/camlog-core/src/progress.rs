//! Human-readable progress reporting.
//!
//! The engine reports what it is doing through a [`ProgressSink`] supplied by
//! the caller (a console, a GUI log pane). [`NoProgress`] discards everything.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::discovery::NumericId;
use crate::merge::StrategyKind;

/// Something the merge engine is doing or has done.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    Discovered {
        session_files: usize,
        sessions: usize,
        other_files: usize,
    },
    Skipped {
        path: PathBuf,
    },
    ReadingFile {
        index: usize,
        total: usize,
    },
    MergingSession {
        session: NumericId,
        strategy: StrategyKind,
    },
    SessionDone {
        session: NumericId,
        elapsed: Duration,
    },
    MergingOthers {
        files: usize,
    },
    OthersDone {
        elapsed: Duration,
    },
    CleanupFailed {
        path: PathBuf,
    },
    Complete {
        output: PathBuf,
        elapsed: Duration,
    },
}

impl fmt::Display for ProgressEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Discovered {
                session_files,
                sessions,
                other_files,
            } => {
                write!(f, "Found {session_files} files from {sessions} sessions")?;
                if *other_files > 0 {
                    write!(f, ", plus {other_files} other logs to be merged")?;
                }
                Ok(())
            }
            Self::Skipped { path } => write!(
                f,
                "Skipping {} because it has an invalid file type (needs .txt or .log)",
                path.display()
            ),
            Self::ReadingFile { index, total } => {
                write!(f, "Reading log {index}/{total} of current session")
            }
            Self::MergingSession { session, strategy } => {
                write!(f, "Merging session {session} with {strategy} merge")
            }
            Self::SessionDone { session, elapsed } => write!(
                f,
                "Session {session} done ({:.2}s)",
                elapsed.as_secs_f64()
            ),
            Self::MergingOthers { files } => write!(f, "Merging {files} other files"),
            Self::OthersDone { elapsed } => {
                write!(f, "Other files done ({:.2}s)", elapsed.as_secs_f64())
            }
            Self::CleanupFailed { path } => write!(f, "Unable to delete {}", path.display()),
            Self::Complete { output, elapsed } => write!(
                f,
                "Output: {} Complete ({:.3}s)",
                output.display(),
                elapsed.as_secs_f64()
            ),
        }
    }
}

/// Receives progress events from the merge engine.
pub trait ProgressSink {
    fn emit(&self, event: &ProgressEvent);
}

/// Sink that ignores every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn emit(&self, _event: &ProgressEvent) {}
}

impl<F> ProgressSink for F
where
    F: Fn(&ProgressEvent),
{
    fn emit(&self, event: &ProgressEvent) {
        self(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::cell::RefCell;

    #[test]
    fn discovered_mentions_other_files_only_when_present() {
        let without = ProgressEvent::Discovered {
            session_files: 4,
            sessions: 2,
            other_files: 0,
        };
        assert_eq!(without.to_string(), "Found 4 files from 2 sessions");

        let with = ProgressEvent::Discovered {
            session_files: 4,
            sessions: 2,
            other_files: 1,
        };
        assert_eq!(
            with.to_string(),
            "Found 4 files from 2 sessions, plus 1 other logs to be merged"
        );
    }

    #[test]
    fn session_messages_name_the_strategy_and_timing() {
        let merging = ProgressEvent::MergingSession {
            session: NumericId::new("3"),
            strategy: StrategyKind::Streaming,
        };
        assert_eq!(merging.to_string(), "Merging session 3 with streaming merge");

        let done = ProgressEvent::SessionDone {
            session: NumericId::new("3"),
            elapsed: Duration::from_millis(1250),
        };
        assert_eq!(done.to_string(), "Session 3 done (1.25s)");

        let complete = ProgressEvent::Complete {
            output: PathBuf::from("out.txt"),
            elapsed: Duration::from_millis(42),
        };
        assert_eq!(complete.to_string(), "Output: out.txt Complete (0.042s)");
    }

    #[test]
    fn closures_are_sinks() {
        let seen = RefCell::new(Vec::new());
        let sink = |event: &ProgressEvent| seen.borrow_mut().push(event.to_string());

        sink.emit(&ProgressEvent::MergingOthers { files: 2 });
        NoProgress.emit(&ProgressEvent::MergingOthers { files: 3 });

        assert_eq!(seen.into_inner(), vec!["Merging 2 other files"]);
    }
}
