//! Merge strategies for the files of one session.
//!
//! Two strategies produce the same output from the same inputs:
//!
//! - [`InMemoryMerge`] reads every line, sorts, and writes. Simple and fast,
//!   but holds the whole session in memory.
//! - [`StreamingMerge`] treats each input as already sorted and performs a
//!   k-way merge through a min-heap, holding one line per input.
//!
//! [`SizePolicy`] picks between them by total session size. Both compare
//! whole raw lines, which is chronological order as long as every line
//! shares the same timestamp precision.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::fmt;
use std::io::Write;

use serde::Serialize;

use crate::error::MergeError;
use crate::filter::timestamped;
use crate::lines::{LineStream, LineWriter};
use crate::progress::{ProgressEvent, ProgressSink};

/// Sessions at or below this many bytes are merged in memory.
pub const DEFAULT_SIZE_THRESHOLD: u64 = 2 * 1_000_000_000;

/// Merges line streams into one ordered output.
///
/// Only timestamped lines are written. Streams are dropped, and their files
/// closed, before `merge` returns.
pub trait MergeStrategy {
    fn merge<W: Write>(
        &self,
        streams: Vec<LineStream<'_>>,
        out: &mut LineWriter<W>,
        progress: &dyn ProgressSink,
    ) -> Result<u64, MergeError>;
}

/// Loads every line, sorts, writes.
#[derive(Debug, Clone, Copy, Default)]
pub struct InMemoryMerge;

impl MergeStrategy for InMemoryMerge {
    fn merge<W: Write>(
        &self,
        streams: Vec<LineStream<'_>>,
        out: &mut LineWriter<W>,
        progress: &dyn ProgressSink,
    ) -> Result<u64, MergeError> {
        let before = out.written();
        let total = streams.len();
        let mut lines = Vec::new();
        for (idx, stream) in streams.into_iter().enumerate() {
            progress.emit(&ProgressEvent::ReadingFile {
                index: idx + 1,
                total,
            });
            for line in timestamped(stream) {
                lines.push(line?);
            }
        }

        lines.sort();
        tracing::debug!(lines = lines.len(), "sorted session in memory");

        for line in &lines {
            out.write_line(line)?;
        }
        Ok(out.written() - before)
    }
}

/// Next unread line of one stream.
///
/// Ordered by line, then by stream index, so equal lines come out in input
/// order.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
struct Head {
    line: String,
    stream: usize,
}

/// k-way merge of individually sorted streams.
#[derive(Debug, Clone, Copy, Default)]
pub struct StreamingMerge;

impl MergeStrategy for StreamingMerge {
    fn merge<W: Write>(
        &self,
        streams: Vec<LineStream<'_>>,
        out: &mut LineWriter<W>,
        _progress: &dyn ProgressSink,
    ) -> Result<u64, MergeError> {
        let mut streams: Vec<_> = streams.into_iter().map(timestamped).collect();
        let mut heap = BinaryHeap::with_capacity(streams.len());

        for (stream, lines) in streams.iter_mut().enumerate() {
            if let Some(line) = lines.next().transpose()? {
                heap.push(Reverse(Head { line, stream }));
            }
        }

        let before = out.written();
        while let Some(Reverse(head)) = heap.pop() {
            out.write_line(&head.line)?;

            if let Some(line) = streams[head.stream].next().transpose()? {
                heap.push(Reverse(Head {
                    line,
                    stream: head.stream,
                }));
            }
        }
        Ok(out.written() - before)
    }
}

/// Which strategy a session is merged with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    InMemory,
    Streaming,
}

impl StrategyKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::InMemory => "in_memory",
            Self::Streaming => "streaming",
        }
    }

    /// Runs the selected strategy.
    pub fn merge<W: Write>(
        self,
        streams: Vec<LineStream<'_>>,
        out: &mut LineWriter<W>,
        progress: &dyn ProgressSink,
    ) -> Result<u64, MergeError> {
        match self {
            Self::InMemory => InMemoryMerge.merge(streams, out, progress),
            Self::Streaming => StreamingMerge.merge(streams, out, progress),
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Chooses a strategy from the total byte size of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizePolicy {
    pub threshold: u64,
}

impl Default for SizePolicy {
    fn default() -> Self {
        Self::new(DEFAULT_SIZE_THRESHOLD)
    }
}

impl SizePolicy {
    pub const fn new(threshold: u64) -> Self {
        Self { threshold }
    }

    pub const fn select(&self, session_size: u64) -> StrategyKind {
        if session_size <= self.threshold {
            StrategyKind::InMemory
        } else {
            StrategyKind::Streaming
        }
    }
}
