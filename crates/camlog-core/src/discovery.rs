//! Session discovery: classifies the log files of a capture directory.
//!
//! Offline camera logs are named
//! `Camx_OfflineLog*Tid<thread>_Session<session>_Segment<segment>*.txt` and
//! are grouped by session and thread. Other `.txt`/`.log` files are merged in
//! a second pass; anything else is skipped.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::error::MergeError;

/// Extension required for session files.
pub const SESSION_EXTENSION: &str = "txt";

/// Extensions accepted for any log file.
pub const ACCEPTED_EXTENSIONS: &[&str] = &["txt", "log"];

static SESSION_FILE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Camx_OfflineLog.*Tid([0-9]+)_Session([0-9]+)_Segment([0-9]+)").unwrap()
});

/// A run of decimal digits taken from a file name.
///
/// Ordered by numeric value, so session "10" sorts after session "2".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct NumericId(String);

impl NumericId {
    pub fn new(digits: impl Into<String>) -> Self {
        Self(digits.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn significant(&self) -> &str {
        self.0.trim_start_matches('0')
    }
}

impl Ord for NumericId {
    fn cmp(&self, other: &Self) -> Ordering {
        let (a, b) = (self.significant(), other.significant());
        a.len()
            .cmp(&b.len())
            .then_with(|| a.cmp(b))
            .then_with(|| self.0.cmp(&other.0))
    }
}

impl PartialOrd for NumericId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for NumericId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A discovered log file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogFile {
    pub path: PathBuf,
    pub byte_size: u64,
    /// Set for session files only.
    pub session_id: Option<NumericId>,
    pub thread_id: Option<NumericId>,
    /// Recorded for reporting; merge order does not depend on it.
    pub segment_id: Option<NumericId>,
}

impl LogFile {
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// One capture run: its files grouped by thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    pub id: NumericId,
    pub threads: BTreeMap<NumericId, Vec<LogFile>>,
}

impl Session {
    /// All files of the session, thread by thread.
    pub fn files(&self) -> impl Iterator<Item = &LogFile> {
        self.threads.values().flatten()
    }

    pub fn file_count(&self) -> usize {
        self.threads.values().map(Vec::len).sum()
    }

    /// Total size of every file in the session.
    pub fn byte_size(&self) -> u64 {
        self.files().map(|f| f.byte_size).sum()
    }
}

/// Result of scanning an input directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Discovery {
    /// Sessions in ascending numeric order of id.
    pub sessions: Vec<Session>,
    /// Log files whose names do not match the session pattern.
    pub others: Vec<LogFile>,
    /// Files with an unrecognized extension.
    pub skipped: Vec<PathBuf>,
}

impl Discovery {
    pub fn session_file_count(&self) -> usize {
        self.sessions.iter().map(Session::file_count).sum()
    }

    /// True if there is nothing to merge.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty() && self.others.is_empty()
    }

    /// Removes `path` from the discovered files.
    ///
    /// Used to keep a previous merge output living in the input directory out
    /// of the next merge. Returns true if something was removed.
    pub fn exclude(&mut self, path: &Path) -> bool {
        let Ok(target) = fs::canonicalize(path) else {
            return false;
        };
        let keep = |file: &LogFile| !fs::canonicalize(&file.path).is_ok_and(|p| p == target);

        let before = self.session_file_count() + self.others.len();
        self.others.retain(keep);
        for session in &mut self.sessions {
            for files in session.threads.values_mut() {
                files.retain(keep);
            }
            session.threads.retain(|_, files| !files.is_empty());
        }
        self.sessions.retain(|s| !s.threads.is_empty());

        let removed = before != self.session_file_count() + self.others.len();
        if removed {
            tracing::debug!(path = %path.display(), "excluded file from merge");
        }
        removed
    }
}

/// Splits a session file name into `(thread, session, segment)`.
fn parse_session_name(name: &str) -> Option<(NumericId, NumericId, NumericId)> {
    let caps = SESSION_FILE_RE.captures(name)?;
    Some((
        NumericId::new(&caps[1]),
        NumericId::new(&caps[2]),
        NumericId::new(&caps[3]),
    ))
}

/// Scans `dir` and classifies every file in it.
///
/// Files are visited in file-name order, which is also the order of each
/// thread's file list. Sub-directories are ignored.
pub fn discover(dir: &Path) -> Result<Discovery, MergeError> {
    if !dir.is_dir() {
        return Err(MergeError::InvalidInputDirectory(dir.to_path_buf()));
    }

    let mut paths = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() {
            paths.push(path);
        }
    }
    paths.sort();

    let mut sessions: BTreeMap<NumericId, BTreeMap<NumericId, Vec<LogFile>>> = BTreeMap::new();
    let mut discovery = Discovery::default();

    for path in paths {
        let extension = path.extension().and_then(|e| e.to_str());
        if !extension.is_some_and(|e| ACCEPTED_EXTENSIONS.contains(&e)) {
            tracing::warn!(path = %path.display(), "skipping file with unrecognized extension");
            discovery.skipped.push(path);
            continue;
        }

        let ids = if extension == Some(SESSION_EXTENSION) {
            path.file_name()
                .and_then(|n| n.to_str())
                .and_then(parse_session_name)
        } else {
            None
        };
        let byte_size = fs::metadata(&path)?.len();

        match ids {
            Some((thread_id, session_id, segment_id)) => {
                tracing::debug!(
                    path = %path.display(),
                    session = %session_id,
                    thread = %thread_id,
                    segment = %segment_id,
                    "found session file"
                );
                sessions
                    .entry(session_id.clone())
                    .or_default()
                    .entry(thread_id.clone())
                    .or_default()
                    .push(LogFile {
                        path,
                        byte_size,
                        session_id: Some(session_id),
                        thread_id: Some(thread_id),
                        segment_id: Some(segment_id),
                    });
            }
            None => {
                tracing::debug!(path = %path.display(), "found other log file");
                discovery.others.push(LogFile {
                    path,
                    byte_size,
                    session_id: None,
                    thread_id: None,
                    segment_id: None,
                });
            }
        }
    }

    discovery.sessions = sessions
        .into_iter()
        .map(|(id, threads)| Session { id, threads })
        .collect();

    tracing::info!(
        sessions = discovery.sessions.len(),
        session_files = discovery.session_file_count(),
        others = discovery.others.len(),
        skipped = discovery.skipped.len(),
        "discovered log files"
    );
    Ok(discovery)
}
