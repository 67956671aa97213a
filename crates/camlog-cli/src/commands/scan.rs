//! Scan command: shows how a capture directory would be merged.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;

use camlog_core::{Discovery, LogFile, SizePolicy, StrategyKind, discover, temp_path};

use crate::Config;

/// Discovery results for display.
#[derive(Debug, Serialize)]
pub struct ScanReport {
    pub directory: PathBuf,
    pub sessions: Vec<SessionEntry>,
    pub others: Vec<FileEntry>,
    pub skipped: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct SessionEntry {
    pub session_id: String,
    pub byte_size: u64,
    pub strategy: StrategyKind,
    pub threads: Vec<ThreadEntry>,
}

#[derive(Debug, Serialize)]
pub struct ThreadEntry {
    pub thread_id: String,
    pub files: Vec<FileEntry>,
}

#[derive(Debug, Serialize)]
pub struct FileEntry {
    pub name: String,
    pub byte_size: u64,
}

impl From<&LogFile> for FileEntry {
    fn from(file: &LogFile) -> Self {
        Self {
            name: file.file_name(),
            byte_size: file.byte_size,
        }
    }
}

impl ScanReport {
    pub fn new(directory: &Path, discovery: &Discovery, policy: SizePolicy) -> Self {
        let sessions = discovery
            .sessions
            .iter()
            .map(|session| {
                let byte_size = session.byte_size();
                SessionEntry {
                    session_id: session.id.to_string(),
                    byte_size,
                    strategy: policy.select(byte_size),
                    threads: session
                        .threads
                        .iter()
                        .map(|(thread_id, files)| ThreadEntry {
                            thread_id: thread_id.to_string(),
                            files: files.iter().map(FileEntry::from).collect(),
                        })
                        .collect(),
                }
            })
            .collect();

        Self {
            directory: directory.to_path_buf(),
            sessions,
            others: discovery.others.iter().map(FileEntry::from).collect(),
            skipped: discovery
                .skipped
                .iter()
                .map(|p| {
                    p.file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_default()
                })
                .collect(),
        }
    }
}

/// Runs the scan command.
pub fn run<W: Write>(writer: &mut W, input: &Path, config: &Config, json: bool) -> Result<()> {
    let mut discovery =
        discover(input).with_context(|| format!("failed to scan {}", input.display()))?;

    // Leave out what a default merge into this directory would skip.
    let output = config.default_output(input);
    discovery.exclude(&temp_path(&output)?);
    discovery.exclude(&output);
    let report = ScanReport::new(input, &discovery, SizePolicy::new(config.size_threshold));

    if json {
        serde_json::to_writer_pretty(&mut *writer, &report).context("failed to serialize report")?;
        writeln!(writer)?;
    } else {
        write_text(writer, &report)?;
    }
    Ok(())
}

fn write_text<W: Write>(writer: &mut W, report: &ScanReport) -> Result<()> {
    writeln!(writer, "Directory: {}", report.directory.display())?;

    writeln!(writer, "Sessions: {}", report.sessions.len())?;
    for session in &report.sessions {
        writeln!(
            writer,
            "- session {} ({} bytes, {} merge)",
            session.session_id, session.byte_size, session.strategy
        )?;
        for thread in &session.threads {
            writeln!(writer, "  - thread {}", thread.thread_id)?;
            for file in &thread.files {
                writeln!(writer, "    - {} ({} bytes)", file.name, file.byte_size)?;
            }
        }
    }

    writeln!(writer, "Other files: {}", report.others.len())?;
    for file in &report.others {
        writeln!(writer, "- {} ({} bytes)", file.name, file.byte_size)?;
    }

    if !report.skipped.is_empty() {
        writeln!(writer, "Skipped: {}", report.skipped.len())?;
        for name in &report.skipped {
            writeln!(writer, "- {name}")?;
        }
    }

    Ok(())
}
