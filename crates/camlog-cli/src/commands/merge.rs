//! Merge command: combines a capture directory into one chronological log.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};

use camlog_core::{MergeSummary, Merger, ProgressEvent};

use crate::Config;

/// Runs the merge command.
///
/// Progress goes to stderr unless `quiet`; the summary line goes to `writer`.
pub fn run<W: Write>(
    writer: &mut W,
    input: &Path,
    output: Option<&Path>,
    config: &Config,
    quiet: bool,
) -> Result<MergeSummary> {
    let output = output.map_or_else(|| config.default_output(input), Path::to_path_buf);
    let merger = Merger::new(&config.merge_options()).context("invalid merge configuration")?;

    let print = |event: &ProgressEvent| eprintln!("{event}");
    let result = if quiet {
        merger.run(input, &output)
    } else {
        merger.with_progress(&print).run(input, &output)
    };
    let summary = result.with_context(|| format!("failed to merge logs in {}", input.display()))?;

    writeln!(
        writer,
        "Merged {} lines ({} session files, {} other files) into {} in {:.3}s",
        summary.lines_written,
        summary.session_files,
        summary.other_files,
        summary.output.display(),
        summary.elapsed.as_secs_f64()
    )?;

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::fs;

    use tempfile::TempDir;

    #[test]
    fn merge_writes_default_output_and_summary() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path();
        fs::write(
            dir.join("Camx_OfflineLog_Tid1_Session1_Segment0.txt"),
            "01-01 00:00:01.000000000 a\n",
        )
        .unwrap();
        fs::write(dir.join("other.log"), "01-01 00:00:00.5 b\n").unwrap();

        let mut out = Vec::new();
        let summary = run(&mut out, dir, None, &Config::default(), true).unwrap();

        assert_eq!(summary.output, dir.join("out.txt"));
        assert_eq!(
            fs::read_to_string(dir.join("out.txt")).unwrap(),
            "01-01 00:00:00.500000000 b\n01-01 00:00:01.000000000 a\n"
        );
        let printed = String::from_utf8(out).unwrap();
        assert!(printed.starts_with("Merged 2 lines (1 session files, 1 other files) into "));
    }

    #[test]
    fn merge_uses_configured_precision() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path();
        fs::write(dir.join("a.log"), "01-01 00:00:00.5 b\n").unwrap();
        let output = temp.path().join("merged.txt");
        let config = Config {
            fractional_digits: 3,
            ..Config::default()
        };

        run(&mut Vec::new(), dir, Some(&output), &config, true).unwrap();

        assert_eq!(fs::read_to_string(&output).unwrap(), "01-01 00:00:00.500 b\n");
    }

    #[test]
    fn merge_reports_missing_directory() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("missing");

        let err = run(&mut Vec::new(), &missing, None, &Config::default(), true).unwrap_err();

        assert!(err.to_string().contains("failed to merge logs in"));
        assert!(format!("{err:#}").contains("invalid input directory"));
    }

    #[test]
    fn merge_rejects_bad_duplicate_pattern() {
        let temp = TempDir::new().unwrap();
        let config = Config {
            duplicate_pattern: "[".to_string(),
            ..Config::default()
        };

        let err = run(&mut Vec::new(), temp.path(), None, &config, true).unwrap_err();

        assert!(err.to_string().contains("invalid merge configuration"));
    }
}
