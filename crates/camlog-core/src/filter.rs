//! Admission rule for lines reaching the merged output.

use crate::error::MergeError;

/// Returns true if the line starts with an ASCII digit.
///
/// Timestamped lines always do. Headers, blank lines and continuation lines
/// of stack traces do not, and never reach the output.
pub fn is_timestamped(line: &str) -> bool {
    line.as_bytes().first().is_some_and(u8::is_ascii_digit)
}

/// Keeps only timestamped lines; read errors pass through.
pub fn timestamped<I>(lines: I) -> impl Iterator<Item = Result<String, MergeError>>
where
    I: Iterator<Item = Result<String, MergeError>>,
{
    lines.filter(|line| match line {
        Ok(line) => is_timestamped(line),
        Err(_) => true,
    })
}
