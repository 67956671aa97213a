//! Timestamp precision reconciliation.
//!
//! Merging compares raw line text, which matches chronological order only
//! while every line carries the same number of fractional-second digits.
//! Offline captures write fewer digits than the canonical logs, so their
//! lines are right-padded with zeros before they enter a merge.
//!
//! Some subsystems also log the same diagnostic through two channels. Lines
//! matching the duplicate rule are dropped here instead of being padded.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::MergeError;
use crate::filter::is_timestamped;

/// Canonical number of fractional-second digits.
pub const CANONICAL_PRECISION: usize = 9;

/// Log tags the camera stack emits redundantly.
pub const DEFAULT_DUPLICATE_PATTERN: &str = r"(I|E|W) (CamX\s*:|CHIUSECASE\s*:)";

/// `MM-DD HH:MM:SS.` followed by the fractional digits (group 1).
static TIMESTAMP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9]{2}-[0-9]{2} [0-9]{2}:[0-9]{2}:[0-9]{2}\.([0-9]+)").unwrap()
});

static DEFAULT_DUPLICATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(DEFAULT_DUPLICATE_PATTERN).unwrap());

enum Verdict {
    Drop,
    Keep,
    Rewrite(String),
}

/// Pads short fractional timestamps and drops duplicate diagnostics.
#[derive(Debug, Clone)]
pub struct Normalizer {
    precision: usize,
    duplicate: Regex,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self {
            precision: CANONICAL_PRECISION,
            duplicate: DEFAULT_DUPLICATE_RE.clone(),
        }
    }
}

impl Normalizer {
    pub fn new(precision: usize, duplicate_pattern: &str) -> Result<Self, MergeError> {
        Ok(Self {
            precision,
            duplicate: Regex::new(duplicate_pattern)?,
        })
    }

    pub const fn precision(&self) -> usize {
        self.precision
    }

    /// Normalizes one line.
    ///
    /// Returns `None` if the line is dropped: it is not timestamped, or it
    /// matches the duplicate rule. The duplicate check runs before padding.
    /// A leading-digit line without a recognizable timestamp is kept as is.
    pub fn normalize<'a>(&self, line: &'a str) -> Option<Cow<'a, str>> {
        match self.classify(line) {
            Verdict::Drop => None,
            Verdict::Keep => Some(Cow::Borrowed(line)),
            Verdict::Rewrite(padded) => Some(Cow::Owned(padded)),
        }
    }

    /// Normalizes a stream of lines lazily.
    pub fn lines<I>(&self, lines: I) -> NormalizedLines<'_, I>
    where
        I: Iterator<Item = Result<String, MergeError>>,
    {
        NormalizedLines {
            normalizer: self,
            lines,
        }
    }

    fn classify(&self, line: &str) -> Verdict {
        if !is_timestamped(line) || self.duplicate.is_match(line) {
            return Verdict::Drop;
        }

        let Some(digits) = TIMESTAMP_RE.captures(line).and_then(|caps| caps.get(1)) else {
            return Verdict::Keep;
        };

        let missing = self.precision.saturating_sub(digits.len());
        if missing == 0 {
            return Verdict::Keep;
        }

        let (head, tail) = line.split_at(digits.end());
        let mut padded = String::with_capacity(line.len() + missing);
        padded.push_str(head);
        padded.push_str(&"0".repeat(missing));
        padded.push_str(tail);
        Verdict::Rewrite(padded)
    }
}

/// Iterator returned by [`Normalizer::lines`].
pub struct NormalizedLines<'n, I> {
    normalizer: &'n Normalizer,
    lines: I,
}

impl<I> Iterator for NormalizedLines<'_, I>
where
    I: Iterator<Item = Result<String, MergeError>>,
{
    type Item = Result<String, MergeError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => return Some(Err(e)),
            };
            match self.normalizer.classify(&line) {
                Verdict::Drop => {}
                Verdict::Keep => return Some(Ok(line)),
                Verdict::Rewrite(padded) => return Some(Ok(padded)),
            }
        }
    }
}
