//! Line-oriented reading and writing of log files.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::MergeError;

/// Buffer size for `BufReader`/`BufWriter` (64KB for large capture files)
const BUFFER_SIZE: usize = 64 * 1024;

/// A boxed stream of lines feeding a merge.
pub type LineStream<'a> = Box<dyn Iterator<Item = Result<String, MergeError>> + 'a>;

/// Reads one file line by line.
///
/// Bytes that are not valid UTF-8 are replaced instead of failing the read,
/// so corrupted capture artifacts still merge. Every line keeps its original
/// terminator; a final line without one gets `\n` so it cannot run into the
/// next merged line.
pub struct LineSource<R = BufReader<File>> {
    path: PathBuf,
    reader: R,
    buf: Vec<u8>,
}

impl LineSource {
    /// Opens `path` for reading.
    pub fn open(path: &Path) -> Result<Self, MergeError> {
        let file = File::open(path).map_err(|source| MergeError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "opened log file");
        Ok(Self::new(path, BufReader::with_capacity(BUFFER_SIZE, file)))
    }
}

impl<R: BufRead> LineSource<R> {
    pub fn new(path: impl Into<PathBuf>, reader: R) -> Self {
        Self {
            path: path.into(),
            reader,
            buf: Vec::new(),
        }
    }

    fn read_line(&mut self) -> Result<Option<String>, MergeError> {
        self.buf.clear();
        let read = self
            .reader
            .read_until(b'\n', &mut self.buf)
            .map_err(|source| MergeError::Read {
                path: self.path.clone(),
                source,
            })?;
        if read == 0 {
            return Ok(None);
        }
        if self.buf.last() != Some(&b'\n') {
            self.buf.push(b'\n');
        }
        Ok(Some(String::from_utf8_lossy(&self.buf).into_owned()))
    }
}

impl<R: BufRead> Iterator for LineSource<R> {
    type Item = Result<String, MergeError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_line().transpose()
    }
}

/// Buffered writer for merged output that counts the lines it writes.
pub struct LineWriter<W: Write = BufWriter<File>> {
    path: PathBuf,
    writer: W,
    written: u64,
}

impl LineWriter {
    /// Creates (or truncates) `path`.
    pub fn create(path: &Path) -> Result<Self, MergeError> {
        Self::open_with(path, OpenOptions::new().write(true).create(true).truncate(true))
    }

    /// Opens `path` for appending, creating it if needed.
    pub fn append(path: &Path) -> Result<Self, MergeError> {
        Self::open_with(path, OpenOptions::new().append(true).create(true))
    }

    fn open_with(path: &Path, options: &OpenOptions) -> Result<Self, MergeError> {
        let file = options.open(path).map_err(|source| MergeError::Write {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::new(path, BufWriter::with_capacity(BUFFER_SIZE, file)))
    }
}

impl<W: Write> LineWriter<W> {
    pub fn new(path: impl Into<PathBuf>, writer: W) -> Self {
        Self {
            path: path.into(),
            writer,
            written: 0,
        }
    }

    /// Number of lines written so far.
    pub const fn written(&self) -> u64 {
        self.written
    }

    pub fn write_line(&mut self, line: &str) -> Result<(), MergeError> {
        self.writer
            .write_all(line.as_bytes())
            .map_err(|source| MergeError::Write {
                path: self.path.clone(),
                source,
            })?;
        self.written += 1;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    /// Flushes buffered output and returns the number of lines written.
    pub fn finish(mut self) -> Result<u64, MergeError> {
        self.writer.flush().map_err(|source| MergeError::Write {
            path: self.path.clone(),
            source,
        })?;
        Ok(self.written)
    }
}
