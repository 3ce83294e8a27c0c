use crate::util::{
    create_with_backoff, open_with_backoff, remove_with_backoff, replace_file_atomic_backoff,
};
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Terminator written after each line of the final output.
#[cfg(windows)]
pub const LINE_ENDING: &[u8] = b"\r\n";
#[cfg(not(windows))]
pub const LINE_ENDING: &[u8] = b"\n";

/// Byte-oriented line reader. Lines are opaque: no UTF-8 validation, no trimming
/// beyond the terminator itself.
pub struct LineReader<R> {
    rdr: R,
}

impl LineReader<BufReader<File>> {
    pub fn open(path: &Path, buf_bytes: usize) -> io::Result<Self> {
        let f = open_with_backoff(path, 16, 50)?;
        Ok(Self::new(BufReader::with_capacity(buf_bytes.max(8 * 1024), f)))
    }
}

impl<R: BufRead> LineReader<R> {
    pub fn new(rdr: R) -> Self {
        Self { rdr }
    }

    /// Read the next line into `buf`. Returns the number of bytes consumed from the
    /// underlying reader (0 on EOF). Strips a trailing `\n` and one `\r` before it;
    /// an unterminated final line is returned as-is.
    pub fn read_line(&mut self, buf: &mut Vec<u8>) -> io::Result<usize> {
        buf.clear();
        let n = self.rdr.read_until(b'\n', buf)?;
        if n == 0 {
            return Ok(0);
        }
        if buf.last() == Some(&b'\n') {
            buf.pop();
            if buf.last() == Some(&b'\r') {
                buf.pop();
            }
        }
        Ok(n)
    }

    /// Like `read_line`, but strips only the `\n`. Used for partition files,
    /// where any `\r` left before the `\n` belongs to the line itself.
    pub fn read_raw_line(&mut self, buf: &mut Vec<u8>) -> io::Result<usize> {
        buf.clear();
        let n = self.rdr.read_until(b'\n', buf)?;
        if buf.last() == Some(&b'\n') {
            buf.pop();
        }
        Ok(n)
    }
}

/// Buffered line writer that appends `terminator` after each line.
pub struct LineWriter<W: Write> {
    w: BufWriter<W>,
    terminator: &'static [u8],
}

impl<W: Write> LineWriter<W> {
    pub fn new(inner: W, buf_bytes: usize, terminator: &'static [u8]) -> Self {
        Self { w: BufWriter::with_capacity(buf_bytes.max(8 * 1024), inner), terminator }
    }

    #[inline]
    pub fn write_line(&mut self, line: &[u8]) -> io::Result<()> {
        self.w.write_all(line)?;
        self.w.write_all(self.terminator)
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.w.flush()
    }

    /// Flush buffered bytes and hand back the inner writer.
    pub fn finish(self) -> io::Result<W> {
        self.w.into_inner().map_err(|e| e.into_error())
    }
}

/// Output file written under a temporary name and promoted over the final path
/// only once everything has been flushed.
pub struct AtomicOutput {
    tmp_path: PathBuf,
    final_path: PathBuf,
}

impl AtomicOutput {
    /// Create `<final>.inprogress` next to `final_path`.
    pub fn create(final_path: &Path, buf_bytes: usize) -> Result<(Self, LineWriter<File>)> {
        let mut name = final_path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "out".into());
        name.push(".inprogress");
        let tmp_path = final_path.with_file_name(name);
        let f = create_with_backoff(&tmp_path, 16, 50)
            .with_context(|| format!("create {}", tmp_path.display()))?;
        let out = Self { tmp_path, final_path: final_path.to_path_buf() };
        Ok((out, LineWriter::new(f, buf_bytes, LINE_ENDING)))
    }

    pub fn tmp_path(&self) -> &Path {
        &self.tmp_path
    }

    /// Flush `writer`, sync it, and replace the final path with the temp file.
    pub fn commit(self, writer: LineWriter<File>) -> Result<PathBuf> {
        let f = writer
            .finish()
            .with_context(|| format!("flush {}", self.tmp_path.display()))?;
        f.sync_all().with_context(|| format!("sync {}", self.tmp_path.display()))?;
        drop(f);
        replace_file_atomic_backoff(&self.tmp_path, &self.final_path)?;
        Ok(self.final_path)
    }

    /// Drop `writer` and remove the temp file, leaving the final path untouched.
    /// A failed removal is logged, not returned.
    pub fn abort(self, writer: LineWriter<File>) {
        drop(writer);
        if let Err(e) = remove_with_backoff(&self.tmp_path, 10, 25) {
            tracing::warn!(path = %self.tmp_path.display(), error = %e, "temp output not removed");
        }
    }
}
