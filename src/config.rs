use anyhow::{anyhow, ensure, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Lines held in memory between a read step and the routing step.
pub const DEFAULT_BATCH_LIMIT: usize = 100_000;
/// Average partition size targeted by the default partition count.
pub const BYTES_PER_PARTITION: u64 = 32 * 1024 * 1024;
pub const DEFAULT_OUTPUT_NAME: &str = "out.txt";
pub const SCRATCH_DIR_NAME: &str = "temp";

/// User-facing options with sensible defaults and builder chaining.
/// Unset paths and counts are derived from the input in `resolve()`.
#[derive(Clone, Debug)]
pub struct DedupOptions {
    pub input: Option<PathBuf>,
    pub output: Option<PathBuf>,         // default: <input dir>/out.txt
    pub batch_limit: usize,
    pub group_count: Option<usize>,      // default: input size / 32MiB, at least 1
    pub scratch_dir: Option<PathBuf>,    // default: <input dir>/temp
    pub check_free_space: bool,
    pub progress: bool,

    // IO tuning
    pub read_buffer_bytes: usize,        // BufReader capacity
    pub write_buffer_bytes: usize,       // per-partition and output BufWriter capacity
}

impl Default for DedupOptions {
    fn default() -> Self {
        Self {
            input: None,
            output: None,
            batch_limit: DEFAULT_BATCH_LIMIT,
            group_count: None,
            scratch_dir: None,
            check_free_space: true,
            progress: true,
            read_buffer_bytes: 256 * 1024,
            write_buffer_bytes: 64 * 1024,
        }
    }
}

impl DedupOptions {
    pub fn with_input(mut self, path: impl AsRef<Path>) -> Self {
        self.input = Some(path.as_ref().to_path_buf());
        self
    }
    pub fn with_output(mut self, path: impl AsRef<Path>) -> Self {
        self.output = Some(path.as_ref().to_path_buf());
        self
    }
    pub fn with_batch_limit(mut self, lines: usize) -> Self {
        self.batch_limit = lines;
        self
    }
    pub fn with_group_count(mut self, groups: usize) -> Self {
        self.group_count = Some(groups);
        self
    }
    pub fn with_scratch_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.scratch_dir = Some(dir.as_ref().to_path_buf());
        self
    }
    pub fn with_check_free_space(mut self, yes: bool) -> Self {
        self.check_free_space = yes;
        self
    }
    pub fn with_progress(mut self, yes: bool) -> Self {
        self.progress = yes;
        self
    }

    // IO buffers tuning
    pub fn with_io_buffers(mut self, read_bytes: usize, write_bytes: usize) -> Self {
        self.read_buffer_bytes = read_bytes.max(8 * 1024);
        self.write_buffer_bytes = write_bytes.max(8 * 1024);
        self
    }

    /// Validate options and fill in every default. Touches no files.
    pub fn resolve(&self) -> Result<ResolvedConfig> {
        let input = self.input.clone().ok_or_else(|| anyhow!("input path is required"))?;
        ensure!(self.batch_limit > 0, "batch limit must be at least 1 line");
        if let Some(g) = self.group_count {
            ensure!(g > 0, "partition count must be at least 1");
        }

        let meta = fs::metadata(&input).with_context(|| format!("stat {}", input.display()))?;
        ensure!(meta.is_file(), "input {} is not a regular file", input.display());
        let input_bytes = meta.len();

        let dir = parent_dir(&input);
        Ok(ResolvedConfig {
            output: self.output.clone().unwrap_or_else(|| dir.join(DEFAULT_OUTPUT_NAME)),
            scratch_dir: self.scratch_dir.clone().unwrap_or_else(|| dir.join(SCRATCH_DIR_NAME)),
            group_count: self.group_count.unwrap_or_else(|| default_group_count(input_bytes)),
            batch_limit: self.batch_limit,
            input_bytes,
            input,
            check_free_space: self.check_free_space,
            progress: self.progress,
            read_buffer_bytes: self.read_buffer_bytes,
            write_buffer_bytes: self.write_buffer_bytes,
        })
    }
}

/// Fully-defaulted configuration consumed by the pipeline.
#[derive(Clone, Debug)]
pub struct ResolvedConfig {
    pub input: PathBuf,
    pub input_bytes: u64,
    pub output: PathBuf,
    pub scratch_dir: PathBuf,
    pub group_count: usize,
    pub batch_limit: usize,
    pub check_free_space: bool,
    pub progress: bool,
    pub read_buffer_bytes: usize,
    pub write_buffer_bytes: usize,
}

/// One partition per 32MiB of input, never fewer than one, saturating on
/// platforms where the quotient does not fit in `usize`.
pub fn default_group_count(input_bytes: u64) -> usize {
    usize::try_from(input_bytes / BYTES_PER_PARTITION)
        .unwrap_or(usize::MAX)
        .max(1)
}

/// Directory that holds `path`; a bare file name resolves to the current directory.
pub fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
