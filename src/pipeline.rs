use crate::config::{parent_dir, DedupOptions, ResolvedConfig};
use crate::disk::{available_space, verify_free_space};
use crate::lines::{AtomicOutput, LineReader};
use crate::merge::{merge_partitions, RunStatistics};
use crate::partition::{partition_lines, Partition};
use crate::progress::{maybe_bytes, maybe_count};
use crate::scratch::ScratchDir;
use crate::util::{human_bytes, init_tracing_once};
use anyhow::{Context, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Builder-style driver for one external deduplication run.
#[derive(Clone, Default)]
pub struct LineDedup {
    pub(crate) opts: DedupOptions,
}

/// Outcome of a successful run.
#[derive(Clone, Debug, Serialize)]
pub struct RunReport {
    pub input: PathBuf,
    pub output: PathBuf,
    pub input_bytes: u64,
    pub group_count: usize,
    pub batch_limit: usize,
    pub stats: RunStatistics,
    #[serde(serialize_with = "millis")]
    pub partition_elapsed: Duration,
    #[serde(serialize_with = "millis")]
    pub merge_elapsed: Duration,
}

fn millis<S: serde::Serializer>(d: &Duration, s: S) -> std::result::Result<S::Ok, S::Error> {
    s.serialize_u64(d.as_millis() as u64)
}

impl LineDedup {
    pub fn new() -> Self {
        Self { opts: DedupOptions::default() }
    }

    pub fn from_options(opts: DedupOptions) -> Self {
        Self { opts }
    }

    // -------- Builder methods --------
    pub fn input(mut self, path: impl AsRef<Path>) -> Self { self.opts = self.opts.with_input(path); self }
    pub fn output(mut self, path: impl AsRef<Path>) -> Self { self.opts = self.opts.with_output(path); self }
    pub fn batch_limit(mut self, lines: usize) -> Self { self.opts = self.opts.with_batch_limit(lines); self }
    pub fn group_count(mut self, groups: usize) -> Self { self.opts = self.opts.with_group_count(groups); self }
    pub fn scratch_dir(mut self, dir: impl AsRef<Path>) -> Self { self.opts = self.opts.with_scratch_dir(dir); self }
    pub fn check_free_space(mut self, yes: bool) -> Self { self.opts = self.opts.with_check_free_space(yes); self }
    pub fn progress(mut self, yes: bool) -> Self { self.opts = self.opts.with_progress(yes); self }
    pub fn io_buffers(mut self, read_bytes: usize, write_bytes: usize) -> Self { self.opts = self.opts.with_io_buffers(read_bytes, write_bytes); self }

    pub fn options(&self) -> &DedupOptions {
        &self.opts
    }

    /// Partition the input, merge the partitions into the output, and clean up
    /// the scratch directory. Configuration and precondition failures surface
    /// before any file is created.
    pub fn run(self) -> Result<RunReport> {
        init_tracing_once();
        let cfg = self.opts.resolve()?;
        tracing::info!(
            "Input file size: {} bytes ({})",
            cfg.input_bytes,
            human_bytes(cfg.input_bytes)
        );

        if cfg.check_free_space {
            // The scratch dir does not exist yet; check the volume that will hold it.
            let volume = parent_dir(&cfg.scratch_dir);
            verify_free_space(cfg.input_bytes, available_space(&volume))?;
        }

        let scratch = ScratchDir::create(&cfg.scratch_dir)?;
        tracing::info!(
            partitions = cfg.group_count,
            batch = cfg.batch_limit,
            scratch = %scratch.path().display(),
            "Start to read and group lines..."
        );

        let started = Instant::now();
        let partitions = {
            let mut rdr = LineReader::open(&cfg.input, cfg.read_buffer_bytes)
                .with_context(|| format!("open {}", cfg.input.display()))?;
            let pb = maybe_bytes(cfg.progress, "Partition", cfg.input_bytes);
            let parts = partition_lines(
                &mut rdr,
                scratch.path(),
                cfg.group_count,
                cfg.batch_limit,
                cfg.write_buffer_bytes,
                pb.as_ref(),
            )?;
            if let Some(pb) = &pb {
                pb.finish(format!("{} partitions written", parts.len()));
            }
            parts
        };
        let partition_elapsed = started.elapsed();
        tracing::info!("Done! Time: {}ms", partition_elapsed.as_millis());

        tracing::info!("Start to remove duplicate lines and merge files...");
        let started = Instant::now();
        let stats = merge_into_output(&cfg, partitions)?;
        let merge_elapsed = started.elapsed();
        tracing::info!("Done! Time: {}ms", merge_elapsed.as_millis());

        if let Err(e) = scratch.close() {
            tracing::warn!(error = %e, "scratch directory not removed");
        }

        tracing::info!(
            "Total lines: {}, Duplicate lines: {}",
            stats.total_lines,
            stats.duplicate_lines
        );

        Ok(RunReport {
            input: cfg.input,
            output: cfg.output,
            input_bytes: cfg.input_bytes,
            group_count: cfg.group_count,
            batch_limit: cfg.batch_limit,
            stats,
            partition_elapsed,
            merge_elapsed,
        })
    }
}

fn merge_into_output(cfg: &ResolvedConfig, partitions: Vec<Partition>) -> Result<RunStatistics> {
    let (out, mut w) = AtomicOutput::create(&cfg.output, cfg.write_buffer_bytes)?;
    let pb = maybe_count(cfg.progress, "Merge", partitions.len() as u64);

    match merge_partitions(partitions, &mut w, cfg.read_buffer_bytes, pb.as_ref()) {
        Ok(stats) => {
            out.commit(w)?;
            if let Some(pb) = &pb {
                pb.finish("merge done");
            }
            Ok(stats)
        }
        Err(e) => {
            out.abort(w);
            Err(e)
        }
    }
}
