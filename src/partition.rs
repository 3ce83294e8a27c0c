use ahash::RandomState;
use anyhow::{anyhow, ensure, Context, Result};
use std::fs::File;
use std::hash::{BuildHasher, Hash, Hasher};
use std::io::{BufRead, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::buffer::OutputBuffer;
use crate::lines::LineReader;
use crate::progress::ProgressScope;
use crate::util::create_with_backoff;

/// A disk-resident bucket of lines produced by the partition phase.
/// Identity is positional: `id` is its index in `[0, group_count)`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Partition {
    pub id: usize,
    pub path: PathBuf,
}

/// File name of partition `id` inside the scratch directory.
pub fn partition_file_name(id: usize) -> String {
    format!("{id}.txt")
}

/// Upper bound on the combined size of all partition write buffers.
pub const PARTITION_WRITE_BUDGET: usize = 256 * 1024 * 1024;

const MIN_PARTITION_WRITE_BUF: usize = 4 * 1024;

/// Per-partition write buffer size: `write_buf`, shrunk so that `group_count`
/// buffers together stay within `PARTITION_WRITE_BUDGET`. Never below 4KiB.
pub fn partition_write_buffer(write_buf: usize, group_count: usize) -> usize {
    (PARTITION_WRITE_BUDGET / group_count.max(1))
        .min(write_buf)
        .max(MIN_PARTITION_WRITE_BUF)
}

/// Fixed-seed hasher so routing is a pure function of line content.
fn routing_state() -> RandomState {
    RandomState::with_seeds(
        0x1357_9bdf_acce_55ed,
        0x2468_ace0_fdb9_8642,
        0xfeed_face_dead_beef,
        0x0bad_f00d_c0de_cafe,
    )
}

/// Partition writers that route each line to a stable partition file.
/// Writers live in a fixed-size vector indexed by partition id.
///
/// File layout:
///   <scratch>/<id>.txt   one per partition, `\n`-terminated lines
pub struct Partitioner {
    writers: Vec<BufWriter<File>>,
    partitions: Vec<Partition>,
    state: RandomState,
}

impl Partitioner {
    /// Create `group_count` partition files under `scratch` (which must exist).
    /// Stale files with the same names are truncated.
    pub fn create(scratch: &Path, group_count: usize, write_buf: usize) -> Result<Self> {
        ensure!(group_count > 0, "partition count must be at least 1");

        let mut writers: Vec<BufWriter<File>> = Vec::new();
        let mut partitions: Vec<Partition> = Vec::new();
        writers
            .try_reserve_exact(group_count)
            .and_then(|_| partitions.try_reserve_exact(group_count))
            .map_err(|e| anyhow!("partition count {group_count} too large: {e}"))?;

        let buf_bytes = partition_write_buffer(write_buf, group_count);
        for id in 0..group_count {
            let path = scratch.join(partition_file_name(id));
            let f = create_with_backoff(&path, 16, 50)
                .with_context(|| format!("create partition {}", path.display()))?;
            writers.push(BufWriter::with_capacity(buf_bytes, f));
            partitions.push(Partition { id, path });
        }

        Ok(Self { writers, partitions, state: routing_state() })
    }

    pub fn group_count(&self) -> usize {
        self.writers.len()
    }

    /// Partition id this line is routed to.
    #[inline]
    pub fn partition_index(&self, line: &[u8]) -> usize {
        partition_index_with(&self.state, line, self.writers.len())
    }

    /// Append `line` plus a `\n` terminator to its partition.
    pub fn route(&mut self, line: &[u8]) -> Result<()> {
        let idx = self.partition_index(line);
        let w = &mut self.writers[idx];
        w.write_all(line)
            .and_then(|_| w.write_all(b"\n"))
            .with_context(|| format!("write partition {}", self.partitions[idx].path.display()))
    }

    /// Flush and close every writer. Returns partition handles in id order.
    pub fn finish(self) -> Result<Vec<Partition>> {
        for (w, p) in self.writers.into_iter().zip(self.partitions.iter()) {
            let f = w
                .into_inner()
                .map_err(|e| e.into_error())
                .with_context(|| format!("flush partition {}", p.path.display()))?;
            drop(f);
        }
        Ok(self.partitions)
    }
}

/// Route `line` into one of `group_count` buckets using the routing hasher.
/// Identical content always yields the same bucket within a build.
pub fn partition_index(line: &[u8], group_count: usize) -> usize {
    partition_index_with(&routing_state(), line, group_count.max(1))
}

#[inline]
fn partition_index_with(state: &RandomState, line: &[u8], group_count: usize) -> usize {
    let mut h = state.build_hasher();
    line.hash(&mut h);
    (h.finish() % group_count as u64) as usize
}

/// Partition phase: alternate between refilling the bounded buffer from `rdr`
/// and draining it into partition files, until the input is exhausted.
pub fn partition_lines<R: BufRead>(
    rdr: &mut LineReader<R>,
    scratch: &Path,
    group_count: usize,
    batch_limit: usize,
    write_buf: usize,
    pb: Option<&ProgressScope>,
) -> Result<Vec<Partition>> {
    ensure!(batch_limit > 0, "batch limit must be at least 1 line");
    let mut parts = Partitioner::create(scratch, group_count, write_buf)?;
    let mut buffer = OutputBuffer::new(batch_limit);
    let mut total_lines: u64 = 0;

    loop {
        let step = buffer.refill(rdr).context("read input")?;
        for line in buffer.drain() {
            parts.route(&line)?;
        }
        total_lines += step.lines as u64;
        if let Some(pb) = pb {
            pb.inc_bytes(step.bytes);
        }
        if step.eof {
            break;
        }
    }

    tracing::debug!(lines = total_lines, partitions = parts.group_count(), "input partitioned");
    parts.finish()
}
