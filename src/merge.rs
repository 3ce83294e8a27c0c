use ahash::AHashSet;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::io::Write;

use crate::lines::{LineReader, LineWriter};
use crate::partition::Partition;
use crate::progress::ProgressScope;
use crate::util::remove_with_backoff;

/// Counters accumulated over the merge phase.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStatistics {
    /// Lines read back from all partitions (equals input line count).
    pub total_lines: u64,
    /// Lines dropped because an identical line was already kept.
    pub duplicate_lines: u64,
    /// Partition files that could not be deleted after merging.
    pub cleanup_failures: u64,
}

impl RunStatistics {
    /// Record one merged partition: `count` lines read, `distinct` kept.
    pub fn record(&mut self, count: u64, distinct: u64) {
        debug_assert!(distinct <= count);
        self.total_lines += count;
        self.duplicate_lines += count - distinct;
    }

    pub fn distinct_lines(&self) -> u64 {
        self.total_lines - self.duplicate_lines
    }
}

/// Load one partition into a set. Returns the set and the number of lines read.
pub fn load_partition(p: &Partition, read_buf: usize) -> Result<(AHashSet<Vec<u8>>, u64)> {
    let mut rdr = LineReader::open(&p.path, read_buf)
        .with_context(|| format!("open partition {}", p.path.display()))?;
    let mut seen: AHashSet<Vec<u8>> = AHashSet::new();
    let mut count: u64 = 0;
    let mut buf = Vec::with_capacity(256);
    loop {
        let n = rdr
            .read_raw_line(&mut buf)
            .with_context(|| format!("read partition {}", p.path.display()))?;
        if n == 0 {
            break;
        }
        count += 1;
        if !seen.contains(buf.as_slice()) {
            seen.insert(buf.clone());
        }
    }
    Ok((seen, count))
}

/// Delete a merged partition file. A failure is logged and counted in
/// `stats.cleanup_failures`; it never aborts the run.
pub fn discard_partition(p: &Partition, stats: &mut RunStatistics) {
    if let Err(e) = remove_with_backoff(&p.path, 10, 25) {
        tracing::warn!(path = %p.path.display(), error = %e, "delete failed");
        stats.cleanup_failures += 1;
    }
}

/// Merge phase: deduplicate each partition in id order, append its distinct lines
/// to `out`, then delete the partition file. Deletion failures are logged and
/// counted, never fatal. `out` is flushed before returning; closing it is up to
/// the caller, which owns the underlying sink.
pub fn merge_partitions<W: Write>(
    mut partitions: Vec<Partition>,
    out: &mut LineWriter<W>,
    read_buf: usize,
    pb: Option<&ProgressScope>,
) -> Result<RunStatistics> {
    partitions.sort_by_key(|p| p.id);
    let mut stats = RunStatistics::default();

    for p in partitions {
        let (lines, count) = load_partition(&p, read_buf)?;
        let distinct = lines.len() as u64;
        for line in lines.iter() {
            out.write_line(line).context("write output")?;
        }
        drop(lines);
        stats.record(count, distinct);

        discard_partition(&p, &mut stats);
        tracing::trace!(partition = p.id, count, distinct, "partition merged");
        if let Some(pb) = pb {
            pb.inc_items(1);
        }
    }

    out.flush().context("flush output")?;
    Ok(stats)
}
