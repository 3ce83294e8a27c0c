mod config;
mod util;
mod disk;
mod scratch;
mod progress;

mod lines;
mod buffer;
mod partition;
mod merge;
mod pipeline;

pub use crate::config::{
    default_group_count, parent_dir, DedupOptions, ResolvedConfig, BYTES_PER_PARTITION,
    DEFAULT_BATCH_LIMIT, DEFAULT_OUTPUT_NAME, SCRATCH_DIR_NAME,
};
pub use crate::pipeline::{LineDedup, RunReport};

// partition phase: bounded buffer, hash routing, partition handles
pub use crate::buffer::{OutputBuffer, Refill};
pub use crate::partition::{
    partition_file_name, partition_index, partition_lines, partition_write_buffer, Partition,
    Partitioner, PARTITION_WRITE_BUDGET,
};

// merge phase
pub use crate::merge::{discard_partition, load_partition, merge_partitions, RunStatistics};

// line I/O helpers
pub use crate::lines::{AtomicOutput, LineReader, LineWriter, LINE_ENDING};

// scratch directory lifecycle and free-space precondition
pub use crate::scratch::ScratchDir;
pub use crate::disk::{available_space, verify_free_space};

pub use crate::progress::ProgressScope;
pub use crate::util::{
    create_with_backoff, human_bytes, init_tracing_once, open_with_backoff, remove_dir_with_backoff,
    remove_with_backoff, replace_file_atomic_backoff,
};
