//! Bounded read-ahead queue used between input reads and partition writes.

use crate::lines::LineReader;
use std::collections::VecDeque;
use std::io::{self, BufRead};

/// FIFO of lines read from the input but not yet routed to a partition.
/// Holds at most `limit` lines and is only refilled once fully drained.
pub struct OutputBuffer {
    queue: VecDeque<Vec<u8>>,
    limit: usize,
}

/// Result of one refill step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Refill {
    /// Lines added to the buffer by this step.
    pub lines: usize,
    /// Bytes consumed from the reader, terminators included.
    pub bytes: u64,
    /// The reader is exhausted.
    pub eof: bool,
}

impl OutputBuffer {
    /// `limit` is clamped to at least one line.
    pub fn new(limit: usize) -> Self {
        let limit = limit.max(1);
        Self { queue: VecDeque::with_capacity(limit.min(64 * 1024)), limit }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Read lines until the buffer holds `limit` lines or the reader hits EOF.
    /// Must only be called on an empty buffer.
    pub fn refill<R: BufRead>(&mut self, rdr: &mut LineReader<R>) -> io::Result<Refill> {
        debug_assert!(self.queue.is_empty(), "refill on a non-drained buffer");
        let mut step = Refill { lines: 0, bytes: 0, eof: false };
        while self.queue.len() < self.limit {
            let mut line = Vec::new();
            let n = rdr.read_line(&mut line)?;
            if n == 0 {
                step.eof = true;
                break;
            }
            step.bytes += n as u64;
            step.lines += 1;
            self.queue.push_back(line);
        }
        Ok(step)
    }

    /// Pop every buffered line in arrival order, leaving the buffer empty.
    pub fn drain(&mut self) -> std::collections::vec_deque::Drain<'_, Vec<u8>> {
        self.queue.drain(..)
    }
}
