//! Progress reporting utilities: byte-based bar for the partition phase and a
//! count bar for the merge phase.

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

const BYTES_TEMPLATE: &str = "{spinner:.green} {msg} {bytes:>10}/{total_bytes:<10} [{bar:.cyan/blue}] {percent:>3}%  \
     {bytes_per_sec}  elapsed: {elapsed_precise}  eta: {eta_precise}";
const COUNT_TEMPLATE: &str = "{spinner:.green} {msg} {pos}/{len} [{bar:.cyan/blue}] {percent:>3}%  \
     it/s: {per_sec}  elapsed: {elapsed_precise}  eta: {eta_precise}";

fn styled_bar(total: u64, template: &str, label: String) -> ProgressBar {
    let pb = ProgressBar::new(total);
    // Templates are constants; a parse failure falls back to the default style.
    if let Ok(style) = ProgressStyle::with_template(template) {
        pb.set_style(style.progress_chars("█▉▊▋▌▍▎▏  "));
    }
    if !label.is_empty() {
        pb.set_message(label);
    }
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// A small, ergonomic wrapper around `indicatif` progress bars.
/// Use either `ProgressScope::bytes(..)` or `ProgressScope::count(..)`.
/// - `inc_bytes(delta)` / `inc_items(delta)` increments progress
/// - `finish(msg)` finalizes the bar with a message
pub struct ProgressScope {
    pb: ProgressBar,
}

impl ProgressScope {
    pub fn bytes<T: Into<String>>(label: T, total_bytes: u64) -> Self {
        Self { pb: styled_bar(total_bytes, BYTES_TEMPLATE, label.into()) }
    }
    pub fn count<T: Into<String>>(label: T, total: u64) -> Self {
        Self { pb: styled_bar(total, COUNT_TEMPLATE, label.into()) }
    }
    #[inline] pub fn inc_bytes(&self, delta: u64) { self.pb.inc(delta); }
    #[inline] pub fn inc_items(&self, delta: u64) { self.pb.inc(delta); }
    pub fn finish<T: Into<String>>(&self, msg: T) { self.pb.finish_with_message(msg.into()); }
}

/// Build a scope only when progress display is enabled.
pub fn maybe_bytes(enabled: bool, label: &str, total_bytes: u64) -> Option<ProgressScope> {
    enabled.then(|| ProgressScope::bytes(label, total_bytes))
}

pub fn maybe_count(enabled: bool, label: &str, total: u64) -> Option<ProgressScope> {
    enabled.then(|| ProgressScope::count(label, total))
}
