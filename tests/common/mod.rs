#![allow(dead_code)]

use linedup::{LineDedup, RunReport};
use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

/// Fresh directory under the system temp dir that survives until the test process exits.
pub fn scratch_root() -> PathBuf {
    tempfile::tempdir().unwrap().into_path()
}

/// Write `lines` to `path`, each followed by `\n`.
pub fn write_lines(path: &Path, lines: &[&str]) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    let mut f = File::create(path).unwrap();
    for l in lines {
        writeln!(&mut f, "{}", l).unwrap();
    }
}

/// Create `<root>/input.txt` with `lines` and return its path.
pub fn make_input(lines: &[&str]) -> PathBuf {
    let input = scratch_root().join("input.txt");
    write_lines(&input, lines);
    input
}

/// Read a text file line-by-line into strings (keeps empty lines).
pub fn read_lines(path: &Path) -> Vec<String> {
    let f = File::open(path).unwrap();
    BufReader::new(f).lines().map(|l| l.unwrap()).collect()
}

pub fn line_set(lines: &[String]) -> BTreeSet<String> {
    lines.iter().cloned().collect()
}

/// Dedup `input` into `<input dir>/out.txt` with explicit partition and batch sizes.
pub fn run_dedup(input: &Path, groups: usize, batch: usize) -> RunReport {
    LineDedup::new()
        .input(input)
        .group_count(groups)
        .batch_limit(batch)
        .progress(false)
        .check_free_space(false)
        .run()
        .unwrap()
}

/// Dedup `input` into `output`.
pub fn run_dedup_to(input: &Path, output: &Path, groups: usize, batch: usize) -> RunReport {
    LineDedup::new()
        .input(input)
        .output(output)
        .group_count(groups)
        .batch_limit(batch)
        .progress(false)
        .check_free_space(false)
        .run()
        .unwrap()
}

/// Deterministic pseudo-random corpus with plenty of repeats (xorshift, no deps).
pub fn noisy_corpus(n: usize, distinct: u64) -> Vec<String> {
    let mut x: u64 = 0x9e37_79b9_7f4a_7c15;
    (0..n)
        .map(|_| {
            x ^= x << 13;
            x ^= x >> 7;
            x ^= x << 17;
            format!("line-{:05}", x % distinct)
        })
        .collect()
}

pub fn entries(dir: &Path) -> Vec<PathBuf> {
    match fs::read_dir(dir) {
        Ok(rd) => rd.map(|e| e.unwrap().path()).collect(),
        Err(_) => Vec::new(),
    }
}
