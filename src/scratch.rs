use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::util::remove_dir_with_backoff;

/// Scratch directory holding partition files for the duration of one run.
///
/// `create` makes the directory if needed and remembers whether it did;
/// `close` removes it again only in that case. Nothing happens on drop, so a
/// failed run leaves its partition files in place for inspection.
#[derive(Debug)]
pub struct ScratchDir {
    path: PathBuf,
    created: bool,
}

impl ScratchDir {
    pub fn create(path: &Path) -> Result<Self> {
        let created = !path.exists();
        fs::create_dir_all(path)
            .with_context(|| format!("create scratch dir {}", path.display()))?;
        Ok(Self { path: path.to_path_buf(), created })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// True when this run created the directory.
    pub fn created(&self) -> bool {
        self.created
    }

    /// Remove the directory if this run created it. Fails if it is not empty.
    pub fn close(self) -> Result<()> {
        if !self.created {
            return Ok(());
        }
        remove_dir_with_backoff(&self.path, 10, 25)
    }
}
