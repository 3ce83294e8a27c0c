use anyhow::{bail, Result};
use std::path::Path;
use sysinfo::{DiskExt, System, SystemExt};

/// Free bytes on the volume holding `path`, or `None` if no mounted disk matches.
/// `path` must exist; the deepest mount point that prefixes it wins.
pub fn available_space(path: &Path) -> Option<u64> {
    let target = path.canonicalize().ok()?;
    let mut sys = System::new();
    sys.refresh_disks_list();
    sys.disks()
        .iter()
        .filter(|d| target.starts_with(d.mount_point()))
        .max_by_key(|d| d.mount_point().as_os_str().len())
        .map(|d| d.available_space())
}

/// Partitioning roughly doubles the on-disk footprint while it runs, so the
/// scratch volume must have at least `required` free bytes.
pub fn verify_free_space(required: u64, available: Option<u64>) -> Result<()> {
    match available {
        Some(free) if free < required => bail!(
            "insufficient free storage: need {} bytes, {} available",
            required,
            free
        ),
        Some(_) => Ok(()),
        None => {
            tracing::warn!("cannot determine free storage for scratch volume; skipping space check");
            Ok(())
        }
    }
}
