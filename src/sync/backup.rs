//! Backup snapshots under `<root>/Backups`.
//!
//! Snapshot directories are named `<stamp>_<label>` with a `%Y%m%d_%H%M%S`
//! stamp, so lexicographic order equals chronological order and pruning can
//! sort by name alone. Two snapshots within the same second get a numeric
//! suffix instead of colliding.

use std::io;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::fs::copy::copy_path;
use crate::transfer::progress::EventSink;
use crate::utils::errors::Result;

/// Directory under the root holding all snapshots.
pub const BACKUPS_DIR: &str = "Backups";

pub fn backups_root(root: &Path) -> PathBuf {
    root.join(BACKUPS_DIR)
}

/// Snapshot the given root-relative paths into a fresh directory under
/// `<root>/Backups`, preserving relative structure. Missing sources are
/// skipped. Returns the snapshot directory.
pub fn create_backup(
    root: &Path,
    label: &str,
    paths: &[String],
    sink: &mut dyn EventSink,
) -> io::Result<PathBuf> {
    let backups = backups_root(root);
    std::fs::create_dir_all(&backups)?;

    let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    let dest = unique_snapshot_dir(&backups, &format!("{}_{}", stamp, label));
    std::fs::create_dir_all(&dest)?;

    for rel in paths {
        let src = root.join(rel);
        if !src.exists() {
            continue;
        }
        copy_path(&src, &dest.join(rel))?;
        sink.log(&format!("[BACKUP] {}", rel));
    }

    Ok(dest)
}

/// First non-existing snapshot path for the given base name, suffixing `-2`,
/// `-3`, ... on collision.
fn unique_snapshot_dir(backups: &Path, base: &str) -> PathBuf {
    let candidate = backups.join(base);
    if !candidate.exists() {
        return candidate;
    }
    let mut n = 2;
    loop {
        let candidate = backups.join(format!("{}-{}", base, n));
        if !candidate.exists() {
            return candidate;
        }
        n += 1;
    }
}

/// Keep the `keep` newest snapshots (greatest names) and delete the rest.
/// Individual deletion failures are logged and skipped, never raised.
pub fn prune_backups(root: &Path, keep: usize, sink: &mut dyn EventSink) -> Result<()> {
    let backups = backups_root(root);
    if !backups.is_dir() {
        return Ok(());
    }

    let mut dirs: Vec<PathBuf> = std::fs::read_dir(&backups)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_dir())
        .collect();

    // Newest first: the timestamp prefix makes name order chronological.
    dirs.sort_by(|a, b| b.file_name().cmp(&a.file_name()));

    for extra in dirs.into_iter().skip(keep) {
        let name = extra
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        match std::fs::remove_dir_all(&extra) {
            Ok(()) => sink.log(&format!("[PRUNE] {}", name)),
            Err(e) => warn!("failed to prune backup {}: {}", name, e),
        }
    }

    Ok(())
}
