//! Apply a downloaded pack to a live root.
//!
//! Callers must have verified the archive hash against the manifest before
//! extraction (`pack::archive::verify_archive`); this module assumes
//! `extract_dir` already holds trusted content. Manifest paths are re-filtered
//! against the protected set anyway — a manifest is untrusted input and must
//! never reach `saves` or the other protected trees.

use std::path::Path;
use tracing::warn;

use crate::fs::copy::copy_path;
use crate::fs::paths::{is_protected, normalize_rel};
use crate::pack::manifest::Manifest;
use crate::sync::backup::{create_backup, prune_backups};
use crate::transfer::progress::EventSink;
use crate::utils::errors::{PackError, Result};

/// Options for one apply run.
#[derive(Debug, Clone)]
pub struct ApplyOptions {
    /// Narrate every step but mutate nothing.
    pub dry_run: bool,

    /// Snapshots retained when pruning after a successful apply.
    pub keep_backups: usize,
}

impl Default for ApplyOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            keep_backups: 3,
        }
    }
}

/// Replace each manifest path under `root` with the corresponding content
/// from `extract_dir`.
///
/// A `pre_update` snapshot of every existing target is taken before the first
/// deletion; if that snapshot fails, the apply aborts with `BackupFailed` and
/// `root` is untouched. A remove/copy failure mid-apply surfaces as
/// `PartialIo` without rolling back paths already applied. After a successful
/// non-dry-run apply, backups beyond `opts.keep_backups` are pruned.
pub fn apply_manifest(
    extract_dir: &Path,
    manifest: &Manifest,
    root: &Path,
    opts: &ApplyOptions,
    sink: &mut dyn EventSink,
) -> Result<()> {
    if !root.is_dir() {
        return Err(PackError::MissingRoot(root.to_path_buf()));
    }

    // Defense in depth: the builder filtered already, but the manifest may
    // come from anywhere.
    let mut targets = Vec::new();
    for entry in &manifest.paths {
        let rel = normalize_rel(&entry.path);
        if rel.is_empty() {
            continue;
        }
        if is_protected(&rel) {
            warn!("manifest names a protected path, dropping: {}", rel);
            sink.log(&format!("[SKIP protected] {}", rel));
            continue;
        }
        targets.push(rel);
    }

    let existing: Vec<String> = targets
        .iter()
        .filter(|rel| root.join(rel).exists())
        .cloned()
        .collect();

    if !opts.dry_run {
        create_backup(root, "pre_update", &existing, sink).map_err(PackError::BackupFailed)?;
    }

    for rel in &targets {
        let src = extract_dir.join(rel);
        let dst = root.join(rel);
        sink.log(&format!("[REPLACE] {}", rel));
        if opts.dry_run {
            continue;
        }

        // Not shipped in this pack: leave the local path alone.
        if !src.exists() {
            sink.log(&format!("[SKIP missing] {}", rel));
            continue;
        }

        remove_target(&dst).map_err(|source| PackError::PartialIo {
            path: rel.clone(),
            source,
        })?;
        copy_path(&src, &dst).map_err(|source| PackError::PartialIo {
            path: rel.clone(),
            source,
        })?;
    }

    if !opts.dry_run {
        prune_backups(root, opts.keep_backups, sink)?;
    }

    Ok(())
}

fn remove_target(dst: &Path) -> std::io::Result<()> {
    if dst.is_dir() {
        std::fs::remove_dir_all(dst)
    } else if dst.exists() {
        std::fs::remove_file(dst)
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pack::manifest::{PackEntry, ReplaceMode};
    use crate::pack::{build_pack, BuildOptions};
    use crate::sync::backup::backups_root;
    use crate::transfer::progress::RecordingSink;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn manifest_for(paths: &[&str]) -> Manifest {
        Manifest {
            version: "2025.08.26.0900".to_string(),
            asset: "minecraft-pack.zip".to_string(),
            sha256: "0".repeat(64),
            paths: paths
                .iter()
                .map(|p| PackEntry {
                    path: p.to_string(),
                    mode: ReplaceMode::Replace,
                })
                .collect(),
        }
    }

    fn seed(dir: &Path, rel: &str, content: &[u8]) {
        let path = dir.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    /// Build from one root, extract, apply into another.
    fn build_and_extract(temp_dir: &TempDir, selection: &[&str]) -> (Manifest, PathBuf) {
        let src_root = temp_dir.path().join("src-root");
        seed(&src_root, "config/a.txt", b"x");
        seed(&src_root, "mods/b.jar", &[0xde, 0xad]);

        let sel: Vec<String> = selection.iter().map(|s| s.to_string()).collect();
        let output = build_pack(
            &sel,
            &src_root,
            &temp_dir.path().join("out"),
            &BuildOptions::default(),
            &mut crate::NullSink,
        )
        .unwrap();

        let extracted = temp_dir.path().join("extracted");
        crate::pack::archive::extract_archive(&output.archive_path, &extracted).unwrap();
        (output.manifest, extracted)
    }

    #[test]
    fn test_round_trip_into_empty_root() -> Result<()> {
        let temp_dir = TempDir::new().unwrap();
        let (manifest, extracted) = build_and_extract(&temp_dir, &["config", "mods"]);

        let root = temp_dir.path().join("dst-root");
        fs::create_dir_all(&root).unwrap();

        apply_manifest(
            &extracted,
            &manifest,
            &root,
            &ApplyOptions::default(),
            &mut crate::NullSink,
        )?;

        assert_eq!(fs::read(root.join("config/a.txt"))?, b"x");
        assert_eq!(fs::read(root.join("mods/b.jar"))?, [0xde, 0xad]);

        Ok(())
    }

    #[test]
    fn test_replaces_stale_content() -> Result<()> {
        let temp_dir = TempDir::new().unwrap();
        let (manifest, extracted) = build_and_extract(&temp_dir, &["config"]);

        let root = temp_dir.path().join("dst-root");
        seed(&root, "config/a.txt", b"stale");
        seed(&root, "config/obsolete.cfg", b"gone");

        apply_manifest(
            &extracted,
            &manifest,
            &root,
            &ApplyOptions::default(),
            &mut crate::NullSink,
        )?;

        // full replace per path: the old directory content is gone
        assert_eq!(fs::read(root.join("config/a.txt"))?, b"x");
        assert!(!root.join("config/obsolete.cfg").exists());

        Ok(())
    }

    #[test]
    fn test_backup_taken_before_replace() -> Result<()> {
        let temp_dir = TempDir::new().unwrap();
        let (manifest, extracted) = build_and_extract(&temp_dir, &["config"]);

        let root = temp_dir.path().join("dst-root");
        seed(&root, "config/a.txt", b"old");

        apply_manifest(
            &extracted,
            &manifest,
            &root,
            &ApplyOptions::default(),
            &mut crate::NullSink,
        )?;

        let snapshots: Vec<PathBuf> = fs::read_dir(backups_root(&root))?
            .map(|e| e.unwrap().path())
            .collect();
        assert_eq!(snapshots.len(), 1);
        assert_eq!(fs::read(snapshots[0].join("config/a.txt"))?, b"old");

        Ok(())
    }

    #[test]
    fn test_idempotent_double_apply() -> Result<()> {
        let temp_dir = TempDir::new().unwrap();
        let (manifest, extracted) = build_and_extract(&temp_dir, &["config", "mods"]);

        let root = temp_dir.path().join("dst-root");
        fs::create_dir_all(&root).unwrap();

        let opts = ApplyOptions::default();
        apply_manifest(&extracted, &manifest, &root, &opts, &mut crate::NullSink)?;
        apply_manifest(&extracted, &manifest, &root, &opts, &mut crate::NullSink)?;

        assert_eq!(fs::read(root.join("config/a.txt"))?, b"x");
        assert_eq!(fs::read(root.join("mods/b.jar"))?, [0xde, 0xad]);
        // one extra snapshot, nothing else
        assert_eq!(fs::read_dir(backups_root(&root))?.count(), 2);

        Ok(())
    }

    #[test]
    fn test_protected_manifest_paths_dropped() -> Result<()> {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("dst-root");
        seed(&root, "saves/world/level.dat", b"precious");

        let extracted = temp_dir.path().join("extracted");
        seed(&extracted, "saves/world/level.dat", b"evil");

        let mut sink = RecordingSink::new();
        apply_manifest(
            &extracted,
            &manifest_for(&["saves"]),
            &root,
            &ApplyOptions::default(),
            &mut sink,
        )?;

        assert_eq!(fs::read(root.join("saves/world/level.dat"))?, b"precious");
        assert!(sink.lines.iter().any(|l| l == "[SKIP protected] saves"));
        assert!(!sink.lines.iter().any(|l| l.starts_with("[REPLACE]")));

        Ok(())
    }

    #[test]
    fn test_missing_source_is_noop() -> Result<()> {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("dst-root");
        seed(&root, "config/a.txt", b"kept");

        let extracted = temp_dir.path().join("extracted");
        fs::create_dir_all(&extracted).unwrap();

        apply_manifest(
            &extracted,
            &manifest_for(&["config"]),
            &root,
            &ApplyOptions::default(),
            &mut crate::NullSink,
        )?;

        // target untouched, but it was backed up first
        assert_eq!(fs::read(root.join("config/a.txt"))?, b"kept");
        assert_eq!(fs::read_dir(backups_root(&root))?.count(), 1);

        Ok(())
    }

    #[test]
    fn test_dry_run_mutates_nothing() -> Result<()> {
        let temp_dir = TempDir::new().unwrap();
        let (manifest, extracted) = build_and_extract(&temp_dir, &["config"]);

        let root = temp_dir.path().join("dst-root");
        seed(&root, "config/a.txt", b"untouched");

        let mut sink = RecordingSink::new();
        apply_manifest(
            &extracted,
            &manifest,
            &root,
            &ApplyOptions {
                dry_run: true,
                keep_backups: 3,
            },
            &mut sink,
        )?;

        assert_eq!(fs::read(root.join("config/a.txt"))?, b"untouched");
        assert!(!backups_root(&root).exists());
        // narration still happens
        assert!(sink.lines.iter().any(|l| l == "[REPLACE] config"));

        Ok(())
    }

    #[test]
    fn test_dry_run_and_real_run_narrate_alike() -> Result<()> {
        let temp_dir = TempDir::new().unwrap();
        let (manifest, extracted) = build_and_extract(&temp_dir, &["config", "mods"]);

        let root = temp_dir.path().join("dst-root");
        fs::create_dir_all(&root).unwrap();

        let mut dry_sink = RecordingSink::new();
        apply_manifest(
            &extracted,
            &manifest,
            &root,
            &ApplyOptions {
                dry_run: true,
                keep_backups: 3,
            },
            &mut dry_sink,
        )?;

        let mut real_sink = RecordingSink::new();
        apply_manifest(
            &extracted,
            &manifest,
            &root,
            &ApplyOptions::default(),
            &mut real_sink,
        )?;

        let replaces = |lines: &[String]| -> Vec<String> {
            lines
                .iter()
                .filter(|l| l.starts_with("[REPLACE]"))
                .cloned()
                .collect()
        };
        assert_eq!(replaces(&dry_sink.lines), replaces(&real_sink.lines));

        Ok(())
    }

    #[test]
    fn test_prune_runs_after_apply() -> Result<()> {
        let temp_dir = TempDir::new().unwrap();
        let (manifest, extracted) = build_and_extract(&temp_dir, &["config"]);

        let root = temp_dir.path().join("dst-root");
        fs::create_dir_all(&root).unwrap();
        // seed stale snapshots that pruning should clear
        for stamp in ["19990101_000000_old", "19990102_000000_old"] {
            fs::create_dir_all(backups_root(&root).join(stamp)).unwrap();
        }

        apply_manifest(
            &extracted,
            &manifest,
            &root,
            &ApplyOptions {
                dry_run: false,
                keep_backups: 1,
            },
            &mut crate::NullSink,
        )?;

        let remaining: Vec<String> = fs::read_dir(backups_root(&root))?
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        // only the fresh pre_update snapshot survives
        assert_eq!(remaining.len(), 1);
        assert!(remaining[0].ends_with("_pre_update"));

        Ok(())
    }
}
