//! Pack builder - turns a selection of root-relative paths into a versioned,
//! checksummed zip archive plus its manifest.
//!
//! The manifest records the pre-expansion selection entries (coarse intent);
//! the archive records the expanded per-file contents (ground truth). Both
//! are written into the output directory; the root is never touched.

pub mod archive;
pub mod manifest;

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing::warn;
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::CompressionMethod;

use crate::fs::paths::{is_protected, normalize_rel};
use crate::transfer::progress::{EventSink, ProgressGate};
use crate::utils::errors::{PackError, Result};
use manifest::{Manifest, PackEntry, ReplaceMode, ARCHIVE_NAME, MANIFEST_NAME};

/// Report progress after every this many files while zipping.
const PROGRESS_BATCH: usize = 50;

/// Options for a pack build.
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    /// Explicit version tag; timestamp fallback when `None`.
    pub version: Option<String>,

    /// Advisory cancellation, polled between files.
    pub cancel: CancellationToken,
}

/// Result of a successful build.
#[derive(Debug)]
pub struct BuildOutput {
    pub archive_path: PathBuf,
    pub manifest_path: PathBuf,
    pub manifest: Manifest,
}

/// Build `minecraft-pack.zip` and `manifest.json` from the selected entries
/// under `root`, writing both into `out_dir`.
///
/// Protected entries are filtered out of the selection (narrated, never
/// fatal); an empty surviving selection fails with `EmptySelection`. Missing
/// entries are skipped with a warning. The manifest records the filtered
/// pre-expansion selection, each tagged `mode: "replace"`.
pub fn build_pack(
    selection: &[String],
    root: &Path,
    out_dir: &Path,
    opts: &BuildOptions,
    sink: &mut dyn EventSink,
) -> Result<BuildOutput> {
    if !root.is_dir() {
        return Err(PackError::MissingRoot(root.to_path_buf()));
    }

    std::fs::create_dir_all(out_dir)?;
    sink.log(&format!("[MC ROOT] {}", root.display()));
    sink.log(&format!("[OUT DIR] {}", out_dir.display()));

    // Protected filtering happens on the top-level segment only.
    let mut filtered = Vec::new();
    for entry in selection {
        let rel = normalize_rel(entry);
        if rel.is_empty() {
            continue;
        }
        if is_protected(&rel) {
            sink.log(&format!("[SKIP protected] {}", rel));
            continue;
        }
        filtered.push(rel);
    }

    if filtered.is_empty() {
        return Err(PackError::EmptySelection);
    }

    let mut gate = ProgressGate::new();

    // Gather the full file list up front so progress is real.
    let mut files: Vec<(PathBuf, String)> = Vec::new();
    for rel in &filtered {
        gather_entry(root, rel, &mut files, sink)?;
    }

    if files.is_empty() {
        return Err(PackError::EmptySelection);
    }

    let archive_path = out_dir.join(ARCHIVE_NAME);
    let manifest_path = out_dir.join(MANIFEST_NAME);
    let total = files.len();

    sink.log(&format!(
        "[START] Zipping {} file(s) -> {}",
        total,
        archive_path.display()
    ));
    gate.report(sink, 0.10);

    let zip_file = File::create(&archive_path)?;
    let mut writer = zip::ZipWriter::new(zip_file);
    let zip_opts = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for (i, (full, arc_name)) in files.iter().enumerate() {
        if opts.cancel.is_cancelled() {
            return Err(PackError::Cancelled);
        }
        writer.start_file(arc_name.as_str(), zip_opts)?;
        let mut src = File::open(full)?;
        io::copy(&mut src, &mut writer)?;

        let done = i + 1;
        if done % PROGRESS_BATCH == 0 || done == total {
            gate.report(sink, 0.10 + 0.80 * (done as f64 / total as f64));
        }
    }
    writer.finish()?;

    let sha = archive::sha256_file(&archive_path)?;
    let manifest = Manifest {
        version: opts
            .version
            .clone()
            .filter(|v| !v.is_empty())
            .unwrap_or_else(Manifest::timestamp_version),
        asset: ARCHIVE_NAME.to_string(),
        sha256: sha.clone(),
        paths: filtered
            .into_iter()
            .map(|path| PackEntry {
                path,
                mode: ReplaceMode::Replace,
            })
            .collect(),
    };
    manifest.save(&manifest_path)?;

    sink.log(&format!("[SHA256] {}", sha));
    sink.log("[DONE] Pack built.");
    gate.report(sink, 0.95);

    Ok(BuildOutput {
        archive_path,
        manifest_path,
        manifest,
    })
}

/// Expand one selection entry into `(absolute path, archive name)` pairs.
/// Directories enumerate recursively with sorted entries so archive order is
/// stable; missing entries are a logged skip, not an error.
fn gather_entry(
    root: &Path,
    rel: &str,
    out: &mut Vec<(PathBuf, String)>,
    sink: &mut dyn EventSink,
) -> Result<()> {
    let src = root.join(rel);
    if !src.exists() {
        warn!("selected entry missing under root: {}", rel);
        sink.log(&format!("[SKIP missing] {}", rel));
        return Ok(());
    }

    if src.is_dir() {
        let mut count = 0usize;
        for entry in WalkDir::new(&src).sort_by_file_name() {
            let entry = entry.map_err(io::Error::other)?;
            if !entry.file_type().is_file() {
                continue;
            }
            let rel_to_root = entry
                .path()
                .strip_prefix(root)
                .map_err(io::Error::other)?;
            let arc = normalize_rel(&rel_to_root.to_string_lossy());
            out.push((entry.path().to_path_buf(), arc));
            count += 1;
        }
        sink.log(&format!("[SCAN] {} -> {} file(s)", rel, count));
    } else {
        out.push((src, rel.to_string()));
        sink.log(&format!("[SCAN] {} -> 1 file", rel));
    }

    Ok(())
}

/// Export the entire `saves` tree into `worlds_<stamp>.zip` under `out_dir`.
///
/// This is an explicit user-requested export of world data, the one
/// sanctioned read of a protected subtree; it never feeds into a pack.
/// A missing `saves` directory yields an empty archive.
pub fn backup_worlds_only(root: &Path, out_dir: &Path) -> Result<PathBuf> {
    if !root.is_dir() {
        return Err(PackError::MissingRoot(root.to_path_buf()));
    }
    std::fs::create_dir_all(out_dir)?;

    let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    let zip_path = out_dir.join(format!("worlds_{}.zip", stamp));
    let saves = root.join("saves");

    let zip_file = File::create(&zip_path)?;
    let mut writer = zip::ZipWriter::new(zip_file);
    let zip_opts = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    if saves.is_dir() {
        for entry in WalkDir::new(&saves).sort_by_file_name() {
            let entry = entry.map_err(io::Error::other)?;
            if !entry.file_type().is_file() {
                continue;
            }
            let rel = entry
                .path()
                .strip_prefix(root)
                .map_err(io::Error::other)?;
            writer.start_file(normalize_rel(&rel.to_string_lossy()), zip_opts)?;
            let mut src = File::open(entry.path())?;
            io::copy(&mut src, &mut writer)?;
        }
    }
    writer.finish()?;

    Ok(zip_path)
}
