//! End-to-end update and publish flows.
//!
//! These tie the remote store, the integrity check, the apply engine and the
//! settings collaborator together in the order the protocol requires: the
//! archive hash is verified against the manifest before extraction, and a
//! mismatch aborts before apply is ever invoked.

use tempfile::TempDir;
use tracing::info;

use crate::config::Settings;
use crate::pack::archive::{extract_archive, verify_archive};
use crate::pack::{build_pack, BuildOptions};
use crate::remote::github::GithubClient;
use crate::sync::apply::{apply_manifest, ApplyOptions};
use crate::transfer::progress::EventSink;
use crate::utils::errors::Result;
use std::path::Path;

/// Fetch the latest pack and apply it to the configured root.
///
/// Returns `Ok(None)` when the installation is already on the latest version,
/// otherwise the version that was applied. On a non-dry-run success the
/// settings' `last_applied_version` is updated and persisted.
pub async fn run_update(
    client: &GithubClient,
    settings: &mut Settings,
    sink: &mut dyn EventSink,
) -> Result<Option<String>> {
    let manifest = client.get_latest_manifest().await?;

    if manifest.version == settings.last_applied_version {
        sink.log(&format!("[DONE] Already on version {}.", manifest.version));
        return Ok(None);
    }

    let work = TempDir::new()?;
    sink.log(&format!("[DOWNLOAD] {}", manifest.asset));
    let archive_path = client
        .download_asset(&manifest.asset, work.path(), sink)
        .await?;

    // Abort before extraction on a hash mismatch.
    verify_archive(&archive_path, &manifest.sha256)?;
    sink.log(&format!("[SHA256] {}", manifest.sha256));

    let extracted = work.path().join("extracted");
    extract_archive(&archive_path, &extracted)?;

    let opts = ApplyOptions {
        dry_run: settings.dry_run,
        keep_backups: settings.keep_backups,
    };
    let root = settings.minecraft_path.clone();
    apply_manifest(&extracted, &manifest, &root, &opts, sink)?;

    if settings.dry_run {
        sink.log("[DONE] Dry run complete, nothing was changed.");
        return Ok(Some(manifest.version));
    }

    settings.last_applied_version = manifest.version.clone();
    settings.save()?;
    info!("updated to pack version {}", manifest.version);
    sink.log(&format!("[DONE] Updated to version {}.", manifest.version));

    Ok(Some(manifest.version))
}

/// Build a pack from the given selection (falling back to the persisted one)
/// and publish it as a release. Returns the release tag.
pub async fn run_publish(
    client: &GithubClient,
    settings: &Settings,
    selection: Option<&[String]>,
    out_dir: &Path,
    opts: &BuildOptions,
    sink: &mut dyn EventSink,
) -> Result<String> {
    let selection = selection.unwrap_or(settings.include_selected.as_slice());
    let output = build_pack(selection, &settings.minecraft_path, out_dir, opts, sink)?;
    client
        .publish(&output.manifest_path, &output.archive_path, sink)
        .await
}
