//! Archive hashing, verification and extraction.

use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::debug;
use zip::result::ZipError;

use crate::utils::errors::{PackError, Result};

/// Streaming SHA-256 of a file, lowercase hex. Reads in 1 MiB chunks to bound
/// memory on large archives.
pub fn sha256_file(path: &Path) -> Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; 1024 * 1024];

    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// Verify an archive against its manifest hash. A mismatch must abort the
/// update flow before the archive is ever extracted or applied.
pub fn verify_archive(path: &Path, expected_sha256: &str) -> Result<()> {
    let actual = sha256_file(path)?;
    if !actual.eq_ignore_ascii_case(expected_sha256) {
        return Err(PackError::IntegrityMismatch {
            expected: expected_sha256.to_string(),
            actual,
        });
    }
    debug!("archive hash verified: {}", actual);
    Ok(())
}

/// Extract a zip archive into `dest`, creating it if needed. Entry names are
/// validated through `enclosed_name` so an archive cannot escape `dest`.
pub fn extract_archive(archive_path: &Path, dest: &Path) -> Result<()> {
    let file = File::open(archive_path)?;
    let mut archive = zip::ZipArchive::new(BufReader::new(file))?;

    fs::create_dir_all(dest)?;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        let rel = entry
            .enclosed_name()
            .ok_or(ZipError::InvalidArchive("unsafe entry name".into()))?;
        let dest_path = dest.join(rel);

        if entry.is_dir() {
            fs::create_dir_all(&dest_path)?;
        } else {
            if let Some(parent) = dest_path.parent() {
                fs::create_dir_all(parent)?;
            }
            let mut outfile = File::create(&dest_path)?;
            std::io::copy(&mut entry, &mut outfile)?;
        }
    }

    Ok(())
}
