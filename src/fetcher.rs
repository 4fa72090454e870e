//! Archive download and extraction
//!
//! Follows the roster download link on the authenticated client, writes the
//! response body verbatim to a local file, and expands every archive entry
//! into the working directory. Downstream stages locate their inputs by
//! filename prefix, so the only guarantee here is that the expected files
//! exist after extraction if the archive contained them.

use anyhow::{Context, Result};
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::discovery::DownloadLink;
use crate::session::PortalSession;

/// Transient local name for the downloaded archive; deleted during cleanup.
pub const ARCHIVE_FILENAME: &str = "roster_archive.zip";

/// Download the archive byte-for-byte into the working directory.
pub async fn download_archive(
    session: &PortalSession,
    link: &DownloadLink,
    workdir: &Path,
) -> Result<PathBuf> {
    info!("Downloading {}", link.text);
    let response = session
        .client
        .get(link.url.clone())
        .send()
        .await
        .context("Failed to follow roster download link")?;
    let bytes = response
        .bytes()
        .await
        .context("Failed to read archive response body")?;

    let path = workdir.join(ARCHIVE_FILENAME);
    fs::write(&path, &bytes)
        .with_context(|| format!("Failed to write archive to {}", path.display()))?;
    debug!("Wrote {} bytes to {}", bytes.len(), path.display());
    Ok(path)
}

/// Expand all archive entries into the working directory. No selective
/// filtering; entries with paths escaping the working directory are skipped.
pub fn extract_archive(archive_path: &Path, workdir: &Path) -> Result<Vec<PathBuf>> {
    let file = File::open(archive_path)
        .with_context(|| format!("Failed to open archive {}", archive_path.display()))?;
    let mut archive = zip::ZipArchive::new(file)
        .with_context(|| format!("Failed to read archive {}", archive_path.display()))?;

    let mut extracted = Vec::with_capacity(archive.len());
    for index in 0..archive.len() {
        let mut entry = archive
            .by_index(index)
            .with_context(|| format!("Failed to read archive entry {index}"))?;
        let Some(relative) = entry.enclosed_name() else {
            warn!("Skipping archive entry with unsafe path: {}", entry.name());
            continue;
        };
        let target = workdir.join(relative);

        if entry.is_dir() {
            fs::create_dir_all(&target)
                .with_context(|| format!("Failed to create directory {}", target.display()))?;
            continue;
        }
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
        let mut output = File::create(&target)
            .with_context(|| format!("Failed to create {}", target.display()))?;
        io::copy(&mut entry, &mut output)
            .with_context(|| format!("Failed to extract {}", target.display()))?;
        debug!("Extracted {}", target.display());
        extracted.push(target);
    }

    info!(
        "Extracted {} entries from {}",
        extracted.len(),
        archive_path.display()
    );
    Ok(extracted)
}
