//! Pipeline orchestration
//!
//! Drives the stages in order: authenticate, locate the newest roster link,
//! download and extract the archive, classify the combined roster file, build
//! the workbook, then delete the intermediate artifacts. Each stage consumes
//! the previous stage's output; no stage retries another's work, and nothing
//! runs concurrently.

use anyhow::{anyhow, Context, Result};
use chrono::Local;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::config::AppConfig;
use crate::roster::{self, ReferenceIds};
use crate::session::{self, Credentials};
use crate::{discovery, fetcher, report};

/// Run the full retrieval-and-classification pipeline, returning the path of
/// the saved workbook.
pub async fn run(
    config: &AppConfig,
    credentials: Credentials,
    workdir: &Path,
) -> Result<PathBuf> {
    let session = session::authenticate(config, credentials).await?;
    let link = discovery::find_latest(&session, &config.portal.link_prefix)?;

    let archive = fetcher::download_archive(&session, &link, workdir).await?;
    fetcher::extract_archive(&archive, workdir)?;

    let combined = find_combined_file(workdir, &config.portal.combined_file_prefix)?;
    info!("Combined roster file: {}", combined.display());

    let ids = ReferenceIds::new(&config.reference);
    let classified = roster::classify(&combined, &ids)?;

    let report_path = workdir.join(report::output_filename(Local::now().date_naive()));
    report::build_report(&classified, &report_path)?;

    cleanup(workdir, &archive)?;
    Ok(report_path)
}

/// Locate the combined roster text file by filename prefix. Extraction does
/// not hand back a manifest; the file is discovered in the working directory.
fn find_combined_file(workdir: &Path, prefix: &str) -> Result<PathBuf> {
    for entry in fs::read_dir(workdir)
        .with_context(|| format!("Failed to read working directory {}", workdir.display()))?
    {
        let entry = entry?;
        let path = entry.path();
        if path.is_file() && entry.file_name().to_string_lossy().starts_with(prefix) {
            return Ok(path);
        }
    }
    Err(anyhow!(
        "Combined roster file with prefix '{prefix}' not found after extraction"
    ))
}

/// Delete the extracted text files and the intermediate archive once the
/// workbook has been saved.
fn cleanup(workdir: &Path, archive: &Path) -> Result<()> {
    for entry in fs::read_dir(workdir)
        .with_context(|| format!("Failed to read working directory {}", workdir.display()))?
    {
        let entry = entry?;
        let path = entry.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "txt") {
            fs::remove_file(&path)
                .with_context(|| format!("Failed to remove {}", path.display()))?;
            debug!("Removed intermediate file {}", path.display());
        }
    }
    fs::remove_file(archive)
        .with_context(|| format!("Failed to remove {}", archive.display()))?;
    debug!("Removed archive {}", archive.display());
    Ok(())
}
