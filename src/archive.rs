// src/archive.rs

use anyhow::{Context, Result};
use glob::{glob, Pattern};
use std::{
    fs::{self, File},
    path::{Path, PathBuf},
};
use tracing::{info, instrument, warn};
use zip::ZipArchive;

/// Which files in the download directory were archives.
#[derive(Debug, Default)]
pub struct UnzipReport {
    pub extracted: Vec<PathBuf>,
    /// Files that did not open (or extract) as ZIP.
    pub skipped: Vec<PathBuf>,
}

/// Regular files directly inside `dir`, sorted.
fn files_in(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)
        .with_context(|| format!("listing {:?}", dir))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|p| p.is_file())
        .collect();
    files.sort();
    Ok(files)
}

/// Try every file in `zip_dir` as a ZIP, whatever its extension, and extract
/// the valid ones into `extract_dir`. Anything else is logged and skipped.
#[instrument(
    level = "info",
    skip(zip_dir, extract_dir),
    fields(zips = %zip_dir.as_ref().display())
)]
pub fn unzip_all<P: AsRef<Path>, Q: AsRef<Path>>(
    zip_dir: P,
    extract_dir: Q,
) -> Result<UnzipReport> {
    let zip_dir = zip_dir.as_ref();
    let extract_dir = extract_dir.as_ref();
    fs::create_dir_all(extract_dir).with_context(|| format!("creating {:?}", extract_dir))?;

    let mut report = UnzipReport::default();
    for path in files_in(zip_dir)? {
        let name = path.file_name().unwrap_or_default().to_string_lossy().to_string();
        let file = File::open(&path).with_context(|| format!("opening {:?}", path))?;

        let mut archive = match ZipArchive::new(file) {
            Ok(a) => a,
            Err(e) => {
                warn!(file = %name, error = %e, "not a valid ZIP file, skipping");
                report.skipped.push(path);
                continue;
            }
        };

        info!(file = %name, entries = archive.len(), "extracting");
        match archive.extract(extract_dir) {
            Ok(()) => report.extracted.push(path),
            Err(e) => {
                warn!(file = %name, error = %e, "extraction failed, skipping");
                report.skipped.push(path);
            }
        }
    }

    info!(
        extracted = report.extracted.len(),
        skipped = report.skipped.len(),
        "unzip finished"
    );
    Ok(report)
}

/// Rename, falling back to copy + delete when crossing filesystems.
fn move_file(from: &Path, to: &Path) -> Result<()> {
    if fs::rename(from, to).is_ok() {
        return Ok(());
    }
    fs::copy(from, to).with_context(|| format!("copying {:?} -> {:?}", from, to))?;
    fs::remove_file(from).with_context(|| format!("removing {:?}", from))?;
    Ok(())
}

/// Move every file below `extract_dir` (recursively) flat into `dest_dir`.
#[instrument(
    level = "info",
    skip(extract_dir, dest_dir),
    fields(dest = %dest_dir.as_ref().display())
)]
pub fn move_extracted<P: AsRef<Path>, Q: AsRef<Path>>(
    extract_dir: P,
    dest_dir: Q,
) -> Result<Vec<PathBuf>> {
    let extract_dir = extract_dir.as_ref();
    let dest_dir = dest_dir.as_ref();
    fs::create_dir_all(dest_dir).with_context(|| format!("creating {:?}", dest_dir))?;

    let pattern = format!("{}/**/*", Pattern::escape(&extract_dir.to_string_lossy()));
    let mut moved = Vec::new();
    for entry in glob(&pattern).with_context(|| format!("bad glob pattern {}", pattern))? {
        let path = match entry {
            Ok(p) => p,
            Err(e) => {
                warn!(error = %e, "unreadable entry while walking extracted files");
                continue;
            }
        };
        if !path.is_file() {
            continue;
        }
        let Some(file_name) = path.file_name() else {
            continue;
        };
        let target = dest_dir.join(file_name);
        info!(file = %file_name.to_string_lossy(), dest = %dest_dir.display(), "moving");
        move_file(&path, &target)?;
        moved.push(target);
    }
    Ok(moved)
}

/// Delete the downloaded files, then the temporary and download directories.
#[instrument(level = "info", skip(zip_dir, extract_dir))]
pub fn cleanup<P: AsRef<Path>, Q: AsRef<Path>>(zip_dir: P, extract_dir: Q) -> Result<()> {
    let zip_dir = zip_dir.as_ref();
    let extract_dir = extract_dir.as_ref();

    if zip_dir.exists() {
        for path in files_in(zip_dir)? {
            info!(path = %path.display(), "removing");
            fs::remove_file(&path).with_context(|| format!("removing {:?}", path))?;
        }
    }
    if extract_dir.exists() {
        info!(dir = %extract_dir.display(), "removing temporary directory");
        fs::remove_dir_all(extract_dir).with_context(|| format!("removing {:?}", extract_dir))?;
    }
    if zip_dir.exists() {
        info!(dir = %zip_dir.display(), "removing download directory");
        fs::remove_dir_all(zip_dir).with_context(|| format!("removing {:?}", zip_dir))?;
    }
    Ok(())
}
