//! Archive extraction followed by flattening into a single directory.

pub mod rar;
pub mod zip;

use crate::fsops::{find_identical, safe_move, unique_destination};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, warn};
use walkdir::WalkDir;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    Zip,
    Rar,
}

impl ArchiveKind {
    /// Detect by extension, case-insensitively.
    pub fn detect(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_string_lossy().to_ascii_lowercase();
        match extension.as_str() {
            "zip" => Some(ArchiveKind::Zip),
            "rar" => Some(ArchiveKind::Rar),
            _ => None,
        }
    }
}

/// Optional codecs, resolved once at startup.
#[derive(Debug, Clone, Default)]
pub struct Capabilities {
    pub rar_tool: Option<PathBuf>,
}

impl Capabilities {
    pub fn detect() -> Self {
        let rar_tool = which::which("unrar").ok();
        match &rar_tool {
            Some(path) => debug!("Using unrar at {}", path.display()),
            None => debug!("unrar not found; .rar archives will not be extracted"),
        }
        Self { rar_tool }
    }
}

enum Codec<'a> {
    Zip,
    Rar(&'a Path),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractOutcome {
    /// Extraction completed; number of files now directly in the target
    /// that were moved up out of nested directories.
    Extracted { flattened: usize },
    /// Codec unavailable; nothing was extracted.
    Skipped,
    /// Extraction failed part-way; whatever was written has been flattened.
    Failed { flattened: usize, reason: String },
}

/// Extract `archive_path` into `target_dir` and flatten the result.
///
/// Entries land in a hidden staging directory inside `target_dir` so that no
/// existing file is overwritten; the flattening pass then moves everything
/// up, suffixing clashing names. Failures are logged and reported in the
/// outcome, never raised.
pub fn flatten_extract(
    archive_path: &Path,
    target_dir: &Path,
    capabilities: &Capabilities,
) -> ExtractOutcome {
    let kind = match ArchiveKind::detect(archive_path) {
        Some(kind) => kind,
        None => {
            warn!("Not a recognized archive: {}", archive_path.display());
            return ExtractOutcome::Skipped;
        }
    };

    let codec = match (kind, capabilities.rar_tool.as_deref()) {
        (ArchiveKind::Zip, _) => Codec::Zip,
        (ArchiveKind::Rar, Some(tool)) => Codec::Rar(tool),
        (ArchiveKind::Rar, None) => {
            warn!(
                "unrar not available; skipping extraction for {}",
                archive_path.display()
            );
            return ExtractOutcome::Skipped;
        }
    };

    if let Err(e) = fs::create_dir_all(target_dir) {
        error!("Cannot create {}: {}", target_dir.display(), e);
        return ExtractOutcome::Failed {
            flattened: 0,
            reason: e.to_string(),
        };
    }

    let staging = match tempfile::Builder::new()
        .prefix(".extract-")
        .tempdir_in(target_dir)
    {
        Ok(dir) => dir,
        Err(e) => {
            error!("Cannot create staging dir in {}: {}", target_dir.display(), e);
            return ExtractOutcome::Failed {
                flattened: 0,
                reason: e.to_string(),
            };
        }
    };

    let extracted = match codec {
        Codec::Zip => zip::extract_zip(archive_path, staging.path()).map(|_| ()),
        Codec::Rar(tool) => rar::extract_rar(tool, archive_path, staging.path()),
    };

    let report = flatten_dir(target_dir);
    let flattened = report.moved;
    if report.failed > 0 {
        keep_staging(staging.path(), archive_path, target_dir, report.failed);
    }
    drop(staging);

    match extracted {
        Ok(()) => ExtractOutcome::Extracted { flattened },
        Err(e) => {
            error!("Error extracting {}: {}", archive_path.display(), e);
            ExtractOutcome::Failed {
                flattened,
                reason: e.to_string(),
            }
        }
    }
}

/// Rename a staging directory that still holds unmoved files so that
/// dropping the `TempDir` does not delete them.
fn keep_staging(staging: &Path, archive_path: &Path, target_dir: &Path, failed: usize) {
    let archive_name = archive_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let kept = unique_destination(
        &target_dir.join(format!("unflattened_{}", archive_name)),
    );
    match fs::rename(staging, &kept) {
        Ok(()) => error!(
            "{} file(s) from {} could not be flattened; left in {}",
            failed,
            archive_path.display(),
            kept.display()
        ),
        Err(e) => error!(
            "{} file(s) from {} could not be flattened and are lost with {}: {}",
            failed,
            archive_path.display(),
            staging.display(),
            e
        ),
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FlattenReport {
    /// Files moved up into the directory.
    pub moved: usize,
    /// Nested files dropped because an identical file was already present.
    pub identical: usize,
    /// Files left where they were after a move error.
    pub failed: usize,
}

/// Move every file below `dir` up into `dir` itself, then remove the
/// emptied subdirectories bottom-up.
///
/// A nested file whose content matches the file already at its flattened
/// name (or one of its `_n` variants) is removed instead of moved, so
/// extracting the same archive twice leaves the directory unchanged.
/// Differing content gets a suffixed name; nothing is overwritten.
pub fn flatten_dir(dir: &Path) -> FlattenReport {
    let nested: Vec<PathBuf> = WalkDir::new(dir)
        .min_depth(2)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("Error walking {}: {}", dir.display(), e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .collect();

    let mut report = FlattenReport::default();
    for src in nested {
        let file_name = match src.file_name() {
            Some(name) => name.to_owned(),
            None => continue,
        };
        let dst = dir.join(&file_name);

        match find_identical(&src, &dst) {
            Ok(Some(existing)) => {
                debug!(
                    "{} is identical to {}; dropping the nested copy",
                    src.display(),
                    existing.display()
                );
                match fs::remove_file(&src) {
                    Ok(()) => report.identical += 1,
                    Err(e) => {
                        error!("Error removing {}: {}", src.display(), e);
                        report.failed += 1;
                    }
                }
                continue;
            }
            Ok(None) => {}
            Err(e) => warn!("Cannot compare {} with {}: {}", src.display(), dst.display(), e),
        }

        match safe_move(&src, &dst) {
            Ok(dst) => {
                debug!("Flattened {} -> {}", src.display(), dst.display());
                report.moved += 1;
            }
            Err(e) => {
                error!("Error moving {}: {}", src.display(), e);
                report.failed += 1;
            }
        }
    }

    remove_empty_dirs(dir);
    report
}

/// Remove empty subdirectories of `dir` bottom-up. Directories that cannot
/// be removed are left in place.
pub fn remove_empty_dirs(dir: &Path) {
    let subdirs: Vec<PathBuf> = WalkDir::new(dir)
        .min_depth(1)
        .contents_first(true)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_dir())
        .map(|entry| entry.into_path())
        .collect();

    for subdir in subdirs {
        if let Err(e) = fs::remove_dir(&subdir) {
            debug!("Leaving {} in place: {}", subdir.display(), e);
        }
    }
}
