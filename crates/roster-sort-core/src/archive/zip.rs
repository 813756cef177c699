use crate::error::Error;
use std::fs::{self, File};
use std::io;
use std::path::Path;
use tracing::warn;
use zip::ZipArchive;

/// Extract every entry of a zip archive under `dest`, keeping the archive's
/// internal layout. Entries whose names would escape `dest` are skipped.
///
/// Returns the number of files written.
pub fn extract_zip(archive_path: &Path, dest: &Path) -> Result<usize, Error> {
    let file = File::open(archive_path)?;
    let mut archive = ZipArchive::new(file)?;
    let mut written = 0usize;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        let relative = match entry.enclosed_name() {
            Some(path) => path.to_path_buf(),
            None => {
                warn!(
                    "Skipping unsafe entry '{}' in {}",
                    entry.name(),
                    archive_path.display()
                );
                continue;
            }
        };
        let out_path = dest.join(relative);

        if entry.is_dir() {
            fs::create_dir_all(&out_path)?;
            continue;
        }

        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent)?;
        }
        // A repeated path inside one archive keeps the first copy.
        if out_path.exists() {
            warn!(
                "Duplicate entry '{}' in {}, keeping first",
                entry.name(),
                archive_path.display()
            );
            continue;
        }
        let mut out_file = File::create(&out_path)?;
        io::copy(&mut entry, &mut out_file)?;
        written += 1;
    }

    Ok(written)
}
