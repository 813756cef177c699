use std::fs::{self, File};
use std::hash::Hasher as _;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing::trace;
use twox_hash::XxHash64;

const HASH_BUFFER_SIZE: usize = 64 * 1024;

/// `dst` with a `_n` suffix before the extension; `n == 0` is `dst` itself.
fn suffixed(dst: &Path, n: usize) -> PathBuf {
    if n == 0 {
        return dst.to_path_buf();
    }
    let dir = dst.parent().unwrap_or_else(|| Path::new(""));
    let stem = dst
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = dst
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    dir.join(format!("{}_{}{}", stem, n, extension))
}

/// First free path for `dst`: `dst` itself, then `stem_1.ext`, `stem_2.ext`, ...
pub fn unique_destination(dst: &Path) -> PathBuf {
    let mut n = 0usize;
    loop {
        let candidate = suffixed(dst, n);
        if !candidate.exists() {
            return candidate;
        }
        n += 1;
    }
}

/// Existing file among `dst`, `stem_1.ext`, `stem_2.ext`, ... whose content
/// equals `src`. Stops at the first free name.
pub fn find_identical(src: &Path, dst: &Path) -> io::Result<Option<PathBuf>> {
    let mut n = 0usize;
    loop {
        let candidate = suffixed(dst, n);
        if !candidate.exists() {
            return Ok(None);
        }
        if candidate.is_file() && same_content(src, &candidate)? {
            return Ok(Some(candidate));
        }
        n += 1;
    }
}

/// Size first, full content hash only when sizes agree.
pub fn same_content(a: &Path, b: &Path) -> io::Result<bool> {
    if fs::metadata(a)?.len() != fs::metadata(b)?.len() {
        return Ok(false);
    }
    Ok(content_hash(a)? == content_hash(b)?)
}

/// XxHash64 of the whole file, read in fixed-size chunks.
pub fn content_hash(path: &Path) -> io::Result<u64> {
    let mut file = File::open(path)?;
    let mut hasher = XxHash64::with_seed(0);
    let mut buffer = vec![0u8; HASH_BUFFER_SIZE];
    loop {
        let read = file.read(&mut buffer)?;
        if read == 0 {
            break;
        }
        hasher.write(&buffer[..read]);
    }
    Ok(hasher.finish())
}

/// Copy without overwriting. Returns the path actually written.
pub fn safe_copy(src: &Path, dst: &Path) -> io::Result<PathBuf> {
    let target = unique_destination(dst);
    fs::copy(src, &target)?;
    trace!("Copied {} -> {}", src.display(), target.display());
    Ok(target)
}

/// Move without overwriting. Falls back to copy + remove when a rename is
/// not possible (e.g. across filesystems).
pub fn safe_move(src: &Path, dst: &Path) -> io::Result<PathBuf> {
    let target = unique_destination(dst);
    if fs::rename(src, &target).is_err() {
        fs::copy(src, &target)?;
        if let Err(e) = fs::remove_file(src) {
            let _ = fs::remove_file(&target);
            return Err(e);
        }
    }
    trace!("Moved {} -> {}", src.display(), target.display());
    Ok(target)
}

pub fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}
