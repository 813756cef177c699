use crate::error::Error;
use std::path::Path;
use std::process::{Command, Stdio};

/// Extract a rar archive under `dest` with the external `unrar` tool.
/// Existing files are never overwritten (`-o-`).
pub fn extract_rar(tool: &Path, archive_path: &Path, dest: &Path) -> Result<(), Error> {
    // unrar treats a trailing separator as "extract into this directory"
    let mut dest_arg = dest.as_os_str().to_os_string();
    dest_arg.push(std::path::MAIN_SEPARATOR_STR);

    let status = Command::new(tool)
        .arg("x")
        .arg("-o-")
        .arg("-y")
        .arg("-idq")
        .arg(archive_path)
        .arg(dest_arg)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()?;

    if status.success() {
        Ok(())
    } else {
        Err(Error::Other(format!(
            "unrar exited with {} for {}",
            status,
            archive_path.display()
        )))
    }
}
