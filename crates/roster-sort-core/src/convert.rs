use crate::error::Error;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("failed to start converter: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("converter timed out after {0}s")]
    Timeout(u64),

    #[error("converter exited with {0}")]
    Failed(std::process::ExitStatus),

    #[error("converter produced no output at {}", .0.display())]
    MissingOutput(PathBuf),
}

/// Turns one document into a same-stem file with the target extension
/// inside `out_dir`.
pub trait Converter {
    fn target_extension(&self) -> &str;

    fn convert(&self, input: &Path, out_dir: &Path) -> Result<PathBuf, ConvertError>;

    /// Where `convert` is expected to place the output for `input`.
    fn expected_output(&self, input: &Path, out_dir: &Path) -> PathBuf {
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        out_dir.join(format!("{}.{}", stem, self.target_extension()))
    }
}

/// LibreOffice-compatible headless converter run as a subprocess.
#[derive(Debug, Clone)]
pub struct OfficeConverter {
    program: PathBuf,
    target_extension: String,
    timeout: Duration,
}

impl OfficeConverter {
    pub fn new(program: PathBuf, target_extension: &str, timeout: Duration) -> Self {
        Self {
            program,
            target_extension: target_extension.to_string(),
            timeout,
        }
    }

    /// Resolve `program` on PATH; a missing converter is a configuration
    /// error.
    pub fn locate(program: &str, target_extension: &str, timeout: Duration) -> Result<Self, Error> {
        let resolved =
            which::which(program).map_err(|_| Error::ToolNotFound(program.to_string()))?;
        debug!("Using converter at {}", resolved.display());
        Ok(Self::new(resolved, target_extension, timeout))
    }
}

impl Converter for OfficeConverter {
    fn target_extension(&self) -> &str {
        &self.target_extension
    }

    fn convert(&self, input: &Path, out_dir: &Path) -> Result<PathBuf, ConvertError> {
        let mut child = Command::new(&self.program)
            .arg("--headless")
            .arg("--convert-to")
            .arg(&self.target_extension)
            .arg("--outdir")
            .arg(out_dir)
            .arg(input)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;

        let started = Instant::now();
        let status = loop {
            match child.try_wait()? {
                Some(status) => break status,
                None => {
                    if started.elapsed() > self.timeout {
                        let _ = child.kill();
                        let _ = child.wait();
                        return Err(ConvertError::Timeout(self.timeout.as_secs()));
                    }
                    thread::sleep(Duration::from_millis(100));
                }
            }
        };

        if !status.success() {
            return Err(ConvertError::Failed(status));
        }

        let output = self.expected_output(input, out_dir);
        if output.exists() {
            Ok(output)
        } else {
            Err(ConvertError::MissingOutput(output))
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ConversionTally {
    pub converted: usize,
    pub failed: usize,
}

/// Convert every document under `folder` whose extension is in
/// `extensions` and that has no converted sibling yet.
///
/// Already-converted documents are never touched again.
pub fn conversion_pass(
    folder: &Path,
    converter: &dyn Converter,
    extensions: &[String],
) -> ConversionTally {
    let pending: Vec<PathBuf> = WalkDir::new(folder)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| has_extension(path, extensions))
        .filter(|path| {
            let dir = path.parent().unwrap_or(folder);
            !converter.expected_output(path, dir).exists()
        })
        .collect();

    let mut tally = ConversionTally::default();
    for document in pending {
        let dir = document.parent().unwrap_or(folder);
        match converter.convert(&document, dir) {
            Ok(output) => {
                info!("Converted {} -> {}", document.display(), output.display());
                tally.converted += 1;
            }
            Err(e) => {
                warn!("Failed converting {}: {}", document.display(), e);
                tally.failed += 1;
            }
        }
    }
    tally
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .map_or(false, |e| extensions.iter().any(|wanted| wanted.eq_ignore_ascii_case(&e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::fs;
    use tempfile::tempdir;

    /// Writes the expected output unless the stem contains "broken".
    struct FakeConverter {
        calls: RefCell<Vec<PathBuf>>,
    }

    impl Converter for FakeConverter {
        fn target_extension(&self) -> &str {
            "pdf"
        }

        fn convert(&self, input: &Path, out_dir: &Path) -> Result<PathBuf, ConvertError> {
            self.calls.borrow_mut().push(input.to_path_buf());
            let output = self.expected_output(input, out_dir);
            if input.file_name().unwrap_or_default().to_string_lossy().contains("broken") {
                return Err(ConvertError::MissingOutput(output));
            }
            fs::write(&output, "pdf").unwrap();
            Ok(output)
        }
    }

    #[test]
    fn test_conversion_is_at_most_once() {
        let tmp = tempdir().unwrap();
        let folder = tmp.path();
        fs::write(folder.join("essay.docx"), "d").unwrap();
        fs::write(folder.join("done.docx"), "d").unwrap();
        fs::write(folder.join("done.pdf"), "p").unwrap();
        fs::write(folder.join("broken.DOCX"), "d").unwrap();
        fs::write(folder.join("image.png"), "i").unwrap();

        let converter = FakeConverter {
            calls: RefCell::new(Vec::new()),
        };
        let exts = vec!["docx".to_string()];

        let first = conversion_pass(folder, &converter, &exts);
        assert_eq!(first, ConversionTally { converted: 1, failed: 1 });
        assert!(folder.join("essay.pdf").exists());

        // Second visit only retries the failure
        let second = conversion_pass(folder, &converter, &exts);
        assert_eq!(second, ConversionTally { converted: 0, failed: 1 });
        assert_eq!(converter.calls.borrow().len(), 3);
    }

    #[test]
    fn test_expected_output_uses_stem() {
        let converter = FakeConverter {
            calls: RefCell::new(Vec::new()),
        };
        let out = converter.expected_output(Path::new("/in/7_Obrien_Maeve_report.docx"), Path::new("/out"));
        assert_eq!(out, PathBuf::from("/out/7_Obrien_Maeve_report.pdf"));
    }

    #[test]
    fn test_missing_program_is_tool_not_found() {
        let err = OfficeConverter::locate(
            "roster-sort-no-such-converter",
            "pdf",
            Duration::from_secs(1),
        )
        .unwrap_err();
        assert!(matches!(err, Error::ToolNotFound(_)));
    }

    #[cfg(unix)]
    #[test]
    fn test_office_converter_reports_exit_status() {
        let converter = OfficeConverter::new(PathBuf::from("false"), "pdf", Duration::from_secs(5));
        let tmp = tempdir().unwrap();
        let input = tmp.path().join("a.docx");
        fs::write(&input, "d").unwrap();

        let err = converter.convert(&input, tmp.path()).unwrap_err();
        assert!(matches!(err, ConvertError::Failed(_)), "got {err}");
        assert!(!tmp.path().join("a.pdf").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_office_converter_kills_hung_process() {
        use std::io::Write;
        use std::os::unix::fs::PermissionsExt;

        let tmp = tempdir().unwrap();
        let script = tmp.path().join("hang.sh");
        {
            let mut file = fs::File::create(&script).unwrap();
            file.write_all(b"#!/bin/sh\nsleep 5\n").unwrap();
            file.sync_all().unwrap();
        }
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();

        let input = tmp.path().join("slow.docx");
        fs::write(&input, "d").unwrap();
        let converter = OfficeConverter::new(script, "pdf", Duration::from_secs(1));

        let started = Instant::now();
        let err = converter.convert(&input, tmp.path()).unwrap_err();
        assert!(matches!(err, ConvertError::Timeout(1)), "got {err}");
        assert!(started.elapsed() < Duration::from_secs(4));
        assert!(!tmp.path().join("slow.pdf").exists());
    }
}
