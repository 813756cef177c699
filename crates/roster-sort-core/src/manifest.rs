use crate::error::Error;
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use std::fs::OpenOptions;
use std::path::Path;

/// One audit row: where a source file went and how it was matched.
#[derive(Debug, Clone, Serialize)]
pub struct ManifestEntry {
    pub processed_at: String,
    pub source: String,
    pub action: &'static str,
    pub target: String,
    pub record_id: String,
    pub method: String,
}

impl ManifestEntry {
    pub fn new(
        source: &Path,
        action: &'static str,
        target: Option<&Path>,
        record_id: Option<&str>,
        method: Option<String>,
    ) -> Self {
        Self {
            processed_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            source: source.to_string_lossy().into_owned(),
            action,
            target: target
                .map(|p| p.to_string_lossy().into_owned())
                .unwrap_or_default(),
            record_id: record_id.unwrap_or_default().to_string(),
            method: method.unwrap_or_default(),
        }
    }
}

/// Appends manifest rows to a CSV file, writing the header only when the
/// file is new.
pub struct ManifestWriter {
    writer: csv::Writer<std::fs::File>,
}

impl ManifestWriter {
    pub fn open(path: &Path) -> Result<Self, Error> {
        let is_new = !path.exists() || std::fs::metadata(path)?.len() == 0;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let writer = csv::WriterBuilder::new()
            .has_headers(is_new)
            .from_writer(file);
        Ok(Self { writer })
    }

    pub fn record(&mut self, entry: &ManifestEntry) -> Result<(), Error> {
        self.writer.serialize(entry)?;
        self.writer.flush()?;
        Ok(())
    }
}
