use crate::archive::{self, ArchiveKind, Capabilities, ExtractOutcome};
use crate::config::AppConfig;
use crate::convert::{self, ConversionTally, Converter, OfficeConverter};
use crate::error::Error;
use crate::fsops;
use crate::manifest::{ManifestEntry, ManifestWriter};
use crate::matcher::{MatchMethod, MatchOptions, Matcher};
use crate::progress::ProgressReporter;
use crate::roster::Roster;
use glob::Pattern;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Counts for one organize run. Built by folding per-file outcomes.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunStatistics {
    pub files_seen: usize,
    pub matched: usize,
    pub unmatched: usize,
    pub converted: usize,
    pub convert_failed: usize,
    pub skipped_existing: usize,
    /// Copies or extractions that failed for a matched file.
    pub placement_failed: usize,
}

impl RunStatistics {
    pub fn record(mut self, outcome: &FileOutcome) -> Self {
        self.files_seen += 1;
        match outcome {
            FileOutcome::Unmatched => self.unmatched += 1,
            FileOutcome::Matched {
                placement,
                conversion,
                ..
            } => {
                self.matched += 1;
                self.converted += conversion.converted;
                self.convert_failed += conversion.failed;
                match placement {
                    Placement::SkippedExisting => self.skipped_existing += 1,
                    Placement::Failed(_) | Placement::Extracted(ExtractOutcome::Failed { .. }) => {
                        self.placement_failed += 1
                    }
                    _ => {}
                }
            }
        }
        self
    }
}

impl fmt::Display for RunStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "files_seen: {}", self.files_seen)?;
        writeln!(f, "matched: {}", self.matched)?;
        writeln!(f, "unmatched: {}", self.unmatched)?;
        writeln!(f, "converted: {}", self.converted)?;
        writeln!(f, "convert_failed: {}", self.convert_failed)?;
        writeln!(f, "skipped_existing_file: {}", self.skipped_existing)?;
        write!(f, "placement_failed: {}", self.placement_failed)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Placement {
    Copied(PathBuf),
    Extracted(ExtractOutcome),
    /// Same base name already present in the target folder.
    SkippedExisting,
    Failed(String),
    /// Dry run: the file would be placed here.
    Planned,
}

impl Placement {
    fn label(&self) -> &'static str {
        match self {
            Placement::Copied(_) => "copied",
            Placement::Extracted(ExtractOutcome::Extracted { .. }) => "extracted",
            Placement::Extracted(ExtractOutcome::Skipped) => "extract_skipped",
            Placement::Extracted(ExtractOutcome::Failed { .. }) => "extract_failed",
            Placement::SkippedExisting => "skipped_existing",
            Placement::Failed(_) => "failed",
            Placement::Planned => "planned",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FileOutcome {
    /// No roster record cleared either threshold; the file was not touched.
    Unmatched,
    Matched {
        record_id: String,
        folder: PathBuf,
        method: MatchMethod,
        placement: Placement,
        conversion: ConversionTally,
    },
}

pub struct OrganizeEngine {
    config: AppConfig,
    converter: Option<Box<dyn Converter>>,
    capabilities: Option<Capabilities>,
    dry_run: bool,
}

impl OrganizeEngine {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            converter: None,
            capabilities: None,
            dry_run: false,
        }
    }

    /// Use `converter` instead of locating the configured program.
    pub fn with_converter(mut self, converter: Box<dyn Converter>) -> Self {
        self.converter = Some(converter);
        self
    }

    /// Use fixed codec capabilities instead of probing at run start.
    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = Some(capabilities);
        self
    }

    /// Match and report targets without touching the filesystem.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Organize every input file into its submitter folder:
    /// 1. Validate inputs and resolve external tools once
    /// 2. Match each file (lexicographic order) against the roster
    /// 3. Copy or extract into the target folder unless already present
    /// 4. Convert documents in that folder that lack a converted sibling
    ///
    /// Only configuration problems are returned as errors; per-file
    /// failures are logged and counted.
    pub fn organize(&self, reporter: &dyn ProgressReporter) -> Result<RunStatistics, Error> {
        let config = &self.config;
        if !config.input_dir.is_dir() {
            return Err(Error::MissingInput(config.input_dir.clone()));
        }
        let roster = Roster::load(&config.roster_path)?;
        info!(
            "Loaded {} roster records from {}",
            roster.len(),
            config.roster_path.display()
        );
        if roster.is_empty() {
            warn!("Roster is empty; every file will be unmatched");
        }

        let located;
        let converter: Option<&dyn Converter> = match &self.converter {
            _ if !config.convert || self.dry_run => None,
            Some(converter) => Some(converter.as_ref()),
            None => {
                located = OfficeConverter::locate(
                    &config.converter_program,
                    &config.target_extension,
                    Duration::from_secs(config.converter_timeout_secs.max(1)),
                )?;
                Some(&located as &dyn Converter)
            }
        };
        let capabilities = self.capabilities.clone().unwrap_or_else(Capabilities::detect);

        let matcher = Matcher::new(
            roster,
            MatchOptions {
                min_token_matches: config.min_token_matches,
                fuzzy_threshold: config.fuzzy_threshold,
            },
        );

        let ignore_patterns = compile_patterns(&config.ignore_patterns);
        let inputs = list_input_files(&config.input_dir, &ignore_patterns)?;

        if !self.dry_run {
            fs::create_dir_all(&config.output_dir)?;
        }
        let mut manifest = match &config.manifest_path {
            Some(path) if !self.dry_run => Some(ManifestWriter::open(path)?),
            _ => None,
        };

        info!(
            "Organizing {} files from {} into {}",
            inputs.len(),
            config.input_dir.display(),
            config.output_dir.display()
        );
        let started = Instant::now();
        reporter.on_run_start(inputs.len());

        let stats = inputs.iter().fold(RunStatistics::default(), |stats, path| {
            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            reporter.on_file_start(&file_name);

            let outcome = self.process_file(path, &file_name, &matcher, converter, &capabilities);

            if let Some(writer) = manifest.as_mut() {
                if let Err(e) = writer.record(&manifest_entry(path, &outcome)) {
                    error!("Error writing manifest row for {}: {}", file_name, e);
                }
            }
            reporter.on_file_complete(&file_name, &outcome);
            stats.record(&outcome)
        });

        debug!(
            "Organize completed in {:.2}s: {:?}",
            started.elapsed().as_secs_f64(),
            stats
        );
        reporter.on_run_complete(&stats);
        Ok(stats)
    }

    fn process_file(
        &self,
        path: &Path,
        file_name: &str,
        matcher: &Matcher,
        converter: Option<&dyn Converter>,
        capabilities: &Capabilities,
    ) -> FileOutcome {
        let found = match matcher.find_best(file_name) {
            Some(found) => found,
            None => {
                info!("No good match found for: {}", file_name);
                return FileOutcome::Unmatched;
            }
        };

        let folder_name = found.record.folder_name();
        let folder = self.config.output_dir.join(&folder_name);
        let dest = folder.join(file_name);

        let (placement, conversion) = if self.dry_run {
            let placement = if dest.exists() {
                Placement::SkippedExisting
            } else {
                Placement::Planned
            };
            (placement, ConversionTally::default())
        } else {
            let placement = place(path, &folder, &dest, capabilities);
            let conversion = converter
                .filter(|_| folder.is_dir())
                .map(|c| convert::conversion_pass(&folder, c, &self.config.convert_extensions))
                .unwrap_or_default();
            (placement, conversion)
        };

        info!(
            "Processed '{}' → folder '{}' (match method: {}, {})",
            file_name,
            folder_name,
            found.method,
            placement.label()
        );

        FileOutcome::Matched {
            record_id: found.record.id.clone(),
            folder,
            method: found.method,
            placement,
            conversion,
        }
    }
}

/// Copy or extract `path` into `folder` unless a file with the same base
/// name is already there.
fn place(path: &Path, folder: &Path, dest: &Path, capabilities: &Capabilities) -> Placement {
    if let Err(e) = fs::create_dir_all(folder) {
        error!("Cannot create {}: {}", folder.display(), e);
        return Placement::Failed(e.to_string());
    }

    if dest.exists() {
        debug!(
            "File already present in target folder; skipping copy: {}",
            dest.display()
        );
        return Placement::SkippedExisting;
    }

    if ArchiveKind::detect(path).is_some() {
        return Placement::Extracted(archive::flatten_extract(path, folder, capabilities));
    }

    match fsops::safe_copy(path, dest) {
        Ok(written) => Placement::Copied(written),
        Err(e) => {
            error!("Error copying {}: {}", path.display(), e);
            Placement::Failed(e.to_string())
        }
    }
}

fn compile_patterns(globs: &[String]) -> Vec<Pattern> {
    globs
        .iter()
        .filter_map(|glob| match Pattern::new(glob) {
            Ok(p) => Some(p),
            Err(e) => {
                error!("Invalid glob pattern '{}': {}", glob, e);
                None
            }
        })
        .collect()
}

/// Direct, non-hidden regular files of `dir` in lexicographic order.
fn list_input_files(dir: &Path, ignore_patterns: &[Pattern]) -> Result<Vec<PathBuf>, Error> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if fsops::is_hidden(&name) {
            continue;
        }
        let path = entry.path();
        if !path.is_file() {
            debug!("Skipping non-regular entry {}", path.display());
            continue;
        }
        if ignore_patterns.iter().any(|p| p.matches(&name)) {
            debug!("Ignoring {}", name);
            continue;
        }
        files.push(path);
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

fn manifest_entry(path: &Path, outcome: &FileOutcome) -> ManifestEntry {
    match outcome {
        FileOutcome::Unmatched => ManifestEntry::new(path, "unmatched", None, None, None),
        FileOutcome::Matched {
            record_id,
            folder,
            method,
            placement,
            ..
        } => {
            let target = match placement {
                Placement::Copied(written) => written.as_path(),
                _ => folder.as_path(),
            };
            ManifestEntry::new(
                path,
                placement.label(),
                Some(target),
                Some(record_id.as_str()),
                Some(method.to_string()),
            )
        }
    }
}
