use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::{tempdir, TempDir};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use roster_sort_core::archive::Capabilities;
use roster_sort_core::convert::{ConvertError, Converter};
use roster_sort_core::{AppConfig, Error, OrganizeEngine, RunStatistics, SilentReporter};

/// Writes `<stem>.pdf` next to the document; fails for stems containing
/// "broken".
struct FakeConverter;

impl Converter for FakeConverter {
    fn target_extension(&self) -> &str {
        "pdf"
    }

    fn convert(&self, input: &Path, out_dir: &Path) -> Result<PathBuf, ConvertError> {
        let output = self.expected_output(input, out_dir);
        let name = input.file_name().unwrap_or_default().to_string_lossy();
        if name.contains("broken") {
            return Err(ConvertError::MissingOutput(output));
        }
        fs::write(&output, b"%PDF-1.4").map_err(ConvertError::Spawn)?;
        Ok(output)
    }
}

struct Fixture {
    _tmp: TempDir,
    input: PathBuf,
    output: PathBuf,
    config: AppConfig,
}

/// Layout:
///   submissions/      (input files added per test)
///   submitters.csv    (index,surname,first_name,middle_name)
///   organized/        (output root, created by the engine)
fn fixture() -> Fixture {
    let tmp = tempdir().unwrap();
    let input = tmp.path().join("submissions");
    let output = tmp.path().join("organized");
    let roster = tmp.path().join("submitters.csv");
    fs::create_dir_all(&input).unwrap();
    fs::write(
        &roster,
        "index,surname,first_name,middle_name\n\
         1,Smith,John,\n\
         7,O'Brien,Maeve,\n\
         3,Garcia,Maria,Elena\n",
    )
    .unwrap();

    let config = AppConfig {
        input_dir: input.clone(),
        output_dir: output.clone(),
        roster_path: roster,
        manifest_path: None,
        ..AppConfig::default()
    };

    Fixture {
        _tmp: tmp,
        input,
        output,
        config,
    }
}

fn engine(config: &AppConfig) -> OrganizeEngine {
    OrganizeEngine::new(config.clone())
        .with_converter(Box::new(FakeConverter))
        .with_capabilities(Capabilities::default())
}

fn write_zip(path: &Path, entries: &[(&str, &str)]) {
    let file = fs::File::create(path).unwrap();
    let mut writer = ZipWriter::new(file);
    for (name, content) in entries {
        writer.start_file(*name, SimpleFileOptions::default()).unwrap();
        writer.write_all(content.as_bytes()).unwrap();
    }
    writer.finish().unwrap();
}

fn sorted_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

fn snapshot(dir: &Path) -> Vec<(String, Vec<u8>)> {
    let mut files: Vec<(String, Vec<u8>)> = walkdir::WalkDir::new(dir)
        .into_iter()
        .map(|e| e.unwrap())
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            let rel = e.path().strip_prefix(dir).unwrap().to_string_lossy().into_owned();
            (rel, fs::read(e.path()).unwrap())
        })
        .collect();
    files.sort();
    files
}

#[test]
fn test_full_organize_pipeline() {
    let fx = fixture();
    fs::write(fx.input.join("Smith_John_essay.docx"), "essay").unwrap();
    fs::write(fx.input.join("7_Obrien_Maeve_report.docx"), "report").unwrap();
    fs::write(fx.input.join("randomfile123.png"), "png").unwrap();
    fs::write(fx.input.join(".DS_Store"), "junk").unwrap();
    fs::create_dir(fx.input.join("not_a_file")).unwrap();
    write_zip(
        &fx.input.join("garcia-maria.zip"),
        &[
            ("week1/notes.txt", "one"),
            ("week1/deep/notes.txt", "two"),
            ("draft/essay.docx", "draft"),
        ],
    );

    let stats = engine(&fx.config).organize(&SilentReporter).unwrap();

    assert_eq!(
        stats,
        RunStatistics {
            files_seen: 4,
            matched: 3,
            unmatched: 1,
            converted: 3,
            convert_failed: 0,
            skipped_existing: 0,
            placement_failed: 0,
        }
    );

    assert_eq!(
        sorted_names(&fx.output),
        vec!["1_Smith_John", "3_Garcia_Maria", "7_O_Brien_Maeve"]
    );
    assert_eq!(
        sorted_names(&fx.output.join("1_Smith_John")),
        vec!["Smith_John_essay.docx", "Smith_John_essay.pdf"]
    );
    assert_eq!(
        sorted_names(&fx.output.join("7_O_Brien_Maeve")),
        vec!["7_Obrien_Maeve_report.docx", "7_Obrien_Maeve_report.pdf"]
    );
    // Archive is extracted and flattened, not copied
    assert_eq!(
        sorted_names(&fx.output.join("3_Garcia_Maria")),
        vec!["essay.docx", "essay.pdf", "notes.txt", "notes_1.txt"]
    );

    // Unmatched input is left in place
    assert!(fx.input.join("randomfile123.png").exists());
    assert!(fx.input.join("Smith_John_essay.docx").exists());
}

#[test]
fn test_rerun_is_idempotent() {
    let fx = fixture();
    fs::write(fx.input.join("Smith_John_essay.docx"), "essay").unwrap();
    fs::write(fx.input.join("Garcia_Maria_photo.jpg"), "jpg").unwrap();
    fs::write(fx.input.join("7_Obrien_Maeve_report.docx"), "report").unwrap();
    fs::write(fx.input.join("randomfile123.png"), "png").unwrap();
    write_zip(
        &fx.input.join("garcia-maria.zip"),
        &[
            ("essay.docx", "zipped essay"),
            ("draft/notes.txt", "draft notes"),
            ("final/notes.txt", "final notes"),
        ],
    );

    let first = engine(&fx.config).organize(&SilentReporter).unwrap();
    let tree_after_first = snapshot(&fx.output);

    let second = engine(&fx.config).organize(&SilentReporter).unwrap();
    let tree_after_second = snapshot(&fx.output);

    let third = engine(&fx.config).organize(&SilentReporter).unwrap();
    let tree_after_third = snapshot(&fx.output);

    assert_eq!(first.matched, 4);
    assert_eq!(first.converted, 3);
    assert_eq!(
        sorted_names(&fx.output.join("3_Garcia_Maria")),
        vec![
            "Garcia_Maria_photo.jpg",
            "essay.docx",
            "essay.pdf",
            "notes.txt",
            "notes_1.txt"
        ]
    );

    // Plain files are skipped; the archive is re-extracted but adds nothing
    assert_eq!(second.skipped_existing, 3);
    assert_eq!(second.matched, first.matched);
    assert_eq!(second.converted, 0);
    assert_eq!(second.unmatched, first.unmatched);
    assert_eq!(third.converted, 0);
    assert_eq!(tree_after_first, tree_after_second);
    assert_eq!(tree_after_first, tree_after_third);
}

#[test]
fn test_conversion_catches_up_on_later_run() {
    let fx = fixture();
    fs::write(fx.input.join("Smith_John_essay.docx"), "essay").unwrap();

    let mut no_convert = fx.config.clone();
    no_convert.convert = false;
    let first = engine(&no_convert).organize(&SilentReporter).unwrap();
    assert_eq!(first.converted, 0);
    assert!(!fx.output.join("1_Smith_John/Smith_John_essay.pdf").exists());

    // Placement is a no-op, but the folder visit still converts
    let second = engine(&fx.config).organize(&SilentReporter).unwrap();
    assert_eq!(second.skipped_existing, 1);
    assert_eq!(second.converted, 1);
    assert!(fx.output.join("1_Smith_John/Smith_John_essay.pdf").exists());
}

#[test]
fn test_failures_are_counted_not_fatal() {
    let fx = fixture();
    fs::write(fx.input.join("broken_smith_john.docx"), "bad doc").unwrap();
    fs::write(fx.input.join("maria-garcia-corrupt.zip"), "not a zip").unwrap();
    fs::write(fx.input.join("smith-john-late.docx"), "late").unwrap();

    let stats = engine(&fx.config).organize(&SilentReporter).unwrap();

    assert_eq!(stats.files_seen, 3);
    assert_eq!(stats.matched, 3);
    assert_eq!(stats.placement_failed, 1);
    assert_eq!(stats.converted, 1);
    // The broken document is retried on the second folder visit
    assert_eq!(stats.convert_failed, 2);
    assert_eq!(sorted_names(&fx.output.join("3_Garcia_Maria")), Vec::<String>::new());
}

#[test]
fn test_existing_files_are_never_overwritten() {
    let fx = fixture();
    let folder = fx.output.join("1_Smith_John");
    fs::create_dir_all(&folder).unwrap();
    fs::write(folder.join("Smith_John_notes.txt"), "from earlier run").unwrap();

    fs::write(fx.input.join("Smith_John_notes.txt"), "resubmitted").unwrap();
    fs::write(fx.input.join("notes.txt"), "anonymous").unwrap();

    let stats = engine(&fx.config).organize(&SilentReporter).unwrap();
    assert_eq!(stats.matched, 1);
    assert_eq!(stats.unmatched, 1);
    assert_eq!(stats.skipped_existing, 1);
    assert_eq!(
        fs::read_to_string(folder.join("Smith_John_notes.txt")).unwrap(),
        "from earlier run"
    );
    assert_eq!(sorted_names(&folder), vec!["Smith_John_notes.txt"]);
}

#[test]
fn test_rar_without_codec_is_skipped() {
    let fx = fixture();
    fs::write(fx.input.join("Smith_John_bundle.rar"), "rar bytes").unwrap();

    let stats = engine(&fx.config).organize(&SilentReporter).unwrap();
    assert_eq!(stats.matched, 1);
    assert_eq!(stats.placement_failed, 0);
    assert!(sorted_names(&fx.output.join("1_Smith_John")).is_empty());
}

#[test]
fn test_dry_run_leaves_filesystem_untouched() {
    let fx = fixture();
    fs::write(fx.input.join("Smith_John_essay.docx"), "essay").unwrap();
    fs::write(fx.input.join("randomfile123.png"), "png").unwrap();

    let stats = engine(&fx.config)
        .dry_run(true)
        .organize(&SilentReporter)
        .unwrap();

    assert_eq!(stats.matched, 1);
    assert_eq!(stats.unmatched, 1);
    assert_eq!(stats.converted, 0);
    assert!(!fx.output.exists());
}

#[test]
fn test_ignore_patterns_skip_files() {
    let mut fx = fixture();
    fs::write(fx.input.join("Smith_John_essay.docx"), "essay").unwrap();
    fs::write(fx.input.join("Smith_John_essay.tmp"), "tmp").unwrap();
    fx.config.ignore_patterns = vec!["*.tmp".to_string()];

    let stats = engine(&fx.config).organize(&SilentReporter).unwrap();
    assert_eq!(stats.files_seen, 1);
    assert!(!fx.output.join("1_Smith_John/Smith_John_essay.tmp").exists());
}

#[test]
fn test_manifest_records_each_file() {
    let mut fx = fixture();
    fs::write(fx.input.join("Smith_John_essay.docx"), "essay").unwrap();
    fs::write(fx.input.join("randomfile123.png"), "png").unwrap();
    let manifest = fx.output.join("manifest.csv");
    fx.config.manifest_path = Some(manifest.clone());

    engine(&fx.config).organize(&SilentReporter).unwrap();

    let mut reader = csv::Reader::from_path(&manifest).unwrap();
    let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), 2);
    // Lexicographic input order: "Smith..." sorts before "random..."
    assert_eq!(&rows[0][2], "copied");
    assert_eq!(&rows[0][4], "1");
    assert_eq!(&rows[0][5], "token");
    assert_eq!(&rows[1][2], "unmatched");
}

#[test]
fn test_missing_inputs_are_fatal() {
    let fx = fixture();

    let mut missing_dir = fx.config.clone();
    missing_dir.input_dir = fx.input.join("nope");
    let err = engine(&missing_dir).organize(&SilentReporter).unwrap_err();
    assert!(matches!(err, Error::MissingInput(_)));

    let mut missing_roster = fx.config.clone();
    missing_roster.roster_path = fx.input.join("nope.csv");
    let err = engine(&missing_roster).organize(&SilentReporter).unwrap_err();
    assert!(matches!(err, Error::MissingRoster(_)));
}

#[test]
fn test_missing_converter_is_fatal_when_enabled() {
    let mut fx = fixture();
    fx.config.converter_program = "roster-sort-no-such-converter".to_string();

    let err = OrganizeEngine::new(fx.config.clone())
        .with_capabilities(Capabilities::default())
        .organize(&SilentReporter)
        .unwrap_err();
    assert!(matches!(err, Error::ToolNotFound(_)));

    fx.config.convert = false;
    let stats = OrganizeEngine::new(fx.config.clone())
        .with_capabilities(Capabilities::default())
        .organize(&SilentReporter)
        .unwrap();
    assert_eq!(stats.files_seen, 0);
}
