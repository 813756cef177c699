use crate::error::Error;
use config::{Config, ConfigBuilder, Environment, File as ConfigFile};
use config::builder::DefaultState;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub roster_path: PathBuf,
    pub min_token_matches: usize,
    pub fuzzy_threshold: f64,
    /// Run the conversion pass after placement.
    pub convert: bool,
    pub converter_program: String,
    pub converter_timeout_secs: u64,
    /// Document extensions handed to the converter, without the dot.
    pub convert_extensions: Vec<String>,
    pub target_extension: String,
    /// Glob patterns on input file names to leave alone.
    pub ignore_patterns: Vec<String>,
    /// Append one CSV row per processed file when set.
    pub manifest_path: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("submissions"),
            output_dir: PathBuf::from("organized_submissions"),
            roster_path: PathBuf::from("submitters.csv"),
            min_token_matches: 2,
            fuzzy_threshold: 0.60,
            convert: true,
            converter_program: "libreoffice".to_string(),
            converter_timeout_secs: 120,
            convert_extensions: vec!["docx".to_string()],
            target_extension: "pdf".to_string(),
            ignore_patterns: Vec::new(),
            manifest_path: None,
        }
    }
}

/// Defaults, then `Config.toml` if present, then `ROSTER_SORT_*` environment
/// variables.
pub fn load_configuration() -> Result<AppConfig, Error> {
    let builder = Config::builder()
        .add_source(ConfigFile::with_name("Config").required(false))
        .add_source(
            Environment::with_prefix("ROSTER_SORT")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("convert_extensions")
                .with_list_parse_key("ignore_patterns"),
        );
    from_builder(builder)
}

fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<AppConfig, Error> {
    let config = builder.build()?.try_deserialize::<AppConfig>()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_organizer_layout() {
        let config = AppConfig::default();
        assert_eq!(config.min_token_matches, 2);
        assert_eq!(config.fuzzy_threshold, 0.60);
        assert_eq!(config.convert_extensions, vec!["docx".to_string()]);
        assert_eq!(config.target_extension, "pdf");
        assert!(config.manifest_path.is_none());
    }

    #[test]
    fn test_partial_source_keeps_defaults() {
        let config: AppConfig = Config::builder()
            .set_override("input_dir", "incoming")
            .unwrap()
            .set_override("fuzzy_threshold", 0.75)
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        assert_eq!(config.input_dir, PathBuf::from("incoming"));
        assert_eq!(config.fuzzy_threshold, 0.75);
        assert_eq!(config.output_dir, PathBuf::from("organized_submissions"));
        assert!(config.convert);
    }

    #[test]
    fn test_malformed_value_is_config_error() {
        let builder = Config::builder()
            .set_override("converter_timeout_secs", "soon")
            .unwrap();
        let err = from_builder(builder).unwrap_err();
        assert!(matches!(err, Error::Config(_)), "got {err}");
    }
}
