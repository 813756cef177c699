use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Roster error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Roster file not found: {}", .0.display())]
    MissingRoster(PathBuf),

    #[error("Input directory not found: {}", .0.display())]
    MissingInput(PathBuf),

    #[error("Required tool '{0}' not found in PATH")]
    ToolNotFound(String),

    #[error("{0}")]
    Other(String),
}
