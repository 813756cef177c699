use crate::engine::{FileOutcome, RunStatistics};

/// Trait for reporting organize progress.
///
/// CLI implements with indicatif. All methods have default no-op
/// implementations.
pub trait ProgressReporter {
    fn on_run_start(&self, _total_files: usize) {}
    fn on_file_start(&self, _file_name: &str) {}
    fn on_file_complete(&self, _file_name: &str, _outcome: &FileOutcome) {}
    fn on_run_complete(&self, _stats: &RunStatistics) {}
}

/// No-op progress reporter for silent operation.
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {}
