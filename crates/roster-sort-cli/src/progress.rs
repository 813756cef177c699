use indicatif::{ProgressBar, ProgressStyle};
use roster_sort_core::engine::FileOutcome;
use roster_sort_core::{ProgressReporter, RunStatistics};
use std::sync::Mutex;

/// CLI progress reporter: one bar over the input files.
pub struct CliReporter {
    bar: Mutex<Option<ProgressBar>>,
}

impl CliReporter {
    pub fn new() -> Self {
        Self {
            bar: Mutex::new(None),
        }
    }
}

impl ProgressReporter for CliReporter {
    fn on_run_start(&self, total_files: usize) {
        let pb = ProgressBar::new(total_files as u64);
        if let Ok(style) = ProgressStyle::with_template(
            "  {spinner:.cyan} Organizing [{bar:30.cyan/dim}] {pos}/{len} {wide_msg}",
        ) {
            pb.set_style(
                style
                    .progress_chars("━╸─")
                    .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
            );
        }
        pb.enable_steady_tick(std::time::Duration::from_millis(80));
        if let Ok(mut guard) = self.bar.lock() {
            if let Some(old) = guard.replace(pb) {
                old.finish_and_clear();
            }
        }
    }

    fn on_file_start(&self, file_name: &str) {
        if let Ok(guard) = self.bar.lock() {
            if let Some(pb) = guard.as_ref() {
                pb.set_message(file_name.to_string());
            }
        }
    }

    fn on_file_complete(&self, _file_name: &str, _outcome: &FileOutcome) {
        if let Ok(guard) = self.bar.lock() {
            if let Some(pb) = guard.as_ref() {
                pb.inc(1);
            }
        }
    }

    fn on_run_complete(&self, stats: &RunStatistics) {
        if let Some(pb) = self.bar.lock().ok().and_then(|mut guard| guard.take()) {
            pb.finish_and_clear();
        }
        eprintln!(
            "  \x1b[32m✓\x1b[0m Organize complete: {} matched, {} unmatched",
            stats.matched, stats.unmatched
        );
    }
}
