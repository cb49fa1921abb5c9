use std::fmt;
use std::path::PathBuf;

/// Stage-fatal conditions. Per-file failures never surface here; they are
/// logged in the stage report and the run continues.
#[derive(Debug)]
pub enum PipelineError {
    /// Input folder missing or unreadable.
    InputDir { dir: PathBuf, source: String },
    /// The Summary tab needed to build the join index is missing.
    MissingSummaryTab,
    /// The Summary tab exists but lacks a required column.
    MissingColumn { tab: String, column: String },
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InputDir { dir, source } => {
                write!(f, "cannot read input folder {}: {}", dir.display(), source)
            }
            Self::MissingSummaryTab => {
                write!(f, "the consolidated workbook has no Summary tab")
            }
            Self::MissingColumn { tab, column } => {
                write!(f, "tab '{tab}': missing column '{column}'")
            }
        }
    }
}

impl std::error::Error for PipelineError {}
