/// What a stage did, file by file.
///
/// Notes are per-file skip/failure messages in processing order; the CLI
/// prints them verbatim. A run that only skipped files is still a success.
#[derive(Debug, Default)]
pub struct StageReport {
    /// Files (or documents) that contributed rows.
    pub files_processed: usize,
    /// Rows appended (or, for stage 1, rows written) to the output tab.
    pub rows_written: usize,
    /// Per-file warnings and skips, in order.
    pub notes: Vec<String>,
}

impl StageReport {
    pub fn note(&mut self, msg: impl Into<String>) {
        self.notes.push(msg.into());
    }
}
