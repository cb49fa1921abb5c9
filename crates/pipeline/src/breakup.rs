//! Stage 2: payout breakup block extraction.
//!
//! A fixed 31x5 region from each file's "Payout Breakup" sheet, joined by
//! file name against the summary index, appended to the output tab with a
//! running serial number. The serial continues from the tab's existing
//! maximum, so it never resets across runs unless the tab is deleted.

use std::path::Path;

use payhub_io::{Book, Cell, SourceBook};

use crate::error::PipelineError;
use crate::layout::{BREAKUP_HEADERS, BREAKUP_REGION, BREAKUP_SHEET, BREAKUP_TAB, SOURCE_EXTENSIONS};
use crate::report::StageReport;
use crate::scan::scan_folder;
use crate::summary::SummaryIndex;

/// Run stage 2. Rows are only ever appended; a per-file failure (missing
/// sheet, read error, no summary row to join against) commits zero rows for
/// that file.
pub fn run_breakup(
    input_dir: &Path,
    book: &mut Book,
    index: &SummaryIndex,
) -> Result<StageReport, PipelineError> {
    let mut report = StageReport::default();
    let entries = scan_folder(input_dir, SOURCE_EXTENSIONS)?;

    let tab = book.tab_or_create(BREAKUP_TAB, BREAKUP_HEADERS);
    let mut serial = tab.max_serial() + 1;

    for entry in entries.iter().filter(|e| e.supported) {
        let block = match extract_block(&entry.path) {
            Ok(block) => block,
            Err(e) => {
                report.note(format!("error processing file {}: {}", entry.file_name, e));
                continue;
            }
        };

        let Some(meta) = index.get(&entry.file_name) else {
            report.note(format!(
                "error processing file {}: no Summary row for this file",
                entry.file_name
            ));
            continue;
        };

        for source_row in block {
            let mut row = Vec::with_capacity(BREAKUP_HEADERS.len());
            row.push(Cell::Number(serial as f64));
            row.extend(source_row);
            row.push(meta.brand.clone());
            row.push(meta.res_id.clone());
            row.push(meta.payout_period.clone());
            row.push(Cell::text(entry.file_name.clone()));
            tab.append_row(row);
            serial += 1;
            report.rows_written += 1;
        }
        report.files_processed += 1;
    }

    Ok(report)
}

fn extract_block(path: &Path) -> Result<Vec<Vec<Cell>>, String> {
    let mut source = SourceBook::open(path)?;
    let grid = source.sheet(BREAKUP_SHEET)?;
    Ok(grid.region(&BREAKUP_REGION))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{BREAKUP_TAB, SUMMARY_TAB};
    use crate::summary::tests::write_source;
    use crate::summary::run_summary;
    use payhub_io::Tab;

    /// Add a "Payout Breakup" sheet with `n` populated rows to an existing
    /// source workbook on disk.
    fn add_breakup_sheet(path: &Path, n: usize) {
        let mut book = Book::load(path).unwrap();
        let mut tab = Tab::new(BREAKUP_SHEET);
        for i in 0..n {
            let r = BREAKUP_REGION.start_row as usize + i;
            tab.set(r, 1, Cell::text(format!("Category {i}")));
            tab.set(r, 2, Cell::text("Particulars"));
            tab.set(r, 3, Cell::Number(10.0 + i as f64));
            tab.set(r, 4, Cell::Number(1.0));
            tab.set(r, 5, Cell::Number(11.0 + i as f64));
        }
        book.tabs.push(tab);
        book.save(path).unwrap();
    }

    fn setup() -> (tempfile::TempDir, Book, SummaryIndex) {
        let dir = tempfile::tempdir().unwrap();
        let a = write_source(dir.path(), "rest_a.xlsx", "Spice Route", 101.0, "wk1");
        add_breakup_sheet(&a, 3);

        let mut book = Book::new();
        let out = run_summary(dir.path(), &mut book).unwrap();
        (dir, book, out.index)
    }

    #[test]
    fn test_fixed_31_rows_per_file() {
        let (dir, mut book, index) = setup();
        let report = run_breakup(dir.path(), &mut book, &index).unwrap();

        // 31 rows regardless of the 3 populated source rows
        assert_eq!(report.rows_written, 31);
        let tab = book.tab(BREAKUP_TAB).unwrap();
        assert_eq!(tab.data_rows().len(), 31);

        let first = &tab.data_rows()[0];
        assert_eq!(first[0], Cell::Number(1.0));
        assert_eq!(first[1], Cell::Text("Category 0".into()));
        assert_eq!(first[6], Cell::Text("Spice Route".into()));
        assert_eq!(first[7], Cell::Number(101.0));
        assert_eq!(first[9], Cell::Text("rest_a.xlsx".into()));

        // Padding rows carry serial + metadata but empty source cells
        let last = &tab.data_rows()[30];
        assert_eq!(last[0], Cell::Number(31.0));
        assert!(last[1..6].iter().all(|c| c.is_empty()));
    }

    #[test]
    fn test_serials_continue_across_runs() {
        let (dir, mut book, index) = setup();
        run_breakup(dir.path(), &mut book, &index).unwrap();
        run_breakup(dir.path(), &mut book, &index).unwrap();

        let tab = book.tab(BREAKUP_TAB).unwrap();
        // Re-running duplicates rows; that is the expected behavior
        assert_eq!(tab.data_rows().len(), 62);
        let serials: Vec<i64> = tab
            .data_rows()
            .iter()
            .map(|r| r[0].as_number().unwrap() as i64)
            .collect();
        // Strictly increasing by one, never reset
        assert_eq!(serials, (1..=62).collect::<Vec<i64>>());
    }

    #[test]
    fn test_file_without_summary_row_commits_nothing() {
        let (dir, mut book, index) = setup();
        // A second file with a breakup sheet but no Summary sheet, so it has
        // no index entry
        let path = dir.path().join("orphan.xlsx");
        Book { tabs: vec![Tab::new("Other")] }.save(&path).unwrap();
        add_breakup_sheet(&path, 2);

        let report = run_breakup(dir.path(), &mut book, &index).unwrap();
        assert_eq!(report.files_processed, 1);
        assert_eq!(report.rows_written, 31);
        assert!(report
            .notes
            .iter()
            .any(|n| n.contains("orphan.xlsx") && n.contains("no Summary row")));

        // No partial rows from the orphan
        let tab = book.tab(BREAKUP_TAB).unwrap();
        assert!(tab
            .data_rows()
            .iter()
            .all(|r| r[9].as_text() == "rest_a.xlsx"));
    }

    #[test]
    fn test_missing_breakup_sheet_skips_file() {
        let dir = tempfile::tempdir().unwrap();
        write_source(dir.path(), "rest_a.xlsx", "Spice Route", 101.0, "wk1");
        // No breakup sheet added

        let mut book = Book::new();
        let out = run_summary(dir.path(), &mut book).unwrap();
        let report = run_breakup(dir.path(), &mut book, &out.index).unwrap();

        assert_eq!(report.rows_written, 0);
        assert!(report.notes.iter().any(|n| n.contains("rest_a.xlsx")));
        // Tab exists with header only
        assert_eq!(book.tab(BREAKUP_TAB).unwrap().rows.len(), 1);
    }

    #[test]
    fn test_summary_tab_survives_alongside() {
        let (dir, mut book, index) = setup();
        run_breakup(dir.path(), &mut book, &index).unwrap();
        assert!(book.tab(SUMMARY_TAB).is_some());
        assert_eq!(book.tab(SUMMARY_TAB).unwrap().data_rows().len(), 1);
    }
}
