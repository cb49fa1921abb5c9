//! Stage 1: fixed-cell summary extraction, plus the join index the later
//! stages consume.
//!
//! One row per source file, copied verbatim from the cells named in
//! [`crate::layout::SUMMARY_FIELDS`]. The file name is the unique key; a file
//! that fails here is absent from the index and is therefore skipped by
//! stages 2 and 3.

use std::collections::HashMap;
use std::path::Path;

use payhub_io::{Book, Cell, SourceBook, Tab};

use crate::error::PipelineError;
use crate::layout::{
    summary_headers, FIELD_BRAND, FIELD_PAYOUT_PERIOD, FIELD_RES_ID, FILE_NAME_HEADER,
    SOURCE_EXTENSIONS, SUMMARY_FIELDS, SUMMARY_SHEET, SUMMARY_TAB,
};
use crate::report::StageReport;
use crate::scan::scan_folder;

/// One parsed source file: the mapped field values in
/// [`SUMMARY_FIELDS`] order, plus the file name.
#[derive(Debug, Clone)]
pub struct SummaryRecord {
    pub values: Vec<Cell>,
    pub file_name: String,
}

impl SummaryRecord {
    pub fn brand(&self) -> &Cell {
        &self.values[FIELD_BRAND]
    }

    pub fn res_id(&self) -> &Cell {
        &self.values[FIELD_RES_ID]
    }

    pub fn payout_period(&self) -> &Cell {
        &self.values[FIELD_PAYOUT_PERIOD]
    }

    fn to_row(&self) -> Vec<Cell> {
        let mut row = self.values.clone();
        row.push(Cell::text(self.file_name.clone()));
        row
    }
}

/// Join metadata attached to breakup and order rows.
#[derive(Debug, Clone)]
pub struct SummaryMeta {
    pub brand: Cell,
    pub res_id: Cell,
    pub payout_period: Cell,
}

/// File name → join metadata, built once and shared read-only by stages 2
/// and 3.
#[derive(Debug, Default)]
pub struct SummaryIndex {
    map: HashMap<String, SummaryMeta>,
}

impl SummaryIndex {
    pub fn from_records(records: &[SummaryRecord]) -> SummaryIndex {
        let map = records
            .iter()
            .map(|r| {
                (
                    r.file_name.clone(),
                    SummaryMeta {
                        brand: r.brand().clone(),
                        res_id: r.res_id().clone(),
                        payout_period: r.payout_period().clone(),
                    },
                )
            })
            .collect();
        SummaryIndex { map }
    }

    /// Rebuild the index from a saved Summary tab. Columns are located by
    /// header name, not position, so extra or reordered columns don't break
    /// standalone stage runs.
    pub fn from_tab(tab: &Tab) -> Result<SummaryIndex, SummaryIndexError> {
        let header = tab.rows.first().ok_or_else(|| SummaryIndexError {
            column: FILE_NAME_HEADER.to_string(),
        })?;

        let col = |name: &str| -> Result<usize, SummaryIndexError> {
            header
                .iter()
                .position(|c| c.as_text() == name)
                .ok_or_else(|| SummaryIndexError { column: name.to_string() })
        };

        let brand_col = col(SUMMARY_FIELDS[FIELD_BRAND].0)?;
        let res_id_col = col(SUMMARY_FIELDS[FIELD_RES_ID].0)?;
        let period_col = col(SUMMARY_FIELDS[FIELD_PAYOUT_PERIOD].0)?;
        let file_col = col(FILE_NAME_HEADER)?;

        let cell = |row: &[Cell], idx: usize| row.get(idx).cloned().unwrap_or(Cell::Empty);

        let mut map = HashMap::new();
        for row in tab.data_rows() {
            let file_name = cell(row, file_col).as_text();
            if file_name.is_empty() {
                continue;
            }
            map.insert(
                file_name,
                SummaryMeta {
                    brand: cell(row, brand_col),
                    res_id: cell(row, res_id_col),
                    payout_period: cell(row, period_col),
                },
            );
        }
        Ok(SummaryIndex { map })
    }

    pub fn get(&self, file_name: &str) -> Option<&SummaryMeta> {
        self.map.get(file_name)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// A required column was missing when rebuilding the index from disk.
#[derive(Debug)]
pub struct SummaryIndexError {
    pub column: String,
}

impl From<SummaryIndexError> for PipelineError {
    fn from(e: SummaryIndexError) -> PipelineError {
        PipelineError::MissingColumn { tab: SUMMARY_TAB.to_string(), column: e.column }
    }
}

/// What stage 1 hands back: the index for stages 2/3 plus the run report.
#[derive(Debug)]
pub struct SummaryOutput {
    pub index: SummaryIndex,
    pub report: StageReport,
}

/// Run stage 1: extract one summary row per source file and overwrite the
/// output Summary tab (header + rows). With zero parsed files the tab is
/// left untouched.
pub fn run_summary(input_dir: &Path, book: &mut Book) -> Result<SummaryOutput, PipelineError> {
    let mut report = StageReport::default();
    let mut records: Vec<SummaryRecord> = Vec::new();

    for entry in scan_folder(input_dir, SOURCE_EXTENSIONS)? {
        if !entry.supported {
            report.note(format!("skipping unsupported file format: {}", entry.file_name));
            continue;
        }
        match extract_record(&entry.path, &entry.file_name) {
            Ok(Some(record)) => records.push(record),
            Ok(None) => {
                report.note(format!("'{}' sheet not found in {}", SUMMARY_SHEET, entry.file_name));
            }
            Err(e) => {
                report.note(format!("could not process {}: {}", entry.file_name, e));
            }
        }
    }

    if records.is_empty() {
        report.note("no summary data extracted");
        return Ok(SummaryOutput { index: SummaryIndex::default(), report });
    }

    let mut rows: Vec<Vec<Cell>> = Vec::with_capacity(records.len() + 1);
    rows.push(summary_headers().iter().map(|h| Cell::text(*h)).collect());
    rows.extend(records.iter().map(SummaryRecord::to_row));
    book.replace_tab(SUMMARY_TAB, rows);

    report.files_processed = records.len();
    report.rows_written = records.len();
    let index = SummaryIndex::from_records(&records);
    Ok(SummaryOutput { index, report })
}

/// Read the mapped cells from one file. `Ok(None)` means the file has no
/// Summary sheet (skip with a note); `Err` is any other per-file failure.
fn extract_record(path: &Path, file_name: &str) -> Result<Option<SummaryRecord>, String> {
    let mut source = SourceBook::open(path)?;
    if !source.has_sheet(SUMMARY_SHEET) {
        return Ok(None);
    }
    let grid = source.sheet(SUMMARY_SHEET)?;
    let values = SUMMARY_FIELDS
        .iter()
        .map(|(_, at)| grid.cell(at.row, at.col))
        .collect();
    Ok(Some(SummaryRecord { values, file_name: file_name.to_string() }))
}
