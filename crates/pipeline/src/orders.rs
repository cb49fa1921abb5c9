//! Stage 3: order-level row extraction.
//!
//! Every row below the fixed header region of each file's "Order Level"
//! sheet, all columns, prefixed with the join metadata. Output headers are
//! bootstrapped once from the first candidate file; row widths are
//! file-dependent and deliberately not validated against the header.

use std::path::Path;

use payhub_io::{Book, Cell, SourceBook};

use crate::error::PipelineError;
use crate::layout::{
    ORDER_DATA_START_ROW, ORDER_HEADER_ROW, ORDER_PREFIX_HEADERS, ORDER_SHEET, ORDER_TAB,
    SOURCE_EXTENSIONS,
};
use crate::report::StageReport;
use crate::scan::scan_folder;
use crate::summary::SummaryIndex;

pub fn run_orders(
    input_dir: &Path,
    book: &mut Book,
    index: &SummaryIndex,
) -> Result<StageReport, PipelineError> {
    let mut report = StageReport::default();
    let entries = scan_folder(input_dir, SOURCE_EXTENSIONS)?;
    let candidates: Vec<_> = entries.iter().filter(|e| e.supported).collect();

    // Create the tab once, with headers taken from the first candidate's
    // Order Level sheet. A failed sample read falls back to the metadata
    // prefix alone.
    if book.tab(ORDER_TAB).is_none() {
        let mut header: Vec<Cell> =
            ORDER_PREFIX_HEADERS.iter().map(|h| Cell::text(*h)).collect();
        if let Some(sample) = candidates.first() {
            match sample_headers(&sample.path) {
                Ok(cells) => header.extend(cells),
                Err(e) => report.note(format!(
                    "could not read '{}' headers from {}: {}",
                    ORDER_SHEET, sample.file_name, e
                )),
            }
        }
        book.replace_tab(ORDER_TAB, vec![header]);
    }

    let Some(tab) = book.tab_mut(ORDER_TAB) else {
        // Just created above; only reachable if the tab list was mutated
        // concurrently, which the single-threaded model rules out.
        return Ok(report);
    };

    for entry in &candidates {
        let rows = match extract_rows(&entry.path) {
            Ok(rows) => rows,
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

        for source_row in rows {
            let mut row = Vec::with_capacity(ORDER_PREFIX_HEADERS.len() + source_row.len());
            row.push(meta.brand.clone());
            row.push(meta.res_id.clone());
            row.push(meta.payout_period.clone());
            row.push(Cell::text(entry.file_name.clone()));
            row.extend(source_row);
            tab.append_row(row);
            report.rows_written += 1;
        }
        report.files_processed += 1;
    }

    Ok(report)
}

fn sample_headers(path: &Path) -> Result<Vec<Cell>, String> {
    let mut source = SourceBook::open(path)?;
    let grid = source.sheet(ORDER_SHEET)?;
    Ok(grid.row(ORDER_HEADER_ROW))
}

fn extract_rows(path: &Path) -> Result<Vec<Vec<Cell>>, String> {
    let mut source = SourceBook::open(path)?;
    let grid = source.sheet(ORDER_SHEET)?;
    Ok(grid.rows_from(ORDER_DATA_START_ROW))
}
