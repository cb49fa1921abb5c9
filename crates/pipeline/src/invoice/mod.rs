//! Stage 4: commission invoice parsing.
//!
//! Text extraction is the caller's concern (the CLI shells out to
//! `pdftotext`); this module takes the extracted text per document, parses
//! it with the v1 template, and rebuilds the Commission Invoice tab:
//! pre-existing rows are kept, new rows appended after them, and the tab
//! rewritten wholesale. Like stages 2-3, re-running duplicates rows.

pub mod commission_invoice_v1;

use std::path::Path;

use chrono::{Datelike, NaiveDate};
use payhub_io::{Book, Cell};

use crate::error::PipelineError;
use crate::layout::{INVOICE_EXTENSIONS, INVOICE_TAB};
use crate::report::StageReport;
use crate::scan::scan_folder;

use commission_invoice_v1::{invoice_headers, InvoiceRecord, DEFAULT_SCHEMA};

/// April-March fiscal year label, e.g. 2024-05-12 → "2024-25" and
/// 2024-02-10 → "2023-24".
pub fn fiscal_year_label(date: NaiveDate) -> String {
    let year = date.year();
    if date.month() >= 4 {
        format!("{}-{:02}", year, (year + 1).rem_euclid(100))
    } else {
        format!("{}-{:02}", year - 1, year.rem_euclid(100))
    }
}

/// One successfully parsed document.
#[derive(Debug)]
pub struct DocumentSummary {
    pub file_name: String,
    /// Parsed line items. Zero is a valid outcome, not an error. Kept in
    /// full so the CLI's diagnostics dump can serialize them.
    pub records: Vec<InvoiceRecord>,
}

#[derive(Debug)]
pub struct InvoiceOutput {
    pub report: StageReport,
    /// Parsed documents in processing order, for progress output and
    /// diagnostics dumps.
    pub documents: Vec<DocumentSummary>,
}

/// Run stage 4 over every invoice document in `invoice_dir`.
///
/// `extract_text` turns one document into its concatenated page text; any
/// extraction or parse failure skips that document with a note and zero rows.
pub fn run_invoices(
    invoice_dir: &Path,
    book: &mut Book,
    extract_text: &dyn Fn(&Path) -> Result<String, String>,
) -> Result<InvoiceOutput, PipelineError> {
    let mut report = StageReport::default();
    let mut documents = Vec::new();
    let mut new_rows: Vec<Vec<Cell>> = Vec::new();

    for entry in scan_folder(invoice_dir, INVOICE_EXTENSIONS)? {
        if !entry.supported {
            continue;
        }
        let text = match extract_text(&entry.path) {
            Ok(text) => text,
            Err(e) => {
                report.note(format!("failed to parse {}: {}", entry.file_name, e));
                continue;
            }
        };
        match commission_invoice_v1::parse(&text, &entry.file_name, &DEFAULT_SCHEMA) {
            Ok(records) => {
                report.files_processed += 1;
                new_rows.extend(records.iter().map(InvoiceRecord::to_row));
                documents.push(DocumentSummary { file_name: entry.file_name.clone(), records });
            }
            Err(e) => {
                report.note(format!("failed to parse {}: {}", entry.file_name, e));
            }
        }
    }

    // Merge-and-rewrite: existing data rows stay ahead of this run's rows.
    let mut rows: Vec<Vec<Cell>> = Vec::new();
    rows.push(invoice_headers().iter().map(|h| Cell::text(*h)).collect());
    if let Some(tab) = book.tab(INVOICE_TAB) {
        rows.extend(tab.data_rows().iter().cloned());
    }
    report.rows_written = new_rows.len();
    rows.extend(new_rows);
    book.replace_tab(INVOICE_TAB, rows);

    Ok(InvoiceOutput { report, documents })
}

#[cfg(test)]
mod tests {
    use super::*;
    use commission_invoice_v1::tests::sample_text;
    use payhub_io::Tab;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_fiscal_year_label() {
        assert_eq!(fiscal_year_label(date(2024, 5, 12)), "2024-25");
        assert_eq!(fiscal_year_label(date(2024, 2, 10)), "2023-24");
        assert_eq!(fiscal_year_label(date(2024, 4, 1)), "2024-25");
        assert_eq!(fiscal_year_label(date(2024, 3, 31)), "2023-24");
        // Century rollover keeps two digits
        assert_eq!(fiscal_year_label(date(2099, 6, 1)), "2099-00");
    }

    fn invoice_dir(files: &[(&str, &str)]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for (name, contents) in files {
            std::fs::write(dir.path().join(name), contents).unwrap();
        }
        dir
    }

    // Extractor that hands back the file's own contents as "extracted text".
    fn read_file(path: &Path) -> Result<String, String> {
        std::fs::read_to_string(path).map_err(|e| e.to_string())
    }

    #[test]
    fn test_rows_appended_and_tab_rewritten() {
        let dir = invoice_dir(&[("inv_1.pdf", &sample_text())]);
        let mut book = Book::new();

        let out = run_invoices(dir.path(), &mut book, &read_file).unwrap();
        assert_eq!(out.report.files_processed, 1);
        assert_eq!(out.documents[0].records.len(), 2);

        let tab = book.tab(INVOICE_TAB).unwrap();
        assert_eq!(tab.data_rows().len(), 2);
        assert_eq!(tab.rows[0].len(), invoice_headers().len());
    }

    #[test]
    fn test_existing_rows_kept_ahead_of_new() {
        let dir = invoice_dir(&[("inv_1.pdf", &sample_text())]);
        let mut book = Book::new();
        let mut tab = Tab::with_header(INVOICE_TAB, &invoice_headers());
        tab.append_row(vec![Cell::text("pre-existing")]);
        book.tabs.push(tab);

        run_invoices(dir.path(), &mut book, &read_file).unwrap();

        let tab = book.tab(INVOICE_TAB).unwrap();
        assert_eq!(tab.data_rows().len(), 3);
        assert_eq!(tab.data_rows()[0][0], Cell::Text("pre-existing".into()));
    }

    #[test]
    fn test_unparsable_document_skipped() {
        let dir = invoice_dir(&[
            ("bad.pdf", "Invoice Date : 12/05/2024\n"),
            ("good.pdf", &sample_text()),
        ]);
        let mut book = Book::new();

        let out = run_invoices(dir.path(), &mut book, &read_file).unwrap();
        assert_eq!(out.report.files_processed, 1);
        assert!(out.report.notes.iter().any(|n| n.contains("bad.pdf")));
        assert_eq!(book.tab(INVOICE_TAB).unwrap().data_rows().len(), 2);
    }

    #[test]
    fn test_zero_line_items_is_not_an_error() {
        let text = "Invoice Date : 2024-05-12\nService Period : Apr 2024\n";
        let dir = invoice_dir(&[("empty.pdf", text)]);
        let mut book = Book::new();

        let out = run_invoices(dir.path(), &mut book, &read_file).unwrap();
        assert_eq!(out.report.files_processed, 1);
        assert!(out.documents[0].records.is_empty());
        assert!(out.report.notes.is_empty());
        assert_eq!(book.tab(INVOICE_TAB).unwrap().data_rows().len(), 0);
    }

    #[test]
    fn test_rerun_duplicates_rows() {
        let dir = invoice_dir(&[("inv_1.pdf", &sample_text())]);
        let mut book = Book::new();
        run_invoices(dir.path(), &mut book, &read_file).unwrap();
        run_invoices(dir.path(), &mut book, &read_file).unwrap();
        assert_eq!(book.tab(INVOICE_TAB).unwrap().data_rows().len(), 4);
    }

    #[test]
    fn test_non_pdf_files_ignored() {
        let dir = invoice_dir(&[("notes.txt", "Invoice Date : 2024-05-12\n")]);
        let mut book = Book::new();
        let out = run_invoices(dir.path(), &mut book, &read_file).unwrap();
        assert_eq!(out.report.files_processed, 0);
        assert!(out.report.notes.is_empty());
    }
}
