//! Declarative extraction layouts.
//!
//! Every fixed coordinate the pipeline touches lives here as data: which
//! sheet, which cell, which region. The stages apply these uniformly per
//! file, so a source-format change is an edit to this table, not to stage
//! code.

use payhub_io::Region;

// ── Source files ────────────────────────────────────────────────────

/// Extensions accepted from the payouts folder (case-insensitive).
pub const SOURCE_EXTENSIONS: &[&str] = &["xlsx", "xls"];

/// Extensions accepted from the invoices folder (case-insensitive).
pub const INVOICE_EXTENSIONS: &[&str] = &["pdf"];

/// Sheet names consumed from each source workbook.
pub const SUMMARY_SHEET: &str = "Summary";
pub const BREAKUP_SHEET: &str = "Payout Breakup";
pub const ORDER_SHEET: &str = "Order Level";

// ── Output tabs ─────────────────────────────────────────────────────

pub const SUMMARY_TAB: &str = "Summary";
pub const BREAKUP_TAB: &str = "Payout Breakup Tab";
pub const ORDER_TAB: &str = "Order Level";
pub const INVOICE_TAB: &str = "Commission Invoice";

// ── Stage 1: fixed-cell summary fields ──────────────────────────────

/// A fixed cell in absolute 0-indexed coordinates (A1 = 0,0).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRef {
    pub row: u32,
    pub col: u32,
}

/// Named summary fields and where they live on the "Summary" sheet.
/// Order here is the column order of the output Summary tab.
pub const SUMMARY_FIELDS: &[(&str, CellRef)] = &[
    ("Brand", CellRef { row: 4, col: 1 }),                                     // B5
    ("Location", CellRef { row: 5, col: 1 }),                                  // B6
    ("City", CellRef { row: 6, col: 1 }),                                      // B7
    ("Res-Id", CellRef { row: 7, col: 1 }),                                    // B8
    ("Payout Period", CellRef { row: 11, col: 2 }),                            // C12
    ("Payout Settlement Date", CellRef { row: 12, col: 2 }),                   // C13
    ("Total Payout", CellRef { row: 13, col: 2 }),                             // C14
    ("Total Orders (Delivered + Cancelled)", CellRef { row: 14, col: 2 }),     // C15
    ("Bank UTR", CellRef { row: 15, col: 2 }),                                 // C16
];

/// Positions of the join-metadata fields within [`SUMMARY_FIELDS`].
pub const FIELD_BRAND: usize = 0;
pub const FIELD_RES_ID: usize = 3;
pub const FIELD_PAYOUT_PERIOD: usize = 4;

/// Column header for the join key appended after the mapped fields.
pub const FILE_NAME_HEADER: &str = "File Name";

/// Output Summary tab header: the mapped field names plus the file name.
pub fn summary_headers() -> Vec<&'static str> {
    let mut headers: Vec<&str> = SUMMARY_FIELDS.iter().map(|(name, _)| *name).collect();
    headers.push(FILE_NAME_HEADER);
    headers
}

// ── Stage 2: payout breakup block ───────────────────────────────────

/// The fixed slice taken from every "Payout Breakup" sheet: spreadsheet rows
/// 4-34, columns B-F. Always 31 rows x 5 columns; short sheets pad with
/// empty cells.
pub const BREAKUP_REGION: Region = Region {
    start_row: 3,
    end_row: 34,
    start_col: 1,
    end_col: 6,
};

pub const BREAKUP_HEADERS: &[&str] = &[
    "SR.No",
    "Sub-Category",
    "Particulars",
    "Delivered Orders",
    "Cancelled Orders",
    "Total",
    "Brand",
    "Res-Id",
    "Payout Period",
    "File Name",
];

// ── Stage 3: order-level rows ───────────────────────────────────────

/// Row of the "Order Level" sheet holding column headers (0-indexed).
pub const ORDER_HEADER_ROW: u32 = 2;

/// First data row of the "Order Level" sheet (0-indexed); everything above
/// is title/header region.
pub const ORDER_DATA_START_ROW: u32 = 4;

/// Metadata columns prefixed to every order row.
pub const ORDER_PREFIX_HEADERS: &[&str] = &["Brand", "Res-Id", "Payout Period", "File Name"];
