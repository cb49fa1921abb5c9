// Read access to per-restaurant source workbooks (xlsx, xls).
//
// Source files are read-only inputs. Each stage opens a file, pulls what it
// needs from one named sheet, and drops the handle before the next file.

use std::path::Path;

use calamine::{open_workbook_auto, Data, Range, Reader, Sheets};

use crate::cell::Cell;

/// A rectangular slice of a sheet in absolute 0-indexed coordinates.
/// `end_row` / `end_col` are exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub start_row: u32,
    pub end_row: u32,
    pub start_col: u32,
    pub end_col: u32,
}

impl Region {
    pub fn rows(&self) -> u32 {
        self.end_row - self.start_row
    }

    pub fn cols(&self) -> u32 {
        self.end_col - self.start_col
    }
}

/// An open source workbook.
pub struct SourceBook {
    sheets: Sheets<std::io::BufReader<std::fs::File>>,
    sheet_names: Vec<String>,
}

impl SourceBook {
    pub fn open(path: &Path) -> Result<SourceBook, String> {
        let sheets = open_workbook_auto(path)
            .map_err(|e| format!("failed to open {}: {}", path.display(), e))?;
        let sheet_names = sheets.sheet_names().to_vec();
        Ok(SourceBook { sheets, sheet_names })
    }

    pub fn has_sheet(&self, name: &str) -> bool {
        self.sheet_names.iter().any(|s| s == name)
    }

    /// Read one sheet's used range into an addressable grid.
    pub fn sheet(&mut self, name: &str) -> Result<SheetGrid, String> {
        let range = self
            .sheets
            .worksheet_range(name)
            .map_err(|e| format!("failed to read sheet '{}': {}", name, e))?;
        Ok(SheetGrid { range })
    }
}

/// One sheet's data, addressed by absolute coordinates (A1 = row 0, col 0).
///
/// calamine ranges start at the first used cell, not A1; all accessors here
/// take absolute positions so the declarative layouts in the pipeline crate
/// read like the spreadsheet does. Out-of-range reads yield `Cell::Empty`.
pub struct SheetGrid {
    range: Range<Data>,
}

impl SheetGrid {
    pub fn cell(&self, row: u32, col: u32) -> Cell {
        match self.range.get_value((row, col)) {
            Some(data) => Cell::from_data(data),
            None => Cell::Empty,
        }
    }

    /// Slice a fixed region. The result always has the region's full
    /// dimensions; positions past the sheet's used range come back empty.
    pub fn region(&self, region: &Region) -> Vec<Vec<Cell>> {
        (region.start_row..region.end_row)
            .map(|r| {
                (region.start_col..region.end_col)
                    .map(|c| self.cell(r, c))
                    .collect()
            })
            .collect()
    }

    /// One full-width row at an absolute row index.
    pub fn row(&self, row: u32) -> Vec<Cell> {
        (0..self.width()).map(|c| self.cell(row, c)).collect()
    }

    /// Every full-width row from `start_row` to the end of the used range.
    pub fn rows_from(&self, start_row: u32) -> Vec<Vec<Cell>> {
        (start_row..self.height())
            .map(|r| self.row(r))
            .collect()
    }

    /// Used height in absolute rows (0 when the sheet is empty).
    pub fn height(&self) -> u32 {
        self.range.end().map(|(r, _)| r + 1).unwrap_or(0)
    }

    /// Used width in absolute columns (0 when the sheet is empty).
    pub fn width(&self) -> u32 {
        self.range.end().map(|(_, c)| c + 1).unwrap_or(0)
    }
}
