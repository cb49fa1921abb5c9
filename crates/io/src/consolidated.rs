// The consolidated output workbook.
//
// The whole book is held in memory as rows of cells, loaded with calamine and
// written with rust_xlsxwriter. There is no in-place append for xlsx, so
// "append" means: load, add rows, rewrite the file. Stage semantics
// (overwrite vs append vs merge-rewrite) are expressed against this model.

use std::path::Path;

use calamine::{open_workbook_auto, Reader};
use rust_xlsxwriter::Workbook as XlsxWorkbook;

use crate::cell::Cell;

/// One output tab. `rows[0]` is the header row once the tab has been
/// initialized; data rows follow.
#[derive(Debug, Clone, Default)]
pub struct Tab {
    pub name: String,
    pub rows: Vec<Vec<Cell>>,
}

impl Tab {
    pub fn new(name: impl Into<String>) -> Tab {
        Tab { name: name.into(), rows: Vec::new() }
    }

    pub fn with_header(name: impl Into<String>, header: &[&str]) -> Tab {
        let mut tab = Tab::new(name);
        tab.rows.push(header.iter().map(|h| Cell::text(*h)).collect());
        tab
    }

    pub fn append_row(&mut self, row: Vec<Cell>) {
        self.rows.push(row);
    }

    /// Data rows (everything after the header).
    pub fn data_rows(&self) -> &[Vec<Cell>] {
        if self.rows.is_empty() {
            &[]
        } else {
            &self.rows[1..]
        }
    }

    /// Set a single cell, growing the grid as needed. Used to lay out sheets
    /// at fixed coordinates (and to build test fixtures).
    pub fn set(&mut self, row: usize, col: usize, value: Cell) {
        if self.rows.len() <= row {
            self.rows.resize(row + 1, Vec::new());
        }
        let r = &mut self.rows[row];
        if r.len() <= col {
            r.resize(col + 1, Cell::Empty);
        }
        r[col] = value;
    }

    /// Largest numeric value in the first column of the data rows.
    /// This is the serial-number high-water mark; zero for a fresh tab.
    pub fn max_serial(&self) -> i64 {
        self.data_rows()
            .iter()
            .filter_map(|r| r.first().and_then(|c| c.as_number()))
            .fold(0, |acc, n| acc.max(n as i64))
    }
}

/// The consolidated workbook, all tabs in memory.
#[derive(Debug, Clone, Default)]
pub struct Book {
    pub tabs: Vec<Tab>,
}

impl Book {
    pub fn new() -> Book {
        Book::default()
    }

    /// Load an existing workbook. Every sheet is read in full; sheets keep
    /// their file order so a rewrite preserves tab order.
    pub fn load(path: &Path) -> Result<Book, String> {
        let mut sheets = open_workbook_auto(path)
            .map_err(|e| format!("failed to open {}: {}", path.display(), e))?;
        let names = sheets.sheet_names().to_vec();

        let mut tabs = Vec::with_capacity(names.len());
        for name in &names {
            let range = sheets
                .worksheet_range(name)
                .map_err(|e| format!("failed to read sheet '{}': {}", name, e))?;

            let height = range.end().map(|(r, _)| r as usize + 1).unwrap_or(0);
            let width = range.end().map(|(_, c)| c as usize + 1).unwrap_or(0);

            let mut tab = Tab::new(name.clone());
            for r in 0..height {
                let row = (0..width)
                    .map(|c| match range.get_value((r as u32, c as u32)) {
                        Some(data) => Cell::from_data(data),
                        None => Cell::Empty,
                    })
                    .collect();
                tab.rows.push(row);
            }
            tabs.push(tab);
        }

        Ok(Book { tabs })
    }

    /// Load an existing workbook, or start a fresh one when the file does not
    /// exist yet.
    pub fn load_or_new(path: &Path) -> Result<Book, String> {
        if path.exists() {
            Book::load(path)
        } else {
            Ok(Book::new())
        }
    }

    pub fn tab(&self, name: &str) -> Option<&Tab> {
        self.tabs.iter().find(|t| t.name == name)
    }

    pub fn tab_mut(&mut self, name: &str) -> Option<&mut Tab> {
        self.tabs.iter_mut().find(|t| t.name == name)
    }

    /// Get a tab, creating it with the given header row when absent.
    /// The header is written exactly once; an existing tab is returned as-is.
    pub fn tab_or_create(&mut self, name: &str, header: &[&str]) -> &mut Tab {
        if let Some(idx) = self.tabs.iter().position(|t| t.name == name) {
            return &mut self.tabs[idx];
        }
        self.tabs.push(Tab::with_header(name, header));
        self.tabs.last_mut().unwrap()
    }

    /// Replace a tab's entire contents (truncate-and-rewrite semantics).
    /// Creates the tab when absent; keeps its position when present.
    pub fn replace_tab(&mut self, name: &str, rows: Vec<Vec<Cell>>) {
        match self.tab_mut(name) {
            Some(tab) => tab.rows = rows,
            None => self.tabs.push(Tab { name: name.to_string(), rows }),
        }
    }

    /// Write the whole book to disk.
    pub fn save(&self, path: &Path) -> Result<(), String> {
        let mut xlsx = XlsxWorkbook::new();

        for tab in &self.tabs {
            let worksheet = xlsx
                .add_worksheet()
                .set_name(&tab.name)
                .map_err(|e| format!("failed to create sheet '{}': {}", tab.name, e))?;

            for (r, row) in tab.rows.iter().enumerate() {
                for (c, cell) in row.iter().enumerate() {
                    let (r, c) = (r as u32, c as u16);
                    match cell {
                        Cell::Empty => {}
                        Cell::Text(s) => {
                            worksheet
                                .write_string(r, c, s)
                                .map_err(|e| format!("failed to write cell: {}", e))?;
                        }
                        Cell::Number(n) => {
                            worksheet
                                .write_number(r, c, *n)
                                .map_err(|e| format!("failed to write cell: {}", e))?;
                        }
                        Cell::Bool(b) => {
                            worksheet
                                .write_boolean(r, c, *b)
                                .map_err(|e| format!("failed to write cell: {}", e))?;
                        }
                    }
                }
            }
        }

        xlsx.save(path)
            .map_err(|e| format!("failed to save {}: {}", path.display(), e))
    }
}
