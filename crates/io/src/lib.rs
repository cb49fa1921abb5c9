// Spreadsheet I/O operations

pub mod cell;
pub mod consolidated;
pub mod source;

pub use cell::Cell;
pub use consolidated::{Book, Tab};
pub use source::{Region, SheetGrid, SourceBook};
