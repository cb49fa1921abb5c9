//! CLI Exit Code Registry
//!
//! Single source of truth for the binary's exit codes. Scripts wrapping the
//! pipeline rely on these; a run that skipped files but finished is still a
//! success (skips are visible on stderr only).

/// Success - command completed, possibly with per-file skips.
pub const EXIT_SUCCESS: u8 = 0;

/// Usage error - bad arguments, unknown flags.
pub const EXIT_USAGE: u8 = 2;

/// IO error - input folder or output workbook unreadable/unwritable,
/// pdftotext missing.
pub const EXIT_IO_ERROR: u8 = 3;

/// Parse/precondition error - Summary tab or columns missing for a stage
/// that needs the join index.
pub const EXIT_PARSE_ERROR: u8 = 4;
