//! `pdftotext -layout` wrapper for invoice text extraction.

use std::path::Path;
use std::process::Command;

use crate::exit_codes::EXIT_IO_ERROR;
use crate::CliError;

/// Check once up front that pdftotext is installed, so a missing binary is a
/// clear fatal error rather than one note per invoice.
pub fn check_available() -> Result<(), CliError> {
    which::which("pdftotext").map_err(|_| CliError {
        code: EXIT_IO_ERROR,
        message: "pdftotext not installed (poppler-utils)".to_string(),
        hint: Some("Install with: apt install poppler-utils / brew install poppler".to_string()),
    })?;
    Ok(())
}

/// Run `pdftotext -layout <file> -` and capture stdout.
///
/// Returns a plain error string so it can feed the pipeline's per-document
/// failure handling: a bad PDF skips that document, not the run.
pub fn extract_text(file: &Path) -> Result<String, String> {
    let file_str = file
        .to_str()
        .ok_or_else(|| format!("invalid file path: {}", file.display()))?;

    let output = Command::new("pdftotext")
        .args(["-layout", file_str, "-"])
        .output()
        .map_err(|e| format!("failed to run pdftotext: {}", e))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(format!(
            "pdftotext failed (exit {}): {}",
            output.status.code().unwrap_or(-1),
            stderr.trim(),
        ));
    }

    let text = String::from_utf8_lossy(&output.stdout).to_string();

    if text.trim().is_empty() {
        return Err("PDF appears scanned/image-only — text extraction failed".to_string());
    }

    Ok(text)
}
