// Input folder enumeration.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::PipelineError;

/// One entry from an input folder, in directory enumeration order.
/// The order is whatever the platform yields; it is not sorted, and output
/// row order follows it.
#[derive(Debug)]
pub struct FolderEntry {
    pub file_name: String,
    pub path: PathBuf,
    /// Whether the extension matched the stage's accepted list.
    pub supported: bool,
}

pub fn scan_folder(dir: &Path, extensions: &[&str]) -> Result<Vec<FolderEntry>, PipelineError> {
    let read_dir = fs::read_dir(dir).map_err(|e| PipelineError::InputDir {
        dir: dir.to_path_buf(),
        source: e.to_string(),
    })?;

    let mut entries = Vec::new();
    for entry in read_dir {
        let entry = entry.map_err(|e| PipelineError::InputDir {
            dir: dir.to_path_buf(),
            source: e.to_string(),
        })?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let file_name = entry.file_name().to_string_lossy().into_owned();
        let supported = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|ext| extensions.iter().any(|x| ext.eq_ignore_ascii_case(x)))
            .unwrap_or(false);
        entries.push(FolderEntry { file_name, path, supported });
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_filter_is_case_insensitive() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.xlsx"), b"").unwrap();
        std::fs::write(dir.path().join("b.XLS"), b"").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"").unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();

        let entries = scan_folder(dir.path(), &["xlsx", "xls"]).unwrap();
        assert_eq!(entries.len(), 3); // the subdirectory is not listed
        let supported: Vec<_> = entries.iter().filter(|e| e.supported).collect();
        assert_eq!(supported.len(), 2);
        let unsupported: Vec<_> = entries.iter().filter(|e| !e.supported).collect();
        assert_eq!(unsupported[0].file_name, "notes.txt");
    }

    #[test]
    fn test_missing_dir_is_fatal() {
        let err = scan_folder(Path::new("/definitely/not/here"), &["xlsx"]).unwrap_err();
        assert!(matches!(err, PipelineError::InputDir { .. }));
    }
}
