use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileReadErrorKind {
    /// File could not be opened or read.
    Io(String),
    /// Extension is not one of the supported source formats.
    UnsupportedFormat,
    /// Structurally invalid dBase table.
    Dbf(String),
    /// Workbook could not be opened or has no usable sheet.
    Spreadsheet(String),
    Csv(String),
    /// Dataset snapshot is unreadable or from another format version.
    Snapshot(String),
}

/// A whole file failed to read. Nothing from it is merged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReadError {
    pub path: PathBuf,
    pub kind: FileReadErrorKind,
}

impl FileReadError {
    pub fn new(path: &Path, kind: FileReadErrorKind) -> Self {
        Self { path: path.to_path_buf(), kind }
    }
}

impl fmt::Display for FileReadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = self.path.display();
        match &self.kind {
            FileReadErrorKind::Io(msg) => write!(f, "cannot read {path}: {msg}"),
            FileReadErrorKind::UnsupportedFormat => {
                write!(f, "{path}: unsupported file type (expected .dbf, .xlsx, .xls, .ods or .csv)")
            }
            FileReadErrorKind::Dbf(msg) => write!(f, "{path}: invalid DBF table: {msg}"),
            FileReadErrorKind::Spreadsheet(msg) => write!(f, "{path}: {msg}"),
            FileReadErrorKind::Csv(msg) => write!(f, "{path}: CSV error: {msg}"),
            FileReadErrorKind::Snapshot(msg) => write!(f, "{path}: snapshot error: {msg}"),
        }
    }
}

impl std::error::Error for FileReadError {}

/// Export or snapshot write failure. A failed write never replaces an existing file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteError {
    pub path: PathBuf,
    pub message: String,
}

impl WriteError {
    pub fn new(path: &Path, message: impl Into<String>) -> Self {
        Self { path: path.to_path_buf(), message: message.into() }
    }
}

impl fmt::Display for WriteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cannot write {}: {}", self.path.display(), self.message)
    }
}

impl std::error::Error for WriteError {}
