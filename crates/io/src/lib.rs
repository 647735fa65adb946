// File I/O: source readers, report exporters and dataset snapshots

pub mod csv;
pub mod dbf;
pub mod error;
pub mod export;
pub mod snapshot;
pub mod xlsx;

use std::path::{Path, PathBuf};

use loanrec_recon::model::{BatchReport, RawBatch, SourceFormat};
use loanrec_recon::DatasetStore;

pub use error::{FileReadError, FileReadErrorKind, WriteError};

/// Snapshot format version.
/// Increment when the layout changes in a way older builds can't read.
pub const SNAPSHOT_FORMAT_VERSION: u32 = 1;

/// Source format from the file extension (case-insensitive).
pub fn detect_format(path: &Path) -> Option<SourceFormat> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "dbf" => Some(SourceFormat::Dbf),
        "xlsx" | "xls" | "xlsm" | "ods" => Some(SourceFormat::Spreadsheet),
        "csv" | "tsv" => Some(SourceFormat::Csv),
        _ => None,
    }
}

/// Name recorded as a record's contributing source.
fn source_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Read every row of one file. Either the whole file is read or none of it is.
pub fn read_batch(path: &Path) -> Result<RawBatch, FileReadError> {
    let format = detect_format(path)
        .ok_or_else(|| FileReadError::new(path, FileReadErrorKind::UnsupportedFormat))?;

    let rows = match format {
        SourceFormat::Dbf => dbf::import(path)?,
        SourceFormat::Spreadsheet => xlsx::import(path)?,
        SourceFormat::Csv => csv::import(path)?,
    };
    log::debug!("{}: read {} rows as {}", path.display(), rows.len(), format);

    Ok(RawBatch {
        source_file: source_name(path),
        format,
        rows,
    })
}

/// Result of importing one file of a multi-file selection.
#[derive(Debug)]
pub struct FileOutcome {
    pub path: PathBuf,
    pub result: Result<BatchReport, FileReadError>,
}

/// Import files in the given order. A file that fails to read is reported
/// and skipped; the remaining files are still merged.
pub fn import_files<P: AsRef<Path>>(store: &DatasetStore, paths: &[P]) -> Vec<FileOutcome> {
    paths
        .iter()
        .map(|p| {
            let path = p.as_ref();
            let result = read_batch(path).map(|batch| store.add_batch(&batch));
            if let Err(e) = &result {
                log::warn!("{}", e);
            }
            FileOutcome {
                path: path.to_path_buf(),
                result,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_from_extension() {
        assert_eq!(detect_format(Path::new("PINJAM.DBF")), Some(SourceFormat::Dbf));
        assert_eq!(detect_format(Path::new("a.xlsx")), Some(SourceFormat::Spreadsheet));
        assert_eq!(detect_format(Path::new("a.ods")), Some(SourceFormat::Spreadsheet));
        assert_eq!(detect_format(Path::new("a.Csv")), Some(SourceFormat::Csv));
        assert_eq!(detect_format(Path::new("a.tsv")), Some(SourceFormat::Csv));
        assert_eq!(detect_format(Path::new("a.pdf")), None);
        assert_eq!(detect_format(Path::new("noext")), None);
    }

    #[test]
    fn unsupported_extension_is_file_error() {
        let err = read_batch(Path::new("report.pdf")).unwrap_err();
        assert_eq!(err.kind, FileReadErrorKind::UnsupportedFormat);
    }

    #[test]
    fn source_name_is_file_name() {
        assert_eq!(source_name(Path::new("/data/2019/PINJAM.DBF")), "PINJAM.DBF");
    }
}
