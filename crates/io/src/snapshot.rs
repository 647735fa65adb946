// Dataset persistence between runs
//
// A snapshot is a single JSON document: a format version, the save time and
// the merged records in first-sighting order. Identity indexes are rebuilt on load.

use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};

use loanrec_recon::Dataset;

use crate::error::{FileReadError, FileReadErrorKind, WriteError};
use crate::export::write_atomically;
use crate::SNAPSHOT_FORMAT_VERSION;

#[derive(Serialize)]
struct SnapshotOut<'a> {
    format_version: u32,
    saved_at: String,
    dataset: &'a Dataset,
}

#[derive(Deserialize)]
struct SnapshotIn {
    format_version: u32,
    #[serde(default)]
    saved_at: Option<String>,
    dataset: Dataset,
}

pub fn save(dataset: &Dataset, path: &Path) -> Result<(), WriteError> {
    let snapshot = SnapshotOut {
        format_version: SNAPSHOT_FORMAT_VERSION,
        saved_at: chrono::Utc::now().to_rfc3339(),
        dataset,
    };
    let json = serde_json::to_vec_pretty(&snapshot).map_err(|e| WriteError::new(path, e.to_string()))?;
    write_atomically(path, |file| file.write_all(&json).map_err(|e| e.to_string()))?;
    log::debug!("saved {} records to {}", dataset.len(), path.display());
    Ok(())
}

/// Load a saved dataset. A missing file is an empty dataset.
pub fn load(path: &Path) -> Result<Dataset, FileReadError> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Dataset::new()),
        Err(e) => return Err(FileReadError::new(path, FileReadErrorKind::Io(e.to_string()))),
    };
    let snapshot_err = |msg: String| FileReadError::new(path, FileReadErrorKind::Snapshot(msg));

    let snapshot: SnapshotIn = serde_json::from_slice(&bytes).map_err(|e| snapshot_err(e.to_string()))?;
    if snapshot.format_version != SNAPSHOT_FORMAT_VERSION {
        return Err(snapshot_err(format!(
            "format version {} is not supported (expected {})",
            snapshot.format_version, SNAPSHOT_FORMAT_VERSION
        )));
    }
    log::debug!(
        "loaded {} records from {} (saved {})",
        snapshot.dataset.len(),
        path.display(),
        snapshot.saved_at.as_deref().unwrap_or("unknown")
    );
    Ok(snapshot.dataset)
}
