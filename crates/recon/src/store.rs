//! The merged dataset and the store that owns it.
//!
//! Writers build a complete new [`Dataset`] off to the side and publish it with
//! a single pointer swap. Readers clone the current `Arc` and never see a
//! half-merged batch or a half-cleared reset.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use serde::{Deserialize, Serialize};

use crate::aggregate::merge_batch;
use crate::config::ColumnAliases;
use crate::error::LoanError;
use crate::identity::normalize_name;
use crate::model::{BatchReport, IdentityKey, MergedLoanRecord, RawBatch};
use crate::normalize::normalize_row;
use crate::query::{self, LoanFilter};

// ---------------------------------------------------------------------------
// Dataset
// ---------------------------------------------------------------------------

/// Merged records in first-sighting order, indexed by identity key.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "Vec<MergedLoanRecord>", into = "Vec<MergedLoanRecord>")]
pub struct Dataset {
    pub(crate) records: Vec<MergedLoanRecord>,
    pub(crate) index: HashMap<IdentityKey, usize>,
    /// Normalized current name -> records carrying it.
    pub(crate) names: HashMap<String, Vec<usize>>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[MergedLoanRecord] {
        &self.records
    }

    pub fn get(&self, key: &IdentityKey) -> Option<&MergedLoanRecord> {
        self.index.get(key).map(|&i| &self.records[i])
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Move record `idx` from the `old` name bucket to the `new` one.
    pub(crate) fn rename(&mut self, idx: usize, old: &str, new: &str) {
        if old != new {
            if let Some(list) = self.names.get_mut(old) {
                list.retain(|&i| i != idx);
                if list.is_empty() {
                    self.names.remove(old);
                }
            }
        }
        if !new.is_empty() {
            let list = self.names.entry(new.to_string()).or_default();
            if !list.contains(&idx) {
                list.push(idx);
            }
        }
    }
}

impl From<Vec<MergedLoanRecord>> for Dataset {
    fn from(records: Vec<MergedLoanRecord>) -> Self {
        let mut dataset = Dataset::new();
        for record in records {
            if dataset.index.contains_key(&record.identity_key) {
                log::warn!("dropping duplicate record for {}", record.identity_key);
                continue;
            }
            let idx = dataset.records.len();
            let name = normalize_name(&record.employee_name);
            dataset.index.insert(record.identity_key.clone(), idx);
            dataset.records.push(record);
            dataset.rename(idx, "", &name);
        }
        dataset
    }
}

impl From<Dataset> for Vec<MergedLoanRecord> {
    fn from(dataset: Dataset) -> Self {
        dataset.records
    }
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// Owner of the current dataset. Construct once and share by reference.
pub struct DatasetStore {
    current: RwLock<Arc<Dataset>>,
    /// Serializes `add_batch` and `reset`.
    writer: Mutex<()>,
    aliases: ColumnAliases,
}

impl Default for DatasetStore {
    fn default() -> Self {
        Self::new(ColumnAliases::default())
    }
}

impl DatasetStore {
    pub fn new(aliases: ColumnAliases) -> Self {
        Self::with_dataset(Dataset::new(), aliases)
    }

    /// Start from a previously saved dataset.
    pub fn with_dataset(dataset: Dataset, aliases: ColumnAliases) -> Self {
        Self {
            current: RwLock::new(Arc::new(dataset)),
            writer: Mutex::new(()),
            aliases,
        }
    }

    pub fn aliases(&self) -> &ColumnAliases {
        &self.aliases
    }

    /// The dataset as of now. Later writes do not affect the returned value.
    pub fn snapshot(&self) -> Arc<Dataset> {
        let guard = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    fn publish(&self, dataset: Dataset) {
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        *guard = Arc::new(dataset);
    }

    /// Normalize and merge one file's rows. Bad rows are skipped and tallied.
    pub fn add_batch(&self, batch: &RawBatch) -> BatchReport {
        let _writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);

        let mut report = BatchReport {
            source_file: batch.source_file.clone(),
            rows_read: batch.rows.len(),
            ..BatchReport::default()
        };

        let mut records = Vec::with_capacity(batch.rows.len());
        for (i, row) in batch.rows.iter().enumerate() {
            match normalize_row(row, batch.format, &batch.source_file, i + 1, &self.aliases) {
                Ok(normalized) => {
                    report.coerced_values += normalized.coerced_values;
                    report.clamped_values += normalized.clamped_values;
                    records.push(normalized.record);
                }
                Err(LoanError::MalformedRow { reason, .. }) => {
                    log::warn!("{}: skipping row {}: {reason}", batch.source_file, i + 1);
                    report.record_skip(&reason);
                }
                Err(e) => {
                    log::warn!("{}: skipping row {}: {e}", batch.source_file, i + 1);
                    report.record_skip(&e);
                }
            }
        }

        let mut next = Dataset::clone(&self.snapshot());
        let stats = merge_batch(&mut next, records);
        self.publish(next);

        report.rows_merged = stats.rows_merged;
        report.records_created = stats.records_created;
        report.records_updated = stats.records_updated;
        report.collisions = stats.collisions;

        log::info!(
            "{} ({}): {} rows read, {} merged, {} skipped, {} new employees",
            report.source_file,
            batch.format,
            report.rows_read,
            report.rows_merged,
            report.rows_skipped,
            report.records_created
        );
        report
    }

    /// Drop every merged record.
    pub fn reset(&self) {
        let _writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        self.publish(Dataset::new());
        log::info!("dataset reset");
    }

    pub fn all_records(&self) -> Vec<MergedLoanRecord> {
        self.snapshot().records().to_vec()
    }

    pub fn find(&self, filter: &LoanFilter) -> Vec<MergedLoanRecord> {
        let dataset = self.snapshot();
        query::find(dataset.records(), filter).into_iter().cloned().collect()
    }
}
