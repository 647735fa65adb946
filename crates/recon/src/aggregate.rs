use std::collections::{BTreeSet, HashSet};

use crate::derived;
use crate::identity::{normalize_name, resolve};
use crate::model::{Contribution, IdentityCollisionWarning, IdentityKey, LoanRecord, LoanStatus, MergedLoanRecord};
use crate::store::Dataset;

/// What one call to [`merge_batch`] did to the dataset.
#[derive(Debug, Clone, Default)]
pub struct MergeStats {
    pub rows_merged: usize,
    pub records_created: usize,
    /// Records that existed before the batch and received at least one row.
    pub records_updated: usize,
    pub collisions: Vec<IdentityCollisionWarning>,
}

impl MergeStats {
    fn warn(&mut self, warning: IdentityCollisionWarning) {
        if !self.collisions.contains(&warning) {
            log::warn!("identity collision: {warning}");
            self.collisions.push(warning);
        }
    }
}

fn empty_record(identity_key: IdentityKey) -> MergedLoanRecord {
    MergedLoanRecord {
        identity_key,
        employee_id: String::new(),
        employee_name: String::new(),
        division: String::new(),
        total_loan_cents: 0,
        total_installment_cents: 0,
        total_tenor: 0,
        total_installments_paid: 0,
        remaining_installments: 0,
        remaining_balance_cents: 0,
        status: LoanStatus::BelumBayar,
        contributing_sources: Vec::new(),
        contributions: Vec::new(),
    }
}

/// Sum the additive figures of `record` into `merged`.
fn add_totals(merged: &mut MergedLoanRecord, record: &LoanRecord) {
    merged.total_loan_cents = merged.total_loan_cents.saturating_add(record.loan_amount_cents);
    merged.total_installment_cents = merged
        .total_installment_cents
        .saturating_add(record.installment_amount_cents);
    merged.total_tenor = merged.total_tenor.saturating_add(record.tenor);
    merged.total_installments_paid = merged
        .total_installments_paid
        .saturating_add(record.installments_paid);
}

/// Non-additive fields: the most recently merged row wins, blank or not.
/// Within a batch that is the last row in file order; across batches, the last batch.
fn apply_last_write_wins(merged: &mut MergedLoanRecord, record: &LoanRecord) {
    merged.employee_name = record.employee_name.clone();
    merged.division = record.division.clone();
    if !merged.identity_key.is_name_fallback() {
        merged.employee_id = record.employee_id.clone();
    }
}

fn track_source(merged: &mut MergedLoanRecord, record: &LoanRecord) {
    if !merged.contributing_sources.contains(&record.source_file) {
        merged.contributing_sources.push(record.source_file.clone());
    }
    merged.contributions.push(Contribution::from(record));
}

/// Fold a batch of normalized records into `dataset` in a single pass.
///
/// Each record is looked up by identity key only; earlier batches are never
/// re-scanned. Derived fields of the touched record are recomputed right after
/// each fold so the dataset never holds stale remaining/status values.
pub fn merge_batch(dataset: &mut Dataset, records: impl IntoIterator<Item = LoanRecord>) -> MergeStats {
    let mut stats = MergeStats::default();
    let preexisting = dataset.records.len();
    let mut updated: HashSet<usize> = HashSet::new();

    for record in records {
        let key = resolve(&record);
        let name_key = normalize_name(&record.employee_name);

        let idx = match dataset.index.get(&key) {
            Some(&idx) => idx,
            None => {
                let idx = dataset.records.len();
                dataset.records.push(empty_record(key.clone()));
                dataset.index.insert(key.clone(), idx);
                stats.records_created += 1;
                idx
            }
        };
        if idx < preexisting {
            updated.insert(idx);
        }

        let merged = &mut dataset.records[idx];
        let previous_name = normalize_name(&merged.employee_name);
        if !key.is_name_fallback()
            && !previous_name.is_empty()
            && !name_key.is_empty()
            && previous_name != name_key
        {
            stats.warn(IdentityCollisionWarning::NameChanged {
                identity: key.clone(),
                previous_name: previous_name.clone(),
                new_name: name_key.clone(),
            });
        }

        add_totals(merged, &record);
        apply_last_write_wins(merged, &record);
        track_source(merged, &record);
        derived::apply(merged);

        log::debug!(
            "{} row {} -> {key}: loan={} paid={}/{} status={}",
            record.source_file,
            record.row,
            merged.total_loan_cents,
            merged.total_installments_paid,
            merged.total_tenor,
            merged.status
        );

        dataset.rename(idx, &previous_name, &name_key);
        if let Some(sharing) = dataset.names.get(&name_key) {
            if sharing.len() > 1 {
                let identities: BTreeSet<IdentityKey> = sharing
                    .iter()
                    .map(|&i| dataset.records[i].identity_key.clone())
                    .collect();
                stats.warn(IdentityCollisionWarning::SharedName {
                    name_key: name_key.clone(),
                    identities: identities.into_iter().collect(),
                });
            }
        }

        stats.rows_merged += 1;
    }

    stats.records_updated = updated.len();
    stats
}
