use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::model::{LoanStatus, MergedLoanRecord};
use crate::query::division_key;

/// Division label used for records with a blank division.
pub const NO_DIVISION: &str = "(none)";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BorrowerRank {
    pub employee_id: String,
    pub employee_name: String,
    pub division: String,
    pub total_loan_cents: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DivisionRank {
    pub division: String,
    pub borrowers: usize,
    pub total_loan_cents: i64,
}

/// Aggregate figures for the dashboard, computed in one pass over the records.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardSummary {
    pub total_loan_cents: i64,
    /// Sum of every record's remaining balance, paid-off ones included.
    pub total_remaining_cents: i64,
    pub employee_count: usize,
    /// Every status is present, zero-filled.
    pub status_counts: BTreeMap<LoanStatus, usize>,
    /// Share of employees per status, in percent with one decimal.
    pub status_percentages: BTreeMap<LoanStatus, f64>,
    /// Remaining balance per status. Paid-off loans always contribute zero.
    pub status_remaining_cents: BTreeMap<LoanStatus, i64>,
    pub top_borrowers: Vec<BorrowerRank>,
    pub top_divisions_by_borrowers: Vec<DivisionRank>,
    pub top_divisions_by_loan: Vec<DivisionRank>,
}

fn percent(count: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (count as f64 * 1000.0 / total as f64).round() / 10.0
}

impl DashboardSummary {
    pub fn compute(records: &[MergedLoanRecord], top_n: usize) -> Self {
        let mut status_counts: BTreeMap<LoanStatus, usize> =
            LoanStatus::ALL.iter().map(|s| (*s, 0)).collect();
        let mut status_remaining_cents: BTreeMap<LoanStatus, i64> =
            LoanStatus::ALL.iter().map(|s| (*s, 0)).collect();
        let mut total_loan_cents: i64 = 0;
        let mut total_remaining_cents: i64 = 0;

        // Divisions in first-seen order so ties rank deterministically.
        // Grouped case-insensitively, labelled with the first spelling seen.
        let mut divisions: Vec<DivisionRank> = Vec::new();
        let mut division_idx: HashMap<String, usize> = HashMap::new();

        for r in records {
            total_loan_cents = total_loan_cents.saturating_add(r.total_loan_cents);
            *status_counts.entry(r.status).or_insert(0) += 1;

            total_remaining_cents = total_remaining_cents.saturating_add(r.remaining_balance_cents);
            if r.status != LoanStatus::Lunas {
                let slot = status_remaining_cents.entry(r.status).or_insert(0);
                *slot = slot.saturating_add(r.remaining_balance_cents);
            }

            let name = match r.division.trim() {
                "" => NO_DIVISION,
                d => d,
            };
            let idx = *division_idx.entry(division_key(name)).or_insert_with(|| {
                divisions.push(DivisionRank {
                    division: name.to_string(),
                    borrowers: 0,
                    total_loan_cents: 0,
                });
                divisions.len() - 1
            });
            divisions[idx].borrowers += 1;
            divisions[idx].total_loan_cents = divisions[idx].total_loan_cents.saturating_add(r.total_loan_cents);
        }

        let status_percentages = status_counts
            .iter()
            .map(|(status, &count)| (*status, percent(count, records.len())))
            .collect();

        let mut borrowers: Vec<&MergedLoanRecord> = records.iter().collect();
        borrowers.sort_by(|a, b| b.total_loan_cents.cmp(&a.total_loan_cents));
        let top_borrowers = borrowers
            .into_iter()
            .take(top_n)
            .map(|r| BorrowerRank {
                employee_id: r.employee_id.clone(),
                employee_name: r.employee_name.clone(),
                division: r.division.clone(),
                total_loan_cents: r.total_loan_cents,
            })
            .collect();

        let mut by_borrowers = divisions.clone();
        by_borrowers.sort_by(|a, b| b.borrowers.cmp(&a.borrowers));
        by_borrowers.truncate(top_n);

        let mut by_loan = divisions;
        by_loan.sort_by(|a, b| b.total_loan_cents.cmp(&a.total_loan_cents));
        by_loan.truncate(top_n);

        Self {
            total_loan_cents,
            total_remaining_cents,
            employee_count: records.len(),
            status_counts,
            status_percentages,
            status_remaining_cents,
            top_borrowers,
            top_divisions_by_borrowers: by_borrowers,
            top_divisions_by_loan: by_loan,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::IdentityKey;

    fn rec(id: &str, division: &str, loan: i64, remaining: i64, status: LoanStatus) -> MergedLoanRecord {
        MergedLoanRecord {
            identity_key: IdentityKey::EmployeeId(id.into()),
            employee_id: id.into(),
            employee_name: format!("name {id}"),
            division: division.into(),
            total_loan_cents: loan,
            total_installment_cents: 0,
            total_tenor: 0,
            total_installments_paid: 0,
            remaining_installments: 0,
            remaining_balance_cents: remaining,
            status,
            contributing_sources: vec![],
            contributions: vec![],
        }
    }

    #[test]
    fn empty_dataset() {
        let s = DashboardSummary::compute(&[], 10);
        assert_eq!(s.employee_count, 0);
        assert_eq!(s.total_loan_cents, 0);
        assert_eq!(s.status_counts.len(), 3);
        assert!(s.status_counts.values().all(|&c| c == 0));
        assert!(s.top_borrowers.is_empty());
        assert!(s.status_percentages.values().all(|&p| p == 0.0));
    }

    #[test]
    fn paid_off_balance_counts_toward_total_only() {
        // Tenor fully paid but installments did not cover the principal.
        let records = vec![
            rec("E1", "Gudang", 120_000, 60_000, LoanStatus::Lunas),
            rec("E2", "Gudang", 1_000, 400, LoanStatus::Berjalan),
            rec("E3", "Gudang", 1_000, 1_000, LoanStatus::BelumBayar),
        ];
        let s = DashboardSummary::compute(&records, 5);
        assert_eq!(s.total_remaining_cents, 61_400);
        assert_eq!(s.status_remaining_cents[&LoanStatus::Lunas], 0);
        assert_eq!(s.status_remaining_cents[&LoanStatus::Berjalan], 400);
        assert_eq!(s.status_percentages[&LoanStatus::Lunas], 33.3);
    }

    #[test]
    fn divisions_group_case_insensitively() {
        let records = vec![
            rec("E1", "Gudang", 100, 0, LoanStatus::BelumBayar),
            rec("E2", "GUDANG ", 200, 0, LoanStatus::BelumBayar),
        ];
        let s = DashboardSummary::compute(&records, 5);
        assert_eq!(s.top_divisions_by_loan.len(), 1);
        assert_eq!(s.top_divisions_by_loan[0].division, "Gudang");
        assert_eq!(s.top_divisions_by_loan[0].total_loan_cents, 300);
    }

    #[test]
    fn totals_and_distribution() {
        let records = vec![
            rec("E1", "Gudang", 1000, 400, LoanStatus::Berjalan),
            rec("E2", "Gudang", 3000, 3000, LoanStatus::BelumBayar),
            rec("E3", "Keuangan", 2000, 0, LoanStatus::Lunas),
            rec("E4", " ", 500, 100, LoanStatus::Berjalan),
        ];
        let s = DashboardSummary::compute(&records, 2);
        assert_eq!(s.total_loan_cents, 6500);
        assert_eq!(s.total_remaining_cents, 3500);
        assert_eq!(s.status_percentages[&LoanStatus::Berjalan], 50.0);
        assert_eq!(s.status_percentages[&LoanStatus::Lunas], 25.0);
        assert_eq!(s.employee_count, 4);
        assert_eq!(s.status_counts[&LoanStatus::Berjalan], 2);
        assert_eq!(s.status_counts[&LoanStatus::Lunas], 1);
        assert_eq!(s.status_remaining_cents[&LoanStatus::Berjalan], 500);
        assert_eq!(s.status_remaining_cents[&LoanStatus::Lunas], 0);

        let top: Vec<&str> = s.top_borrowers.iter().map(|b| b.employee_id.as_str()).collect();
        assert_eq!(top, ["E2", "E3"]);

        assert_eq!(s.top_divisions_by_borrowers[0].division, "Gudang");
        assert_eq!(s.top_divisions_by_borrowers[0].borrowers, 2);
        assert_eq!(s.top_divisions_by_loan[0].division, "Gudang");
        assert_eq!(s.top_divisions_by_loan[0].total_loan_cents, 4000);
        assert_eq!(s.top_divisions_by_loan[1].division, "Keuangan");
    }

    #[test]
    fn blank_division_is_grouped() {
        let records = vec![rec("E1", "", 1, 0, LoanStatus::BelumBayar), rec("E2", "  ", 1, 0, LoanStatus::BelumBayar)];
        let s = DashboardSummary::compute(&records, 5);
        assert_eq!(s.top_divisions_by_borrowers.len(), 1);
        assert_eq!(s.top_divisions_by_borrowers[0].division, NO_DIVISION);
        assert_eq!(s.top_divisions_by_borrowers[0].borrowers, 2);
    }
}
