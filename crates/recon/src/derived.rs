//! Derived fields recomputed from merged totals after every merge.

use crate::model::{LoanStatus, MergedLoanRecord};

/// Status from merged totals, first matching rule wins:
/// nothing left on a non-zero tenor is paid off, any payment is in progress,
/// everything else has not started.
pub fn classify_status(total_tenor: u32, total_installments_paid: u32) -> LoanStatus {
    let remaining = total_tenor.saturating_sub(total_installments_paid);
    if remaining == 0 && total_tenor > 0 {
        LoanStatus::Lunas
    } else if total_installments_paid > 0 {
        LoanStatus::Berjalan
    } else {
        LoanStatus::BelumBayar
    }
}

/// `total_loan - total_installment * total_paid`, floored at zero.
pub fn remaining_balance_cents(total_loan_cents: i64, total_installment_cents: i64, total_paid: u32) -> i64 {
    let paid = i128::from(total_installment_cents) * i128::from(total_paid);
    let remaining = (i128::from(total_loan_cents) - paid).max(0);
    i64::try_from(remaining).unwrap_or(i64::MAX)
}

pub(crate) fn apply(record: &mut MergedLoanRecord) {
    record.remaining_installments = record
        .total_tenor
        .saturating_sub(record.total_installments_paid);
    record.remaining_balance_cents = remaining_balance_cents(
        record.total_loan_cents,
        record.total_installment_cents,
        record.total_installments_paid,
    );
    record.status = classify_status(record.total_tenor, record.total_installments_paid);
}

/// Recompute remaining installments, remaining balance and status.
pub fn recompute(mut record: MergedLoanRecord) -> MergedLoanRecord {
    apply(&mut record);
    record
}
