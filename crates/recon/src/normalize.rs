//! Record normalization: raw rows from any source format into [`LoanRecord`].
//!
//! Everything downstream of this module works on the typed record only.
//! Numeric cells are forgiving: NUL padding and whitespace are stripped,
//! blanks read as zero, decimal commas are accepted, and anything still
//! unparseable reads as zero with a warning instead of failing the row.

use crate::config::ColumnAliases;
use crate::error::{LoanError, MalformedReason};
use crate::model::{LoanRecord, RawRow, RawValue, SourceFormat};

/// A normalized record plus what had to be patched up to produce it.
#[derive(Debug, Clone)]
pub struct Normalized {
    pub record: LoanRecord,
    pub coerced_values: usize,
    pub clamped_values: usize,
}

/// Parse numeric text the way legacy DBF/Excel exports write it.
///
/// Returns `Some(0.0)` for blank input and `None` when the text is not a number.
pub fn parse_numeric_text(raw: &str) -> Option<f64> {
    let cleaned: String = raw.chars().filter(|c| *c != '\0').collect();
    let trimmed = cleaned.trim();
    if trimmed.is_empty() {
        return Some(0.0);
    }
    if let Ok(n) = trimmed.parse::<i64>() {
        return Some(n as f64);
    }
    trimmed
        .replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
}

fn numeric(value: &RawValue) -> Option<f64> {
    match value {
        RawValue::Empty => Some(0.0),
        RawValue::Number(n) if n.is_finite() => Some(*n),
        RawValue::Number(_) | RawValue::Bool(_) => None,
        RawValue::Text(s) => parse_numeric_text(s),
    }
}

fn is_zero(value: &RawValue) -> bool {
    matches!(numeric(value), Some(n) if n == 0.0)
}

/// First alias column that is present, non-blank and not zero.
fn pick<'r>(row: &'r RawRow, aliases: &[String]) -> Option<&'r RawValue> {
    aliases
        .iter()
        .filter_map(|alias| row.get(alias))
        .find(|v| !v.is_blank() && !is_zero(v))
}

/// First alias column that is present and non-blank. An explicit zero counts.
fn pick_present<'r>(row: &'r RawRow, aliases: &[String]) -> Option<&'r RawValue> {
    aliases
        .iter()
        .filter_map(|alias| row.get(alias))
        .find(|v| !v.is_blank())
}

fn text(value: Option<&RawValue>) -> String {
    match value {
        None | Some(RawValue::Empty) => String::new(),
        Some(RawValue::Text(s)) => s
            .trim_matches(|c: char| c == '\0' || c.is_whitespace())
            .to_string(),
        // Spreadsheets hand employee numbers back as floats.
        Some(RawValue::Number(n)) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{}", *n as i64),
        Some(RawValue::Number(n)) => n.to_string(),
        Some(RawValue::Bool(b)) => b.to_string(),
    }
}

struct Coercer<'a> {
    source_file: &'a str,
    format: SourceFormat,
    row: usize,
    coerced: usize,
    clamped: usize,
}

impl Coercer<'_> {
    fn number(&mut self, field: &str, value: Option<&RawValue>) -> f64 {
        let Some(value) = value else {
            return 0.0;
        };
        let n = match numeric(value) {
            Some(n) => n,
            None => {
                log::warn!(
                    "{} ({}) row {}: cannot parse {field} value {value:?}, using 0",
                    self.source_file,
                    self.format,
                    self.row
                );
                self.coerced += 1;
                return 0.0;
            }
        };
        if n < 0.0 {
            log::warn!(
                "{} row {}: negative {field} {n}, clamped to 0",
                self.source_file,
                self.row
            );
            self.clamped += 1;
            return 0.0;
        }
        n
    }

    fn cents(&mut self, field: &str, value: Option<&RawValue>) -> i64 {
        // `as` saturates on overflow; round() is half away from zero.
        (self.number(field, value) * 100.0).round() as i64
    }

    fn count(&mut self, field: &str, value: Option<&RawValue>) -> u32 {
        self.number(field, value).trunc() as u32
    }
}

/// Count the per-month payment columns that carry a payment.
fn count_payment_columns(row: &RawRow, aliases: &ColumnAliases) -> u32 {
    let paid = row
        .cells()
        .filter(|(name, _)| aliases.is_payment_column(name))
        .filter(|(_, v)| !v.is_blank() && !is_zero(v) && **v != RawValue::Bool(false))
        .count();
    u32::try_from(paid).unwrap_or(u32::MAX)
}

/// Normalize one raw row. `row_no` is the 1-based data row number in its file.
pub fn normalize_row(
    row: &RawRow,
    format: SourceFormat,
    source_file: &str,
    row_no: usize,
    aliases: &ColumnAliases,
) -> Result<Normalized, LoanError> {
    let employee_id = text(pick(row, &aliases.employee_id));
    let employee_name = text(pick(row, &aliases.employee_name));
    if employee_id.is_empty() && employee_name.is_empty() {
        return Err(LoanError::MalformedRow {
            source_file: source_file.to_string(),
            row: row_no,
            reason: MalformedReason::MissingIdentity,
        });
    }
    let division = text(pick(row, &aliases.division));

    let mut c = Coercer {
        source_file,
        format,
        row: row_no,
        coerced: 0,
        clamped: 0,
    };
    let loan_amount_cents = c.cents("loan_amount", pick(row, &aliases.loan_amount));
    let tenor = c.count("tenor", pick(row, &aliases.tenor));
    let installment_amount_cents =
        c.cents("installment_amount", pick(row, &aliases.installment_amount));
    let installments_paid = match pick_present(row, &aliases.installments_paid) {
        Some(v) => c.count("installments_paid", Some(v)),
        None => count_payment_columns(row, aliases),
    };

    Ok(Normalized {
        record: LoanRecord {
            employee_id,
            employee_name,
            division,
            loan_amount_cents,
            tenor,
            installment_amount_cents,
            installments_paid,
            source_file: source_file.to_string(),
            row: row_no,
        },
        coerced_values: c.coerced,
        clamped_values: c.clamped,
    })
}
