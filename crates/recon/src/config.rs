use serde::Deserialize;

use crate::error::LoanError;

// ---------------------------------------------------------------------------
// Column aliases
// ---------------------------------------------------------------------------

/// Accepted source column names per canonical field.
///
/// Source files are produced by different tools over many years, so the same
/// figure shows up as `JML` in one file and `JUMLAH` in the next. For each
/// field the first alias whose column is present, non-blank and not zero wins.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ColumnAliases {
    pub employee_id: Vec<String>,
    pub employee_name: Vec<String>,
    pub division: Vec<String>,
    pub loan_amount: Vec<String>,
    pub tenor: Vec<String>,
    pub installment_amount: Vec<String>,
    pub installments_paid: Vec<String>,
    /// Prefix of the per-month payment columns (`ANG1`, `ANG2`, ...).
    pub payment_prefix: String,
}

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

impl Default for ColumnAliases {
    fn default() -> Self {
        Self {
            employee_id: names(&["NOPEG", "NO_PEGAWAI", "EMPLOYEE_ID"]),
            employee_name: names(&["NAMA", "NAMA_KARYAWAN", "EMPLOYEE_NAME"]),
            division: names(&["BAGIAN", "DIVISI", "DIVISION"]),
            loan_amount: names(&["JML", "JML_DDL", "JUMLAH", "LOAN_AMOUNT"]),
            tenor: names(&["LAMA", "TENOR"]),
            installment_amount: names(&["CICIL", "BUNGA1", "CICILAN", "INSTALLMENT_AMOUNT"]),
            installments_paid: names(&["ANGSURAN_KE", "INSTALLMENTS_PAID"]),
            payment_prefix: "ANG".into(),
        }
    }
}

impl ColumnAliases {
    pub fn from_toml(input: &str) -> Result<Self, LoanError> {
        let aliases: ColumnAliases =
            toml::from_str(input).map_err(|e| LoanError::ConfigParse(e.to_string()))?;
        aliases.validate()?;
        Ok(aliases)
    }

    pub fn validate(&self) -> Result<(), LoanError> {
        for (field, list) in self.fields() {
            if list.iter().all(|name| name.trim().is_empty()) {
                return Err(LoanError::ColumnConfig(format!(
                    "field '{field}' needs at least one column name"
                )));
            }
        }
        if self.payment_prefix.trim().is_empty() {
            return Err(LoanError::ColumnConfig(
                "payment_prefix must not be empty".into(),
            ));
        }
        Ok(())
    }

    fn fields(&self) -> [(&'static str, &[String]); 7] {
        [
            ("employee_id", self.employee_id.as_slice()),
            ("employee_name", self.employee_name.as_slice()),
            ("division", self.division.as_slice()),
            ("loan_amount", self.loan_amount.as_slice()),
            ("tenor", self.tenor.as_slice()),
            ("installment_amount", self.installment_amount.as_slice()),
            ("installments_paid", self.installments_paid.as_slice()),
        ]
    }

    /// True when `column` is a named alias of any canonical field.
    pub fn is_alias(&self, column: &str) -> bool {
        let column = column.trim();
        self.fields()
            .iter()
            .flat_map(|(_, list)| list.iter())
            .any(|alias| alias.trim().eq_ignore_ascii_case(column))
    }

    /// True for per-month payment columns: prefixed, and not an alias of another field.
    pub fn is_payment_column(&self, column: &str) -> bool {
        let upper = column.trim().to_ascii_uppercase();
        upper.starts_with(&self.payment_prefix.trim().to_ascii_uppercase()) && !self.is_alias(column)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
