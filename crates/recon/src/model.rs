use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// An untyped cell value as a file parser produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RawValue {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
}

impl RawValue {
    /// Blank means "no value": empty cells and text that is only whitespace/NUL padding.
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(s) => s.trim_matches(|c: char| c == '\0' || c.is_whitespace()).is_empty(),
            Self::Number(_) | Self::Bool(_) => false,
        }
    }
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<f64> for RawValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

/// One row from one source file: column name to value, in column order.
///
/// Column lookup is case-insensitive and ignores surrounding whitespace,
/// since legacy DBF headers and hand-made spreadsheets disagree on both.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRow {
    cells: Vec<(String, RawValue)>,
}

impl RawRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, column: impl Into<String>, value: RawValue) {
        self.cells.push((column.into(), value));
    }

    /// Builder-style insert, handy for tests and small fixtures.
    pub fn with(mut self, column: &str, value: impl Into<RawValue>) -> Self {
        self.push(column, value.into());
        self
    }

    pub fn get(&self, column: &str) -> Option<&RawValue> {
        let wanted = column.trim();
        self.cells
            .iter()
            .find(|(name, _)| name.trim().eq_ignore_ascii_case(wanted))
            .map(|(_, v)| v)
    }

    pub fn cells(&self) -> impl Iterator<Item = (&str, &RawValue)> {
        self.cells.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, RawValue)> for RawRow {
    fn from_iter<I: IntoIterator<Item = (K, RawValue)>>(iter: I) -> Self {
        Self {
            cells: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// Which kind of file a batch came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceFormat {
    /// Legacy dBase table.
    Dbf,
    /// Excel / ODS workbook.
    Spreadsheet,
    Csv,
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dbf => write!(f, "dbf"),
            Self::Spreadsheet => write!(f, "spreadsheet"),
            Self::Csv => write!(f, "csv"),
        }
    }
}

/// All raw rows of one imported file.
#[derive(Debug, Clone)]
pub struct RawBatch {
    pub source_file: String,
    pub format: SourceFormat,
    pub rows: Vec<RawRow>,
}

// ---------------------------------------------------------------------------
// Normalized record
// ---------------------------------------------------------------------------

/// One loan row after normalization. Monetary fields are minor units (cents).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoanRecord {
    pub employee_id: String,
    pub employee_name: String,
    pub division: String,
    pub loan_amount_cents: i64,
    pub tenor: u32,
    pub installment_amount_cents: i64,
    pub installments_paid: u32,
    pub source_file: String,
    /// 1-based data row number within the source file.
    pub row: usize,
}

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// Key that decides which rows belong to the same employee.
///
/// Employee numbers and name fallbacks live in separate variants so an
/// employee number can never collide with somebody's name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum IdentityKey {
    EmployeeId(String),
    Name(String),
}

impl IdentityKey {
    pub fn is_name_fallback(&self) -> bool {
        matches!(self, Self::Name(_))
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmployeeId(id) => write!(f, "id:{id}"),
            Self::Name(name) => write!(f, "name:{name}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Merged record
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoanStatus {
    /// Paid off.
    Lunas,
    /// In progress.
    Berjalan,
    /// Not started.
    BelumBayar,
}

impl LoanStatus {
    pub const ALL: [LoanStatus; 3] = [Self::Lunas, Self::Berjalan, Self::BelumBayar];

    /// Display label used by reports and exports.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Lunas => "Lunas",
            Self::Berjalan => "Berjalan",
            Self::BelumBayar => "Belum Bayar",
        }
    }
}

impl fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lunas => write!(f, "LUNAS"),
            Self::Berjalan => write!(f, "BERJALAN"),
            Self::BelumBayar => write!(f, "BELUM_BAYAR"),
        }
    }
}

impl FromStr for LoanStatus {
    type Err = String;

    /// Accepts the wire names (`BELUM_BAYAR`) and the display labels (`Belum Bayar`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let folded: String = s
            .trim()
            .chars()
            .map(|c| if c == ' ' || c == '-' { '_' } else { c.to_ascii_uppercase() })
            .collect();
        match folded.as_str() {
            "LUNAS" => Ok(Self::Lunas),
            "BERJALAN" => Ok(Self::Berjalan),
            "BELUM_BAYAR" => Ok(Self::BelumBayar),
            _ => Err(format!(
                "unknown status '{s}' (expected LUNAS, BERJALAN or BELUM_BAYAR)"
            )),
        }
    }
}

/// The figures one source row added to a merged record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contribution {
    pub source_file: String,
    pub row: usize,
    pub loan_amount_cents: i64,
    pub tenor: u32,
    pub installment_amount_cents: i64,
    pub installments_paid: u32,
}

impl From<&LoanRecord> for Contribution {
    fn from(r: &LoanRecord) -> Self {
        Self {
            source_file: r.source_file.clone(),
            row: r.row,
            loan_amount_cents: r.loan_amount_cents,
            tenor: r.tenor,
            installment_amount_cents: r.installment_amount_cents,
            installments_paid: r.installments_paid,
        }
    }
}

/// Per-employee reconciled loan record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergedLoanRecord {
    pub identity_key: IdentityKey,
    /// Employee number as last seen (display casing); blank for name-keyed records.
    pub employee_id: String,
    pub employee_name: String,
    pub division: String,
    pub total_loan_cents: i64,
    pub total_installment_cents: i64,
    pub total_tenor: u32,
    pub total_installments_paid: u32,
    pub remaining_installments: u32,
    pub remaining_balance_cents: i64,
    pub status: LoanStatus,
    /// Distinct source files, in first-seen order.
    pub contributing_sources: Vec<String>,
    pub contributions: Vec<Contribution>,
}

// ---------------------------------------------------------------------------
// Batch report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IdentityCollisionWarning {
    /// Different identities whose (current) names normalize to the same key.
    SharedName {
        name_key: String,
        identities: Vec<IdentityKey>,
    },
    /// One employee number seen with two different names.
    NameChanged {
        identity: IdentityKey,
        previous_name: String,
        new_name: String,
    },
}

impl fmt::Display for IdentityCollisionWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SharedName { name_key, identities } => {
                let ids: Vec<String> = identities.iter().map(|k| k.to_string()).collect();
                write!(f, "name '{name_key}' is shared by {}", ids.join(", "))
            }
            Self::NameChanged { identity, previous_name, new_name } => {
                write!(f, "{identity} renamed from '{previous_name}' to '{new_name}'")
            }
        }
    }
}

/// Outcome of merging one batch into the dataset.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub source_file: String,
    pub rows_read: usize,
    pub rows_merged: usize,
    pub rows_skipped: usize,
    pub records_created: usize,
    pub records_updated: usize,
    /// Skip reason → count.
    pub skip_reasons: BTreeMap<String, usize>,
    /// Numeric cells that could not be parsed and were read as zero.
    pub coerced_values: usize,
    /// Negative amounts or counts clamped to zero.
    pub clamped_values: usize,
    pub collisions: Vec<IdentityCollisionWarning>,
}

impl BatchReport {
    pub fn record_skip(&mut self, reason: &dyn fmt::Display) {
        self.rows_skipped += 1;
        *self.skip_reasons.entry(reason.to_string()).or_insert(0) += 1;
    }
}
