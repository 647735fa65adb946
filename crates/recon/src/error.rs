use std::fmt;

/// Why a raw row could not be turned into a [`LoanRecord`](crate::model::LoanRecord).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MalformedReason {
    /// Both employee number and employee name are blank.
    MissingIdentity,
}

impl fmt::Display for MalformedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingIdentity => write!(f, "missing employee identity"),
        }
    }
}

#[derive(Debug)]
pub enum LoanError {
    /// Row-level failure. The row is skipped and counted; the batch continues.
    MalformedRow {
        source_file: String,
        row: usize,
        reason: MalformedReason,
    },
    /// Column alias TOML parse / deserialization error.
    ConfigParse(String),
    /// Column alias validation error (empty alias list, empty prefix).
    ColumnConfig(String),
}

impl fmt::Display for LoanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedRow { source_file, row, reason } => {
                write!(f, "'{source_file}', row {row}: {reason}")
            }
            Self::ConfigParse(msg) => write!(f, "column config parse error: {msg}"),
            Self::ColumnConfig(msg) => write!(f, "column config error: {msg}"),
        }
    }
}

impl std::error::Error for LoanError {}
