//! `loanrec-recon`: employee-loan reconciliation engine.
//!
//! Pure engine crate: receives raw rows already read from source files,
//! normalizes them, merges them per employee and keeps the merged dataset.
//! No file-format dependencies.

pub mod aggregate;
pub mod config;
pub mod dashboard;
pub mod derived;
pub mod error;
pub mod identity;
pub mod model;
pub mod normalize;
pub mod query;
pub mod store;

pub use config::ColumnAliases;
pub use dashboard::DashboardSummary;
pub use error::LoanError;
pub use model::{
    BatchReport, IdentityCollisionWarning, IdentityKey, LoanRecord, LoanStatus, MergedLoanRecord, RawBatch, RawRow,
    RawValue, SourceFormat,
};
pub use query::{IdMatch, LoanFilter, SortOrder};
pub use store::{Dataset, DatasetStore};
