// Report layout shared by the CSV and XLSX exporters

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use loanrec_recon::model::MergedLoanRecord;

use crate::error::WriteError;

pub const HEADERS: [&str; 9] = [
    "No. Pegawai",
    "Nama Karyawan",
    "Divisi",
    "Total Pinjaman (Rp)",
    "Total Tenor (Bln)",
    "Pembayaran",
    "Sisa Tenor (Bln)",
    "Sisa Pinjaman (Rp)",
    "Status",
];

#[derive(Debug, Clone, PartialEq)]
pub enum ExportCell {
    Text(String),
    /// Minor units (cents).
    Amount(i64),
    Count(u32),
}

/// Project one merged record onto the report columns.
pub fn row(r: &MergedLoanRecord) -> [ExportCell; 9] {
    [
        ExportCell::Text(r.employee_id.clone()),
        ExportCell::Text(r.employee_name.clone()),
        ExportCell::Text(r.division.clone()),
        ExportCell::Amount(r.total_loan_cents),
        ExportCell::Count(r.total_tenor),
        ExportCell::Count(r.total_installments_paid),
        ExportCell::Count(r.remaining_installments),
        ExportCell::Amount(r.remaining_balance_cents),
        ExportCell::Text(r.status.label().to_string()),
    ]
}

/// Rupiah amount from cents, without a fraction when it is whole.
pub fn format_amount(cents: i64) -> String {
    let whole = cents / 100;
    let frac = (cents % 100).abs();
    if frac == 0 {
        whole.to_string()
    } else if cents < 0 && whole == 0 {
        format!("-0.{frac:02}")
    } else {
        format!("{whole}.{frac:02}")
    }
}

pub fn amount_value(cents: i64) -> f64 {
    cents as f64 / 100.0
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Write through a sibling temp file and rename it over `path`.
/// On failure the temp file is removed and any existing file at `path` is untouched.
pub fn write_atomically<F>(path: &Path, write: F) -> Result<(), WriteError>
where
    F: FnOnce(&mut File) -> Result<(), String>,
{
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| WriteError::new(path, e.to_string()))?;
    }

    let tmp = temp_path(path);
    let result = File::create(&tmp)
        .map_err(|e| e.to_string())
        .and_then(|mut file| {
            write(&mut file)?;
            file.sync_all().map_err(|e| e.to_string())
        })
        .and_then(|()| fs::rename(&tmp, path).map_err(|e| e.to_string()));

    if let Err(message) = result {
        let _ = fs::remove_file(&tmp);
        return Err(WriteError::new(path, message));
    }
    Ok(())
}
