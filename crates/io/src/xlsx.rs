// Spreadsheet import (xlsx, xls, xlsm, ods) and loan report export (xlsx only)
//
// Import reads the first sheet. The first non-empty row is the header row;
// every later non-empty row becomes one raw row keyed by those headers.

use std::io::Write;
use std::path::Path;

use calamine::{open_workbook_auto, Data, Range, Reader, Sheets};
use rust_xlsxwriter::{Format, Workbook as XlsxWorkbook};

use loanrec_recon::model::{MergedLoanRecord, RawRow, RawValue};

use crate::error::{FileReadError, FileReadErrorKind, WriteError};
use crate::export::{self, ExportCell};

const SHEET_NAME: &str = "Data Pinjaman";
const COLUMN_WIDTHS: [f64; 9] = [14.0, 28.0, 18.0, 18.0, 12.0, 12.0, 12.0, 18.0, 12.0];

pub fn import(path: &Path) -> Result<Vec<RawRow>, FileReadError> {
    let spreadsheet_err = |msg: String| FileReadError::new(path, FileReadErrorKind::Spreadsheet(msg));

    let mut workbook: Sheets<_> = open_workbook_auto(path)
        .map_err(|e| spreadsheet_err(format!("Failed to open workbook: {}", e)))?;

    let sheet_names: Vec<String> = workbook.sheet_names().to_vec();
    let Some(first) = sheet_names.first() else {
        return Err(spreadsheet_err("workbook contains no sheets".to_string()));
    };
    if sheet_names.len() > 1 {
        log::debug!("{}: reading sheet '{}' of {}", path.display(), first, sheet_names.len());
    }

    let range = workbook
        .worksheet_range(first)
        .map_err(|e| spreadsheet_err(format!("Failed to read sheet '{}': {}", first, e)))?;

    Ok(rows_from_range(&range))
}

fn header_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => s.trim().to_string(),
        Data::Float(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{}", *n as i64),
        Data::Float(n) => n.to_string(),
        Data::Int(n) => n.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => dt.as_f64().to_string(),
        Data::Error(e) => format!("#{:?}", e),
    }
}

fn cell_value(cell: &Data) -> RawValue {
    match cell {
        Data::Empty => RawValue::Empty,
        Data::String(s) if s.trim().is_empty() => RawValue::Empty,
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => RawValue::Text(s.clone()),
        Data::Float(n) => RawValue::Number(*n),
        Data::Int(n) => RawValue::Number(*n as f64),
        Data::Bool(b) => RawValue::Bool(*b),
        // Serial day number; dates are never amounts, so only the raw value matters.
        Data::DateTime(dt) => RawValue::Number(dt.as_f64()),
        // Left as text: the normalizer reads it as zero and counts it.
        Data::Error(e) => RawValue::Text(format!("#{:?}", e)),
    }
}

fn rows_from_range(range: &Range<Data>) -> Vec<RawRow> {
    let mut rows = range
        .rows()
        .filter(|cells| cells.iter().any(|c| !matches!(cell_value(c), RawValue::Empty)));

    let Some(header_cells) = rows.next() else {
        return Vec::new();
    };
    let headers: Vec<String> = header_cells.iter().map(header_text).collect();

    rows.map(|cells| {
        headers
            .iter()
            .enumerate()
            .filter(|(_, name)| !name.is_empty())
            .map(|(i, name)| (name.clone(), cells.get(i).map(cell_value).unwrap_or(RawValue::Empty)))
            .collect()
    })
    .collect()
}

fn build_workbook(records: &[MergedLoanRecord]) -> Result<Vec<u8>, String> {
    let mut workbook = XlsxWorkbook::new();
    let header_format = Format::new().set_bold();
    let amount_format = Format::new().set_num_format("#,##0");
    let plain = Format::new();

    let worksheet = workbook
        .add_worksheet()
        .set_name(SHEET_NAME)
        .map_err(|e| format!("Failed to create sheet: {}", e))?;

    for (col, header) in export::HEADERS.iter().enumerate() {
        worksheet
            .write_string_with_format(0, col as u16, *header, &header_format)
            .map_err(|e| format!("Failed to write header: {}", e))?;
        worksheet
            .set_column_width(col as u16, COLUMN_WIDTHS[col])
            .map_err(|e| format!("Failed to set column width: {}", e))?;
    }
    worksheet
        .set_freeze_panes(1, 0)
        .map_err(|e| format!("Failed to freeze header row: {}", e))?;

    for (i, record) in records.iter().enumerate() {
        let row = (i + 1) as u32;
        for (col, cell) in export::row(record).iter().enumerate() {
            let col = col as u16;
            let written = match cell {
                ExportCell::Text(s) => worksheet.write_string_with_format(row, col, s, &plain),
                ExportCell::Amount(cents) => {
                    worksheet.write_number_with_format(row, col, export::amount_value(*cents), &amount_format)
                }
                ExportCell::Count(n) => worksheet.write_number_with_format(row, col, *n, &plain),
            };
            written.map_err(|e| format!("Failed to write row {}: {}", row + 1, e))?;
        }
    }

    workbook
        .save_to_buffer()
        .map_err(|e| format!("Failed to build XLSX file: {}", e))
}

pub fn export(records: &[MergedLoanRecord], path: &Path) -> Result<(), WriteError> {
    let buffer = build_workbook(records).map_err(|e| WriteError::new(path, e))?;
    export::write_atomically(path, |file| file.write_all(&buffer).map_err(|e| e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use loanrec_recon::model::{IdentityKey, LoanStatus};

    fn write_fixture(path: &Path) {
        let mut workbook = XlsxWorkbook::new();
        let ws = workbook.add_worksheet();
        // Title row above the header is blank; header starts on row 2.
        ws.write_string(1, 0, "NOPEG").unwrap();
        ws.write_string(1, 1, "NAMA").unwrap();
        ws.write_string(1, 2, "JML").unwrap();
        ws.write_string(1, 3, "LUNAS").unwrap();
        ws.write_string(2, 0, "E001").unwrap();
        ws.write_string(2, 1, "Budi").unwrap();
        ws.write_number(2, 2, 1500000.0).unwrap();
        ws.write_boolean(2, 3, true).unwrap();
        ws.write_number(4, 0, 1002.0).unwrap();
        ws.write_string(4, 1, "  ").unwrap();
        workbook.save(path).unwrap();
    }

    #[test]
    fn import_first_sheet_with_header_row() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pinjaman.xlsx");
        write_fixture(&path);

        let rows = import(&path).unwrap();
        assert_eq!(rows.len(), 2, "blank row between records is skipped");
        assert_eq!(rows[0].get("NOPEG"), Some(&RawValue::Text("E001".into())));
        assert_eq!(rows[0].get("JML"), Some(&RawValue::Number(1500000.0)));
        assert_eq!(rows[0].get("LUNAS"), Some(&RawValue::Bool(true)));
        assert_eq!(rows[1].get("NOPEG"), Some(&RawValue::Number(1002.0)));
        assert_eq!(rows[1].get("NAMA"), Some(&RawValue::Empty));
    }

    #[test]
    fn import_missing_file_is_spreadsheet_error() {
        let err = import(Path::new("/nonexistent/loans.xlsx")).unwrap_err();
        assert!(matches!(err.kind, FileReadErrorKind::Spreadsheet(_)));
    }

    #[test]
    fn export_writes_headers_and_amounts() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("laporan.xlsx");
        let record = MergedLoanRecord {
            identity_key: IdentityKey::EmployeeId("E001".into()),
            employee_id: "E001".into(),
            employee_name: "Budi".into(),
            division: "Gudang".into(),
            total_loan_cents: 1_200_000_050,
            total_installment_cents: 100_000_000,
            total_tenor: 12,
            total_installments_paid: 6,
            remaining_installments: 6,
            remaining_balance_cents: 600_000_050,
            status: LoanStatus::Berjalan,
            contributing_sources: vec!["a.dbf".into()],
            contributions: vec![],
        };
        export(&[record], &path).unwrap();

        let rows = import(&path).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("No. Pegawai"), Some(&RawValue::Text("E001".into())));
        assert_eq!(rows[0].get("Total Pinjaman (Rp)"), Some(&RawValue::Number(12_000_000.5)));
        assert_eq!(rows[0].get("Pembayaran"), Some(&RawValue::Number(6.0)));
        assert_eq!(rows[0].get("Status"), Some(&RawValue::Text("Berjalan".into())));
    }
}
