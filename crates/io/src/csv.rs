// CSV/TSV import and loan report export

use std::io::{Read, Write};
use std::path::Path;

use loanrec_recon::model::{MergedLoanRecord, RawRow, RawValue};

use crate::error::{FileReadError, FileReadErrorKind, WriteError};
use crate::export::{self, ExportCell};

const UTF8_BOM: &str = "\u{feff}";

/// Import a delimited file. The first non-empty record is the header row.
pub fn import(path: &Path) -> Result<Vec<RawRow>, FileReadError> {
    let content = read_file_as_utf8(path)
        .map_err(|e| FileReadError::new(path, FileReadErrorKind::Io(e)))?;
    let content = content.strip_prefix(UTF8_BOM).unwrap_or(&content);
    let delimiter = if has_extension(path, "tsv") { b'\t' } else { sniff_delimiter(content) };
    import_from_string(content, delimiter)
        .map_err(|e| FileReadError::new(path, FileReadErrorKind::Csv(e)))
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(ext))
}

/// Detect the most likely field delimiter by checking consistency across the first few lines.
///
/// For each candidate (tab, semicolon, comma, pipe), count fields per line. The delimiter
/// that produces the most consistent field count (>1 field) wins.
fn sniff_delimiter(content: &str) -> u8 {
    let candidates: &[u8] = &[b'\t', b';', b',', b'|'];
    let sample_lines: Vec<&str> = content.lines().filter(|l| !l.trim().is_empty()).take(10).collect();

    if sample_lines.is_empty() {
        return b',';
    }

    let mut best = b',';
    let mut best_score = 0u64;

    for &delim in candidates {
        let counts: Vec<usize> = sample_lines
            .iter()
            .map(|line| {
                csv::ReaderBuilder::new()
                    .delimiter(delim)
                    .has_headers(false)
                    .flexible(true)
                    .from_reader(line.as_bytes())
                    .records()
                    .next()
                    .and_then(|r| r.ok())
                    .map(|r| r.len())
                    .unwrap_or(1)
            })
            .collect();

        if counts.first().copied().unwrap_or(0) <= 1 {
            continue;
        }

        // Lines agreeing with the header's width, weighted by that width.
        let target = counts[0];
        let consistent = counts.iter().filter(|&&c| c == target).count() as u64;
        let score = consistent * target as u64;

        if score > best_score {
            best_score = score;
            best = delim;
        }
    }

    best
}

/// Read file and convert to UTF-8 if needed (handles Windows-1252, Latin-1, etc.)
pub fn read_file_as_utf8(path: &Path) -> Result<String, String> {
    let mut file = std::fs::File::open(path).map_err(|e| e.to_string())?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes).map_err(|e| e.to_string())?;

    match String::from_utf8(bytes) {
        Ok(s) => Ok(s),
        Err(e) => {
            let bytes = e.into_bytes();
            // Excel-exported CSVs from the payroll office are Windows-1252.
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
            Ok(decoded.into_owned())
        }
    }
}

fn cell_value(field: &str) -> RawValue {
    if field.trim().is_empty() {
        RawValue::Empty
    } else {
        RawValue::Text(field.to_string())
    }
}

fn import_from_string(content: &str, delimiter: u8) -> Result<Vec<RawRow>, String> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut headers: Option<Vec<String>> = None;
    let mut rows = Vec::new();

    for result in reader.records() {
        let record = result.map_err(|e| e.to_string())?;
        if record.iter().all(|f| f.trim().is_empty()) {
            continue;
        }
        let Some(header) = &headers else {
            headers = Some(record.iter().map(|h| h.trim().to_string()).collect());
            continue;
        };
        let row: RawRow = header
            .iter()
            .enumerate()
            .filter(|(_, name)| !name.is_empty())
            .map(|(i, name)| (name.clone(), record.get(i).map(cell_value).unwrap_or(RawValue::Empty)))
            .collect();
        rows.push(row);
    }

    Ok(rows)
}

/// Write the loan report as UTF-8 CSV with a byte-order mark so Excel picks the right encoding.
pub fn export_records<W: Write>(records: &[MergedLoanRecord], mut out: W) -> Result<(), String> {
    out.write_all(UTF8_BOM.as_bytes()).map_err(|e| e.to_string())?;
    let mut writer = csv::WriterBuilder::new().from_writer(out);

    writer.write_record(export::HEADERS).map_err(|e| e.to_string())?;
    for record in records {
        let fields: Vec<String> = export::row(record)
            .iter()
            .map(|cell| match cell {
                ExportCell::Text(s) => s.clone(),
                ExportCell::Amount(v) => export::format_amount(*v),
                ExportCell::Count(n) => n.to_string(),
            })
            .collect();
        writer.write_record(&fields).map_err(|e| e.to_string())?;
    }

    writer.flush().map_err(|e| e.to_string())?;
    Ok(())
}

pub fn export(records: &[MergedLoanRecord], path: &Path) -> Result<(), WriteError> {
    export::write_atomically(path, |file| export_records(records, file))
}
