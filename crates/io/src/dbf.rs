// dBase III/IV table import
//
// Only what the loan tables need: character, numeric, float, logical and date
// fields. Memo fields (stored in a separate .DBT) are read as their raw
// block reference text. Text is Windows-1252 / Latin-1.

use std::path::Path;

use loanrec_recon::model::{RawRow, RawValue};
use loanrec_recon::normalize::parse_numeric_text;

use crate::error::{FileReadError, FileReadErrorKind};

const HEADER_LEN: usize = 32;
const DESCRIPTOR_LEN: usize = 32;
const DESCRIPTOR_END: u8 = 0x0D;
const DELETED: u8 = b'*';

#[derive(Debug, Clone)]
struct Field {
    name: String,
    kind: u8,
    len: usize,
}

pub fn import(path: &Path) -> Result<Vec<RawRow>, FileReadError> {
    let bytes = std::fs::read(path)
        .map_err(|e| FileReadError::new(path, FileReadErrorKind::Io(e.to_string())))?;
    parse(&bytes).map_err(|msg| FileReadError::new(path, FileReadErrorKind::Dbf(msg)))
}

fn decode(bytes: &[u8]) -> String {
    let (text, _) = encoding_rs::WINDOWS_1252.decode_without_bom_handling(bytes);
    text.into_owned()
}

fn read_fields(bytes: &[u8], header_len: usize) -> Result<Vec<Field>, String> {
    let mut fields = Vec::new();
    let mut offset = HEADER_LEN;
    while offset < header_len && bytes[offset] != DESCRIPTOR_END {
        let Some(desc) = bytes.get(offset..offset + DESCRIPTOR_LEN) else {
            return Err(format!("field descriptor at byte {offset} is truncated"));
        };
        let name_end = desc[..11].iter().position(|&b| b == 0).unwrap_or(11);
        fields.push(Field {
            name: decode(&desc[..name_end]).trim().to_string(),
            kind: desc[11].to_ascii_uppercase(),
            len: usize::from(desc[16]),
        });
        offset += DESCRIPTOR_LEN;
    }
    if fields.is_empty() {
        return Err("table has no fields".into());
    }
    Ok(fields)
}

fn field_value(field: &Field, raw: &[u8]) -> RawValue {
    match field.kind {
        b'N' | b'F' => {
            let text = decode(raw);
            let cleaned = text.trim_matches(|c: char| c == '\0' || c.is_whitespace());
            if cleaned.is_empty() {
                RawValue::Empty
            } else {
                match parse_numeric_text(cleaned) {
                    Some(n) => RawValue::Number(n),
                    // Left as text: the normalizer reads it as zero and counts it.
                    None => RawValue::Text(cleaned.to_string()),
                }
            }
        }
        b'L' => match raw.first().copied() {
            Some(b'T' | b't' | b'Y' | b'y') => RawValue::Bool(true),
            Some(b'F' | b'f' | b'N' | b'n') => RawValue::Bool(false),
            _ => RawValue::Empty,
        },
        b'D' => {
            let text = decode(raw);
            let digits = text.trim();
            if digits.len() == 8 && digits.bytes().all(|b| b.is_ascii_digit()) {
                RawValue::Text(format!("{}-{}-{}", &digits[..4], &digits[4..6], &digits[6..]))
            } else if digits.is_empty() {
                RawValue::Empty
            } else {
                RawValue::Text(digits.to_string())
            }
        }
        _ => {
            let text = decode(raw);
            let trimmed = text.trim_matches(|c: char| c == '\0' || c.is_whitespace());
            if trimmed.is_empty() {
                RawValue::Empty
            } else {
                RawValue::Text(trimmed.to_string())
            }
        }
    }
}

/// Parse a complete `.dbf` image into rows, skipping deleted records.
pub fn parse(bytes: &[u8]) -> Result<Vec<RawRow>, String> {
    if bytes.len() < HEADER_LEN + 1 {
        return Err(format!("file is {} bytes, shorter than a DBF header", bytes.len()));
    }
    let declared_count = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]) as usize;
    let header_len = usize::from(u16::from_le_bytes([bytes[8], bytes[9]]));
    let record_len = usize::from(u16::from_le_bytes([bytes[10], bytes[11]]));

    if header_len < HEADER_LEN + 1 || header_len > bytes.len() {
        return Err(format!("header length {header_len} is out of range"));
    }

    let fields = read_fields(bytes, header_len)?;
    let data_len: usize = fields.iter().map(|f| f.len).sum::<usize>() + 1;
    if record_len < data_len {
        return Err(format!(
            "record length {record_len} is shorter than its fields ({data_len})"
        ));
    }

    // The declared count is untrusted; never size anything from it.
    let available = (bytes.len() - header_len) / record_len;
    if declared_count > available {
        log::warn!("DBF declares {declared_count} records but data holds {available}");
    }
    let record_count = declared_count.min(available);

    let mut rows = Vec::with_capacity(record_count);
    for i in 0..record_count {
        let start = header_len + i * record_len;
        let record = &bytes[start..start + record_len];
        if record[0] == DELETED {
            continue;
        }
        let mut row = RawRow::new();
        let mut offset = 1;
        for field in &fields {
            let raw = &record[offset..offset + field.len];
            row.push(field.name.clone(), field_value(field, raw));
            offset += field.len;
        }
        rows.push(row);
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_table(fields: &[(&str, u8, u8)], records: &[(bool, Vec<&str>)]) -> Vec<u8> {
        let header_len = HEADER_LEN + fields.len() * DESCRIPTOR_LEN + 1;
        let record_len = 1 + fields.iter().map(|f| usize::from(f.2)).sum::<usize>();

        let mut out = vec![0u8; HEADER_LEN];
        out[0] = 0x03;
        out[4..8].copy_from_slice(&(records.len() as u32).to_le_bytes());
        out[8..10].copy_from_slice(&(header_len as u16).to_le_bytes());
        out[10..12].copy_from_slice(&(record_len as u16).to_le_bytes());

        for (name, kind, len) in fields {
            let mut desc = [0u8; DESCRIPTOR_LEN];
            let name = name.as_bytes();
            desc[..name.len().min(10)].copy_from_slice(&name[..name.len().min(10)]);
            desc[11] = *kind;
            desc[16] = *len;
            out.extend_from_slice(&desc);
        }
        out.push(DESCRIPTOR_END);

        for (deleted, values) in records {
            out.push(if *deleted { DELETED } else { b' ' });
            for ((_, _, len), value) in fields.iter().zip(values) {
                let (value, _, _) = encoding_rs::WINDOWS_1252.encode(value);
                let mut cell = vec![b' '; usize::from(*len)];
                let n = value.len().min(cell.len());
                cell[..n].copy_from_slice(&value[..n]);
                out.extend_from_slice(&cell);
            }
        }
        out.push(0x1A);
        out
    }

    const FIELDS: &[(&str, u8, u8)] = &[
        ("NOPEG", b'C', 6),
        ("NAMA", b'C', 12),
        ("JML", b'N', 12),
        ("AKTIF", b'L', 1),
        ("TGL", b'D', 8),
    ];

    #[test]
    fn reads_typed_fields() {
        let image = build_table(
            FIELDS,
            &[(false, vec!["E001", "José", "  1500000,50", "T", "20240115"])],
        );
        let rows = parse(&image).unwrap();
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.get("NOPEG"), Some(&RawValue::Text("E001".into())));
        assert_eq!(row.get("NAMA"), Some(&RawValue::Text("José".into())));
        assert_eq!(row.get("JML"), Some(&RawValue::Number(1500000.5)));
        assert_eq!(row.get("AKTIF"), Some(&RawValue::Bool(true)));
        assert_eq!(row.get("TGL"), Some(&RawValue::Text("2024-01-15".into())));
    }

    #[test]
    fn nul_padded_numbers_and_blanks() {
        let image = build_table(
            FIELDS,
            &[(false, vec!["E002", "", "\0\0\0\0\0\0\0\0\0\0\0\0", "?", ""])],
        );
        let rows = parse(&image).unwrap();
        let row = &rows[0];
        assert_eq!(row.get("NAMA"), Some(&RawValue::Empty));
        assert_eq!(row.get("JML"), Some(&RawValue::Empty));
        assert_eq!(row.get("AKTIF"), Some(&RawValue::Empty));
        assert_eq!(row.get("TGL"), Some(&RawValue::Empty));
    }

    #[test]
    fn garbage_number_kept_as_text() {
        let image = build_table(FIELDS, &[(false, vec!["E003", "X", "12abc", "F", ""])]);
        let rows = parse(&image).unwrap();
        assert_eq!(rows[0].get("JML"), Some(&RawValue::Text("12abc".into())));
        assert_eq!(rows[0].get("AKTIF"), Some(&RawValue::Bool(false)));
    }

    #[test]
    fn deleted_records_skipped() {
        let image = build_table(
            FIELDS,
            &[
                (true, vec!["E001", "Gone", "1", "T", ""]),
                (false, vec!["E002", "Kept", "2", "T", ""]),
            ],
        );
        let rows = parse(&image).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("NAMA"), Some(&RawValue::Text("Kept".into())));
    }

    #[test]
    fn truncated_data_keeps_complete_records() {
        let mut image = build_table(
            FIELDS,
            &[
                (false, vec!["E001", "A", "1", "T", ""]),
                (false, vec!["E002", "B", "2", "T", ""]),
            ],
        );
        image.truncate(image.len() - 20);
        let rows = parse(&image).unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn inflated_record_count_is_capped_by_file_size() {
        let mut image = build_table(
            FIELDS,
            &[
                (false, vec!["E001", "A", "1", "T", ""]),
                (false, vec!["E002", "B", "2", "T", ""]),
            ],
        );
        image[4..8].copy_from_slice(&u32::MAX.to_le_bytes());
        let rows = parse(&image).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].get("NOPEG"), Some(&RawValue::Text("E002".into())));
    }

    #[test]
    fn rejects_short_file() {
        assert!(parse(&[0u8; 10]).is_err());
    }

    #[test]
    fn rejects_bad_header_length() {
        let mut image = build_table(FIELDS, &[]);
        image[8..10].copy_from_slice(&u16::MAX.to_le_bytes());
        assert!(parse(&image).unwrap_err().contains("header length"));
    }
}
