//! Identity resolution: which rows describe the same employee.
//!
//! Stateless and deterministic. The employee number is authoritative; the
//! name is only a fallback for rows that carry no number, and two different
//! people with the same name and no number will resolve to the same key.

use crate::model::{IdentityKey, LoanRecord};

/// Employee numbers: surrounding and internal whitespace removed, uppercased.
pub fn normalize_employee_id(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace() && *c != '\0')
        .flat_map(char::to_uppercase)
        .collect()
}

/// Names: trimmed, whitespace runs collapsed to one space, lowercased.
pub fn normalize_name(raw: &str) -> String {
    raw.split(|c: char| c.is_whitespace() || c == '\0')
        .filter(|part| !part.is_empty())
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn resolve(record: &LoanRecord) -> IdentityKey {
    let id = normalize_employee_id(&record.employee_id);
    if id.is_empty() {
        IdentityKey::Name(normalize_name(&record.employee_name))
    } else {
        IdentityKey::EmployeeId(id)
    }
}
