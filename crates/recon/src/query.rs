//! Read-side helpers: filtering, ordering and paging merged records.
//!
//! Ordering is a read-time concern; the dataset itself always stays in
//! first-sighting order.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::identity::normalize_employee_id;
use crate::model::{LoanStatus, MergedLoanRecord};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdMatch {
    Exact(String),
    Contains(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    /// First-sighting order.
    #[default]
    Insertion,
    /// Largest total loan first; ties keep first-sighting order.
    LoanAmountDesc,
    NameAsc,
}

/// Conjunctive filter over merged records. Unset fields match everything.
#[derive(Debug, Clone, Default)]
pub struct LoanFilter {
    /// Case-insensitive substring of employee name OR employee number.
    pub search: Option<String>,
    /// Case-insensitive substring of employee name.
    pub name: Option<String>,
    pub employee_id: Option<IdMatch>,
    /// Whole division name, compared case-insensitively.
    pub division: Option<String>,
    pub status: Option<LoanStatus>,
    pub sort: SortOrder,
    /// Keep only the first `limit` results after sorting ("top N").
    pub limit: Option<usize>,
}

/// Grouping key for division names: trimmed and case-folded.
pub fn division_key(division: &str) -> String {
    division.trim().to_lowercase()
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.trim().to_lowercase())
}

impl LoanFilter {
    /// Top `n` borrowers by total loan amount.
    pub fn top_borrowers(n: usize) -> Self {
        Self {
            sort: SortOrder::LoanAmountDesc,
            limit: Some(n),
            ..Self::default()
        }
    }

    pub fn matches(&self, record: &MergedLoanRecord) -> bool {
        if let Some(q) = self.search.as_deref().filter(|q| !q.trim().is_empty()) {
            if !contains_ci(&record.employee_name, q) && !contains_ci(&record.employee_id, q) {
                return false;
            }
        }
        if let Some(name) = self.name.as_deref() {
            if !contains_ci(&record.employee_name, name) {
                return false;
            }
        }
        if let Some(id) = &self.employee_id {
            let have = normalize_employee_id(&record.employee_id);
            let ok = match id {
                IdMatch::Exact(want) => have == normalize_employee_id(want),
                IdMatch::Contains(want) => have.contains(&normalize_employee_id(want)),
            };
            if !ok {
                return false;
            }
        }
        if let Some(division) = self.division.as_deref() {
            if division_key(&record.division) != division_key(division) {
                return false;
            }
        }
        if let Some(status) = self.status {
            if record.status != status {
                return false;
            }
        }
        true
    }
}

/// Apply `filter` to `records`, then sort and truncate as requested.
pub fn find<'a>(records: &'a [MergedLoanRecord], filter: &LoanFilter) -> Vec<&'a MergedLoanRecord> {
    let mut out: Vec<&MergedLoanRecord> = records.iter().filter(|r| filter.matches(r)).collect();
    match filter.sort {
        SortOrder::Insertion => {}
        // sort_by is stable, so ties stay in first-sighting order.
        SortOrder::LoanAmountDesc => out.sort_by(|a, b| b.total_loan_cents.cmp(&a.total_loan_cents)),
        SortOrder::NameAsc => out.sort_by_key(|r| r.employee_name.to_lowercase()),
    }
    if let Some(limit) = filter.limit {
        out.truncate(limit);
    }
    out
}

#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// 1-based.
    pub page: usize,
    pub per_page: usize,
    pub total_items: usize,
    pub total_pages: usize,
}

/// Slice out page `page` (1-based). Pages past the end are empty.
pub fn paginate<T: Clone>(items: &[T], page: usize, per_page: usize) -> Page<T> {
    let per_page = per_page.max(1);
    let page = page.max(1);
    let total_items = items.len();
    let start = (page - 1).saturating_mul(per_page).min(total_items);
    let end = start.saturating_add(per_page).min(total_items);
    Page {
        items: items[start..end].to_vec(),
        page,
        per_page,
        total_items,
        total_pages: total_items.div_ceil(per_page),
    }
}

/// Distinct non-blank division names for filter pickers, sorted and folded
/// by [`division_key`]. Each is spelled as first seen.
pub fn divisions(records: &[MergedLoanRecord]) -> Vec<String> {
    let mut seen: BTreeMap<String, &str> = BTreeMap::new();
    for r in records {
        let name = r.division.trim();
        if !name.is_empty() {
            seen.entry(division_key(name)).or_insert(name);
        }
    }
    seen.into_values().map(str::to_string).collect()
}
