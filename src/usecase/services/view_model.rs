use std::cmp::Ordering;

use crate::domain::entities::record::{FieldValue, Record};
use crate::domain::entities::view::{FilterSpec, SortDirection, SortSpec};

/// Rank of a value's kind when two records hold different kinds for one field.
/// Absent values come first in ascending order.
fn kind_rank(value: &FieldValue) -> u8 {
    match value {
        FieldValue::Null => 0,
        FieldValue::Bool(_) => 1,
        FieldValue::Number(_) | FieldValue::Decimal(_, _) => 2,
        FieldValue::Text(_) => 3,
    }
}

/// Case-folded comparison, then lowercase before uppercase on case-only ties.
pub fn locale_compare(a: &str, b: &str) -> Ordering {
    let folded = a
        .chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase));
    folded.then_with(|| b.cmp(a))
}

/// Total order over field values, dispatched on the value kind.
pub fn compare_values(a: &FieldValue, b: &FieldValue) -> Ordering {
    match (a, b) {
        (FieldValue::Null, FieldValue::Null) => Ordering::Equal,
        (FieldValue::Bool(x), FieldValue::Bool(y)) => u8::from(*x).cmp(&u8::from(*y)),
        (FieldValue::Text(x), FieldValue::Text(y)) => locale_compare(x, y),
        _ => match (a.as_number(), b.as_number()) {
            (Some(x), Some(y)) => x.total_cmp(&y),
            _ => kind_rank(a).cmp(&kind_rank(b)),
        },
    }
}

/// Stable sort on a copy of `records`. Descending uses the reversed comparator.
pub fn apply_sort<R: Record>(records: &[R], spec: &SortSpec) -> Vec<R> {
    let mut sorted = records.to_vec();
    sorted.sort_by(|left, right| {
        let ordering = compare_values(&left.field(&spec.field), &right.field(&spec.field));
        match spec.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    });
    sorted
}

pub fn matches_filter<R: Record>(record: &R, spec: &FilterSpec) -> bool {
    if let Some(search) = spec.search.as_ref().filter(|s| !s.term.is_empty()) {
        let haystack = record.field(&search.field).display().to_lowercase();
        if !haystack.contains(&search.term.to_lowercase()) {
            return false;
        }
    }

    if let Some(category) = spec.category.as_ref().filter(|c| !c.value.is_empty()) {
        if record.field(&category.field).display() != category.value {
            return false;
        }
    }

    if let Some(status) = &spec.status {
        if record.field(&status.field) != FieldValue::Bool(status.value) {
            return false;
        }
    }

    true
}

/// Order-preserving subsequence of records that satisfy every active predicate.
pub fn apply_filter<R: Record>(records: &[R], spec: &FilterSpec) -> Vec<R> {
    records
        .iter()
        .filter(|record| matches_filter(*record, spec))
        .cloned()
        .collect()
}

/// Filter, then sort when a sort is active.
pub fn project<R: Record>(records: &[R], sort: Option<&SortSpec>, filter: &FilterSpec) -> Vec<R> {
    let filtered = apply_filter(records, filter);
    match sort {
        Some(spec) => apply_sort(&filtered, spec),
        None => filtered,
    }
}
