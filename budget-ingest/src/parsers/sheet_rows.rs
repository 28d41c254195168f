//! Sheet value ranges -> lookup table / recorded ids.
//!
//! Rows come back ragged: trailing empty cells are omitted by the Sheets API,
//! so a lookup row may have one, two or three cells.

use budget_core::{CategoryMapping, CategoryRule, ExistingIds};
use serde_json::Value;

fn non_empty_str(row: &[Value], idx: usize) -> Option<&str> {
    row.get(idx).and_then(Value::as_str).filter(|s| !s.is_empty())
}

/// Build the payee lookup from `A:C` (key, category, display name).
///
/// Rows with a missing, non-string or empty key are skipped.
pub fn parse_category_rows(rows: &[Vec<Value>]) -> CategoryMapping {
    let mut mapping = CategoryMapping::new();
    for row in rows {
        let Some(key) = non_empty_str(row, 0) else {
            continue;
        };
        let rule = CategoryRule::new(non_empty_str(row, 1), non_empty_str(row, 2));
        mapping.insert(key, rule);
    }
    mapping
}

/// Collect ids from the first column. Non-string cells and empty rows are skipped.
pub fn parse_transaction_ids(rows: &[Vec<Value>]) -> ExistingIds {
    rows.iter()
        .filter_map(|row| row.first().and_then(Value::as_str))
        .collect()
}
