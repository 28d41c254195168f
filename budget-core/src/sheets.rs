//! Spreadsheet-side types: the payee lookup table, the set of already
//! recorded transaction ids, and the row appended to the ledger.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};

/// Columns written for each ledger row.
pub const TRANSACTIONS_RANGE: &str = "A:F";
/// Column holding the transaction id.
pub const ID_RANGE: &str = "A:A";
/// Lookup sheet: payee key, category, display-name override.
pub const LOOKUP_RANGE: &str = "A:C";
/// Zero-based index of the date column (D).
pub const DATE_COLUMN: i32 = 3;
/// Rows at the top of the ledger excluded from sorting.
pub const HEADER_ROWS: i32 = 1;

/// One row of the lookup sheet, minus its key.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CategoryRule {
    pub category: Option<String>,
    /// Replaces the payee text when present
    pub display_name: Option<String>,
}

impl CategoryRule {
    pub fn new(category: Option<&str>, display_name: Option<&str>) -> Self {
        Self {
            category: category.map(str::to_string),
            display_name: display_name.map(str::to_string),
        }
    }

    pub fn category(category: &str) -> Self {
        Self::new(Some(category), None)
    }

    pub fn rename(display_name: &str) -> Self {
        Self::new(None, Some(display_name))
    }

    /// A rule that neither categorizes nor renames.
    pub fn is_noop(&self) -> bool {
        self.category.is_none() && self.display_name.is_none()
    }
}

/// Payee key -> rule.
///
/// Keys compare case-sensitively for exact lookup. Substring candidates are
/// kept pre-ordered longest key first, ties broken by ascending key, so the
/// most specific key wins regardless of sheet order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryMapping {
    rules: BTreeMap<String, CategoryRule>,
    /// (lowercased key, key), in substring priority order
    by_specificity: Vec<(String, String)>,
}

impl CategoryMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the rule for `key`. No-op rules are dropped, and
    /// dropping one also clears any earlier rule for the same key.
    pub fn insert(&mut self, key: impl Into<String>, rule: CategoryRule) {
        let key = key.into();
        if rule.is_noop() {
            if self.rules.remove(&key).is_some() {
                self.by_specificity.retain(|(_, k)| *k != key);
            }
            return;
        }
        if self.rules.insert(key.clone(), rule).is_none() {
            let entry = (key.to_lowercase(), key);
            let at = self
                .by_specificity
                .binary_search_by(|e| specificity_order(e, &entry))
                .unwrap_or_else(|i| i);
            self.by_specificity.insert(at, entry);
        }
    }

    pub fn exact(&self, payee: &str) -> Option<&CategoryRule> {
        self.rules.get(payee)
    }

    /// First key (in specificity order) contained in `payee`, ignoring case.
    pub fn first_substring_match(&self, payee: &str) -> Option<(&str, &CategoryRule)> {
        let haystack = payee.to_lowercase();
        self.by_specificity
            .iter()
            .find(|(lower, _)| haystack.contains(lower.as_str()))
            .and_then(|(_, key)| self.rules.get_key_value(key))
            .map(|(k, rule)| (k.as_str(), rule))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Rules in ascending key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &CategoryRule)> {
        self.rules.iter().map(|(k, r)| (k.as_str(), r))
    }
}

/// Longer lowercased key first, then ascending key.
fn specificity_order(a: &(String, String), b: &(String, String)) -> Ordering {
    b.0.len().cmp(&a.0.len()).then_with(|| a.1.cmp(&b.1))
}

impl<K: Into<String>> FromIterator<(K, CategoryRule)> for CategoryMapping {
    fn from_iter<I: IntoIterator<Item = (K, CategoryRule)>>(iter: I) -> Self {
        let mut mapping = Self::new();
        for (key, rule) in iter {
            mapping.insert(key, rule);
        }
        mapping
    }
}

/// Transaction ids already present in the ledger.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExistingIds(HashSet<String>);

impl ExistingIds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.0.contains(id)
    }

    pub fn insert(&mut self, id: impl Into<String>) -> bool {
        self.0.insert(id.into())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for ExistingIds {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl<S: Into<String>> Extend<S> for ExistingIds {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        self.0.extend(iter.into_iter().map(Into::into));
    }
}

/// A ledger row, columns `A..F`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SheetRow {
    pub id: String,
    pub payee: String,
    pub amount: f64,
    /// `M/D/YYYY`
    pub date: String,
    pub category: String,
    /// Reserved; always empty
    pub receipt: String,
}

impl SheetRow {
    pub const WIDTH: usize = 6;

    pub fn cells(&self) -> [Value; Self::WIDTH] {
        [
            Value::from(self.id.as_str()),
            Value::from(self.payee.as_str()),
            Value::from(self.amount),
            Value::from(self.date.as_str()),
            Value::from(self.category.as_str()),
            Value::from(self.receipt.as_str()),
        ]
    }
}
