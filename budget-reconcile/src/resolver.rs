//! Payee -> (category, display payee) resolution over the lookup table.
//!
//! Exact key first. Only when no exact key exists does a case-insensitive
//! substring search run, most specific key first (see `CategoryMapping`).

use budget_core::{CategoryMapping, CategoryRule};

/// Result of resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Empty when no matched rule supplies a category
    pub category: String,
    /// Input payee unless the matched rule renames it
    pub payee: String,
}

/// Find the rule that applies to `payee`, if any.
pub fn matching_rule<'m>(payee: &str, mapping: &'m CategoryMapping) -> Option<&'m CategoryRule> {
    mapping
        .exact(payee)
        .or_else(|| mapping.first_substring_match(payee).map(|(_, rule)| rule))
}

/// Resolve a payee against the lookup table. Total: never fails.
pub fn resolve(payee: &str, mapping: &CategoryMapping) -> Resolution {
    match matching_rule(payee, mapping) {
        Some(rule) => Resolution {
            category: rule.category.clone().unwrap_or_default(),
            payee: rule.display_name.clone().unwrap_or_else(|| payee.to_string()),
        },
        None => Resolution {
            category: String::new(),
            payee: payee.to_string(),
        },
    }
}
