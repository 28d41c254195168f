//! Transaction -> ledger row.

use budget_core::{CategoryMapping, SheetRow, Transaction};
use rust_decimal::prelude::ToPrimitive;

use crate::resolver::resolve;

/// `M/D/YYYY`, no zero padding.
pub const DATE_FORMAT: &str = "%-m/%-d/%Y";

/// Posted date in UTC, or an empty cell if the epoch is outside the calendar range.
pub fn format_posted(txn: &Transaction) -> String {
    txn.posted_at()
        .map(|dt| dt.format(DATE_FORMAT).to_string())
        .unwrap_or_default()
}

/// Build the row for one transaction.
///
/// The decimal amount is converted to `f64` here and nowhere earlier.
pub fn shape(txn: &Transaction, mapping: &CategoryMapping) -> SheetRow {
    let resolved = resolve(txn.display_source(), mapping);

    SheetRow {
        id: txn.id.clone(),
        payee: resolved.payee,
        amount: txn.amount.to_f64().unwrap_or_default(),
        date: format_posted(txn),
        category: resolved.category,
        receipt: String::new(),
    }
}
