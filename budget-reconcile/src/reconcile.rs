//! Filter incoming transactions against recorded ids and shape the new ones.

use budget_core::{Account, CategoryMapping, ExistingIds, SheetRow};

use crate::shaper::shape;

/// Counts from one reconcile pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReconcileSummary {
    /// Transactions across all accounts
    pub seen: usize,
    /// Rows produced
    pub emitted: usize,
    /// Already recorded
    pub skipped: usize,
}

/// Receives the summary of each reconcile pass.
pub trait ReconcileObserver {
    fn on_reconciled(&self, summary: &ReconcileSummary);
}

/// Discards summaries.
pub struct NoopObserver;

impl ReconcileObserver for NoopObserver {
    fn on_reconciled(&self, _summary: &ReconcileSummary) {}
}

/// Emits each summary as a `tracing` event.
pub struct LogObserver;

impl ReconcileObserver for LogObserver {
    fn on_reconciled(&self, summary: &ReconcileSummary) {
        tracing::info!(
            seen = summary.seen,
            new = summary.emitted,
            skipped = summary.skipped,
            "Found {} total transactions, {} new",
            summary.seen,
            summary.emitted
        );
    }
}

impl<F: Fn(&ReconcileSummary)> ReconcileObserver for F {
    fn on_reconciled(&self, summary: &ReconcileSummary) {
        self(summary)
    }
}

/// Rows for every transaction whose id is not in `existing`.
///
/// Output order is account order, then transaction order within each account.
pub fn reconcile(
    accounts: &[Account],
    mapping: &CategoryMapping,
    existing: &ExistingIds,
    observer: &dyn ReconcileObserver,
) -> Vec<SheetRow> {
    let mut summary = ReconcileSummary::default();
    let mut rows = Vec::new();

    for txn in accounts.iter().flat_map(|a| a.transactions.iter()) {
        summary.seen += 1;
        if existing.contains(&txn.id) {
            summary.skipped += 1;
            continue;
        }
        rows.push(shape(txn, mapping));
    }

    summary.emitted = rows.len();
    observer.on_reconciled(&summary);
    rows
}
