//! End-to-end import: read the sheet state, fetch from SimpleFIN, append what is new.
//!
//! Both remote services sit behind traits so the pipeline runs against
//! in-memory doubles in tests.

use anyhow::Result;
use async_trait::async_trait;
use budget_core::{AccountSet, CategoryMapping, ExistingIds, SheetRow};
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::reconcile::{ReconcileObserver, reconcile};

/// Spreadsheet reads and writes used by the importer.
#[async_trait]
pub trait SheetsClient: Send + Sync {
    /// Payee lookup table from `sheet!A:C`.
    async fn category_mapping(&self, sheet: &str) -> Result<CategoryMapping>;

    /// Ids already in `sheet!A:A`.
    async fn existing_ids(&self, sheet: &str) -> Result<ExistingIds>;

    /// Append rows after existing content.
    async fn append_rows(&self, sheet: &str, rows: &[SheetRow]) -> Result<()>;

    /// Sort all rows below the header by date, newest first.
    async fn sort_by_date(&self, sheet: &str) -> Result<()>;
}

/// Source of account and transaction data.
#[async_trait]
pub trait FinanceClient: Send + Sync {
    async fn fetch_accounts(&self, start: DateTime<Utc>) -> Result<AccountSet>;
}

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("failed to get category mapping")]
    CategoryMapping(#[source] anyhow::Error),
    #[error("failed to get existing transaction IDs")]
    ExistingIds(#[source] anyhow::Error),
    #[error("failed to fetch transactions")]
    FetchTransactions(#[source] anyhow::Error),
    #[error("failed to append rows")]
    Append(#[source] anyhow::Error),
    #[error("failed to sort sheet")]
    Sort(#[source] anyhow::Error),
}

#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Ledger sheet (ids, appended rows)
    pub sheet_name: String,
    /// Lookup sheet
    pub mapping_sheet: String,
    /// Earliest transaction date requested from SimpleFIN
    pub start_date: DateTime<Utc>,
    /// Reconcile only; never write to the sheet
    pub dry_run: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncReport {
    pub mappings: usize,
    pub existing: usize,
    pub seen: usize,
    /// New rows, in insertion order
    pub rows: Vec<SheetRow>,
    /// True when rows were appended (and the sheet re-sorted)
    pub appended: bool,
}

/// Run one import. Any collaborator failure aborts the run; nothing is retried.
pub async fn run_sync(
    sheets: &dyn SheetsClient,
    finance: &dyn FinanceClient,
    options: &SyncOptions,
    observer: &dyn ReconcileObserver,
) -> Result<SyncReport, SyncError> {
    tracing::info!("Fetching category mapping...");
    let mapping = sheets
        .category_mapping(&options.mapping_sheet)
        .await
        .map_err(SyncError::CategoryMapping)?;
    tracing::info!("Loaded {} category mappings", mapping.len());

    tracing::info!("Fetching existing transaction IDs...");
    let existing = sheets
        .existing_ids(&options.sheet_name)
        .await
        .map_err(SyncError::ExistingIds)?;
    tracing::info!("Found {} existing transactions", existing.len());

    tracing::info!(
        "Fetching transactions since {}...",
        options.start_date.format("%Y-%m-%d")
    );
    let accounts = finance
        .fetch_accounts(options.start_date)
        .await
        .map_err(SyncError::FetchTransactions)?;
    for message in &accounts.errors {
        tracing::warn!(message = %message, "SimpleFIN reported an error");
    }

    let rows = reconcile(&accounts.accounts, &mapping, &existing, observer);

    let mut report = SyncReport {
        mappings: mapping.len(),
        existing: existing.len(),
        seen: accounts.transaction_count(),
        rows,
        appended: false,
    };

    if report.rows.is_empty() {
        tracing::info!("No new transactions to insert");
        return Ok(report);
    }

    if options.dry_run {
        tracing::info!("Dry run: skipping insert of {} transactions", report.rows.len());
        return Ok(report);
    }

    tracing::info!("Inserting {} new transactions...", report.rows.len());
    sheets
        .append_rows(&options.sheet_name, &report.rows)
        .await
        .map_err(SyncError::Append)?;
    report.appended = true;

    tracing::info!("Sorting sheet by date...");
    sheets
        .sort_by_date(&options.sheet_name)
        .await
        .map_err(SyncError::Sort)?;

    tracing::info!("Done!");
    Ok(report)
}
