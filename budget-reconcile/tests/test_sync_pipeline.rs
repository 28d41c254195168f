use anyhow::{Result, anyhow};
use async_trait::async_trait;
use budget_core::{Account, AccountSet, CategoryMapping, CategoryRule, ExistingIds, SheetRow, Transaction};
use budget_reconcile::{
    FinanceClient, NoopObserver, ReconcileSummary, SheetsClient, SyncError, SyncOptions, run_sync,
};
use chrono::{TimeZone, Utc};
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::Mutex;

#[derive(Default)]
struct FakeSheets {
    mapping: CategoryMapping,
    existing: Mutex<ExistingIds>,
    appended: Mutex<Vec<SheetRow>>,
    append_calls: Mutex<usize>,
    sort_calls: Mutex<usize>,
    fail_mapping: bool,
    fail_existing: bool,
    fail_append: bool,
    fail_sort: bool,
}

#[async_trait]
impl SheetsClient for FakeSheets {
    async fn category_mapping(&self, _sheet: &str) -> Result<CategoryMapping> {
        if self.fail_mapping {
            return Err(anyhow!("mapping unavailable"));
        }
        Ok(self.mapping.clone())
    }

    async fn existing_ids(&self, _sheet: &str) -> Result<ExistingIds> {
        if self.fail_existing {
            return Err(anyhow!("ids unavailable"));
        }
        Ok(self.existing.lock().unwrap().clone())
    }

    async fn append_rows(&self, _sheet: &str, rows: &[SheetRow]) -> Result<()> {
        *self.append_calls.lock().unwrap() += 1;
        if self.fail_append {
            return Err(anyhow!("quota exceeded"));
        }
        self.appended.lock().unwrap().extend_from_slice(rows);
        self.existing
            .lock()
            .unwrap()
            .extend(rows.iter().map(|r| r.id.clone()));
        Ok(())
    }

    async fn sort_by_date(&self, _sheet: &str) -> Result<()> {
        *self.sort_calls.lock().unwrap() += 1;
        if self.fail_sort {
            return Err(anyhow!("sort rejected"));
        }
        Ok(())
    }
}

struct FakeFinance {
    response: Option<AccountSet>,
}

#[async_trait]
impl FinanceClient for FakeFinance {
    async fn fetch_accounts(&self, _start: chrono::DateTime<Utc>) -> Result<AccountSet> {
        self.response
            .clone()
            .ok_or_else(|| anyhow!("SimpleFIN API returned status 500"))
    }
}

fn txn(id: &str, payee: &str, amount: &str) -> Transaction {
    Transaction {
        id: id.to_string(),
        payee: payee.to_string(),
        amount: Decimal::from_str(amount).unwrap(),
        posted: 1703548800,
        ..Default::default()
    }
}

fn accounts() -> AccountSet {
    AccountSet {
        accounts: vec![Account {
            id: "acc1".to_string(),
            transactions: vec![
                txn("t1", "Starbucks", "-5.00"),
                txn("t2", "Uber", "-15.00"),
                txn("t3", "Gas", "-40.00"),
            ],
            ..Default::default()
        }],
        ..Default::default()
    }
}

fn sheets() -> FakeSheets {
    FakeSheets {
        mapping: [("Starbucks", CategoryRule::category("Food"))]
            .into_iter()
            .collect(),
        existing: Mutex::new(["t2"].into_iter().collect()),
        ..Default::default()
    }
}

fn options() -> SyncOptions {
    SyncOptions {
        sheet_name: "transactions".to_string(),
        mapping_sheet: "lookup".to_string(),
        start_date: Utc.with_ymd_and_hms(2023, 12, 24, 0, 0, 0).unwrap(),
        dry_run: false,
    }
}

fn row(id: &str, payee: &str, amount: f64, category: &str) -> SheetRow {
    SheetRow {
        id: id.to_string(),
        payee: payee.to_string(),
        amount,
        date: "12/26/2023".to_string(),
        category: category.to_string(),
        receipt: String::new(),
    }
}

#[tokio::test]
async fn test_appends_new_rows_and_sorts() {
    let sheets = sheets();
    let finance = FakeFinance { response: Some(accounts()) };

    let report = run_sync(&sheets, &finance, &options(), &NoopObserver).await.unwrap();

    let expected = vec![row("t1", "Starbucks", -5.0, "Food"), row("t3", "Gas", -40.0, "")];
    assert_eq!(report.rows, expected);
    assert!(report.appended);
    assert_eq!(report.seen, 3);
    assert_eq!(report.existing, 1);
    assert_eq!(report.mappings, 1);
    assert_eq!(*sheets.appended.lock().unwrap(), expected);
    assert_eq!(*sheets.sort_calls.lock().unwrap(), 1);
}

#[tokio::test]
async fn test_second_run_inserts_nothing() {
    let sheets = sheets();
    let finance = FakeFinance { response: Some(accounts()) };

    run_sync(&sheets, &finance, &options(), &NoopObserver).await.unwrap();
    let second = run_sync(&sheets, &finance, &options(), &NoopObserver).await.unwrap();

    assert!(second.rows.is_empty());
    assert!(!second.appended);
    assert_eq!(*sheets.append_calls.lock().unwrap(), 1);
    assert_eq!(*sheets.sort_calls.lock().unwrap(), 1);
    assert_eq!(sheets.appended.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn test_no_new_rows_skips_append_and_sort() {
    let sheets = FakeSheets {
        existing: Mutex::new(["t1", "t2", "t3"].into_iter().collect()),
        ..Default::default()
    };
    let finance = FakeFinance { response: Some(accounts()) };

    let report = run_sync(&sheets, &finance, &options(), &NoopObserver).await.unwrap();

    assert!(report.rows.is_empty());
    assert_eq!(*sheets.append_calls.lock().unwrap(), 0);
    assert_eq!(*sheets.sort_calls.lock().unwrap(), 0);
}

#[tokio::test]
async fn test_empty_account_list() {
    let sheets = sheets();
    let finance = FakeFinance { response: Some(AccountSet::default()) };

    let report = run_sync(&sheets, &finance, &options(), &NoopObserver).await.unwrap();

    assert_eq!(report.seen, 0);
    assert_eq!(*sheets.append_calls.lock().unwrap(), 0);
}

#[tokio::test]
async fn test_dry_run_never_writes() {
    let sheets = sheets();
    let finance = FakeFinance { response: Some(accounts()) };
    let opts = SyncOptions { dry_run: true, ..options() };

    let report = run_sync(&sheets, &finance, &opts, &NoopObserver).await.unwrap();

    assert_eq!(report.rows.len(), 2);
    assert!(!report.appended);
    assert_eq!(*sheets.append_calls.lock().unwrap(), 0);
    assert_eq!(*sheets.sort_calls.lock().unwrap(), 0);
}

#[tokio::test]
async fn test_bridge_errors_do_not_fail_the_run() {
    let sheets = sheets();
    let mut response = accounts();
    response.errors = vec!["Connection to Test Bank may need attention".to_string()];
    let finance = FakeFinance { response: Some(response) };

    let report = run_sync(&sheets, &finance, &options(), &NoopObserver).await.unwrap();
    assert!(report.appended);
}

#[tokio::test]
async fn test_observer_sees_counts() {
    let sheets = sheets();
    let finance = FakeFinance { response: Some(accounts()) };
    let seen = Mutex::new(None);
    let observer = |s: &ReconcileSummary| *seen.lock().unwrap() = Some(*s);

    run_sync(&sheets, &finance, &options(), &observer).await.unwrap();

    assert_eq!(
        *seen.lock().unwrap(),
        Some(ReconcileSummary { seen: 3, emitted: 2, skipped: 1 })
    );
}

#[tokio::test]
async fn test_mapping_failure_aborts_before_fetch() {
    let sheets = FakeSheets { fail_mapping: true, ..sheets() };
    let finance = FakeFinance { response: None };

    let err = run_sync(&sheets, &finance, &options(), &NoopObserver).await.unwrap_err();

    assert!(matches!(err, SyncError::CategoryMapping(_)));
    assert_eq!(err.to_string(), "failed to get category mapping");
}

#[tokio::test]
async fn test_existing_ids_failure() {
    let sheets = FakeSheets { fail_existing: true, ..sheets() };
    let finance = FakeFinance { response: Some(accounts()) };

    let err = run_sync(&sheets, &finance, &options(), &NoopObserver).await.unwrap_err();
    assert!(matches!(err, SyncError::ExistingIds(_)));
}

#[tokio::test]
async fn test_fetch_failure_writes_nothing() {
    let sheets = sheets();
    let finance = FakeFinance { response: None };

    let err = run_sync(&sheets, &finance, &options(), &NoopObserver).await.unwrap_err();

    assert!(matches!(err, SyncError::FetchTransactions(_)));
    assert_eq!(*sheets.append_calls.lock().unwrap(), 0);
}

#[tokio::test]
async fn test_append_failure_skips_sort() {
    let sheets = FakeSheets { fail_append: true, ..sheets() };
    let finance = FakeFinance { response: Some(accounts()) };

    let err = run_sync(&sheets, &finance, &options(), &NoopObserver).await.unwrap_err();

    assert!(matches!(err, SyncError::Append(_)));
    assert_eq!(*sheets.sort_calls.lock().unwrap(), 0);
}

#[tokio::test]
async fn test_sort_failure_is_reported() {
    let sheets = FakeSheets { fail_sort: true, ..sheets() };
    let finance = FakeFinance { response: Some(accounts()) };

    let err = run_sync(&sheets, &finance, &options(), &NoopObserver).await.unwrap_err();

    assert!(matches!(err, SyncError::Sort(_)));
    assert_eq!(sheets.appended.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn test_ingested_sheet_rows_drive_the_run() {
    use serde_json::json;

    let lookup: Vec<Vec<serde_json::Value>> = serde_json::from_value(json!([
        ["Starbucks", "Food", "Coffee Shop"],
        ["grocery", "Food"],
        ["payroll", "Income", "Employer"]
    ]))
    .unwrap();
    let ledger: Vec<Vec<serde_json::Value>> =
        serde_json::from_value(json!([["ID", "Payee", "Amount", "Date", "Category", "Receipt"], ["old"]]))
            .unwrap();

    let sheets = FakeSheets {
        mapping: budget_ingest::parse_category_rows(&lookup),
        existing: Mutex::new(budget_ingest::parse_transaction_ids(&ledger)),
        ..Default::default()
    };
    let body = r#"{"accounts": [{"id": "a", "transactions": [
        {"id": "old", "payee": "Starbucks", "amount": "-3.00", "posted": 1703548800},
        {"id": "n1", "payee": "Starbucks", "amount": "-4.50", "posted": 1703548800},
        {"id": "n2", "payee": "", "description": "ACME PAYROLL", "amount": "2000.00", "posted": 1704153600},
        {"id": "n3", "payee": "Kroger Grocery #12", "amount": "-61.25", "posted": 1704153600}
    ]}]}"#;
    let finance = FakeFinance {
        response: Some(budget_ingest::parse_account_set(body).unwrap()),
    };

    let report = run_sync(&sheets, &finance, &options(), &NoopObserver).await.unwrap();

    let got: Vec<(&str, &str, &str, &str)> = report
        .rows
        .iter()
        .map(|r| (r.id.as_str(), r.payee.as_str(), r.date.as_str(), r.category.as_str()))
        .collect();
    assert_eq!(
        got,
        vec![
            ("n1", "Coffee Shop", "12/26/2023", "Food"),
            ("n2", "Employer", "1/2/2024", "Income"),
            ("n3", "Kroger Grocery #12", "1/2/2024", "Food"),
        ]
    );
    assert_eq!(report.rows[2].amount, -61.25);
}
