use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use budget_core::sheets::{DATE_COLUMN, HEADER_ROWS, ID_RANGE, LOOKUP_RANGE, TRANSACTIONS_RANGE};
use budget_core::{CategoryMapping, ExistingIds, SheetRow};
use budget_ingest::{parse_category_rows, parse_transaction_ids};
use budget_reconcile::SheetsClient;
use google_sheets4::Sheets;
use google_sheets4::api::{
    BatchUpdateSpreadsheetRequest, GridRange, Request, SortRangeRequest, SortSpec, Spreadsheet,
    ValueRange,
};
use hyper::client::HttpConnector;
use hyper_rustls::HttpsConnector;
use serde_json::Value;
use std::path::Path;

// IMPORTANT: use the oauth2 version re-exported by google-sheets4 to avoid version mismatches.
use google_sheets4::oauth2;

pub struct GoogleSheetsClient {
    hub: Sheets<HttpsConnector<HttpConnector>>,
    spreadsheet_id: String,
}

impl GoogleSheetsClient {
    /// Authenticate with a service-account key file.
    pub async fn connect(credentials: &Path, spreadsheet_id: &str) -> Result<Self> {
        let key = oauth2::read_service_account_key(credentials)
            .await
            .with_context(|| format!("read {}", credentials.display()))?;
        let auth = oauth2::ServiceAccountAuthenticator::builder(key)
            .build()
            .await
            .context("building service account authenticator")?;

        let connector = hyper_rustls::HttpsConnectorBuilder::new()
            .with_native_roots()
            .https_or_http()
            .enable_http1()
            .build();
        let hub = Sheets::new(hyper::Client::builder().build(connector), auth);

        Ok(Self {
            hub,
            spreadsheet_id: spreadsheet_id.to_string(),
        })
    }

    async fn read_range(&self, range: &str) -> Result<Vec<Vec<Value>>> {
        let (_, values) = self
            .hub
            .spreadsheets()
            .values_get(&self.spreadsheet_id, range)
            .doit()
            .await
            .with_context(|| format!("reading {range}"))?;
        Ok(values.values.unwrap_or_default())
    }
}

#[async_trait]
impl SheetsClient for GoogleSheetsClient {
    async fn category_mapping(&self, sheet: &str) -> Result<CategoryMapping> {
        let rows = self.read_range(&a1_range(sheet, LOOKUP_RANGE)).await?;
        Ok(parse_category_rows(&rows))
    }

    async fn existing_ids(&self, sheet: &str) -> Result<ExistingIds> {
        let rows = self.read_range(&a1_range(sheet, ID_RANGE)).await?;
        Ok(parse_transaction_ids(&rows))
    }

    async fn append_rows(&self, sheet: &str, rows: &[SheetRow]) -> Result<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let range = a1_range(sheet, TRANSACTIONS_RANGE);
        self.hub
            .spreadsheets()
            .values_append(value_range(rows), &self.spreadsheet_id, &range)
            .value_input_option("USER_ENTERED")
            .insert_data_option("INSERT_ROWS")
            .doit()
            .await
            .with_context(|| format!("appending {} rows to {range}", rows.len()))?;
        Ok(())
    }

    async fn sort_by_date(&self, sheet: &str) -> Result<()> {
        let (_, spreadsheet) = self
            .hub
            .spreadsheets()
            .get(&self.spreadsheet_id)
            .doit()
            .await
            .context("reading spreadsheet metadata")?;
        let sheet_id = find_sheet_id(&spreadsheet, sheet)
            .ok_or_else(|| anyhow!("sheet '{sheet}' not found in spreadsheet"))?;

        self.hub
            .spreadsheets()
            .batch_update(sort_by_date_request(sheet_id), &self.spreadsheet_id)
            .doit()
            .await
            .with_context(|| format!("sorting '{sheet}'"))?;
        Ok(())
    }
}

/// `sheet!range`, quoting the sheet title when A1 notation requires it.
pub fn a1_range(sheet: &str, range: &str) -> String {
    if sheet.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        format!("{sheet}!{range}")
    } else {
        format!("'{}'!{range}", sheet.replace('\'', "''"))
    }
}

fn value_range(rows: &[SheetRow]) -> ValueRange {
    ValueRange {
        values: Some(rows.iter().map(|r| r.cells().to_vec()).collect()),
        ..Default::default()
    }
}

fn find_sheet_id(spreadsheet: &Spreadsheet, title: &str) -> Option<i32> {
    spreadsheet
        .sheets
        .iter()
        .flatten()
        .filter_map(|s| s.properties.as_ref())
        .find(|p| p.title.as_deref() == Some(title))
        .map(|p| p.sheet_id.unwrap_or_default())
}

/// Date column descending over every row below the header, columns A..F.
fn sort_by_date_request(sheet_id: i32) -> BatchUpdateSpreadsheetRequest {
    let sort = SortRangeRequest {
        range: Some(GridRange {
            sheet_id: Some(sheet_id),
            start_row_index: Some(HEADER_ROWS),
            start_column_index: Some(0),
            end_column_index: Some(SheetRow::WIDTH as i32),
            ..Default::default()
        }),
        sort_specs: Some(vec![SortSpec {
            dimension_index: Some(DATE_COLUMN),
            sort_order: Some("DESCENDING".to_string()),
            ..Default::default()
        }]),
    };

    BatchUpdateSpreadsheetRequest {
        requests: Some(vec![Request {
            sort_range: Some(sort),
            ..Default::default()
        }]),
        ..Default::default()
    }
}
