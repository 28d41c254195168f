//! SimpleFIN `/accounts` response body.

use anyhow::{Context, Result};
use budget_core::AccountSet;

/// Decode a `/accounts` body. Amounts may arrive as JSON strings or numbers.
pub fn parse_account_set(body: &str) -> Result<AccountSet> {
    serde_json::from_str(body).context("parse SimpleFIN response")
}
