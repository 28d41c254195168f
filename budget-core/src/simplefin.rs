//! SimpleFIN `/accounts` response types.
//!
//! Every field is defaulted so a sparse bridge response still decodes; the
//! bridge omits `holdings`, `memo` and `transacted_at` for many institutions.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Institution that holds an account
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Organization {
    pub domain: String,
    pub name: String,
    #[serde(rename = "sfin-url", skip_serializing_if = "Option::is_none")]
    pub sfin_url: Option<String>,
}

/// Investment position reported alongside an account
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Holding {
    pub id: String,
    pub cost_basis: String,
    pub currency: String,
    pub description: String,
    pub market_value: String,
    pub purchase_price: String,
    pub shares: String,
    pub symbol: String,
    pub created: i64,
}

/// A single posted (or pending) transaction
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Transaction {
    /// Identifier issued by the institution; unique per account
    pub id: String,
    pub description: String,
    pub memo: String,
    /// May be empty; `description` is the fallback
    pub payee: String,
    /// Signed; negative = money out
    pub amount: Decimal,
    /// Seconds since the epoch
    pub posted: i64,
    pub transacted_at: i64,
    pub pending: bool,
}

impl Transaction {
    /// Text used for display and category lookup: payee, else description.
    pub fn display_source(&self) -> &str {
        if self.payee.is_empty() {
            &self.description
        } else {
            &self.payee
        }
    }

    /// Posted instant in UTC. `None` only for epochs outside chrono's range.
    pub fn posted_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.posted, 0)
    }

    pub fn transacted_at_time(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.transacted_at, 0)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Account {
    pub id: String,
    pub name: String,
    pub currency: String,
    pub balance: String,
    #[serde(rename = "available-balance")]
    pub available_balance: String,
    #[serde(rename = "balance-date")]
    pub balance_date: i64,
    pub org: Organization,
    pub holdings: Vec<Holding>,
    pub transactions: Vec<Transaction>,
}

/// Top-level `/accounts` payload
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AccountSet {
    pub accounts: Vec<Account>,
    /// Non-fatal bridge messages (e.g. an institution needing re-auth)
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
    #[serde(rename = "x-api-message", skip_serializing_if = "Vec::is_empty")]
    pub x_api_message: Vec<String>,
}

impl AccountSet {
    pub fn transaction_count(&self) -> usize {
        self.accounts.iter().map(|a| a.transactions.len()).sum()
    }
}
