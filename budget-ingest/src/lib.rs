//! budget-ingest: decode collaborator payloads (SimpleFIN JSON, sheet value ranges) into the core model.

pub mod parsers;

pub use parsers::sheet_rows::{parse_category_rows, parse_transaction_ids};
pub use parsers::simplefin::parse_account_set;
