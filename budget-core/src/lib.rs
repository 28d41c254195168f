//! budget-core: SimpleFIN and spreadsheet data model shared by the importer crates

pub mod sheets;
pub mod simplefin;

pub use sheets::{CategoryMapping, CategoryRule, ExistingIds, SheetRow};
pub use simplefin::{Account, AccountSet, Holding, Organization, Transaction};
