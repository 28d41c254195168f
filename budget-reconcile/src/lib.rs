//! budget-reconcile: payee category resolution, row shaping, duplicate filtering, and the import pipeline

pub mod reconcile;
pub mod resolver;
pub mod shaper;
pub mod sync;

pub use reconcile::{LogObserver, NoopObserver, ReconcileObserver, ReconcileSummary, reconcile};
pub use resolver::{Resolution, resolve};
pub use shaper::shape;
pub use sync::{FinanceClient, SheetsClient, SyncError, SyncOptions, SyncReport, run_sync};
