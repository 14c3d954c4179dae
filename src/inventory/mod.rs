//! Stock core: per-branch aggregation, the stock classifier, the adjustment
//! fallback chain, and the store seam those pieces talk to.

pub mod adjustment;
pub mod aggregate;
pub mod classify;
pub mod error;
pub mod store;

pub use adjustment::{adjust, AdjustmentKind, AdjustmentOutcome, AdjustmentRequest, QuantityInput};
pub use aggregate::{aggregate_catalog, aggregate_product, ProductStock, StockSnapshot};
pub use classify::{classify_stock, effective_threshold, StockStatus};
pub use error::{InventoryError, StoreError};
pub use store::{delete_branch, InventoryStore, PgInventoryStore};
