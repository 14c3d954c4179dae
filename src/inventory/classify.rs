use serde::{Deserialize, Serialize};

/// Threshold used when a product has none configured.
pub const DEFAULT_LOW_STOCK_THRESHOLD: i32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockStatus {
    OutOfStock,
    LowStock,
    InStock,
}

impl StockStatus {
    pub fn needs_attention(self) -> bool {
        !matches!(self, StockStatus::InStock)
    }
}

impl std::str::FromStr for StockStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "out_of_stock" => Ok(StockStatus::OutOfStock),
            "low_stock" => Ok(StockStatus::LowStock),
            "in_stock" => Ok(StockStatus::InStock),
            other => Err(format!(
                "Invalid stock status '{other}'. Use: in_stock, low_stock, or out_of_stock"
            )),
        }
    }
}

pub fn effective_threshold(configured: Option<i32>) -> i32 {
    configured.unwrap_or(DEFAULT_LOW_STOCK_THRESHOLD)
}

/// Three-way stock classification. The threshold is inclusive: `available == threshold`
/// is low stock.
pub fn classify_stock(available: i64, threshold: i32) -> StockStatus {
    if available <= 0 {
        StockStatus::OutOfStock
    } else if available <= i64::from(threshold) {
        StockStatus::LowStock
    } else {
        StockStatus::InStock
    }
}
