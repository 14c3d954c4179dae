use serde::Serialize;
use uuid::Uuid;

use super::classify::{classify_stock, effective_threshold, StockStatus};
use crate::models::branch::Branch;
use crate::models::inventory::InventoryRecord;
use crate::models::product::Product;

/// Stock of one product summed over every branch, plus a per-branch breakdown.
///
/// Totals are `i64` so that many large branch rows cannot overflow them.
#[derive(Debug, Clone, Serialize)]
pub struct ProductStock {
    pub product_id: Uuid,
    pub total_quantity: i64,
    pub total_reserved: i64,
    pub total_available: i64,
    /// One entry per branch, in branch order. Branches without a row get a zero placeholder.
    pub items: Vec<InventoryRecord>,
}

/// Branch that owns unscoped (`branch_id = NULL`) rows: the main branch, or the first listed
/// branch when the main one is not among `branches`.
fn unscoped_owner(branches: &[Branch]) -> Option<Uuid> {
    branches
        .iter()
        .find(|b| b.is_main_branch)
        .or_else(|| branches.first())
        .map(|b| b.id)
}

fn absorb(mut acc: InventoryRecord, row: &InventoryRecord) -> InventoryRecord {
    acc.quantity = acc.quantity.saturating_add(row.quantity);
    acc.reserved_quantity = acc.reserved_quantity.saturating_add(row.reserved_quantity);
    acc.available_quantity = acc.available_quantity.saturating_add(row.available_quantity);
    acc.updated_at = acc.updated_at.max(row.updated_at);
    acc
}

/// Totals are the sums of `items`, so `total_available == sum(items.available_quantity)`
/// holds for any row and branch set. Rows scoped to a branch outside `branches` are not
/// counted.
pub fn aggregate_product(
    product_id: Uuid,
    rows: &[InventoryRecord],
    branches: &[Branch],
) -> ProductStock {
    let owner = unscoped_owner(branches);

    let items: Vec<InventoryRecord> = branches
        .iter()
        .map(|branch| {
            rows.iter()
                .filter(|r| r.product_id == product_id)
                .filter(|r| match r.branch_id {
                    Some(id) => id == branch.id,
                    None => owner == Some(branch.id),
                })
                .fold(None, |acc: Option<InventoryRecord>, row| {
                    Some(match acc {
                        Some(acc) => absorb(acc, row),
                        None => InventoryRecord { branch_id: Some(branch.id), ..row.clone() },
                    })
                })
                .unwrap_or_else(|| InventoryRecord::placeholder(product_id, branch.id))
        })
        .collect();

    let sum = |field: fn(&InventoryRecord) -> i32| items.iter().map(|i| i64::from(field(i))).sum::<i64>();

    ProductStock {
        product_id,
        total_quantity: sum(|i| i.quantity),
        total_reserved: sum(|i| i.reserved_quantity),
        total_available: sum(|i| i.available_quantity),
        items,
    }
}

/// A product with its aggregate and classification, as listed on the overview.
#[derive(Debug, Clone)]
pub struct CatalogStock<'a> {
    pub product: &'a Product,
    pub stock: ProductStock,
    pub threshold: i32,
    pub status: StockStatus,
}

pub fn aggregate_catalog<'a>(
    products: &'a [Product],
    rows: &[InventoryRecord],
    branches: &[Branch],
) -> Vec<CatalogStock<'a>> {
    products
        .iter()
        .map(|product| {
            let stock = aggregate_product(product.id, rows, branches);
            let threshold = effective_threshold(product.low_stock_threshold);
            let status = classify_stock(stock.total_available, threshold);
            CatalogStock { product, stock, threshold, status }
        })
        .collect()
}

/// What is known about one (product, branch) cell right before an adjustment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StockSnapshot {
    pub quantity: i32,
    pub available: i32,
}

impl StockSnapshot {
    /// Missing rows read as zero stock.
    pub fn for_branch(rows: &[InventoryRecord], product_id: Uuid, branch_id: Option<Uuid>) -> Self {
        rows.iter()
            .find(|r| r.product_id == product_id && r.branch_id == branch_id)
            .map(|r| Self { quantity: r.quantity, available: r.available_quantity })
            .unwrap_or_default()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::Utc;

    pub(crate) fn branch(name: &str, is_main: bool) -> Branch {
        Branch {
            id: Uuid::new_v4(),
            store_id: Uuid::nil(),
            name_en: name.to_string(),
            name_ar: name.to_string(),
            address: None,
            is_main_branch: is_main,
            created_at: Utc::now(),
        }
    }

    pub(crate) fn record(product_id: Uuid, branch_id: Option<Uuid>, qty: i32, reserved: i32) -> InventoryRecord {
        InventoryRecord {
            id: Some(Uuid::new_v4()),
            product_id,
            branch_id,
            quantity: qty,
            reserved_quantity: reserved,
            available_quantity: qty - reserved,
            updated_at: Some(Utc::now()),
        }
    }

    pub(crate) fn product(threshold: Option<i32>) -> Product {
        Product {
            id: Uuid::new_v4(),
            store_id: Uuid::nil(),
            name_en: "Coffee beans".into(),
            name_ar: "حبوب القهوة".into(),
            sku: Some("CB-1".into()),
            price: 12.5,
            is_available: true,
            low_stock_threshold: threshold,
            track_inventory: true,
            deleted_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn missing_branch_gets_zero_placeholder() {
        let p = product(Some(10));
        let main = branch("Main", true);
        let east = branch("East", false);
        let rows = vec![record(p.id, Some(main.id), 5, 0)];

        let stock = aggregate_product(p.id, &rows, &[main.clone(), east.clone()]);

        assert_eq!(stock.total_available, 5);
        assert_eq!(stock.items.len(), 2);
        let east_item = stock.items.iter().find(|i| i.branch_id == Some(east.id)).unwrap();
        assert!(east_item.is_placeholder());
        assert_eq!(east_item.quantity, 0);
        assert_eq!(classify_stock(stock.total_available, 10), StockStatus::LowStock);
    }

    #[test]
    fn totals_match_item_sums() {
        let p = product(None);
        let branches = vec![branch("A", true), branch("B", false), branch("C", false)];
        let rows = vec![
            record(p.id, Some(branches[0].id), 8, 2),
            record(p.id, Some(branches[2].id), 4, 1),
        ];

        let stock = aggregate_product(p.id, &rows, &branches);

        assert_eq!(stock.total_available, items_available(&stock));
        assert_eq!(stock.total_quantity, 12);
        assert_eq!(stock.total_reserved, 3);
    }

    #[test]
    fn items_follow_branch_count_not_row_count() {
        let p = product(None);
        let other = Uuid::new_v4();
        let branches = vec![branch("A", true)];
        let rows = vec![
            record(p.id, Some(branches[0].id), 1, 0),
            record(other, Some(branches[0].id), 50, 0),
        ];

        assert_eq!(aggregate_product(p.id, &rows, &branches).items.len(), 1);
        assert_eq!(aggregate_product(p.id, &rows, &[]).items.len(), 0);
        assert_eq!(aggregate_product(p.id, &[], &branches).items.len(), 1);
    }

    #[test]
    fn other_products_do_not_leak_into_totals() {
        let p = product(None);
        let b = branch("A", true);
        let rows = vec![record(Uuid::new_v4(), Some(b.id), 100, 0)];

        let stock = aggregate_product(p.id, &rows, &[b]);
        assert_eq!(stock.total_quantity, 0);
        assert_eq!(stock.total_available, 0);
    }

    fn items_available(stock: &ProductStock) -> i64 {
        stock.items.iter().map(|i| i64::from(i.available_quantity)).sum()
    }

    #[test]
    fn unscoped_rows_land_on_main_branch() {
        let p = product(None);
        let main = branch("Main", true);
        let rows = vec![record(p.id, None, 7, 0)];

        let stock = aggregate_product(p.id, &rows, &[main.clone()]);

        assert_eq!(stock.total_available, 7);
        assert_eq!(stock.total_available, items_available(&stock));
        assert_eq!(stock.items[0].branch_id, Some(main.id));
        assert_eq!(stock.items[0].quantity, 7);
        assert!(!stock.items[0].is_placeholder());
    }

    #[test]
    fn unscoped_and_scoped_main_rows_are_summed() {
        let p = product(None);
        let east = branch("East", false);
        let main = branch("Main", true);
        let rows = vec![
            record(p.id, Some(main.id), 4, 1),
            record(p.id, None, 6, 2),
            record(p.id, Some(east.id), 2, 0),
        ];

        let stock = aggregate_product(p.id, &rows, &[east.clone(), main.clone()]);

        assert_eq!(stock.items[1].quantity, 10);
        assert_eq!(stock.items[1].reserved_quantity, 3);
        assert_eq!(stock.items[1].available_quantity, 7);
        assert_eq!(stock.total_available, 9);
        assert_eq!(stock.total_available, items_available(&stock));
    }

    #[test]
    fn totals_always_equal_item_sums() {
        let p = product(None);
        let main = branch("Main", true);
        let east = branch("East", false);
        let gone = Uuid::new_v4();
        let rows = vec![
            record(p.id, None, 3, 0),
            record(p.id, Some(east.id), 5, 1),
            record(p.id, Some(gone), 40, 0),
        ];

        let branch_sets: Vec<Vec<Branch>> = vec![
            vec![],
            vec![main.clone()],
            vec![east.clone()],
            vec![main.clone(), east.clone()],
            vec![east.clone(), main.clone()],
        ];
        for branches in branch_sets {
            let stock = aggregate_product(p.id, &rows, &branches);
            assert_eq!(stock.total_available, items_available(&stock));
            assert_eq!(stock.items.len(), branches.len());
        }
    }

    #[test]
    fn large_rows_do_not_overflow_totals() {
        let p = product(None);
        let main = branch("Main", true);
        let east = branch("East", false);
        let rows = vec![
            record(p.id, Some(main.id), i32::MAX, 0),
            record(p.id, Some(east.id), 1, 0),
        ];

        let stock = aggregate_product(p.id, &rows, &[main, east]);

        assert_eq!(stock.total_quantity, i64::from(i32::MAX) + 1);
        assert_eq!(stock.total_available, i64::from(i32::MAX) + 1);
        assert_eq!(classify_stock(stock.total_available, 10), StockStatus::InStock);
    }

    #[test]
    fn merged_main_cell_saturates_instead_of_wrapping() {
        let p = product(None);
        let main = branch("Main", true);
        let rows = vec![record(p.id, Some(main.id), i32::MAX, 0), record(p.id, None, 5, 0)];

        let stock = aggregate_product(p.id, &rows, &[main]);

        assert_eq!(stock.items[0].quantity, i32::MAX);
        assert_eq!(stock.total_available, items_available(&stock));
    }

    #[test]
    fn catalog_classifies_with_product_threshold() {
        let plenty = product(Some(3));
        let scarce = product(None);
        let b = branch("Main", true);
        let rows = vec![record(plenty.id, Some(b.id), 5, 0), record(scarce.id, Some(b.id), 5, 0)];
        let products = vec![plenty, scarce];

        let catalog = aggregate_catalog(&products, &rows, &[b]);

        assert_eq!(catalog[0].status, StockStatus::InStock);
        assert_eq!(catalog[1].status, StockStatus::LowStock);
        assert_eq!(catalog[1].threshold, 10);
    }

    #[test]
    fn snapshot_reads_missing_cell_as_zero() {
        let p = product(None);
        let b = branch("Main", true);
        let rows = vec![record(p.id, Some(b.id), 9, 4)];

        assert_eq!(
            StockSnapshot::for_branch(&rows, p.id, Some(b.id)),
            StockSnapshot { quantity: 9, available: 5 }
        );
        assert_eq!(StockSnapshot::for_branch(&rows, p.id, None), StockSnapshot::default());
    }
}
