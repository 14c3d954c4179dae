//! Stock adjustment: validate the request, then walk an ordered list of
//! persistence strategies until one applies.
//!
//! ```text
//! probe inventory table ──absent──► [AvailabilityFlag]
//!        │ present
//!        ▼
//! [Rpc] ──fail──► [Manual] ──fail──► [AvailabilityFlag] ──fail──► AdjustmentFailed
//! ```
//!
//! Nothing is retried and no step is rolled back. The caller re-reads stock after
//! the chain returns.

use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::aggregate::StockSnapshot;
use super::error::{InventoryError, StoreError};
use super::store::{AdjustInventoryCall, InventoryStore};
use crate::models::inventory::{NewInventoryTransaction, TransactionType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdjustmentKind {
    Add,
    Remove,
    Set,
}

/// Quantity as typed by a user: JSON number or string.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum QuantityInput {
    Integer(i64),
    Decimal(f64),
    Text(String),
}

impl QuantityInput {
    pub fn parse_positive(&self) -> Result<i32, InventoryError> {
        let raw = match self {
            QuantityInput::Integer(n) => Some(*n),
            QuantityInput::Decimal(f) if f.fract() == 0.0 && f.is_finite() => Some(*f as i64),
            QuantityInput::Decimal(_) => None,
            QuantityInput::Text(s) => s.trim().parse::<i64>().ok(),
        };

        raw.filter(|n| *n > 0)
            .and_then(|n| i32::try_from(n).ok())
            .ok_or_else(|| InventoryError::InvalidQuantity(self.to_string()))
    }
}

impl std::fmt::Display for QuantityInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QuantityInput::Integer(n) => write!(f, "{n}"),
            QuantityInput::Decimal(n) => write!(f, "{n}"),
            QuantityInput::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AdjustmentRequest {
    pub product_id: Uuid,
    pub store_id: Uuid,
    pub branch_id: Option<Uuid>,
    pub kind: AdjustmentKind,
    pub quantity: QuantityInput,
    pub notes: Option<String>,
    pub actor: Option<i64>,
}

/// A request that passed validation, with its signed delta resolved.
#[derive(Debug, Clone)]
pub struct PlannedAdjustment {
    pub product_id: Uuid,
    pub store_id: Uuid,
    pub branch_id: Option<Uuid>,
    pub delta: i32,
    pub before: StockSnapshot,
    pub notes: Option<String>,
    pub actor: Option<i64>,
}

impl PlannedAdjustment {
    fn projected_quantity(&self) -> i32 {
        self.before.quantity.saturating_add(self.delta).max(0)
    }
}

/// Validation only; never touches the store. `snapshot` is the last known stock of the
/// selected branch and may be stale relative to other sessions.
pub fn plan(req: &AdjustmentRequest, snapshot: StockSnapshot) -> Result<PlannedAdjustment, InventoryError> {
    let quantity = req.quantity.parse_positive()?;

    let delta = match req.kind {
        AdjustmentKind::Add => quantity,
        AdjustmentKind::Remove => {
            if quantity > snapshot.available {
                return Err(InventoryError::InsufficientStock {
                    available: snapshot.available,
                    requested: quantity,
                });
            }
            -quantity
        }
        AdjustmentKind::Set => quantity - snapshot.quantity,
    };

    Ok(PlannedAdjustment {
        product_id: req.product_id,
        store_id: req.store_id,
        branch_id: req.branch_id,
        delta,
        before: snapshot,
        notes: req.notes.clone().filter(|n| !n.trim().is_empty()),
        actor: req.actor,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AdjustmentStrategy {
    /// `adjust_inventory` database function; atomic.
    Rpc,
    /// Read, upsert, then insert the log row. Not atomic.
    Manual,
    /// Only flips `products.is_available`; quantities are lost.
    AvailabilityFlag,
}

impl AdjustmentStrategy {
    pub const FULL_CHAIN: [AdjustmentStrategy; 3] = [
        AdjustmentStrategy::Rpc,
        AdjustmentStrategy::Manual,
        AdjustmentStrategy::AvailabilityFlag,
    ];
    pub const FLAG_ONLY: [AdjustmentStrategy; 1] = [AdjustmentStrategy::AvailabilityFlag];

    pub fn as_str(self) -> &'static str {
        match self {
            AdjustmentStrategy::Rpc => "rpc",
            AdjustmentStrategy::Manual => "manual",
            AdjustmentStrategy::AvailabilityFlag => "availability_flag",
        }
    }

    async fn attempt(self, store: &dyn InventoryStore, adj: &PlannedAdjustment) -> Result<Applied, StoreError> {
        match self {
            AdjustmentStrategy::Rpc => {
                store
                    .call_adjust_inventory(&AdjustInventoryCall {
                        product_id: adj.product_id,
                        branch_id: adj.branch_id,
                        store_id: adj.store_id,
                        quantity_change: adj.delta,
                        transaction_type: TransactionType::Adjustment,
                        notes: adj.notes.clone(),
                        created_by: adj.actor,
                    })
                    .await?;
                Ok(Applied { quantity_before: None, quantity_after: None, transaction_logged: true })
            }
            AdjustmentStrategy::Manual => {
                let before = store.current_quantity(adj.product_id, adj.branch_id).await?;
                let after = before.saturating_add(adj.delta).max(0);
                store.upsert_inventory(adj.product_id, adj.branch_id, after).await?;

                let logged = store
                    .insert_transaction(&NewInventoryTransaction {
                        product_id: adj.product_id,
                        branch_id: adj.branch_id,
                        store_id: adj.store_id,
                        transaction_type: TransactionType::Adjustment,
                        quantity_change: after - before,
                        quantity_before: before,
                        quantity_after: after,
                        notes: adj.notes.clone(),
                        created_by: adj.actor,
                    })
                    .await;
                if let Err(e) = &logged {
                    warn!(product_id = %adj.product_id, error = %e, "Stock updated but transaction log insert failed");
                }

                Ok(Applied {
                    quantity_before: Some(before),
                    quantity_after: Some(after),
                    transaction_logged: logged.is_ok(),
                })
            }
            AdjustmentStrategy::AvailabilityFlag => {
                let in_stock = adj.delta > 0 || adj.projected_quantity() > 0;
                store.set_product_availability(adj.product_id, in_stock).await?;
                Ok(Applied { quantity_before: None, quantity_after: None, transaction_logged: false })
            }
        }
    }
}

struct Applied {
    quantity_before: Option<i32>,
    quantity_after: Option<i32>,
    transaction_logged: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StrategyFailure {
    pub strategy: AdjustmentStrategy,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AdjustmentOutcome {
    pub strategy: AdjustmentStrategy,
    pub quantity_change: i32,
    pub quantity_before: Option<i32>,
    pub quantity_after: Option<i32>,
    pub transaction_logged: bool,
    pub inventory_tracking: bool,
    /// Strategies tried before the one that applied.
    pub degraded: Vec<StrategyFailure>,
}

/// Validates `req` against `snapshot` and persists it through the first strategy that works.
#[instrument(skip(store, req), fields(product_id = %req.product_id, branch_id = ?req.branch_id, kind = ?req.kind))]
pub async fn adjust(
    store: &dyn InventoryStore,
    req: &AdjustmentRequest,
    snapshot: StockSnapshot,
) -> Result<AdjustmentOutcome, InventoryError> {
    let planned = plan(req, snapshot)?;
    run_chain(store, &planned).await
}

async fn run_chain(store: &dyn InventoryStore, adj: &PlannedAdjustment) -> Result<AdjustmentOutcome, InventoryError> {
    let inventory_tracking = match store.inventory_table_exists().await {
        Ok(exists) => exists,
        Err(e) => {
            warn!(error = %e, "Inventory probe failed, treating tracking as unavailable");
            false
        }
    };
    let chain: &[AdjustmentStrategy] = if inventory_tracking {
        &AdjustmentStrategy::FULL_CHAIN
    } else {
        warn!(product_id = %adj.product_id, "Inventory table unavailable, falling back to availability flag");
        &AdjustmentStrategy::FLAG_ONLY
    };

    let mut failures = Vec::new();
    for &strategy in chain {
        match strategy.attempt(store, adj).await {
            Ok(applied) => {
                info!(strategy = strategy.as_str(), delta = adj.delta, "Stock adjustment applied");
                return Ok(AdjustmentOutcome {
                    strategy,
                    quantity_change: adj.delta,
                    quantity_before: applied.quantity_before,
                    quantity_after: applied.quantity_after,
                    transaction_logged: applied.transaction_logged,
                    inventory_tracking,
                    degraded: failures,
                });
            }
            Err(e) => {
                warn!(strategy = strategy.as_str(), error = %e, "Adjustment strategy failed");
                failures.push(StrategyFailure { strategy, reason: e.to_string() });
            }
        }
    }

    Err(InventoryError::AdjustmentFailed(failures))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::store::memory::{MemoryStore, Op};

    fn request(kind: AdjustmentKind, quantity: QuantityInput) -> AdjustmentRequest {
        AdjustmentRequest {
            product_id: Uuid::new_v4(),
            store_id: Uuid::new_v4(),
            branch_id: Some(Uuid::new_v4()),
            kind,
            quantity,
            notes: Some("count correction".into()),
            actor: Some(7),
        }
    }

    fn snapshot(quantity: i32, available: i32) -> StockSnapshot {
        StockSnapshot { quantity, available }
    }

    #[tokio::test]
    async fn removing_more_than_available_makes_no_store_calls() {
        let store = MemoryStore::default();
        let req = request(AdjustmentKind::Remove, QuantityInput::Integer(3));

        let err = adjust(&store, &req, snapshot(2, 2)).await.unwrap_err();

        assert!(matches!(err, InventoryError::InsufficientStock { available: 2, requested: 3 }));
        assert!(err.to_string().starts_with("Cannot remove"));
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn invalid_quantities_make_no_store_calls() {
        let store = MemoryStore::default();
        for q in [
            QuantityInput::Text("abc".into()),
            QuantityInput::Text("".into()),
            QuantityInput::Integer(0),
            QuantityInput::Integer(-4),
            QuantityInput::Decimal(2.5),
            QuantityInput::Integer(i64::from(i32::MAX) + 1),
        ] {
            let err = adjust(&store, &request(AdjustmentKind::Add, q), snapshot(0, 0))
                .await
                .unwrap_err();
            assert!(matches!(err, InventoryError::InvalidQuantity(_)));
        }
        assert!(store.calls().is_empty());
    }

    #[test]
    fn quantity_text_is_trimmed() {
        assert_eq!(QuantityInput::Text(" 12 ".into()).parse_positive().unwrap(), 12);
        assert_eq!(QuantityInput::Decimal(4.0).parse_positive().unwrap(), 4);
    }

    #[test]
    fn set_resolves_delta_from_current_quantity() {
        let planned = plan(&request(AdjustmentKind::Set, QuantityInput::Integer(4)), snapshot(10, 8)).unwrap();
        assert_eq!(planned.delta, -6);

        let planned = plan(&request(AdjustmentKind::Remove, QuantityInput::Integer(8)), snapshot(10, 8)).unwrap();
        assert_eq!(planned.delta, -8);
    }

    #[tokio::test]
    async fn rpc_is_used_when_available() {
        let store = MemoryStore::default();
        let req = request(AdjustmentKind::Add, QuantityInput::Integer(5));

        let outcome = adjust(&store, &req, snapshot(0, 0)).await.unwrap();

        assert_eq!(outcome.strategy, AdjustmentStrategy::Rpc);
        assert!(outcome.degraded.is_empty());
        assert_eq!(store.calls(), vec![Op::Probe, Op::Rpc]);
        let call = store.rpc_calls.lock().unwrap()[0].clone();
        assert_eq!(call.quantity_change, 5);
        assert_eq!(call.transaction_type, TransactionType::Adjustment);
        assert_eq!(call.created_by, Some(7));
    }

    #[tokio::test]
    async fn rpc_failure_falls_back_to_manual_upsert_and_log() {
        let req = request(AdjustmentKind::Remove, QuantityInput::Text("4".into()));
        let store = MemoryStore::failing(&[Op::Rpc]).with_quantity(req.product_id, req.branch_id, 6);

        let outcome = adjust(&store, &req, snapshot(6, 6)).await.unwrap();

        assert_eq!(outcome.strategy, AdjustmentStrategy::Manual);
        assert_eq!(outcome.quantity_before, Some(6));
        assert_eq!(outcome.quantity_after, Some(2));
        assert!(outcome.transaction_logged);
        assert_eq!(outcome.degraded.len(), 1);
        assert_eq!(outcome.degraded[0].strategy, AdjustmentStrategy::Rpc);
        assert_eq!(
            store.calls(),
            vec![Op::Probe, Op::Rpc, Op::ReadQuantity, Op::Upsert, Op::InsertTransaction]
        );

        let log = store.transactions.lock().unwrap()[0].clone();
        assert_eq!((log.quantity_before, log.quantity_change, log.quantity_after), (6, -4, 2));
        assert_eq!(log.notes.as_deref(), Some("count correction"));
    }

    #[tokio::test]
    async fn manual_result_is_floored_at_zero() {
        // Cached availability says 5, but another session already drained the row.
        let req = request(AdjustmentKind::Remove, QuantityInput::Integer(5));
        let store = MemoryStore::failing(&[Op::Rpc]).with_quantity(req.product_id, req.branch_id, 1);

        let outcome = adjust(&store, &req, snapshot(5, 5)).await.unwrap();

        assert_eq!(outcome.quantity_after, Some(0));
        assert_eq!(store.quantity(req.product_id, req.branch_id), Some(0));
        assert_eq!(store.transactions.lock().unwrap()[0].quantity_change, -1);
    }

    #[tokio::test]
    async fn failed_log_insert_keeps_the_quantity_change() {
        let req = request(AdjustmentKind::Add, QuantityInput::Integer(3));
        let store = MemoryStore::failing(&[Op::Rpc, Op::InsertTransaction]);

        let outcome = adjust(&store, &req, snapshot(0, 0)).await.unwrap();

        assert_eq!(outcome.strategy, AdjustmentStrategy::Manual);
        assert!(!outcome.transaction_logged);
        assert_eq!(store.quantity(req.product_id, req.branch_id), Some(3));
    }

    #[tokio::test]
    async fn rpc_and_manual_failure_degrades_to_flag() {
        let req = request(AdjustmentKind::Add, QuantityInput::Integer(2));
        let store = MemoryStore::failing(&[Op::Rpc, Op::Upsert]);

        let outcome = adjust(&store, &req, snapshot(0, 0)).await.unwrap();

        assert_eq!(outcome.strategy, AdjustmentStrategy::AvailabilityFlag);
        assert_eq!(outcome.degraded.len(), 2);
        assert_eq!(store.availability.lock().unwrap().get(&req.product_id), Some(&true));
        assert!(store.transactions.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_table_only_touches_availability() {
        let req = request(AdjustmentKind::Set, QuantityInput::Integer(4));
        let store = MemoryStore { table_missing: true, ..MemoryStore::default() };

        let outcome = adjust(&store, &req, snapshot(0, 0)).await.unwrap();

        assert_eq!(outcome.strategy, AdjustmentStrategy::AvailabilityFlag);
        assert!(!outcome.inventory_tracking);
        assert_eq!(store.calls(), vec![Op::Probe, Op::SetAvailability]);
    }

    #[tokio::test]
    async fn probe_error_counts_as_missing_table() {
        let req = request(AdjustmentKind::Add, QuantityInput::Integer(1));
        let store = MemoryStore::failing(&[Op::Probe]);

        let outcome = adjust(&store, &req, snapshot(0, 0)).await.unwrap();

        assert_eq!(outcome.strategy, AdjustmentStrategy::AvailabilityFlag);
        assert_eq!(store.calls(), vec![Op::Probe, Op::SetAvailability]);
    }

    #[tokio::test]
    async fn removing_everything_marks_product_unavailable() {
        let req = request(AdjustmentKind::Remove, QuantityInput::Integer(3));
        let store = MemoryStore::failing(&[Op::Rpc, Op::ReadQuantity]);

        adjust(&store, &req, snapshot(3, 3)).await.unwrap();

        assert_eq!(store.availability.lock().unwrap().get(&req.product_id), Some(&false));
    }

    #[tokio::test]
    async fn exhausted_chain_reports_every_reason() {
        let req = request(AdjustmentKind::Add, QuantityInput::Integer(1));
        let store = MemoryStore::failing(&[Op::Rpc, Op::ReadQuantity, Op::SetAvailability]);

        let err = adjust(&store, &req, snapshot(0, 0)).await.unwrap_err();

        match err {
            InventoryError::AdjustmentFailed(failures) => {
                let strategies: Vec<_> = failures.iter().map(|f| f.strategy).collect();
                assert_eq!(strategies, AdjustmentStrategy::FULL_CHAIN.to_vec());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
