//! Mechanic order lifecycle
//!
//! State machine: Open → Completed | Cancelled. Both terminal states set
//! `completed`; cancellation also sets `cancelled`. No transition leaves a
//! terminal state.
//!
//! Stock policy: checkout validates requested quantities against factual
//! stock but does not decrement it — an open order soft-reserves through the
//! visibility formula, and the ledger is decremented once, at completion,
//! after re-validating every line under the per-key locks.

use std::collections::BTreeMap;

use chrono::{Duration, Utc};

use crate::config::OrdersConfig;
use crate::error::{AppError, AppResult};
use crate::models::{CheckoutItem, MechanicOrder, MechanicOrderLine, OrderLineInput, StockKey};
use crate::services::notification::Notifier;
use crate::services::stock_ledger::StockLedgerService;
use crate::services::visibility::VisibilityService;
use crate::store::Store;

#[derive(Clone)]
pub struct MechanicOrderService {
    store: Store,
    ledger: StockLedgerService,
    visibility: VisibilityService,
    notifier: Notifier,
    retention: Duration,
}

impl MechanicOrderService {
    pub fn new(
        store: Store,
        ledger: StockLedgerService,
        visibility: VisibilityService,
        notifier: Notifier,
        config: &OrdersConfig,
    ) -> Self {
        Self {
            store,
            ledger,
            visibility,
            notifier,
            retention: config.retention(),
        }
    }

    /// Create an open order from the requested items.
    ///
    /// Items are aggregated by material before validation; every aggregate
    /// must fit within the current factual stock or the whole checkout is
    /// rejected with nothing persisted. After the order is stored, visibility
    /// is recalculated per material and stock alerts are emitted.
    pub async fn checkout(
        &self,
        order_id: &str,
        mechanic_login: &str,
        storage_type: &str,
        items: &[CheckoutItem],
    ) -> AppResult<(MechanicOrder, Vec<MechanicOrderLine>)> {
        // aggregate positive-quantity items by material, keeping the first
        // usable title per material
        let mut requested: BTreeMap<String, (i64, String)> = BTreeMap::new();
        for item in items {
            if item.qty <= 0 {
                continue;
            }
            let entry = requested.entry(item.material_code.clone()).or_insert_with(|| {
                let title = item
                    .title
                    .clone()
                    .filter(|t| !t.is_empty())
                    .unwrap_or_else(|| item.material_code.clone());
                (0, title)
            });
            entry.0 += item.qty;
        }
        if requested.is_empty() {
            return Err(AppError::EmptyOrder);
        }

        if self.store.get_order(order_id).await.is_some() {
            return Err(AppError::DuplicateEntry(format!("order {}", order_id)));
        }

        // validate against factual stock before creating anything
        for (material, (qty, _)) in &requested {
            let key = StockKey::new(storage_type, material);
            let available = self
                .ledger
                .get(&key)
                .await
                .map(|r| r.available_qty)
                .unwrap_or(0);
            if *qty > available {
                return Err(AppError::InsufficientStock(material.clone()));
            }
        }

        let order = MechanicOrder {
            order_id: order_id.to_string(),
            mechanic_login: mechanic_login.to_string(),
            storage_type: storage_type.to_string(),
            created_at: Utc::now(),
            completed: false,
            cancelled: false,
        };
        let lines: Vec<MechanicOrderLine> = requested
            .iter()
            .map(|(material, (qty, title))| MechanicOrderLine {
                order_id: order_id.to_string(),
                material_code: material.clone(),
                title: title.clone(),
                qty: *qty,
                image_url: None,
            })
            .collect();

        self.store.put_order(order.clone()).await;
        self.store.insert_lines(lines.clone()).await;

        for (material, (_, title)) in &requested {
            self.visibility.recalculate(storage_type, material).await;
            self.emit_stock_alerts(storage_type, material, title).await;
        }

        tracing::info!(
            order_id,
            mechanic_login,
            storage_type,
            lines = lines.len(),
            "order checked out"
        );
        Ok((order, lines))
    }

    /// Open → Completed. Decrements the ledger by every line quantity after
    /// re-validating all of them, so a short key fails the whole completion
    /// with no partial decrement.
    pub async fn mark_completed(&self, order_id: &str) -> AppResult<()> {
        let mut order = self.fetch_open(order_id).await?;
        let lines = self.store.lines_for_order(order_id).await;

        // net quantity per material; lines never carry negative quantities
        let mut per_material: BTreeMap<String, i64> = BTreeMap::new();
        for line in &lines {
            if line.qty > 0 {
                *per_material.entry(line.material_code.clone()).or_insert(0) += line.qty;
            }
        }

        let keys: Vec<StockKey> = per_material
            .keys()
            .map(|m| StockKey::new(&order.storage_type, m))
            .collect();
        let guards = self.store.lock_keys(&keys).await;

        for (material, qty) in &per_material {
            let key = StockKey::new(&order.storage_type, material);
            let available = self
                .store
                .get_stock(&key)
                .await
                .map(|r| r.available_qty)
                .unwrap_or(0);
            if available < *qty {
                return Err(AppError::InsufficientStock(material.clone()));
            }
        }

        for (material, qty) in &per_material {
            let key = StockKey::new(&order.storage_type, material);
            if let Some(mut record) = self.store.get_stock(&key).await {
                record.available_qty -= qty;
                record.updated_at = Utc::now();
                self.store.put_stock(record).await;
            }
        }

        order.completed = true;
        self.store.put_order(order.clone()).await;
        drop(guards);

        // completion is where the ledger actually drops, so alerts fire here
        // as well as at checkout
        for material in per_material.keys() {
            self.visibility.recalculate(&order.storage_type, material).await;
            let title = lines
                .iter()
                .find(|l| &l.material_code == material)
                .map(|l| l.title.clone())
                .unwrap_or_else(|| material.clone());
            self.emit_stock_alerts(&order.storage_type, material, &title).await;
        }

        tracing::info!(order_id, "order completed");
        Ok(())
    }

    /// Open → Cancelled. Sets both terminal flags and recalculates visibility
    /// for every material in the order; the ledger is untouched because
    /// nothing was ever decremented for an open order.
    pub async fn cancel(&self, order_id: &str) -> AppResult<()> {
        let mut order = self.fetch_open(order_id).await?;
        order.completed = true;
        order.cancelled = true;
        self.store.put_order(order.clone()).await;

        for material in self.distinct_materials(order_id).await {
            self.visibility.recalculate(&order.storage_type, &material).await;
        }

        tracing::info!(order_id, "order cancelled");
        Ok(())
    }

    /// Warehouse edit of one line: `None` or a non-positive quantity removes
    /// the line, a strictly smaller quantity shrinks it, anything else is
    /// rejected. Removing the last line cancels the order.
    pub async fn update_line(
        &self,
        order_id: &str,
        material_code: &str,
        new_qty: Option<i64>,
    ) -> AppResult<()> {
        let mut order = self.fetch_open(order_id).await?;
        let mut lines = self.store.lines_for_order(order_id).await;

        let pos = lines
            .iter()
            .position(|l| l.material_code == material_code)
            .ok_or_else(|| AppError::NotFound(format!("Order line {}", material_code)))?;

        match new_qty {
            None => {
                lines.remove(pos);
            }
            Some(qty) if qty <= 0 => {
                lines.remove(pos);
            }
            Some(qty) if qty < lines[pos].qty => {
                lines[pos].qty = qty;
            }
            Some(qty) => {
                return Err(AppError::InvalidQuantity(format!(
                    "line quantity can only be decreased ({} -> {})",
                    lines[pos].qty, qty
                )));
            }
        }

        if lines.is_empty() {
            order.completed = true;
            order.cancelled = true;
            self.store.put_order(order.clone()).await;
        }

        self.store.replace_lines_for_order(order_id, lines).await;
        self.visibility
            .recalculate(&order.storage_type, material_code)
            .await;
        Ok(())
    }

    /// Warehouse bulk edit: drop all existing lines and insert the new set
    pub async fn replace_lines(&self, order_id: &str, lines: &[OrderLineInput]) -> AppResult<()> {
        let order = self.fetch_open(order_id).await?;

        let new_lines: Vec<MechanicOrderLine> = lines
            .iter()
            .map(|l| MechanicOrderLine {
                order_id: order_id.to_string(),
                material_code: l.material_code.clone(),
                title: l.title.clone(),
                qty: l.qty,
                image_url: None,
            })
            .collect();
        self.store.replace_lines_for_order(order_id, new_lines).await;

        let mut materials: Vec<String> = lines.iter().map(|l| l.material_code.clone()).collect();
        materials.sort();
        materials.dedup();
        for material in &materials {
            self.visibility.recalculate(&order.storage_type, material).await;
        }
        Ok(())
    }

    /// Administrative purge of orders older than the retention window,
    /// regardless of state. Returns the number of orders removed.
    pub async fn cleanup(&self) -> usize {
        let cutoff = Utc::now() - self.retention;
        let mut removed = 0;
        for order in self.store.list_orders().await {
            if order.created_at < cutoff {
                self.store.remove_order(&order.order_id).await;
                removed += 1;
            }
        }
        if removed > 0 {
            tracing::info!(removed, "old orders purged");
        }
        removed
    }

    /// One order with its lines
    pub async fn get(&self, order_id: &str) -> AppResult<(MechanicOrder, Vec<MechanicOrderLine>)> {
        let order = self
            .store
            .get_order(order_id)
            .await
            .ok_or_else(|| AppError::NotFound(format!("Order {}", order_id)))?;
        let lines = self.store.lines_for_order(order_id).await;
        Ok((order, lines))
    }

    /// All orders, oldest first, for the warehouse view
    pub async fn list(&self) -> Vec<MechanicOrder> {
        self.store.list_orders().await
    }

    async fn fetch_open(&self, order_id: &str) -> AppResult<MechanicOrder> {
        let order = self
            .store
            .get_order(order_id)
            .await
            .ok_or_else(|| AppError::NotFound(format!("Order {}", order_id)))?;
        if !order.is_open() {
            return Err(AppError::InvalidStateTransition(format!(
                "order {} is already {}",
                order_id,
                if order.cancelled { "cancelled" } else { "completed" }
            )));
        }
        Ok(order)
    }

    async fn distinct_materials(&self, order_id: &str) -> Vec<String> {
        let mut materials: Vec<String> = self
            .store
            .lines_for_order(order_id)
            .await
            .into_iter()
            .map(|l| l.material_code)
            .collect();
        materials.sort();
        materials.dedup();
        materials
    }

    /// After a checkout touched a material: out-of-stock when the factual
    /// quantity is gone, otherwise low-stock when the visible quantity sits
    /// inside a configured tile threshold. Dispatch never fails the caller.
    async fn emit_stock_alerts(&self, storage_type: &str, material: &str, title: &str) {
        let key = StockKey::new(storage_type, material);
        let Some(stock) = self.store.get_stock(&key).await else {
            return;
        };

        if stock.available_qty <= 0 {
            self.notifier.notify_out_of_stock(material, title, storage_type);
            return;
        }

        if let Some(tile) = self.store.active_tile(material).await {
            if tile.min_stock_alert > 0 {
                if let Some(visible) = self.store.get_visible(&key).await {
                    if visible.visible_qty > 0 && visible.visible_qty <= tile.min_stock_alert {
                        self.notifier.notify_low_stock(
                            material,
                            title,
                            visible.visible_qty,
                            tile.min_stock_alert,
                            storage_type,
                        );
                    }
                }
            }
        }
    }
}
