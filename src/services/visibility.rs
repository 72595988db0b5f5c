//! Visible stock reconciliation
//!
//! Derives the per-(storage, material) quantity a browsing mechanic sees:
//! factual stock minus everything tied up in open orders. Recomputed on
//! demand after any event that moves either side of that formula; calling it
//! redundantly is safe.

use chrono::Utc;

use crate::models::{StockKey, VisibleStockRecord};
use crate::store::Store;

#[derive(Clone)]
pub struct VisibilityService {
    store: Store,
}

impl VisibilityService {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Recompute the visible quantity for one key.
    ///
    /// No-op when no stock record exists — there is nothing to show.
    /// Cancelled orders carry `completed == true`, so the single flag check
    /// covers both terminal states.
    pub async fn recalculate(&self, storage_type: &str, material: &str) -> Option<VisibleStockRecord> {
        let key = StockKey::new(storage_type, material);
        let _guard = self.store.lock_key(&key).await;

        let stock = self.store.get_stock(&key).await?;

        let mut reserved_in_open_orders = 0i64;
        for line in self.store.all_lines().await {
            if line.material_code != material {
                continue;
            }
            if let Some(order) = self.store.get_order(&line.order_id).await {
                if order.is_open() && order.storage_type == storage_type {
                    reserved_in_open_orders += line.qty;
                }
            }
        }

        let visible_qty = (stock.available_qty - reserved_in_open_orders).max(0);

        let record = VisibleStockRecord {
            key: key.clone(),
            material_description: stock.material_description.clone(),
            visible_qty,
            updated_at: Utc::now(),
        };
        self.store.put_visible(record.clone()).await;

        tracing::debug!(
            key = %key,
            factual = stock.available_qty,
            reserved = reserved_in_open_orders,
            visible = visible_qty,
            "visible stock recalculated"
        );
        Some(record)
    }

    /// Zero every visible record under a storage type. Called ahead of an
    /// import so stale values from a prior load cannot outlive the refresh.
    pub async fn clear_for_storage(&self, storage_type: &str) {
        for mut record in self.store.visible_for_storage(storage_type).await {
            record.visible_qty = 0;
            record.updated_at = Utc::now();
            self.store.put_visible(record).await;
        }
    }

    /// Read side for catalog browsing
    pub async fn get(&self, key: &StockKey) -> Option<VisibleStockRecord> {
        self.store.get_visible(key).await
    }
}
