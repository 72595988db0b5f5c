//! In-memory transactional record store
//!
//! The core treats persistence as a collaborator providing get/upsert/delete
//! by key. This implementation keeps each record family in its own map and
//! hands out per-(storage, material) locks so that ledger decrements, import
//! writes and visibility recalculation serialize on the same key while
//! unrelated keys proceed in parallel.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use uuid::Uuid;

use crate::models::{
    InventoryRow, InventoryUpload, MechanicOrder, MechanicOrderLine, MechanicTile, ReservedItem,
    StockKey, StockRecord, VisibleStockRecord,
};

/// Cloneable handle to the shared record store
#[derive(Clone, Default)]
pub struct Store {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    stock: RwLock<HashMap<StockKey, StockRecord>>,
    visible: RwLock<HashMap<StockKey, VisibleStockRecord>>,
    orders: RwLock<HashMap<String, MechanicOrder>>,
    order_lines: RwLock<Vec<MechanicOrderLine>>,
    // keyed by (reserved_by, material_code)
    reservations: RwLock<HashMap<(String, String), ReservedItem>>,
    uploads: RwLock<HashMap<Uuid, InventoryUpload>>,
    upload_rows: RwLock<Vec<InventoryRow>>,
    tiles: RwLock<HashMap<String, MechanicTile>>,
    key_locks: Mutex<HashMap<StockKey, Arc<Mutex<()>>>>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Per-key serialization
    // ========================================================================

    /// Acquire the write lock scoped to one (storage, material) key.
    /// Held for the duration of a read-modify-write sequence on that key.
    pub async fn lock_key(&self, key: &StockKey) -> OwnedMutexGuard<()> {
        let lock = {
            let mut registry = self.inner.key_locks.lock().await;
            registry
                .entry(key.clone())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }

    /// Acquire several key locks in sorted order, so concurrent multi-key
    /// operations cannot deadlock against each other.
    pub async fn lock_keys(&self, keys: &[StockKey]) -> Vec<OwnedMutexGuard<()>> {
        let mut sorted: Vec<StockKey> = keys.to_vec();
        sorted.sort();
        sorted.dedup();

        let mut guards = Vec::with_capacity(sorted.len());
        for key in &sorted {
            guards.push(self.lock_key(key).await);
        }
        guards
    }

    // ========================================================================
    // Stock records
    // ========================================================================

    pub async fn get_stock(&self, key: &StockKey) -> Option<StockRecord> {
        self.inner.stock.read().await.get(key).cloned()
    }

    pub async fn put_stock(&self, record: StockRecord) {
        self.inner
            .stock
            .write()
            .await
            .insert(record.key.clone(), record);
    }

    pub async fn list_stock(&self) -> Vec<StockRecord> {
        let mut records: Vec<StockRecord> = self.inner.stock.read().await.values().cloned().collect();
        records.sort_by(|a, b| a.key.cmp(&b.key));
        records
    }

    // ========================================================================
    // Visible stock records
    // ========================================================================

    pub async fn get_visible(&self, key: &StockKey) -> Option<VisibleStockRecord> {
        self.inner.visible.read().await.get(key).cloned()
    }

    pub async fn put_visible(&self, record: VisibleStockRecord) {
        self.inner
            .visible
            .write()
            .await
            .insert(record.key.clone(), record);
    }

    pub async fn visible_for_storage(&self, storage_type: &str) -> Vec<VisibleStockRecord> {
        self.inner
            .visible
            .read()
            .await
            .values()
            .filter(|v| v.key.storage_type == storage_type)
            .cloned()
            .collect()
    }

    // ========================================================================
    // Orders and lines
    // ========================================================================

    pub async fn get_order(&self, order_id: &str) -> Option<MechanicOrder> {
        self.inner.orders.read().await.get(order_id).cloned()
    }

    pub async fn put_order(&self, order: MechanicOrder) {
        self.inner
            .orders
            .write()
            .await
            .insert(order.order_id.clone(), order);
    }

    pub async fn list_orders(&self) -> Vec<MechanicOrder> {
        let mut orders: Vec<MechanicOrder> =
            self.inner.orders.read().await.values().cloned().collect();
        orders.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        orders
    }

    /// Remove an order header together with its lines. No-op when absent.
    pub async fn remove_order(&self, order_id: &str) -> bool {
        let removed = self.inner.orders.write().await.remove(order_id).is_some();
        if removed {
            self.inner
                .order_lines
                .write()
                .await
                .retain(|l| l.order_id != order_id);
        }
        removed
    }

    pub async fn insert_lines(&self, lines: Vec<MechanicOrderLine>) {
        self.inner.order_lines.write().await.extend(lines);
    }

    pub async fn lines_for_order(&self, order_id: &str) -> Vec<MechanicOrderLine> {
        self.inner
            .order_lines
            .read()
            .await
            .iter()
            .filter(|l| l.order_id == order_id)
            .cloned()
            .collect()
    }

    /// Delete all lines for an order and insert the given replacement set
    pub async fn replace_lines_for_order(&self, order_id: &str, lines: Vec<MechanicOrderLine>) {
        let mut all = self.inner.order_lines.write().await;
        all.retain(|l| l.order_id != order_id);
        all.extend(lines);
    }

    pub async fn all_lines(&self) -> Vec<MechanicOrderLine> {
        self.inner.order_lines.read().await.clone()
    }

    // ========================================================================
    // Cart reservations
    // ========================================================================

    pub async fn get_reservation(&self, user: &str, material: &str) -> Option<ReservedItem> {
        self.inner
            .reservations
            .read()
            .await
            .get(&(user.to_string(), material.to_string()))
            .cloned()
    }

    pub async fn put_reservation(&self, item: ReservedItem) {
        self.inner
            .reservations
            .write()
            .await
            .insert((item.reserved_by.clone(), item.material_code.clone()), item);
    }

    pub async fn remove_reservation(&self, user: &str, material: &str) -> bool {
        self.inner
            .reservations
            .write()
            .await
            .remove(&(user.to_string(), material.to_string()))
            .is_some()
    }

    pub async fn reservations_for_user(&self, user: &str) -> Vec<ReservedItem> {
        self.inner
            .reservations
            .read()
            .await
            .values()
            .filter(|r| r.reserved_by == user)
            .cloned()
            .collect()
    }

    pub async fn all_reservations(&self) -> Vec<ReservedItem> {
        self.inner
            .reservations
            .read()
            .await
            .values()
            .cloned()
            .collect()
    }

    /// Hard-delete reservations placed before the cutoff, regardless of owner
    pub async fn remove_reservations_placed_before(&self, cutoff: DateTime<Utc>) -> usize {
        let mut map = self.inner.reservations.write().await;
        let before = map.len();
        map.retain(|_, r| r.reserved_at >= cutoff);
        before - map.len()
    }

    // ========================================================================
    // Uploads
    // ========================================================================

    pub async fn insert_upload(&self, upload: InventoryUpload) {
        self.inner.uploads.write().await.insert(upload.id, upload);
    }

    pub async fn get_upload(&self, id: Uuid) -> Option<InventoryUpload> {
        self.inner.uploads.read().await.get(&id).cloned()
    }

    pub async fn set_upload_counts(&self, id: Uuid, added: i64, updated: i64) {
        if let Some(upload) = self.inner.uploads.write().await.get_mut(&id) {
            upload.added_count = added;
            upload.updated_count = updated;
        }
    }

    pub async fn insert_upload_rows(&self, rows: Vec<InventoryRow>) {
        self.inner.upload_rows.write().await.extend(rows);
    }

    pub async fn rows_for_upload(&self, id: Uuid) -> Vec<InventoryRow> {
        self.inner
            .upload_rows
            .read()
            .await
            .iter()
            .filter(|r| r.upload_id == id)
            .cloned()
            .collect()
    }

    // ========================================================================
    // Catalog tiles
    // ========================================================================

    pub async fn put_tile(&self, tile: MechanicTile) {
        self.inner
            .tiles
            .write()
            .await
            .insert(tile.material_code.clone(), tile);
    }

    /// The active tile for a material, if one is configured
    pub async fn active_tile(&self, material: &str) -> Option<MechanicTile> {
        self.inner
            .tiles
            .read()
            .await
            .get(material)
            .filter(|t| t.active)
            .cloned()
    }
}
