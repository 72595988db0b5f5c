//! Factual stock ledger
//!
//! Holds the authoritative available quantity per (storage, material).
//! Mutated only by import reconciliation and order completion; read by
//! checkout validation and visibility recalculation.

use chrono::Utc;

use crate::error::{AppError, AppResult};
use crate::models::{StockKey, StockRecord};
use crate::store::Store;

#[derive(Clone)]
pub struct StockLedgerService {
    store: Store,
}

impl StockLedgerService {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Current stock record for a key
    pub async fn get(&self, key: &StockKey) -> Option<StockRecord> {
        self.store.get_stock(key).await
    }

    /// Create-or-update the factual quantity, stamping the update time
    pub async fn set(&self, key: &StockKey, qty: i64, description: &str) -> AppResult<StockRecord> {
        if qty < 0 {
            return Err(AppError::InvalidQuantity(format!(
                "stock quantity must be non-negative, got {}",
                qty
            )));
        }

        let _guard = self.store.lock_key(key).await;

        let record = match self.store.get_stock(key).await {
            Some(mut existing) => {
                existing.available_qty = qty;
                if !description.is_empty() {
                    existing.material_description = description.to_string();
                }
                existing.updated_at = Utc::now();
                existing
            }
            None => StockRecord {
                key: key.clone(),
                material_description: description.to_string(),
                available_qty: qty,
                updated_at: Utc::now(),
            },
        };

        self.store.put_stock(record.clone()).await;
        Ok(record)
    }

    /// Atomically subtract `qty` from the factual stock.
    /// Fails when the key is absent or the remaining quantity is short.
    pub async fn decrement(&self, key: &StockKey, qty: i64) -> AppResult<StockRecord> {
        if qty <= 0 {
            return Err(AppError::InvalidQuantity(format!(
                "decrement quantity must be positive, got {}",
                qty
            )));
        }

        let _guard = self.store.lock_key(key).await;

        let mut record = self
            .store
            .get_stock(key)
            .await
            .ok_or_else(|| AppError::InsufficientStock(key.material.clone()))?;

        if record.available_qty < qty {
            return Err(AppError::InsufficientStock(key.material.clone()));
        }

        record.available_qty -= qty;
        record.updated_at = Utc::now();
        self.store.put_stock(record.clone()).await;

        tracing::debug!(key = %key, qty, remaining = record.available_qty, "stock decremented");
        Ok(record)
    }

    /// Snapshot of all stock records, ordered by key
    pub async fn list(&self) -> Vec<StockRecord> {
        self.store.list_stock().await
    }
}
