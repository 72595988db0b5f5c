//! Cart reservations
//!
//! Short-TTL, per-user holds shown in the shopping-cart UI. Reservations are
//! advisory: they never touch the factual ledger and are not enforced at
//! checkout. Expiry is swept lazily on read rather than by a timer.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::config::ReservationConfig;
use crate::error::{AppError, AppResult};
use crate::models::ReservedItem;
use crate::store::Store;

#[derive(Clone)]
pub struct CartReservationService {
    store: Store,
    ttl: Duration,
    sweep_after: Duration,
}

impl CartReservationService {
    pub fn new(store: Store, config: &ReservationConfig) -> Self {
        Self {
            store,
            ttl: config.ttl(),
            sweep_after: config.sweep_after(),
        }
    }

    /// Reserve a material for a user. Upserts by (user, material): a repeat
    /// call overwrites quantity and expiry, it never accumulates.
    pub async fn reserve(
        &self,
        material_code: &str,
        qty: i64,
        reserved_by: &str,
        storage_type: &str,
    ) -> AppResult<ReservedItem> {
        if qty <= 0 {
            return Err(AppError::InvalidQuantity(format!(
                "reservation quantity must be positive, got {}",
                qty
            )));
        }

        let now = Utc::now();
        let id = self
            .store
            .get_reservation(reserved_by, material_code)
            .await
            .map(|existing| existing.id)
            .unwrap_or_else(Uuid::new_v4);

        let item = ReservedItem {
            id,
            material_code: material_code.to_string(),
            qty,
            reserved_by: reserved_by.to_string(),
            reserved_at: now,
            expires_at: now + self.ttl,
            storage_type: storage_type.to_string(),
        };
        self.store.put_reservation(item.clone()).await;
        Ok(item)
    }

    /// Release one reserved material. No-op when no row exists.
    pub async fn release(&self, material_code: &str, user: &str) {
        self.store.remove_reservation(user, material_code).await;
    }

    /// Release every reservation held by a user
    pub async fn release_all(&self, user: &str) {
        for item in self.store.reservations_for_user(user).await {
            self.store
                .remove_reservation(user, &item.material_code)
                .await;
        }
    }

    /// Heartbeat: push the expiry of every still-live reservation of the user
    /// to now + TTL. Already-expired rows are left untouched, never revived.
    pub async fn extend(&self, user: &str) {
        let now = Utc::now();
        for mut item in self.store.reservations_for_user(user).await {
            if item.is_live(now) {
                item.expires_at = now + self.ttl;
                self.store.put_reservation(item).await;
            }
        }
    }

    /// Active reservations of a user. First hard-deletes rows (any user)
    /// placed longer ago than the retention window, then returns the user's
    /// rows whose expiry is still in the future.
    pub async fn active_reservations(&self, user: &str) -> Vec<ReservedItem> {
        let now = Utc::now();

        let swept = self
            .store
            .remove_reservations_placed_before(now - self.sweep_after)
            .await;
        if swept > 0 {
            tracing::debug!(swept, "expired cart reservations removed");
        }

        self.store
            .reservations_for_user(user)
            .await
            .into_iter()
            .filter(|r| r.is_live(now))
            .collect()
    }

    /// Total quantity of a material held live by all users other than
    /// `user` at `now`. Informational, shown as "reserved by others".
    pub async fn sum_reserved_excluding(
        &self,
        material_code: &str,
        user: &str,
        now: DateTime<Utc>,
    ) -> i64 {
        self.store
            .all_reservations()
            .await
            .into_iter()
            .filter(|r| {
                r.material_code == material_code && r.reserved_by != user && r.is_live(now)
            })
            .map(|r| r.qty)
            .sum()
    }

    /// Per-material reserved-by-others sums for a set of materials
    pub async fn reserved_counts(&self, materials: &[String], user: &str) -> HashMap<String, i64> {
        let now = Utc::now();
        let mut counts = HashMap::with_capacity(materials.len());
        for material in materials {
            let sum = self.sum_reserved_excluding(material, user, now).await;
            counts.insert(material.clone(), sum);
        }
        counts
    }
}
