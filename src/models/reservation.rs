//! Cart reservation records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A short-lived per-user hold on a material, shown in the cart UI.
/// Advisory only: it never touches the factual stock ledger.
/// At most one row exists per (reserved_by, material_code).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReservedItem {
    pub id: Uuid,
    pub material_code: String,
    pub qty: i64,
    pub reserved_by: String,
    pub reserved_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub storage_type: String,
}

impl ReservedItem {
    /// Whether the hold is still live at `now`
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}
