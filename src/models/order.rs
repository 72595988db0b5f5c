//! Mechanic order records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A mechanic order. The id is business-meaningful, not a surrogate key.
///
/// Both terminal states set `completed`; cancellation additionally sets
/// `cancelled`, so a single `completed` check identifies open orders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MechanicOrder {
    pub order_id: String,
    pub mechanic_login: String,
    pub storage_type: String,
    pub created_at: DateTime<Utc>,
    pub completed: bool,
    pub cancelled: bool,
}

impl MechanicOrder {
    pub fn is_open(&self) -> bool {
        !self.completed
    }
}

/// One order line, referencing its owning order by id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MechanicOrderLine {
    pub order_id: String,
    pub material_code: String,
    pub title: String,
    pub qty: i64,
    pub image_url: Option<String>,
}

/// One requested item at checkout; same-material items are summed before the
/// order is created
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutItem {
    pub material_code: String,
    pub title: Option<String>,
    pub qty: i64,
}

/// Replacement line content for a warehouse-initiated bulk edit
#[derive(Debug, Clone, Deserialize)]
pub struct OrderLineInput {
    pub material_code: String,
    pub title: String,
    pub qty: i64,
}
