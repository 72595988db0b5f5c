//! Catalog tile records

use serde::{Deserialize, Serialize};

/// Catalog tile mapping a material to its display data and low-stock alert
/// threshold. A missing or inactive tile means no alert is configured.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MechanicTile {
    pub material_code: String,
    pub title: String,
    pub image_url: Option<String>,
    pub min_stock_alert: i64,
    pub active: bool,
}
