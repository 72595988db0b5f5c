//! Stock, visible-stock and import records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Composite key partitioning stock by warehouse location and material code
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StockKey {
    pub storage_type: String,
    pub material: String,
}

impl StockKey {
    pub fn new(storage_type: impl Into<String>, material: impl Into<String>) -> Self {
        Self {
            storage_type: storage_type.into(),
            material: material.into(),
        }
    }
}

impl std::fmt::Display for StockKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.storage_type, self.material)
    }
}

/// Factual available quantity per (storage, material), updated only by
/// imports and order completion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockRecord {
    pub key: StockKey,
    pub material_description: String,
    pub available_qty: i64,
    pub updated_at: DateTime<Utc>,
}

/// Derived stock shown to mechanics browsing the catalog: factual stock net
/// of quantity tied up in open orders. Never authoritative on its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisibleStockRecord {
    pub key: StockKey,
    pub material_description: String,
    pub visible_qty: i64,
    pub updated_at: DateTime<Utc>,
}

/// Header record for one spreadsheet upload, kept with its raw rows for audit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryUpload {
    pub id: Uuid,
    pub original_filename: String,
    pub uploaded_by: String,
    pub uploaded_at: DateTime<Utc>,
    pub total_rows: i64,
    pub added_count: i64,
    pub updated_count: i64,
    /// JSON array of distinct storage types seen, sorted ascending
    pub storage_types_found: String,
}

/// One raw parsed row of an upload, preserved as-parsed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryRow {
    pub upload_id: Uuid,
    pub storage_type: String,
    pub material: String,
    pub material_description: String,
    pub available_stock: i64,
}

/// Import outcome returned to the uploader. `upload_id` references the
/// persisted audit record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportReport {
    pub upload_id: Uuid,
    pub original_filename: String,
    pub total_rows: i64,
    pub added: i64,
    pub updated: i64,
    pub storage_types: Vec<String>,
}
