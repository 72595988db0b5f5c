//! Spreadsheet import reconciliation
//!
//! Takes a decoded sheet (header row + data rows), resolves the four logical
//! columns by header aliases, aggregates rows by (storage, material), diffs
//! the sums against the stock ledger and recalculates visibility for every
//! touched key. The raw parsed rows are kept alongside an upload header for
//! audit.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::Utc;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{ImportReport, InventoryRow, InventoryUpload, StockKey, StockRecord};
use crate::services::visibility::VisibilityService;
use crate::store::Store;

const STORAGE_TYPE_ALIASES: &[&str] = &["storagetype", "stgetype", "storagelocation"];
const MATERIAL_ALIASES: &[&str] = &["material", "materialno", "matnr"];
const DESCRIPTION_ALIASES: &[&str] = &["materialdescription", "description", "shorttext"];
const AVAILABLE_STOCK_ALIASES: &[&str] = &[
    "availablestock",
    "availiabestock",
    "availableqty",
    "unrestrictedstock",
    "stock",
];

/// Resolved physical index of each logical column
#[derive(Debug, Clone, Copy)]
struct ColumnMap {
    storage_type: usize,
    material: usize,
    description: usize,
    available_stock: usize,
}

#[derive(Clone)]
pub struct InventoryImportService {
    store: Store,
    visibility: VisibilityService,
}

impl InventoryImportService {
    pub fn new(store: Store, visibility: VisibilityService) -> Self {
        Self { store, visibility }
    }

    /// Run one import. `sheet` is the decoded upload: first row is the
    /// header, the rest are data rows.
    pub async fn import(
        &self,
        original_filename: &str,
        uploaded_by: &str,
        sheet: &[Vec<String>],
    ) -> AppResult<ImportReport> {
        let header: &[String] = sheet.first().map(|h| h.as_slice()).unwrap_or(&[]);
        let columns = resolve_columns(header)?;

        let upload_id = Uuid::new_v4();
        let mut parsed: Vec<InventoryRow> = Vec::new();
        let mut storage_types: BTreeSet<String> = BTreeSet::new();

        for row in sheet.iter().skip(1) {
            let storage_type = cell(row, columns.storage_type);
            let material = cell(row, columns.material);
            // rows without a storage type or material carry no stock fact
            if storage_type.is_empty() || material.is_empty() {
                continue;
            }

            storage_types.insert(storage_type.clone());
            parsed.push(InventoryRow {
                upload_id,
                storage_type,
                material,
                material_description: cell(row, columns.description),
                available_stock: parse_quantity(&cell(row, columns.available_stock)),
            });
        }

        // Reset visibility for every storage type about to be refreshed, so a
        // value from a prior load cannot survive the import.
        for storage_type in &storage_types {
            self.visibility.clear_for_storage(storage_type).await;
        }

        let storage_types_found: Vec<String> = storage_types.iter().cloned().collect();
        self.store
            .insert_upload(InventoryUpload {
                id: upload_id,
                original_filename: original_filename.to_string(),
                uploaded_by: uploaded_by.to_string(),
                uploaded_at: Utc::now(),
                total_rows: parsed.len() as i64,
                added_count: 0,
                updated_count: 0,
                storage_types_found: serde_json::to_string(&storage_types_found)
                    .unwrap_or_else(|_| "[]".to_string()),
            })
            .await;
        self.store.insert_upload_rows(parsed.clone()).await;

        // Aggregate by (storage, material), remembering the first non-empty
        // description per key for readability.
        let mut aggregated: BTreeMap<StockKey, i64> = BTreeMap::new();
        let mut descriptions: HashMap<StockKey, String> = HashMap::new();
        for row in &parsed {
            let key = StockKey::new(&row.storage_type, &row.material);
            *aggregated.entry(key.clone()).or_insert(0) += row.available_stock;
            if !row.material_description.is_empty() {
                descriptions.entry(key).or_insert_with(|| row.material_description.clone());
            }
        }

        let mut added = 0i64;
        let mut updated = 0i64;
        for (key, sum) in &aggregated {
            let touched = {
                let _guard = self.store.lock_key(key).await;
                match self.store.get_stock(key).await {
                    Some(mut existing) => {
                        if existing.available_qty == *sum {
                            // equal sums leave the record untouched
                            false
                        } else {
                            existing.available_qty = *sum;
                            if let Some(description) = descriptions.get(key) {
                                existing.material_description = description.clone();
                            }
                            existing.updated_at = Utc::now();
                            self.store.put_stock(existing).await;
                            updated += 1;
                            true
                        }
                    }
                    None => {
                        self.store
                            .put_stock(StockRecord {
                                key: key.clone(),
                                material_description: descriptions
                                    .get(key)
                                    .cloned()
                                    .unwrap_or_default(),
                                available_qty: *sum,
                                updated_at: Utc::now(),
                            })
                            .await;
                        added += 1;
                        true
                    }
                }
            };

            if touched {
                self.visibility.recalculate(&key.storage_type, &key.material).await;
            }
        }

        self.store.set_upload_counts(upload_id, added, updated).await;

        tracing::info!(
            filename = original_filename,
            rows = parsed.len(),
            added,
            updated,
            "inventory import applied"
        );

        Ok(ImportReport {
            upload_id,
            original_filename: original_filename.to_string(),
            total_rows: parsed.len() as i64,
            added,
            updated,
            storage_types: storage_types_found,
        })
    }
}

fn cell(row: &[String], idx: usize) -> String {
    row.get(idx).map(|s| s.trim().to_string()).unwrap_or_default()
}

/// Lowercase and strip everything but ASCII alphanumerics, so header
/// variants like "Storage Type" / "storage_type" compare equal
pub fn normalize_header(raw: &str) -> String {
    raw.to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect()
}

/// Quantity parsing tolerant of thousands separators, non-breaking spaces and
/// locale punctuation: "1 234", "1\u{00A0}234", "1.234", "1,234" all yield
/// 1234. Unparseable or blank input yields 0 — a bad cell never aborts the
/// batch.
pub fn parse_quantity(raw: &str) -> i64 {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return 0;
    }

    let digits: String = trimmed
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '-')
        .collect();
    if digits.is_empty() || digits == "-" {
        return 0;
    }

    digits.parse::<i64>().unwrap_or(0)
}

fn resolve_columns(header: &[String]) -> AppResult<ColumnMap> {
    let mut norm_to_idx: HashMap<String, usize> = HashMap::new();
    for (idx, raw) in header.iter().enumerate() {
        let normalized = normalize_header(raw);
        if !normalized.is_empty() {
            norm_to_idx.insert(normalized, idx);
        }
    }

    let find = |aliases: &[&str]| {
        aliases
            .iter()
            .find_map(|alias| norm_to_idx.get(*alias).copied())
    };

    let storage_type = find(STORAGE_TYPE_ALIASES);
    let material = find(MATERIAL_ALIASES);
    let description = find(DESCRIPTION_ALIASES);
    let available_stock = find(AVAILABLE_STOCK_ALIASES);

    match (storage_type, material, description, available_stock) {
        (Some(storage_type), Some(material), Some(description), Some(available_stock)) => {
            Ok(ColumnMap {
                storage_type,
                material,
                description,
                available_stock,
            })
        }
        _ => {
            // report every unresolved column, not just the first
            let mut missing = Vec::new();
            if storage_type.is_none() {
                missing.push("Storage Type".to_string());
            }
            if material.is_none() {
                missing.push("Material".to_string());
            }
            if description.is_none() {
                missing.push("Material Description".to_string());
            }
            if available_stock.is_none() {
                missing.push("Available Stock".to_string());
            }
            Err(AppError::MissingColumns(missing))
        }
    }
}
