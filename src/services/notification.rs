//! Stock alert notifications
//!
//! The notifier is a capability: either a Telegram destination is configured,
//! or alerts downgrade to a log line. Dispatch is fire-and-forget — a failed
//! delivery never blocks or rolls back the mutation that raised the alert.

use std::sync::{Arc, Mutex};

use serde::Serialize;

use crate::config::TelegramConfig;
use crate::external::telegram::TelegramClient;

/// An alert raised when an order checkout pushes a material to or below its
/// alert threshold
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum StockAlert {
    OutOfStock {
        material_code: String,
        title: String,
        storage_type: String,
    },
    LowStock {
        material_code: String,
        title: String,
        visible_qty: i64,
        threshold: i64,
        storage_type: String,
    },
}

/// Outbound alert destination
#[derive(Clone)]
pub enum Notifier {
    /// A Telegram destination is wired up
    Configured(TelegramClient),
    /// No destination; alerts are logged and dropped
    Disabled,
    /// In-memory sink, for tests and dry runs
    Memory(Arc<Mutex<Vec<StockAlert>>>),
}

impl Notifier {
    /// Build from configuration: both token and chat id must be present,
    /// otherwise the notifier is disabled.
    pub fn from_config(config: &TelegramConfig) -> Self {
        match (&config.bot_token, &config.chat_id) {
            (Some(token), Some(chat_id)) if !token.is_empty() && !chat_id.is_empty() => {
                Notifier::Configured(TelegramClient::new(token.clone(), chat_id.clone()))
            }
            _ => {
                tracing::warn!("telegram destination not configured; stock alerts will be logged only");
                Notifier::Disabled
            }
        }
    }

    /// In-memory sink plus a handle to inspect captured alerts
    pub fn memory() -> (Self, Arc<Mutex<Vec<StockAlert>>>) {
        let sink = Arc::new(Mutex::new(Vec::new()));
        (Notifier::Memory(sink.clone()), sink)
    }

    pub fn notify_out_of_stock(&self, material_code: &str, title: &str, storage_type: &str) {
        self.dispatch(StockAlert::OutOfStock {
            material_code: material_code.to_string(),
            title: title.to_string(),
            storage_type: storage_type.to_string(),
        });
    }

    pub fn notify_low_stock(
        &self,
        material_code: &str,
        title: &str,
        visible_qty: i64,
        threshold: i64,
        storage_type: &str,
    ) {
        self.dispatch(StockAlert::LowStock {
            material_code: material_code.to_string(),
            title: title.to_string(),
            visible_qty,
            threshold,
            storage_type: storage_type.to_string(),
        });
    }

    fn dispatch(&self, alert: StockAlert) {
        match self {
            Notifier::Configured(client) => {
                let client = client.clone();
                let text = render(&alert);
                tokio::spawn(async move {
                    if let Err(e) = client.send_message(&text).await {
                        tracing::warn!(error = %e, "failed to deliver stock alert");
                    }
                });
            }
            Notifier::Disabled => {
                tracing::info!(?alert, "stock alert (no destination configured)");
            }
            Notifier::Memory(sink) => {
                if let Ok(mut alerts) = sink.lock() {
                    alerts.push(alert);
                }
            }
        }
    }
}

/// Render an alert as a Markdown message
fn render(alert: &StockAlert) -> String {
    match alert {
        StockAlert::OutOfStock {
            material_code,
            title,
            storage_type,
        } => format!(
            "🔴 *Out of stock*\n\n🏷️ *Title:* {}\n📝 *Code:* `{}`\n🏢 *Storage:* {}",
            title, material_code, storage_type
        ),
        StockAlert::LowStock {
            material_code,
            title,
            visible_qty,
            threshold,
            storage_type,
        } => format!(
            "🟡 *LOW STOCK*\n\n🏷️ *Title:* {}\n📝 *Code:* `{}`\n📦 *Remaining:* {} pcs\n⚠️ *Minimum:* {} pcs\n🏢 *Storage:* {}",
            title, material_code, visible_qty, threshold, storage_type
        ),
    }
}
