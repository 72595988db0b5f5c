//! Warehouse stock and mechanic-order core
//!
//! Keeps the factual stock ledger, short-lived cart reservations, the derived
//! "visible stock" a browsing mechanic sees, spreadsheet import
//! reconciliation, and the mechanic-order state machine. Persistence,
//! transport and presentation are collaborators: the crate runs against an
//! in-process record store and emits stock alerts through a pluggable
//! notifier.
//!
//! Typical wiring:
//!
//! ```no_run
//! use stockroom::config::Config;
//! use stockroom::services::{
//!     CartReservationService, InventoryImportService, MechanicOrderService, Notifier,
//!     StockLedgerService, VisibilityService,
//! };
//! use stockroom::store::Store;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::load()?;
//! let store = Store::new();
//!
//! let ledger = StockLedgerService::new(store.clone());
//! let visibility = VisibilityService::new(store.clone());
//! let reservations = CartReservationService::new(store.clone(), &config.reservation);
//! let imports = InventoryImportService::new(store.clone(), visibility.clone());
//! let orders = MechanicOrderService::new(
//!     store,
//!     ledger,
//!     visibility,
//!     Notifier::from_config(&config.telegram),
//!     &config.orders,
//! );
//! # let _ = (reservations, imports, orders);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod external;
pub mod models;
pub mod services;
pub mod store;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use store::Store;
