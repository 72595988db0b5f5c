//! Business logic services

pub mod import;
pub mod notification;
pub mod orders;
pub mod reservation;
pub mod stock_ledger;
pub mod visibility;

pub use import::InventoryImportService;
pub use notification::{Notifier, StockAlert};
pub use orders::MechanicOrderService;
pub use reservation::CartReservationService;
pub use stock_ledger::StockLedgerService;
pub use visibility::VisibilityService;
