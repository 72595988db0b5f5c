//! Domain records for the warehouse stock core

mod inventory;
mod order;
mod reservation;
mod tile;

pub use inventory::*;
pub use order::*;
pub use reservation::*;
pub use tile::*;
