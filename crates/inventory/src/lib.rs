//! Inventory domain module.
//!
//! Business rules for stock records, implemented as deterministic domain
//! logic (no IO, no HTTP, no storage).

pub mod item;

pub use item::{
    CreateStockItem, LOW_STOCK_THRESHOLD, LowStockEntry, StockItem, UpdateStockItem,
};
