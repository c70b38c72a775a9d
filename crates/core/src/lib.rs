//! `stockwatch-core`: shared domain building blocks.
//!
//! Pure domain primitives used by the inventory and auth crates (no IO).

pub mod entity;
pub mod error;
pub mod id;
pub mod status;

pub use entity::Entity;
pub use error::DomainError;
pub use id::{AdminId, StockItemId};
pub use status::RecordStatus;
