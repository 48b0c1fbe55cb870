//! Data models
//!
//! Shared between bistro-server and its clients (via API).
//! DB row types use `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]`.
//! All IDs are `i64` (SQLite INTEGER PRIMARY KEY).

pub mod menu_item;
pub mod order;
pub mod payment;
pub mod reservation;

// Re-exports
pub use menu_item::*;
pub use order::*;
pub use payment::*;
pub use reservation::*;
