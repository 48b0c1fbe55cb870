//! Shared types for the Bistro restaurant server
//!
//! Data models, status state machines, the unified error system and
//! small utilities used by `bistro-server` and its HTTP clients.

pub mod error;
pub mod models;
pub mod util;

// Re-exports
pub use axum::Json;
pub use http;
pub use serde::{Deserialize, Serialize};
