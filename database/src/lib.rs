//! # Journal Storage
//!
//! Durable storage for trade journals. Each account is kept as one JSON
//! document; CSV stays an interchange format handled by the core crate.

pub mod config;
pub mod error;
pub mod file_store;
pub mod memory;
pub mod store;

// Re-export commonly used types
pub use config::*;
pub use error::*;
pub use file_store::FileStore;
pub use memory::MemoryStore;
pub use store::*;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
