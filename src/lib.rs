//! # Trade Journal
//!
//! Single-user trading journal: record trades, no-trade analyses, deposits
//! and withdrawals, keep the running balance straight and move the whole
//! journal in and out of CSV.
//!
//! ## Architecture
//!
//! The system is organized into modular crates:
//! - `core`: entry model, risk/reward helper, form validation, ledger and CSV codec
//! - `database`: the JSON document store behind the `JournalStore` trait
//! - this crate: configuration, the page controller and terminal rendering

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms, missing_debug_implementations)]

pub mod app;
pub mod attachments;
pub mod config;
pub mod table;

/// Re-exports for convenience
pub mod prelude {
    pub use crate::app::{AppError, AppResult, ImportReport, JournalApp};
    pub use crate::config::JournalConfig;
    pub use trade_journal_core::{EntryDraft, EntryKind, Journal, JournalData};
    pub use trade_journal_database::{FileStore, JournalStore, MemoryStore};
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
