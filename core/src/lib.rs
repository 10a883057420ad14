//! # Trade Journal Core
//!
//! Record schema, derived-field helpers, form validation, the running-balance
//! ledger and the CSV interchange codec for a single-user trading journal.
//!
//! Everything in this crate is synchronous and free of I/O; storage lives in
//! `trade-journal-database`.

pub mod csv_codec;
pub mod error;
pub mod form;
pub mod ledger;
pub mod risk;
pub mod types;

// Re-export commonly used types
pub use csv_codec::{parse, parse_bytes, serialize, serialize_to_writer, Column, ParseOutcome, ParseWarning, ParseWarningKind};
pub use error::*;
pub use form::EntryDraft;
pub use ledger::{Journal, JournalSummary};
pub use risk::{estimate_profit_or_loss, risk_reward_ratio};
pub use types::*;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
