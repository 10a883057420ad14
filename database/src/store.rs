//! Storage abstraction for journals.

use async_trait::async_trait;
use trade_journal_core::{AccountId, JournalData};

use crate::error::{StoreError, StoreResult};

/// Longest account id accepted by stores
pub const MAX_ACCOUNT_ID_LEN: usize = 64;

/// Durable home of journal documents, one per account
#[async_trait]
pub trait JournalStore: Send + Sync {
    /// Loads the journal of an account, `None` if it was never saved
    async fn load(&self, account_id: &str) -> StoreResult<Option<JournalData>>;

    /// Saves the journal under its own account id, replacing any previous copy
    async fn save(&self, data: &JournalData) -> StoreResult<()>;

    /// Removes the journal of an account
    async fn delete(&self, account_id: &str) -> StoreResult<()>;

    /// Lists the accounts that have a saved journal
    async fn accounts(&self) -> StoreResult<Vec<AccountId>>;
}

/// Checks that an account id is safe to use as a storage key.
///
/// Ids are limited to ASCII letters, digits, `-` and `_`.
pub fn validate_account_id(account_id: &str) -> StoreResult<()> {
    let valid = !account_id.is_empty()
        && account_id.len() <= MAX_ACCOUNT_ID_LEN
        && account_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');

    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidAccountId(account_id.to_string()))
    }
}
