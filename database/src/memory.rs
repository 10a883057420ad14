//! In-memory journal store for tests and throwaway sessions.

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::{debug, instrument};
use trade_journal_core::{AccountId, JournalData};

use crate::error::StoreResult;
use crate::store::{validate_account_id, JournalStore};

/// Journal store backed by a concurrent map
#[derive(Debug, Default)]
pub struct MemoryStore {
    journals: DashMap<AccountId, JournalData>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.journals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.journals.is_empty()
    }
}

#[async_trait]
impl JournalStore for MemoryStore {
    #[instrument(skip(self))]
    async fn load(&self, account_id: &str) -> StoreResult<Option<JournalData>> {
        validate_account_id(account_id)?;
        Ok(self.journals.get(account_id).map(|entry| entry.value().clone()))
    }

    #[instrument(skip(self, data), fields(account_id = %data.account_id))]
    async fn save(&self, data: &JournalData) -> StoreResult<()> {
        validate_account_id(&data.account_id)?;
        self.journals.insert(data.account_id.clone(), data.clone());
        debug!(entries = data.entries.len(), "Journal stored in memory");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete(&self, account_id: &str) -> StoreResult<()> {
        validate_account_id(account_id)?;
        self.journals.remove(account_id);
        Ok(())
    }

    async fn accounts(&self) -> StoreResult<Vec<AccountId>> {
        let mut accounts: Vec<AccountId> = self.journals.iter().map(|e| e.key().clone()).collect();
        accounts.sort();
        Ok(accounts)
    }
}
