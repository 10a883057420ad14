//! Journal page controller.
//!
//! Wires the ledger, the CSV codec and a [`JournalStore`] for one account.
//! Every mutation is persisted before it returns; if persisting fails the
//! in-memory journal is rolled back to its previous state.

use rust_decimal::Decimal;
use thiserror::Error;
use tracing::{info, warn};
use trade_journal_core::{
    csv_codec, CodecError, Entry, EntryDraft, Journal, JournalError, JournalSummary, ParseWarning,
};
use trade_journal_database::{JournalStore, StoreError};

/// Errors surfaced by the journal application
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Journal(#[from] JournalError),

    #[error("Could not parse file: {0}")]
    Codec(#[from] CodecError),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Account '{0}' already exists")]
    AccountExists(String),

    #[error("Account '{0}' has not been created yet")]
    AccountMissing(String),
}

/// Type alias for application results
pub type AppResult<T> = Result<T, AppError>;

/// Outcome of a CSV import
#[derive(Debug, Clone)]
pub struct ImportReport {
    pub imported: usize,
    pub warnings: Vec<ParseWarning>,
}

/// One account's journal bound to its store
pub struct JournalApp<S: JournalStore> {
    store: S,
    journal: Journal,
}

impl<S: JournalStore> std::fmt::Debug for JournalApp<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JournalApp")
            .field("account_id", &self.journal.account_id())
            .field("entries", &self.journal.entries().len())
            .finish()
    }
}

impl<S: JournalStore> JournalApp<S> {
    /// Creates a new account, refusing to overwrite an existing one
    pub async fn create(store: S, account_id: &str, account_name: &str, initial_balance: Decimal) -> AppResult<Self> {
        if store.load(account_id).await?.is_some() {
            return Err(AppError::AccountExists(account_id.to_string()));
        }
        let journal = Journal::new(account_id, account_name, initial_balance);
        store.save(journal.data()).await?;
        info!(account_id, %initial_balance, "Account created");
        Ok(Self { store, journal })
    }

    /// Opens an existing account
    pub async fn open(store: S, account_id: &str) -> AppResult<Self> {
        let data = store
            .load(account_id)
            .await?
            .ok_or_else(|| AppError::AccountMissing(account_id.to_string()))?;
        Ok(Self {
            store,
            journal: Journal::from_data(data)?,
        })
    }

    /// Opens an account, creating it with the given metadata if needed
    pub async fn open_or_create(
        store: S,
        account_id: &str,
        account_name: &str,
        initial_balance: Decimal,
    ) -> AppResult<Self> {
        match store.load(account_id).await? {
            Some(data) => Ok(Self {
                store,
                journal: Journal::from_data(data)?,
            }),
            None => Self::create(store, account_id, account_name, initial_balance).await,
        }
    }

    pub fn journal(&self) -> &Journal {
        &self.journal
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn summary(&self) -> AppResult<JournalSummary> {
        Ok(self.journal.summary()?)
    }

    /// Records a new entry from a submitted form
    pub async fn submit(&mut self, draft: EntryDraft) -> AppResult<Entry> {
        let snapshot = self.journal.clone();
        let entry = self.journal.submit(draft)?.clone();
        self.persist(snapshot).await?;
        Ok(entry)
    }

    /// Replaces an entry by id with a resubmitted form
    pub async fn replace(&mut self, id: &str, draft: EntryDraft) -> AppResult<Entry> {
        let snapshot = self.journal.clone();
        let entry = self.journal.replace(id, draft)?.clone();
        self.persist(snapshot).await?;
        Ok(entry)
    }

    /// Loads an entry into a form draft
    pub fn draft_for_edit(&self, id: &str) -> AppResult<EntryDraft> {
        Ok(self.journal.draft_for_edit(id)?)
    }

    /// Removes every entry; returns how many were removed
    pub async fn clear(&mut self) -> AppResult<usize> {
        let snapshot = self.journal.clone();
        let removed = self.journal.entries().len();
        self.journal.clear();
        self.persist(snapshot).await?;
        Ok(removed)
    }

    /// Replaces the journal with the contents of a CSV export
    pub async fn import_csv(&mut self, text: &str, recompute_balances: bool) -> AppResult<ImportReport> {
        let outcome = csv_codec::parse(text, self.journal.account_id())?;
        self.apply_import(outcome, recompute_balances).await
    }

    /// Like [`Self::import_csv`], for raw file contents
    pub async fn import_csv_bytes(&mut self, bytes: &[u8], recompute_balances: bool) -> AppResult<ImportReport> {
        let outcome = csv_codec::parse_bytes(bytes, self.journal.account_id())?;
        self.apply_import(outcome, recompute_balances).await
    }

    async fn apply_import(
        &mut self,
        outcome: csv_codec::ParseOutcome,
        recompute_balances: bool,
    ) -> AppResult<ImportReport> {
        if !outcome.is_clean() {
            warn!(warnings = outcome.warning_count(), "CSV import finished with warnings");
        }

        let snapshot = self.journal.clone();
        let imported = outcome.journal.entries.len();
        self.journal.import(outcome.journal, recompute_balances)?;
        self.persist(snapshot).await?;

        Ok(ImportReport {
            imported,
            warnings: outcome.warnings,
        })
    }

    /// Exports the journal as CSV text
    pub fn export_csv(&self) -> String {
        csv_codec::serialize(self.journal.data())
    }

    async fn persist(&mut self, snapshot: Journal) -> AppResult<()> {
        if let Err(e) = self.store.save(self.journal.data()).await {
            warn!(error = %e, "Saving journal failed; changes rolled back");
            self.journal = snapshot;
            return Err(e.into());
        }
        Ok(())
    }
}
