//! # JSON Document Store
//!
//! Keeps each account's journal as a single JSON document on local disk,
//! `<data_dir>/<account_id>.json`. Writes go to a temporary sibling file that
//! is renamed over the document, so a crash never leaves a half-written
//! journal behind.

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, instrument, warn};
use trade_journal_core::{AccountId, JournalData};

use crate::config::StoreConfig;
use crate::error::StoreResult;
use crate::store::{validate_account_id, JournalStore};

const DOCUMENT_EXTENSION: &str = "json";
const TEMP_EXTENSION: &str = "json.tmp";

/// File-backed journal store
#[derive(Debug, Clone)]
pub struct FileStore {
    config: StoreConfig,
}

impl FileStore {
    /// Opens the store, creating its data directory if needed
    #[instrument(skip(config), fields(data_dir = %config.data_dir.display()))]
    pub async fn new(config: StoreConfig) -> StoreResult<Self> {
        config.validate()?;
        fs::create_dir_all(&config.data_dir).await?;
        info!("Journal store ready");
        Ok(Self { config })
    }

    pub fn data_dir(&self) -> &Path {
        &self.config.data_dir
    }

    /// Location of the document for an account
    pub fn document_path(&self, account_id: &str) -> StoreResult<PathBuf> {
        validate_account_id(account_id)?;
        Ok(self
            .config
            .data_dir
            .join(format!("{}.{}", account_id, DOCUMENT_EXTENSION)))
    }
}

#[async_trait]
impl JournalStore for FileStore {
    #[instrument(skip(self))]
    async fn load(&self, account_id: &str) -> StoreResult<Option<JournalData>> {
        let path = self.document_path(account_id)?;
        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No journal document yet");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let mut data: JournalData = serde_json::from_slice(&bytes)?;
        if data.account_id != account_id {
            warn!(
                stored = %data.account_id,
                "Journal document carries a different account id; using the file name"
            );
            data.account_id = account_id.to_string();
        }

        debug!(entries = data.entries.len(), "Journal loaded");
        Ok(Some(data))
    }

    #[instrument(skip(self, data), fields(account_id = %data.account_id))]
    async fn save(&self, data: &JournalData) -> StoreResult<()> {
        let path = self.document_path(&data.account_id)?;
        let temp_path = path.with_extension(TEMP_EXTENSION);

        let bytes = if self.config.pretty {
            serde_json::to_vec_pretty(data)?
        } else {
            serde_json::to_vec(data)?
        };

        fs::write(&temp_path, &bytes).await?;
        fs::rename(&temp_path, &path).await?;

        debug!(entries = data.entries.len(), bytes = bytes.len(), "Journal saved");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete(&self, account_id: &str) -> StoreResult<()> {
        let path = self.document_path(account_id)?;
        match fs::remove_file(&path).await {
            Ok(()) => {
                info!("Journal document removed");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn accounts(&self) -> StoreResult<Vec<AccountId>> {
        let mut accounts = Vec::new();
        let mut dir = fs::read_dir(&self.config.data_dir).await?;
        while let Some(item) = dir.next_entry().await? {
            let path = item.path();
            if path.extension().and_then(|e| e.to_str()) != Some(DOCUMENT_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                if validate_account_id(stem).is_ok() {
                    accounts.push(stem.to_string());
                }
            }
        }
        accounts.sort();
        Ok(accounts)
    }
}
