//! Journal configuration
//!
//! Handles configuration loading for the trade journal CLI. Values are layered
//! from built-in defaults, optional config files and `JOURNAL_*` environment
//! variables.

use config::{Config, ConfigError, Environment, File};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use trade_journal_database::{validate_account_id, StoreConfig};

/// Runtime configuration of the journal
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JournalConfig {
    /// Account the CLI operates on
    pub account_id: String,

    /// Display name used when the account is first created
    pub account_name: String,

    /// Starting balance used when the account is first created
    pub initial_balance: Decimal,

    /// Directory of the JSON document store
    pub data_dir: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,

    /// Directory for the rolling JSON log file
    pub log_dir: PathBuf,
}

impl Default for JournalConfig {
    fn default() -> Self {
        Self {
            account_id: "default".to_string(),
            account_name: "Trading Account".to_string(),
            initial_balance: Decimal::ZERO,
            data_dir: PathBuf::from("data"),
            log_level: "info".to_string(),
            log_dir: PathBuf::from("logs"),
        }
    }
}

impl JournalConfig {
    /// Loads configuration from config files and the environment.
    ///
    /// `path` is an extra file that, when given, must exist. The result is not
    /// validated so command-line overrides can still be applied on top.
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        let defaults = JournalConfig::default();
        let mut builder = Config::builder()
            .set_default("account_id", defaults.account_id)?
            .set_default("account_name", defaults.account_name)?
            .set_default("initial_balance", defaults.initial_balance.to_string())?
            .set_default("data_dir", defaults.data_dir.to_string_lossy().to_string())?
            .set_default("log_level", defaults.log_level)?
            .set_default("log_dir", defaults.log_dir.to_string_lossy().to_string())?
            .add_source(File::with_name("journal.toml").required(false))
            .add_source(File::with_name("config/journal.toml").required(false));

        if let Some(path) = path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        let config = builder
            .add_source(Environment::with_prefix("JOURNAL").try_parsing(true))
            .build()?;

        config.try_deserialize()
    }

    /// Validates the configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_account_id(&self.account_id)
            .map_err(|e| ConfigError::Message(e.to_string()))?;

        if self.initial_balance < Decimal::ZERO {
            return Err(ConfigError::Message(
                "Initial balance cannot be negative".to_string(),
            ));
        }

        if self.data_dir.as_os_str().is_empty() {
            return Err(ConfigError::Message(
                "Data directory cannot be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Storage settings derived from this configuration
    pub fn store_config(&self) -> StoreConfig {
        StoreConfig {
            data_dir: self.data_dir.clone(),
            pretty: true,
        }
    }
}
