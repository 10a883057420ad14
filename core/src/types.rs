//! Core journal types and data structures.
//!
//! This module defines the record schema shared by the form, the ledger, the
//! CSV codec and the document store: entries of every kind, the derived
//! risk/reward value and the whole-account container.

use chrono::{NaiveDate, NaiveTime};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{JournalError, JournalResult};

/// Unique identifier for a journal entry
pub type EntryId = String;

/// Identifier of the account a journal belongs to
pub type AccountId = String;

/// Market label used for withdrawals and deposits
pub const ACCOUNT_TRANSACTION_MARKET: &str = "Account Transaction";

/// Wall-clock format used for entry times
pub const TIME_FORMAT: &str = "%H:%M";

/// Calendar format used for entry dates
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// What an entry records. Shown as "direction" in the journal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryKind {
    /// Long position
    Long,

    /// Short position
    Short,

    /// Analysis that did not lead to a trade
    NoTrade,

    /// Cash taken out of the account
    Withdrawal,

    /// Cash added to the account
    Deposit,
}

impl EntryKind {
    /// All kinds, in display order
    pub const ALL: [EntryKind; 5] = [
        EntryKind::Long,
        EntryKind::Short,
        EntryKind::NoTrade,
        EntryKind::Withdrawal,
        EntryKind::Deposit,
    ];

    /// Returns true for Long and Short
    pub fn is_trade(&self) -> bool {
        matches!(self, EntryKind::Long | EntryKind::Short)
    }

    /// Returns true for Withdrawal and Deposit
    pub fn is_account_transaction(&self) -> bool {
        matches!(self, EntryKind::Withdrawal | EntryKind::Deposit)
    }

    /// Canonical tag written to CSV and shown in tables
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::Long => "Long",
            EntryKind::Short => "Short",
            EntryKind::NoTrade => "NoTrade",
            EntryKind::Withdrawal => "Withdrawal",
            EntryKind::Deposit => "Deposit",
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntryKind {
    type Err = JournalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '_'))
            .collect::<String>()
            .to_ascii_lowercase();

        match normalized.as_str() {
            "long" => Ok(EntryKind::Long),
            "short" => Ok(EntryKind::Short),
            "notrade" => Ok(EntryKind::NoTrade),
            "withdrawal" => Ok(EntryKind::Withdrawal),
            "deposit" => Ok(EntryKind::Deposit),
            _ => Err(JournalError::InvalidValue {
                field: "direction",
                message: format!("unknown direction '{}'", s.trim()),
            }),
        }
    }
}

/// Self-assessed discipline score, always within 1..=5
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct DisciplineRating(u8);

impl DisciplineRating {
    /// Lowest valid rating
    pub const MIN: u8 = 1;

    /// Highest valid rating
    pub const MAX: u8 = 5;

    /// Default used when a stored rating cannot be trusted
    pub const MIDPOINT: DisciplineRating = DisciplineRating(3);

    /// Creates a rating, rejecting values outside 1..=5
    pub fn new(value: u8) -> Result<Self, JournalError> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(JournalError::InvalidValue {
                field: "disciplineRating",
                message: format!("{} is outside {}..={}", value, Self::MIN, Self::MAX),
            })
        }
    }

    /// Maps anything outside the valid set to the midpoint
    pub fn clamped_or_midpoint(value: i64) -> Self {
        u8::try_from(value)
            .ok()
            .and_then(|v| Self::new(v).ok())
            .unwrap_or(Self::MIDPOINT)
    }

    pub fn value(&self) -> u8 {
        self.0
    }
}

impl Default for DisciplineRating {
    fn default() -> Self {
        Self::MIDPOINT
    }
}

impl TryFrom<u8> for DisciplineRating {
    type Error = JournalError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<DisciplineRating> for u8 {
    fn from(rating: DisciplineRating) -> Self {
        rating.0
    }
}

impl fmt::Display for DisciplineRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Derived risk/reward value of an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum RiskReward {
    /// Not a trade, or a price is missing
    #[default]
    NotApplicable,

    /// Stop or target on the wrong side of the entry
    Invalid,

    /// Computed risk is not positive
    InvalidRisk,

    /// Reward divided by risk
    Ratio(Decimal),
}

impl RiskReward {
    const NOT_APPLICABLE: &'static str = "N/A";
    const INVALID: &'static str = "Invalid";
    const INVALID_RISK: &'static str = "Invalid Risk";
    const RATIO_SUFFIX: &'static str = ":1";

    /// Builds a ratio rounded to the two places it is displayed with
    pub fn ratio(value: Decimal) -> Self {
        RiskReward::Ratio(value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
    }
}

impl fmt::Display for RiskReward {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskReward::NotApplicable => f.write_str(Self::NOT_APPLICABLE),
            RiskReward::Invalid => f.write_str(Self::INVALID),
            RiskReward::InvalidRisk => f.write_str(Self::INVALID_RISK),
            RiskReward::Ratio(value) => {
                let mut shown = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
                shown.rescale(2);
                write!(f, "{}{}", shown, Self::RATIO_SUFFIX)
            }
        }
    }
}

impl FromStr for RiskReward {
    type Err = JournalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        match trimmed {
            "" | Self::NOT_APPLICABLE => Ok(RiskReward::NotApplicable),
            Self::INVALID => Ok(RiskReward::Invalid),
            Self::INVALID_RISK => Ok(RiskReward::InvalidRisk),
            other => other
                .strip_suffix(Self::RATIO_SUFFIX)
                .and_then(|value| Decimal::from_str(value.trim()).ok())
                .map(RiskReward::ratio)
                .ok_or_else(|| JournalError::InvalidValue {
                    field: "riskRewardRatio",
                    message: format!("'{}' is not a ratio", other),
                }),
        }
    }
}

impl TryFrom<String> for RiskReward {
    type Error = JournalError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RiskReward> for String {
    fn from(value: RiskReward) -> Self {
        value.to_string()
    }
}

/// One row of the journal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    /// Unique entry identifier, assigned at creation
    pub id: EntryId,

    /// Calendar day of the entry
    pub date: NaiveDate,

    /// Wall-clock time of the entry
    pub time: NaiveTime,

    /// Long, Short, NoTrade, Withdrawal or Deposit
    #[serde(rename = "direction")]
    pub kind: EntryKind,

    /// Instrument, or the account-transaction sentinel
    pub market: String,

    pub entry_price: Option<Decimal>,
    pub stop_loss_price: Option<Decimal>,
    pub take_profit_price: Option<Decimal>,

    /// Absent while the position is still open
    pub exit_price: Option<Decimal>,

    pub position_size: Option<Decimal>,

    pub risk_reward_ratio: RiskReward,

    /// Realized P/L for trades, signed cash amount for account transactions
    pub profit_or_loss: Option<Decimal>,

    /// Account balance immediately before this entry applied
    pub balance_at_entry: Decimal,

    /// Data URI of an embedded image, or a short textual reference
    pub screenshot: Option<String>,

    pub notes: Option<String>,
    pub emotional_state: Option<String>,
    pub session: Option<String>,
    pub reason_for_entry: Option<String>,
    pub reason_for_exit: Option<String>,

    pub discipline_rating: DisciplineRating,
}

impl Entry {
    /// Ordering key of the journal: oldest first by date, then time
    pub fn sort_key(&self) -> (NaiveDate, NaiveTime) {
        (self.date, self.time)
    }

    /// Returns true for a trade without an exit price
    pub fn is_open(&self) -> bool {
        self.kind.is_trade() && self.exit_price.is_none()
    }

    /// Balance change this entry applies to the account
    pub fn balance_delta(&self) -> Decimal {
        self.profit_or_loss.unwrap_or(Decimal::ZERO)
    }

    /// Applies this entry to `balance`, failing if the result is out of range
    pub fn apply_to(&self, balance: Decimal) -> JournalResult<Decimal> {
        balance
            .checked_add(self.balance_delta())
            .ok_or_else(|| JournalError::InvalidValue {
                field: "profitOrLoss",
                message: format!("balance overflows after entry {}", self.id),
            })
    }

    /// Returns true when the screenshot is an embedded image payload
    pub fn has_embedded_screenshot(&self) -> bool {
        self.screenshot
            .as_deref()
            .map(|s| s.starts_with("data:"))
            .unwrap_or(false)
    }
}

/// Whole-account container
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalData {
    /// Store-level account identifier
    pub account_id: AccountId,

    pub account_name: String,

    pub initial_balance: Decimal,

    /// Ordered oldest first by (date, time)
    pub entries: Vec<Entry>,
}

impl JournalData {
    /// Creates an empty journal for the given account
    pub fn new(account_id: impl Into<AccountId>, account_name: impl Into<String>, initial_balance: Decimal) -> Self {
        Self {
            account_id: account_id.into(),
            account_name: account_name.into(),
            initial_balance,
            entries: Vec::new(),
        }
    }

    /// Restores (date, time) order, keeping the relative order of ties
    pub fn sort_entries(&mut self) {
        self.entries.sort_by_key(Entry::sort_key);
    }

    /// Balance after every entry has applied
    pub fn current_balance(&self) -> JournalResult<Decimal> {
        self.entries
            .iter()
            .try_fold(self.initial_balance, |balance, entry| entry.apply_to(balance))
    }
}
