//! Entry form controller.
//!
//! Collects user input into an [`EntryDraft`], validates it against the
//! kind-gated field rules and turns it into an [`Entry`] with its derived
//! fields filled in.

use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use validator::{Validate, ValidationError};

use crate::error::JournalResult;
use crate::risk::{estimate_profit_or_loss, risk_reward_ratio};
use crate::types::{DisciplineRating, Entry, EntryId, EntryKind, ACCOUNT_TRANSACTION_MARKET};

/// Raw form input for one journal entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_kind_fields"))]
pub struct EntryDraft {
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub kind: EntryKind,

    #[validate(length(max = 100))]
    pub market: String,

    pub entry_price: Option<Decimal>,
    pub stop_loss_price: Option<Decimal>,
    pub take_profit_price: Option<Decimal>,
    pub exit_price: Option<Decimal>,
    pub position_size: Option<Decimal>,

    /// Realized P/L for trades, signed amount for withdrawals and deposits
    pub profit_or_loss: Option<Decimal>,

    pub screenshot: Option<String>,

    #[validate(length(max = 10000))]
    pub notes: Option<String>,

    #[validate(length(max = 200))]
    pub emotional_state: Option<String>,

    #[validate(length(max = 100))]
    pub session: Option<String>,

    #[validate(length(max = 2000))]
    pub reason_for_entry: Option<String>,

    #[validate(length(max = 2000))]
    pub reason_for_exit: Option<String>,

    #[validate(range(min = 1, max = 5))]
    pub discipline_rating: u8,
}

fn field_error(code: &'static str, message: &'static str) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(Cow::Borrowed(message));
    error
}

fn validate_kind_fields(draft: &EntryDraft) -> Result<(), ValidationError> {
    match draft.kind {
        EntryKind::Long | EntryKind::Short => {
            if draft.market.trim().is_empty() {
                return Err(field_error("market", "Market is required"));
            }
            if draft.entry_price.is_none() {
                return Err(field_error("entry_price", "Entry price is required for trades"));
            }
            if draft.stop_loss_price.is_none() {
                return Err(field_error("stop_loss_price", "Stop loss is required for trades"));
            }
            if draft.take_profit_price.is_none() {
                return Err(field_error("take_profit_price", "Take profit is required for trades"));
            }
            match draft.position_size {
                None => return Err(field_error("position_size", "Position size is required for trades")),
                Some(size) if size <= Decimal::ZERO => {
                    return Err(field_error("position_size", "Position size must be greater than zero"))
                }
                Some(_) => {}
            }
            if draft.exit_price.is_none() && draft.profit_or_loss.is_some() {
                return Err(field_error(
                    "profit_or_loss",
                    "Profit or loss can only be recorded once the trade has an exit price",
                ));
            }
        }
        EntryKind::NoTrade => {
            if draft.market.trim().is_empty() {
                return Err(field_error("market", "Market is required"));
            }
        }
        EntryKind::Withdrawal => match draft.profit_or_loss {
            None => return Err(field_error("amount", "Withdrawal amount is required")),
            Some(amount) if amount > Decimal::ZERO => {
                return Err(field_error("amount", "Withdrawal amount must not be positive"))
            }
            Some(_) => {}
        },
        EntryKind::Deposit => match draft.profit_or_loss {
            None => return Err(field_error("amount", "Deposit amount is required")),
            Some(amount) if amount < Decimal::ZERO => {
                return Err(field_error("amount", "Deposit amount must not be negative"))
            }
            Some(_) => {}
        },
    }

    Ok(())
}

fn normalize(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl EntryDraft {
    /// Starts an empty draft of the given kind
    pub fn new(kind: EntryKind, date: NaiveDate, time: NaiveTime) -> Self {
        Self {
            date,
            time,
            kind,
            market: String::new(),
            entry_price: None,
            stop_loss_price: None,
            take_profit_price: None,
            exit_price: None,
            position_size: None,
            profit_or_loss: None,
            screenshot: None,
            notes: None,
            emotional_state: None,
            session: None,
            reason_for_entry: None,
            reason_for_exit: None,
            discipline_rating: DisciplineRating::MIDPOINT.value(),
        }
    }

    /// Draft for a trade with its required levels
    #[allow(clippy::too_many_arguments)]
    pub fn trade(
        kind: EntryKind,
        market: impl Into<String>,
        date: NaiveDate,
        time: NaiveTime,
        entry: Decimal,
        stop: Decimal,
        target: Decimal,
        size: Decimal,
    ) -> Self {
        Self {
            market: market.into(),
            entry_price: Some(entry),
            stop_loss_price: Some(stop),
            take_profit_price: Some(target),
            position_size: Some(size),
            ..Self::new(kind, date, time)
        }
    }

    /// Draft for a withdrawal or deposit of the given signed amount
    pub fn account_transaction(kind: EntryKind, amount: Decimal, date: NaiveDate, time: NaiveTime) -> Self {
        Self {
            market: ACCOUNT_TRANSACTION_MARKET.to_string(),
            profit_or_loss: Some(amount),
            ..Self::new(kind, date, time)
        }
    }

    /// Loads an existing entry back into the form
    pub fn from_entry(entry: &Entry) -> Self {
        Self {
            date: entry.date,
            time: entry.time,
            kind: entry.kind,
            market: entry.market.clone(),
            entry_price: entry.entry_price,
            stop_loss_price: entry.stop_loss_price,
            take_profit_price: entry.take_profit_price,
            exit_price: entry.exit_price,
            position_size: entry.position_size,
            profit_or_loss: entry.profit_or_loss,
            screenshot: entry.screenshot.clone(),
            notes: entry.notes.clone(),
            emotional_state: entry.emotional_state.clone(),
            session: entry.session.clone(),
            reason_for_entry: entry.reason_for_entry.clone(),
            reason_for_exit: entry.reason_for_exit.clone(),
            discipline_rating: entry.discipline_rating.value(),
        }
    }

    /// Validates the draft and builds the entry it describes.
    ///
    /// `balance_at_entry` is the running balance before this entry applies.
    pub fn build(self, id: EntryId, balance_at_entry: Decimal) -> JournalResult<Entry> {
        self.validate()?;
        let discipline_rating = DisciplineRating::new(self.discipline_rating)?;

        let kind = self.kind;
        let is_trade = kind.is_trade();
        let gate = |value: Option<Decimal>| if is_trade { value } else { None };

        let entry_price = gate(self.entry_price);
        let stop_loss_price = gate(self.stop_loss_price);
        let take_profit_price = gate(self.take_profit_price);
        let exit_price = gate(self.exit_price);
        let position_size = gate(self.position_size);

        let profit_or_loss = match kind {
            EntryKind::Long | EntryKind::Short => self
                .profit_or_loss
                .or_else(|| estimate_profit_or_loss(kind, entry_price, exit_price, position_size)),
            EntryKind::NoTrade => None,
            EntryKind::Withdrawal | EntryKind::Deposit => self.profit_or_loss,
        };

        let market = if kind.is_account_transaction() {
            ACCOUNT_TRANSACTION_MARKET.to_string()
        } else {
            self.market.trim().to_string()
        };

        let annotation = |value: Option<String>| {
            if kind.is_account_transaction() {
                None
            } else {
                normalize(value)
            }
        };

        Ok(Entry {
            id,
            date: self.date,
            time: self.time,
            kind,
            market,
            entry_price,
            stop_loss_price,
            take_profit_price,
            exit_price,
            position_size,
            risk_reward_ratio: risk_reward_ratio(kind, entry_price, stop_loss_price, take_profit_price),
            profit_or_loss,
            balance_at_entry,
            screenshot: normalize(self.screenshot),
            notes: normalize(self.notes),
            emotional_state: annotation(self.emotional_state),
            session: annotation(self.session),
            reason_for_entry: annotation(self.reason_for_entry),
            reason_for_exit: annotation(self.reason_for_exit),
            discipline_rating,
        })
    }
}
