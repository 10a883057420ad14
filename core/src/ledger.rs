//! Running-balance ledger for one account.
//!
//! [`Journal`] keeps entries ordered by `(date, time)` and maintains the
//! balance chain: every entry's `balance_at_entry` equals the initial balance
//! plus the P/L of all entries before it. The chain is recomputed after every
//! insert and replacement so edits to earlier entries propagate.
//!
//! Mutations are staged on a copy and only committed once the whole chain
//! fits in a [`Decimal`]; a rejected change leaves the journal as it was.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{JournalError, JournalResult};
use crate::form::EntryDraft;
use crate::types::{AccountId, Entry, EntryId, EntryKind, JournalData};

/// Aggregate figures for a journal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalSummary {
    pub initial_balance: Decimal,
    pub current_balance: Decimal,
    pub total_entries: usize,
    pub trades: usize,
    pub open_positions: usize,
    pub wins: usize,
    pub losses: usize,
    pub no_trades: usize,
    /// Percentage of closed trades with positive P/L
    pub win_rate: Option<Decimal>,
    pub realized_pnl: Decimal,
    pub total_deposits: Decimal,
    pub total_withdrawals: Decimal,
}

/// Journal of one account with ordering and balance invariants
#[derive(Debug, Clone)]
pub struct Journal {
    data: JournalData,
    /// Balance after the last entry
    balance: Decimal,
}

impl Journal {
    /// Creates an empty journal
    pub fn new(account_id: impl Into<AccountId>, account_name: impl Into<String>, initial_balance: Decimal) -> Self {
        Self {
            data: JournalData::new(account_id, account_name, initial_balance),
            balance: initial_balance,
        }
    }

    /// Wraps existing data, restoring entry order without touching balances.
    ///
    /// Fails if the entries' P/L does not sum to a representable balance.
    pub fn from_data(mut data: JournalData) -> JournalResult<Self> {
        data.sort_entries();
        let balance = data.current_balance()?;
        Ok(Self { data, balance })
    }

    pub fn data(&self) -> &JournalData {
        &self.data
    }

    pub fn into_data(self) -> JournalData {
        self.data
    }

    pub fn entries(&self) -> &[Entry] {
        &self.data.entries
    }

    pub fn account_id(&self) -> &str {
        &self.data.account_id
    }

    pub fn get(&self, id: &str) -> Option<&Entry> {
        self.data.entries.iter().find(|e| e.id == id)
    }

    /// Balance after every entry has applied
    pub fn current_balance(&self) -> Decimal {
        self.balance
    }

    /// Creates a new entry from a form submission.
    ///
    /// The entry is inserted after every entry with an earlier or equal
    /// `(date, time)` and the balance chain is recomputed.
    pub fn submit(&mut self, draft: EntryDraft) -> JournalResult<&Entry> {
        let id: EntryId = Uuid::new_v4().to_string();
        let entry = draft.build(id, Decimal::ZERO)?;

        let key = entry.sort_key();
        let mut next = self.data.clone();
        let position = next.entries.partition_point(|e| e.sort_key() <= key);
        next.entries.insert(position, entry);
        self.commit(next, true)?;

        let entry = &self.data.entries[position];
        info!(
            entry_id = %entry.id,
            kind = %entry.kind,
            market = %entry.market,
            balance_at_entry = %entry.balance_at_entry,
            "Journal entry recorded"
        );
        Ok(entry)
    }

    /// Replaces the entry with the given id by a resubmitted form
    pub fn replace(&mut self, id: &str, draft: EntryDraft) -> JournalResult<&Entry> {
        let index = self
            .data
            .entries
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| JournalError::EntryNotFound(id.to_string()))?;

        let replacement = draft.build(id.to_string(), Decimal::ZERO)?;
        let mut next = self.data.clone();
        next.entries[index] = replacement;
        next.sort_entries();
        self.commit(next, true)?;

        info!(entry_id = %id, "Journal entry replaced");
        self.get(id)
            .ok_or_else(|| JournalError::EntryNotFound(id.to_string()))
    }

    /// Loads an entry into a draft for the edit flow
    pub fn draft_for_edit(&self, id: &str) -> JournalResult<EntryDraft> {
        self.get(id)
            .map(EntryDraft::from_entry)
            .ok_or_else(|| JournalError::EntryNotFound(id.to_string()))
    }

    /// Removes every entry, keeping the account metadata
    pub fn clear(&mut self) {
        let removed = self.data.entries.len();
        self.data.entries.clear();
        self.balance = self.data.initial_balance;
        info!(account_id = %self.data.account_id, removed, "Journal cleared");
    }

    /// Replaces the whole journal with imported data.
    ///
    /// The account id of this journal is kept. When `recompute` is false the
    /// imported balances are trusted as-is. Data whose balance chain overflows
    /// is rejected and the journal keeps its previous contents.
    pub fn import(&mut self, mut data: JournalData, recompute: bool) -> JournalResult<()> {
        data.account_id = self.data.account_id.clone();
        data.sort_entries();
        self.commit(data, recompute)?;
        info!(
            account_id = %self.data.account_id,
            entries = self.data.entries.len(),
            recompute,
            "Journal imported"
        );
        Ok(())
    }

    /// Re-stamps `balance_at_entry` along the whole chain
    pub fn recompute_balances(&mut self) -> JournalResult<()> {
        let next = self.data.clone();
        self.commit(next, true)
    }

    /// Returns true when every entry carries the balance the chain implies
    pub fn balances_consistent(&self) -> bool {
        let mut running = Some(self.data.initial_balance);
        self.data.entries.iter().all(|entry| match running {
            Some(balance) if entry.balance_at_entry == balance => {
                running = entry.apply_to(balance).ok();
                true
            }
            _ => false,
        })
    }

    /// Replaces the journal with `next` once its balance chain checks out
    fn commit(&mut self, mut next: JournalData, restamp: bool) -> JournalResult<()> {
        let balance = if restamp {
            restamp_balances(&mut next)?
        } else {
            next.current_balance()?
        };
        self.data = next;
        self.balance = balance;
        Ok(())
    }

    /// Aggregates the journal into headline figures
    pub fn summary(&self) -> JournalResult<JournalSummary> {
        let mut summary = JournalSummary {
            initial_balance: self.data.initial_balance,
            current_balance: self.current_balance(),
            total_entries: self.data.entries.len(),
            trades: 0,
            open_positions: 0,
            wins: 0,
            losses: 0,
            no_trades: 0,
            win_rate: None,
            realized_pnl: Decimal::ZERO,
            total_deposits: Decimal::ZERO,
            total_withdrawals: Decimal::ZERO,
        };

        for entry in &self.data.entries {
            match entry.kind {
                EntryKind::Long | EntryKind::Short => {
                    summary.trades += 1;
                    if entry.is_open() {
                        summary.open_positions += 1;
                    }
                    if let Some(pnl) = entry.profit_or_loss {
                        accumulate(&mut summary.realized_pnl, pnl, "realizedPnl")?;
                        if pnl > Decimal::ZERO {
                            summary.wins += 1;
                        } else if pnl < Decimal::ZERO {
                            summary.losses += 1;
                        }
                    }
                }
                EntryKind::NoTrade => summary.no_trades += 1,
                EntryKind::Deposit => {
                    accumulate(&mut summary.total_deposits, entry.balance_delta(), "totalDeposits")?
                }
                EntryKind::Withdrawal => {
                    accumulate(&mut summary.total_withdrawals, entry.balance_delta(), "totalWithdrawals")?
                }
            }
        }

        let decided = summary.wins + summary.losses;
        if decided > 0 {
            let rate = Decimal::from(summary.wins * 100) / Decimal::from(decided);
            summary.win_rate = Some(rate.round_dp(2));
        }

        Ok(summary)
    }
}

/// Stamps every entry with its running balance and returns the final one
fn restamp_balances(data: &mut JournalData) -> JournalResult<Decimal> {
    let mut running = data.initial_balance;
    for entry in &mut data.entries {
        if entry.balance_at_entry != running {
            debug!(
                entry_id = %entry.id,
                old = %entry.balance_at_entry,
                new = %running,
                "Correcting balance at entry"
            );
            entry.balance_at_entry = running;
        }
        running = entry.apply_to(running)?;
    }
    Ok(running)
}

fn accumulate(total: &mut Decimal, value: Decimal, field: &'static str) -> JournalResult<()> {
    *total = total.checked_add(value).ok_or_else(|| JournalError::InvalidValue {
        field,
        message: "total is out of range".to_string(),
    })?;
    Ok(())
}
