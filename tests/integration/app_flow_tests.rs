//! Journal page flows against an in-memory store

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use rust_decimal_macros::dec;
use std::sync::atomic::{AtomicBool, Ordering};
use trade_journal::prelude::*;
use trade_journal_core::{AccountId, ParseWarningKind, RiskReward};
use trade_journal_database::{StoreError, StoreResult};

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
}

fn at(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

fn closed_long(d: u32, pnl: rust_decimal::Decimal) -> EntryDraft {
    let mut draft = EntryDraft::trade(
        EntryKind::Long,
        "ES",
        day(d),
        at(10, 0),
        dec!(5000),
        dec!(4990),
        dec!(5020),
        dec!(1),
    );
    draft.exit_price = Some(dec!(5010));
    draft.profit_or_loss = Some(pnl);
    draft
}

async fn new_app() -> JournalApp<MemoryStore> {
    JournalApp::create(MemoryStore::new(), "main", "Main", dec!(1000))
        .await
        .unwrap()
}

#[tokio::test]
async fn test_submit_persists_and_chains_balances() {
    let mut app = new_app().await;

    app.submit(closed_long(1, dec!(100))).await.unwrap();
    app.submit(EntryDraft::account_transaction(EntryKind::Deposit, dec!(500), day(2), at(9, 0)))
        .await
        .unwrap();
    let last = app.submit(closed_long(3, dec!(-50))).await.unwrap();

    assert_eq!(last.balance_at_entry, dec!(1600));
    assert_eq!(last.risk_reward_ratio, RiskReward::Ratio(dec!(2)));
    assert_eq!(app.journal().current_balance(), dec!(1550));

    let saved = app.store().load("main").await.unwrap().unwrap();
    assert_eq!(&saved, app.journal().data());
}

#[tokio::test]
async fn test_editing_old_entry_updates_later_balances() {
    let mut app = new_app().await;
    let first = app.submit(closed_long(1, dec!(100))).await.unwrap();
    app.submit(closed_long(2, dec!(20))).await.unwrap();
    app.submit(closed_long(3, dec!(30))).await.unwrap();

    let mut draft = app.draft_for_edit(&first.id).unwrap();
    draft.profit_or_loss = Some(dec!(-200));
    app.replace(&first.id, draft).await.unwrap();

    let balances: Vec<_> = app
        .journal()
        .entries()
        .iter()
        .map(|e| e.balance_at_entry)
        .collect();
    assert_eq!(balances, vec![dec!(1000), dec!(800), dec!(820)]);
    assert!(app.journal().balances_consistent());
}

#[tokio::test]
async fn test_rejected_form_leaves_journal_untouched() {
    let mut app = new_app().await;
    let mut draft = closed_long(1, dec!(10));
    draft.position_size = None;

    let result = app.submit(draft).await;
    assert!(matches!(result, Err(AppError::Journal(_))));
    assert!(app.journal().entries().is_empty());
}

#[tokio::test]
async fn test_create_refuses_existing_account() {
    let store = MemoryStore::new();
    store.save(&JournalData::new("main", "Main", dec!(1))).await.unwrap();

    let result = JournalApp::create(store, "main", "Other", dec!(2)).await;
    assert!(matches!(result, Err(AppError::AccountExists(id)) if id == "main"));
}

#[tokio::test]
async fn test_open_missing_account() {
    let result = JournalApp::open(MemoryStore::new(), "nobody").await;
    assert!(matches!(result, Err(AppError::AccountMissing(_))));
}

#[tokio::test]
async fn test_export_then_import_into_other_account() {
    let mut app = new_app().await;
    app.submit(closed_long(1, dec!(100))).await.unwrap();
    app.submit(EntryDraft::account_transaction(EntryKind::Withdrawal, dec!(-40), day(2), at(9, 0)))
        .await
        .unwrap();
    let text = app.export_csv();

    let mut other = JournalApp::create(MemoryStore::new(), "copy", "Empty", dec!(0))
        .await
        .unwrap();
    let report = other.import_csv(&text, true).await.unwrap();

    assert_eq!(report.imported, 2);
    assert!(report.warnings.is_empty());
    assert_eq!(other.journal().account_id(), "copy");
    assert_eq!(other.journal().data().account_name, "Main");
    assert_eq!(other.journal().current_balance(), dec!(1060));
    assert_eq!(other.journal().entries(), app.journal().entries());
}

#[tokio::test]
async fn test_import_recomputes_tampered_balances_unless_kept() {
    let text = "date,time,direction,market,exitPrice,profitOrLoss,balanceAtEntry,initialBalance\n\
                2024-01-01,09:00,Long,ES,5010,10,999,100\n\
                2024-01-02,09:00,Deposit,Account Transaction,,10,999,100\n";

    let mut app = new_app().await;
    app.import_csv(text, true).await.unwrap();
    let balances: Vec<_> = app.journal().entries().iter().map(|e| e.balance_at_entry).collect();
    assert_eq!(balances, vec![dec!(100), dec!(110)]);

    app.import_csv(text, false).await.unwrap();
    let balances: Vec<_> = app.journal().entries().iter().map(|e| e.balance_at_entry).collect();
    assert_eq!(balances, vec![dec!(999), dec!(999)]);
}

#[tokio::test]
async fn test_import_reports_row_warnings() {
    let text = "date,time,direction,market,balanceAtEntry\n\
                2024-01-01,09:00,Long,ES,100\n\
                2024-01-02,09:00,Long,ES\n";
    let mut app = new_app().await;
    let report = app.import_csv(text, true).await.unwrap();

    assert_eq!(report.imported, 1);
    assert_eq!(report.warnings.len(), 1);
    assert!(matches!(report.warnings[0].kind, ParseWarningKind::FieldCount { .. }));
}

#[tokio::test]
async fn test_overflowing_import_is_rejected_and_keeps_journal() {
    let text = "date,time,direction,market,profitOrLoss,balanceAtEntry\n\
                2024-01-01,09:00,Deposit,Account Transaction,5e28,0\n\
                2024-01-02,09:00,Deposit,Account Transaction,5e28,0\n\
                2024-01-03,09:00,Deposit,Account Transaction,1,0\n";
    let mut app = new_app().await;
    app.submit(closed_long(1, dec!(5))).await.unwrap();

    for recompute in [true, false] {
        let result = app.import_csv(text, recompute).await;
        assert!(matches!(result, Err(AppError::Journal(_))));
        assert_eq!(app.journal().entries().len(), 1);
        assert_eq!(app.journal().current_balance(), dec!(1005));
    }

    let saved = app.store().load("main").await.unwrap().unwrap();
    assert_eq!(saved.entries.len(), 1);
}

#[tokio::test]
async fn test_open_trade_profit_does_not_move_balance() {
    let mut app = new_app().await;
    let mut draft = closed_long(1, dec!(500));
    draft.exit_price = None;

    let result = app.submit(draft).await;
    assert!(matches!(result, Err(AppError::Journal(_))));

    let mut open = closed_long(1, dec!(0));
    open.exit_price = None;
    open.profit_or_loss = None;
    let entry = app.submit(open).await.unwrap();
    assert!(entry.is_open());

    let summary = app.summary().unwrap();
    assert_eq!(summary.current_balance, dec!(1000));
    assert_eq!(summary.open_positions, 1);
    assert_eq!(summary.wins, 0);
}

#[tokio::test]
async fn test_empty_import_is_an_error_and_keeps_journal() {
    let mut app = new_app().await;
    app.submit(closed_long(1, dec!(5))).await.unwrap();

    let result = app.import_csv("", true).await;
    assert!(matches!(result, Err(AppError::Codec(_))));
    assert_eq!(app.journal().entries().len(), 1);
}

#[tokio::test]
async fn test_clear_removes_entries_keeps_account() {
    let mut app = new_app().await;
    app.submit(closed_long(1, dec!(5))).await.unwrap();
    app.submit(closed_long(2, dec!(5))).await.unwrap();

    assert_eq!(app.clear().await.unwrap(), 2);
    let saved = app.store().load("main").await.unwrap().unwrap();
    assert!(saved.entries.is_empty());
    assert_eq!(saved.initial_balance, dec!(1000));
}

/// Store whose saves can be switched off
#[derive(Default)]
struct FlakyStore {
    inner: MemoryStore,
    failing: AtomicBool,
}

#[async_trait]
impl JournalStore for FlakyStore {
    async fn load(&self, account_id: &str) -> StoreResult<Option<JournalData>> {
        self.inner.load(account_id).await
    }

    async fn save(&self, data: &JournalData) -> StoreResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "disk full",
            )));
        }
        self.inner.save(data).await
    }

    async fn delete(&self, account_id: &str) -> StoreResult<()> {
        self.inner.delete(account_id).await
    }

    async fn accounts(&self) -> StoreResult<Vec<AccountId>> {
        self.inner.accounts().await
    }
}

#[tokio::test]
async fn test_failed_save_rolls_back() {
    let mut app = JournalApp::create(FlakyStore::default(), "main", "Main", dec!(1000))
        .await
        .unwrap();
    app.submit(closed_long(1, dec!(100))).await.unwrap();

    app.store().failing.store(true, Ordering::SeqCst);
    let result = app.submit(closed_long(2, dec!(100))).await;

    assert!(matches!(result, Err(AppError::Store(_))));
    assert_eq!(app.journal().entries().len(), 1);
    assert_eq!(app.journal().current_balance(), dec!(1100));

    assert!(app.clear().await.is_err());
    assert_eq!(app.journal().entries().len(), 1);
}
