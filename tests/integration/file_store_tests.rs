//! Journal page flows against the JSON document store on disk

use chrono::{NaiveDate, NaiveTime};
use rust_decimal_macros::dec;
use trade_journal::attachments;
use trade_journal::prelude::*;
use trade_journal_database::StoreConfig;

fn at(d: u32, h: u32) -> (NaiveDate, NaiveTime) {
    (
        NaiveDate::from_ymd_opt(2024, 4, d).unwrap(),
        NaiveTime::from_hms_opt(h, 0, 0).unwrap(),
    )
}

async fn store_in(dir: &std::path::Path) -> FileStore {
    FileStore::new(StoreConfig::new(dir)).await.unwrap()
}

#[tokio::test]
async fn test_journal_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();

    let mut app = JournalApp::create(store_in(dir.path()).await, "swing", "Swing", dec!(2500))
        .await
        .unwrap();
    let (date, time) = at(1, 9);
    let mut draft = EntryDraft::new(EntryKind::NoTrade, date, time);
    draft.market = "CL".into();
    draft.notes = Some("Waited for the open, no setup".into());
    app.submit(draft).await.unwrap();
    let (date, time) = at(2, 9);
    app.submit(EntryDraft::account_transaction(EntryKind::Deposit, dec!(250), date, time))
        .await
        .unwrap();
    drop(app);

    let reopened = JournalApp::open(store_in(dir.path()).await, "swing").await.unwrap();
    assert_eq!(reopened.journal().entries().len(), 2);
    assert_eq!(reopened.journal().current_balance(), dec!(2750));
    assert_eq!(
        reopened.store().accounts().await.unwrap(),
        vec!["swing".to_string()]
    );
}

#[tokio::test]
async fn test_accounts_are_isolated() {
    let dir = tempfile::tempdir().unwrap();

    let mut first = JournalApp::open_or_create(store_in(dir.path()).await, "a", "A", dec!(10))
        .await
        .unwrap();
    let (date, time) = at(1, 9);
    first
        .submit(EntryDraft::account_transaction(EntryKind::Deposit, dec!(5), date, time))
        .await
        .unwrap();

    let second = JournalApp::open_or_create(store_in(dir.path()).await, "b", "B", dec!(20))
        .await
        .unwrap();
    assert!(second.journal().entries().is_empty());
    assert_eq!(second.journal().current_balance(), dec!(20));
}

#[tokio::test]
async fn test_embedded_screenshot_round_trips_through_csv_and_disk() {
    let dir = tempfile::tempdir().unwrap();
    let image = dir.path().join("chart.png");
    tokio::fs::write(&image, [0x89u8, b'P', b'N', b'G']).await.unwrap();
    let screenshot = attachments::screenshot_from_arg(image.to_str().unwrap())
        .await
        .unwrap();
    assert!(screenshot.starts_with("data:image/png;base64,"));

    let mut app = JournalApp::create(store_in(&dir.path().join("data")).await, "main", "Main", dec!(100))
        .await
        .unwrap();
    let (date, time) = at(3, 14);
    let mut draft = EntryDraft::trade(
        EntryKind::Short,
        "NQ",
        date,
        time,
        dec!(18000),
        dec!(18050),
        dec!(17900),
        dec!(1),
    );
    draft.screenshot = Some(screenshot.clone());
    app.submit(draft).await.unwrap();

    let csv_path = dir.path().join("export.csv");
    tokio::fs::write(&csv_path, app.export_csv()).await.unwrap();
    app.clear().await.unwrap();

    let bytes = tokio::fs::read(&csv_path).await.unwrap();
    let report = app.import_csv_bytes(&bytes, true).await.unwrap();
    assert_eq!(report.imported, 1);

    let reopened = JournalApp::open(store_in(&dir.path().join("data")).await, "main")
        .await
        .unwrap();
    let entry = &reopened.journal().entries()[0];
    assert_eq!(entry.screenshot.as_deref(), Some(screenshot.as_str()));
    assert!(entry.is_open());
}

#[tokio::test]
async fn test_invalid_utf8_import_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let mut app = JournalApp::create(store_in(dir.path()).await, "main", "Main", dec!(1))
        .await
        .unwrap();

    let result = app.import_csv_bytes(&[0xff, 0xfe, 0x00, b','], true).await;
    assert!(matches!(result, Err(AppError::Codec(_))));
}
