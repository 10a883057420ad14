//! CSV codec behaviour across whole files
//!
//! Run with: cargo test -p trade-journal-core --test csv_properties

use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use trade_journal_core::{
    parse, serialize, EntryDraft, EntryKind, Journal, JournalData, ParseWarningKind, RiskReward,
};

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 2, d).unwrap()
}

fn at(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

fn sample_journal() -> JournalData {
    let mut journal = Journal::new("main", "Swing, \"Main\" account", dec!(10000.50));

    let mut closed = EntryDraft::trade(
        EntryKind::Long,
        "EURUSD",
        day(1),
        at(9, 15),
        dec!(1.0850),
        dec!(1.0800),
        dec!(1.0950),
        dec!(100000),
    );
    closed.exit_price = Some(dec!(1.0950));
    closed.profit_or_loss = Some(dec!(1000));
    closed.emotional_state = Some("calm".into());
    closed.session = Some("London".into());
    closed.reason_for_entry = Some("Break, retest\nand go".into());
    closed.reason_for_exit = Some("Target hit".into());
    closed.discipline_rating = 5;
    closed.notes = Some("a,b\"c\nd".into());
    closed.screenshot = Some("data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNk+M9QDwADhgGAWjR9awAAAABJRU5ErkJggg==".into());
    journal.submit(closed).unwrap();

    let open = EntryDraft::trade(
        EntryKind::Short,
        "NQ",
        day(2),
        at(14, 30),
        dec!(18000),
        dec!(18100),
        dec!(17700),
        dec!(2),
    );
    journal.submit(open).unwrap();

    let mut analysis = EntryDraft::new(EntryKind::NoTrade, day(3), at(8, 0));
    analysis.market = "GBPJPY".into();
    analysis.notes = Some("No setup".into());
    analysis.discipline_rating = 4;
    journal.submit(analysis).unwrap();

    journal
        .submit(EntryDraft::account_transaction(EntryKind::Withdrawal, dec!(-250.25), day(4), at(12, 0)))
        .unwrap();
    journal
        .submit(EntryDraft::account_transaction(EntryKind::Deposit, dec!(500), day(5), at(12, 0)))
        .unwrap();

    journal.into_data()
}

#[test]
fn round_trip_preserves_entries_and_account() {
    let data = sample_journal();
    let text = serialize(&data);
    let outcome = parse(&text, "main").unwrap();

    assert!(outcome.is_clean(), "unexpected warnings: {:?}", outcome.warnings);
    assert_eq!(outcome.journal, data);
}

#[test]
fn quoting_is_classic_csv() {
    let data = sample_journal();
    let text = serialize(&data);

    assert!(text.contains("\"a,b\"\"c\nd\""));
    assert!(text.contains("\"Swing, \"\"Main\"\" account\""));
    assert!(text.contains(",EURUSD,"));

    let outcome = parse(&text, "main").unwrap();
    assert_eq!(outcome.journal.entries[0].notes.as_deref(), Some("a,b\"c\nd"));
    assert_eq!(
        outcome.journal.entries[0].reason_for_entry.as_deref(),
        Some("Break, retest\nand go")
    );
}

#[test]
fn account_metadata_is_repeated_on_every_row() {
    let data = sample_journal();
    let text = serialize(&data);

    let mut reader = csv::Reader::from_reader(text.as_bytes());
    let mut rows = 0;
    for record in reader.records() {
        let record = record.unwrap();
        assert_eq!(&record[2], "Swing, \"Main\" account");
        assert_eq!(&record[3], "10000.50");
        assert_eq!(record[0].parse::<usize>().unwrap(), rows + 1);
        rows += 1;
    }
    assert_eq!(rows, data.entries.len());

    let outcome = parse(&text, "main").unwrap();
    assert_eq!(outcome.journal.account_name, "Swing, \"Main\" account");
    assert_eq!(outcome.journal.initial_balance, dec!(10000.50));
}

#[test]
fn malformed_row_is_skipped_not_fatal() {
    let text = "date,time,direction,market,balanceAtEntry\n\
                2024-01-01,09:00,Long,ES,100\n\
                2024-01-02,09:00,Long,ES,100\n\
                2024-01-03,09:00,Long,ES\n\
                2024-01-04,09:00,Long,ES,100\n\
                2024-01-05,09:00,Long,ES,100\n";
    let outcome = parse(text, "main").unwrap();

    assert_eq!(outcome.journal.entries.len(), 4);
    assert_eq!(outcome.warning_count(), 1);
    assert_eq!(outcome.warnings[0].line, 4);
    assert_eq!(
        outcome.warnings[0].kind,
        ParseWarningKind::FieldCount { expected: 5, found: 4 }
    );
}

#[test]
fn discipline_rating_out_of_range_imports_as_midpoint() {
    let text = "date,time,direction,market,balanceAtEntry,disciplineRating\n2024-01-01,09:00,Long,ES,100,\"7\"\n";
    let outcome = parse(text, "main").unwrap();

    assert_eq!(outcome.journal.entries.len(), 1);
    assert_eq!(outcome.journal.entries[0].discipline_rating.value(), 3);
    assert!(matches!(
        outcome.warnings[0].kind,
        ParseWarningKind::InvalidDisciplineRating(_)
    ));
}

#[test]
fn deposit_rows_leave_trade_columns_empty() {
    let mut journal = Journal::new("main", "Main", dec!(100));
    journal
        .submit(EntryDraft::account_transaction(EntryKind::Deposit, dec!(40), day(1), at(9, 0)))
        .unwrap();
    let data = journal.into_data();
    let text = serialize(&data);

    let deposit_line = text.lines().nth(1).expect("deposit row");
    let cells: Vec<&str> = deposit_line.split(',').collect();
    assert_eq!(cells[6], "Deposit");
    assert_eq!(cells[7], "Account Transaction");
    // entryPrice..positionSize
    assert!(cells[8..=12].iter().all(|c| c.is_empty()));
    assert_eq!(cells[13], "N/A");
    assert_eq!(cells[14], "40");

    let outcome = parse(&text, "main").unwrap();
    let deposit = &outcome.journal.entries[0];
    assert_eq!(deposit.entry_price, None);
    assert_eq!(deposit.stop_loss_price, None);
    assert_eq!(deposit.position_size, None);
    assert_eq!(deposit.risk_reward_ratio, RiskReward::NotApplicable);
    assert!(deposit.profit_or_loss.unwrap() >= Decimal::ZERO);
    assert_eq!(outcome.journal, data);
}

#[test]
fn older_file_without_session_column_imports() {
    let text = "date,time,direction,market,entryPrice,stopLossPrice,takeProfitPrice,positionSize,balanceAtEntry,emotionalState,disciplineRating\n\
                2023-11-20,10:45,Short,CL,80,82,76,3,5000,anxious,2\n";
    let outcome = parse(text, "legacy").unwrap();
    assert!(outcome.is_clean());

    let entry = &outcome.journal.entries[0];
    assert_eq!(entry.session, None);
    assert_eq!(entry.kind, EntryKind::Short);
    assert_eq!(entry.entry_price, Some(dec!(80)));
    assert_eq!(entry.position_size, Some(dec!(3)));
    assert_eq!(entry.risk_reward_ratio, RiskReward::Ratio(dec!(2)));
    assert_eq!(entry.emotional_state.as_deref(), Some("anxious"));
    assert_eq!(entry.discipline_rating.value(), 2);
    assert_eq!(entry.balance_at_entry, dec!(5000));
}

#[test]
fn reordered_columns_import_by_name() {
    let text = "market,balanceAtEntry,kind,time,date,notes\nES,100,long,09:30,2024-01-01,reordered\n";
    let outcome = parse(text, "main").unwrap();
    let entry = &outcome.journal.entries[0];
    assert_eq!(entry.kind, EntryKind::Long);
    assert_eq!(entry.market, "ES");
    assert_eq!(entry.notes.as_deref(), Some("reordered"));
}

#[test]
fn ids_are_preserved_or_minted() {
    let text = "id,date,time,direction,market,balanceAtEntry\n\
                keep-me,2024-01-01,09:00,Long,ES,100\n\
                ,2024-01-02,09:00,Long,ES,100\n";
    let outcome = parse(text, "main").unwrap();

    assert_eq!(outcome.journal.entries[0].id, "keep-me");
    let minted = &outcome.journal.entries[1].id;
    assert!(uuid::Uuid::parse_str(minted).is_ok());
}

#[test]
fn unknown_direction_is_a_row_defect() {
    let text = "date,time,direction,market,balanceAtEntry\n\
                2024-01-01,09:00,Sideways,ES,100\n\
                2024-01-02,09:00,Long,ES,100\n";
    let outcome = parse(text, "main").unwrap();

    assert_eq!(outcome.journal.entries.len(), 1);
    assert_eq!(
        outcome.warnings[0].kind,
        ParseWarningKind::UnknownDirection("Sideways".into())
    );
}

#[test]
fn rows_are_returned_in_date_order() {
    let text = "date,time,direction,market,balanceAtEntry\n\
                2024-01-03,09:00,Long,C,100\n\
                2024-01-01,15:00,Long,B,100\n\
                2024-01-01,09:00,Long,A,100\n";
    let outcome = parse(text, "main").unwrap();
    let markets: Vec<&str> = outcome.journal.entries.iter().map(|e| e.market.as_str()).collect();
    assert_eq!(markets, vec!["A", "B", "C"]);
}

#[test]
fn blank_lines_are_ignored() {
    let data = sample_journal();
    let text = serialize(&data).replace("\n2,", "\n\n\n2,");
    let outcome = parse(&text, "main").unwrap();
    assert_eq!(outcome.journal.entries.len(), data.entries.len());
}
