//! CSV import/export of whole journals.
//!
//! The file is a flat table: one header row, then one row per entry with a
//! superset of columns covering every entry kind. Account metadata is repeated
//! on every row so a single file is self-describing. Columns are matched by
//! header name, so files written by older or newer revisions with missing or
//! reordered columns still import.
//!
//! Screenshots are embedded verbatim (data URIs included) and restored
//! verbatim on import.
//!
//! Parsing never fails because of a single bad row: such rows are skipped and
//! reported as [`ParseWarning`]s. Only whole-file problems return a
//! [`CodecError`].

use chrono::{Local, NaiveDate, NaiveTime};
use csv::{QuoteStyle, ReaderBuilder, StringRecord, Terminator, WriterBuilder};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::fmt;
use std::io;
use std::str::FromStr;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::error::{CodecError, CodecResult};
use crate::risk::risk_reward_ratio;
use crate::types::{
    DisciplineRating, Entry, EntryKind, JournalData, RiskReward, DATE_FORMAT, TIME_FORMAT,
};

/// Literal treated the same as an empty cell
const NOT_AVAILABLE: &str = "N/A";

/// Columns known to the codec, in the order they are written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    RowNumber,
    Id,
    AccountName,
    InitialBalance,
    Date,
    Time,
    Direction,
    Market,
    EntryPrice,
    StopLossPrice,
    TakeProfitPrice,
    ExitPrice,
    PositionSize,
    RiskRewardRatio,
    ProfitOrLoss,
    BalanceAtEntry,
    EmotionalState,
    Session,
    ReasonForEntry,
    ReasonForExit,
    DisciplineRating,
    Notes,
    Screenshot,
}

impl Column {
    pub const ALL: [Column; 23] = [
        Column::RowNumber,
        Column::Id,
        Column::AccountName,
        Column::InitialBalance,
        Column::Date,
        Column::Time,
        Column::Direction,
        Column::Market,
        Column::EntryPrice,
        Column::StopLossPrice,
        Column::TakeProfitPrice,
        Column::ExitPrice,
        Column::PositionSize,
        Column::RiskRewardRatio,
        Column::ProfitOrLoss,
        Column::BalanceAtEntry,
        Column::EmotionalState,
        Column::Session,
        Column::ReasonForEntry,
        Column::ReasonForExit,
        Column::DisciplineRating,
        Column::Notes,
        Column::Screenshot,
    ];

    /// Header name written for this column
    pub fn as_str(&self) -> &'static str {
        match self {
            Column::RowNumber => "no",
            Column::Id => "id",
            Column::AccountName => "accountName",
            Column::InitialBalance => "initialBalance",
            Column::Date => "date",
            Column::Time => "time",
            Column::Direction => "direction",
            Column::Market => "market",
            Column::EntryPrice => "entryPrice",
            Column::StopLossPrice => "stopLossPrice",
            Column::TakeProfitPrice => "takeProfitPrice",
            Column::ExitPrice => "exitPrice",
            Column::PositionSize => "positionSize",
            Column::RiskRewardRatio => "riskRewardRatio",
            Column::ProfitOrLoss => "profitOrLoss",
            Column::BalanceAtEntry => "balanceAtEntry",
            Column::EmotionalState => "emotionalState",
            Column::Session => "session",
            Column::ReasonForEntry => "reasonForEntry",
            Column::ReasonForExit => "reasonForExit",
            Column::DisciplineRating => "disciplineRating",
            Column::Notes => "notes",
            Column::Screenshot => "screenshot",
        }
    }

    /// Resolves a header cell, case-insensitively. `kind` is accepted for `direction`.
    pub fn from_header(header: &str) -> Option<Column> {
        let header = header.trim();
        if header.eq_ignore_ascii_case("kind") {
            return Some(Column::Direction);
        }
        Column::ALL
            .iter()
            .copied()
            .find(|column| column.as_str().eq_ignore_ascii_case(header))
    }
}

/// Row-level problem found while parsing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseWarningKind {
    /// Row has a different number of cells than the header
    FieldCount { expected: usize, found: usize },

    /// A required column is absent or empty; the row was skipped
    MissingField(&'static str),

    /// Unparsable date; today's date was used instead
    InvalidDate(String),

    /// Unparsable time; the row was skipped
    InvalidTime(String),

    /// Direction tag is not a known entry kind; the row was skipped
    UnknownDirection(String),

    /// Unparsable number; the field was left absent
    InvalidNumber { column: &'static str, value: String },

    /// Rating missing from the valid set; the midpoint was used instead
    InvalidDisciplineRating(String),

    /// Rating cell left empty; the midpoint was used instead
    MissingDisciplineRating,

    /// Trade without an exit price carries a P/L; the P/L was dropped
    ProfitWithoutExit(String),

    /// The reader could not decode the record; the row was skipped
    Record(String),

    /// Data rows were present but none could be imported
    NoUsableRows { rows: usize },
}

impl fmt::Display for ParseWarningKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseWarningKind::FieldCount { expected, found } => {
                write!(f, "expected {} fields, found {}; row skipped", expected, found)
            }
            ParseWarningKind::MissingField(column) => {
                write!(f, "required field '{}' is missing; row skipped", column)
            }
            ParseWarningKind::InvalidDate(value) => {
                write!(f, "invalid date '{}'; using today's date", value)
            }
            ParseWarningKind::InvalidTime(value) => write!(f, "invalid time '{}'; row skipped", value),
            ParseWarningKind::UnknownDirection(value) => {
                write!(f, "unknown direction '{}'; row skipped", value)
            }
            ParseWarningKind::InvalidNumber { column, value } => {
                write!(f, "invalid number '{}' in '{}'; field left empty", value, column)
            }
            ParseWarningKind::InvalidDisciplineRating(value) => {
                write!(f, "invalid discipline rating '{}'; using {}", value, DisciplineRating::MIDPOINT)
            }
            ParseWarningKind::MissingDisciplineRating => {
                write!(f, "discipline rating is empty; using {}", DisciplineRating::MIDPOINT)
            }
            ParseWarningKind::ProfitWithoutExit(value) => {
                write!(f, "open trade carries profit/loss '{}'; field left empty", value)
            }
            ParseWarningKind::Record(message) => write!(f, "unreadable record: {}; row skipped", message),
            ParseWarningKind::NoUsableRows { rows } => {
                write!(f, "{} data rows found but none could be imported", rows)
            }
        }
    }
}

/// A row-level problem and the line it was found on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseWarning {
    /// 1-based line of the input where the record starts, 0 for file-level notes
    pub line: u64,
    pub kind: ParseWarningKind,
}

impl fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.line == 0 {
            write!(f, "{}", self.kind)
        } else {
            write!(f, "line {}: {}", self.line, self.kind)
        }
    }
}

/// Best-effort parse result
#[derive(Debug, Clone)]
pub struct ParseOutcome {
    pub journal: JournalData,
    pub warnings: Vec<ParseWarning>,
}

impl ParseOutcome {
    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// Writes the journal as CSV text
pub fn serialize(data: &JournalData) -> String {
    let mut buffer = Vec::new();
    // Records all have the same width and a Vec sink accepts every write
    if let Err(e) = serialize_to_writer(data, &mut buffer) {
        error!(error = %e, "Serializing journal into memory failed");
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

/// Writes the journal as CSV into any writer
pub fn serialize_to_writer<W: io::Write>(data: &JournalData, writer: W) -> CodecResult<()> {
    let mut csv_writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Necessary)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(writer);

    csv_writer.write_record(Column::ALL.iter().map(Column::as_str))?;
    for (index, entry) in data.entries.iter().enumerate() {
        let record: Vec<String> = Column::ALL
            .iter()
            .map(|column| cell(*column, index + 1, data, entry))
            .collect();
        csv_writer.write_record(&record)?;
    }
    csv_writer.flush()?;
    Ok(())
}

fn cell(column: Column, row_number: usize, data: &JournalData, entry: &Entry) -> String {
    let trade_value = |value: Option<Decimal>| {
        if entry.kind.is_trade() {
            decimal_cell(value)
        } else {
            String::new()
        }
    };

    match column {
        Column::RowNumber => row_number.to_string(),
        Column::Id => entry.id.clone(),
        Column::AccountName => data.account_name.clone(),
        Column::InitialBalance => data.initial_balance.to_string(),
        Column::Date => entry.date.format(DATE_FORMAT).to_string(),
        Column::Time => entry.time.format(TIME_FORMAT).to_string(),
        Column::Direction => entry.kind.as_str().to_string(),
        Column::Market => entry.market.clone(),
        Column::EntryPrice => trade_value(entry.entry_price),
        Column::StopLossPrice => trade_value(entry.stop_loss_price),
        Column::TakeProfitPrice => trade_value(entry.take_profit_price),
        Column::ExitPrice => trade_value(entry.exit_price),
        Column::PositionSize => trade_value(entry.position_size),
        Column::RiskRewardRatio => entry.risk_reward_ratio.to_string(),
        Column::ProfitOrLoss => decimal_cell(entry.profit_or_loss),
        Column::BalanceAtEntry => entry.balance_at_entry.to_string(),
        Column::EmotionalState => text_cell(&entry.emotional_state),
        Column::Session => text_cell(&entry.session),
        Column::ReasonForEntry => text_cell(&entry.reason_for_entry),
        Column::ReasonForExit => text_cell(&entry.reason_for_exit),
        Column::DisciplineRating => entry.discipline_rating.to_string(),
        Column::Notes => text_cell(&entry.notes),
        Column::Screenshot => text_cell(&entry.screenshot),
    }
}

fn decimal_cell(value: Option<Decimal>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn text_cell(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

/// Parses CSV bytes, failing only if they are not UTF-8 text
pub fn parse_bytes(input: &[u8], account_id: &str) -> CodecResult<ParseOutcome> {
    let text = std::str::from_utf8(input)?;
    parse(text, account_id)
}

/// Parses CSV text into a journal for `account_id`.
///
/// Account name and initial balance come from the first data row. Rows that
/// cannot form an entry are skipped with a warning; entries are returned in
/// `(date, time)` order.
pub fn parse(input: &str, account_id: &str) -> CodecResult<ParseOutcome> {
    let input = input.strip_prefix('\u{feff}').unwrap_or(input);
    if input.lines().all(|line| line.trim().is_empty()) {
        return Err(CodecError::Empty);
    }

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(input.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| CodecError::MissingHeader(e.to_string()))?
        .clone();
    let columns = ColumnMap::from_headers(&headers);

    let mut journal = JournalData::new(account_id, account_id, Decimal::ZERO);
    let mut warnings = Vec::new();
    let mut data_rows = 0usize;

    for result in reader.records() {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                let line = e.position().map(|p| p.line()).unwrap_or_default();
                push_warning(&mut warnings, line, ParseWarningKind::Record(e.to_string()));
                continue;
            }
        };

        if record.iter().all(|field| field.trim().is_empty()) {
            continue;
        }

        data_rows += 1;
        let line = record.position().map(|p| p.line()).unwrap_or_default();
        let row = Row {
            record: &record,
            columns: &columns,
            line,
        };

        if data_rows == 1 {
            if let Some(name) = row.text(Column::AccountName) {
                journal.account_name = name;
            }
            if let Some(balance) = row.decimal(Column::InitialBalance, &mut warnings) {
                journal.initial_balance = balance;
            }
        }

        if record.len() != headers.len() {
            push_warning(
                &mut warnings,
                line,
                ParseWarningKind::FieldCount {
                    expected: headers.len(),
                    found: record.len(),
                },
            );
            continue;
        }

        if let Some(entry) = row.decode(&mut warnings) {
            journal.entries.push(entry);
        }
    }

    if data_rows > 0 && journal.entries.is_empty() {
        push_warning(&mut warnings, 0, ParseWarningKind::NoUsableRows { rows: data_rows });
    }

    journal.sort_entries();
    info!(
        account_id = %account_id,
        rows = data_rows,
        entries = journal.entries.len(),
        warnings = warnings.len(),
        "Parsed journal CSV"
    );

    Ok(ParseOutcome { journal, warnings })
}

fn push_warning(warnings: &mut Vec<ParseWarning>, line: u64, kind: ParseWarningKind) {
    warn!(line, "CSV import: {}", kind);
    warnings.push(ParseWarning { line, kind });
}

/// Header name to record index
struct ColumnMap {
    indices: HashMap<Column, usize>,
}

impl ColumnMap {
    fn from_headers(headers: &StringRecord) -> Self {
        let mut indices = HashMap::new();
        for (index, header) in headers.iter().enumerate() {
            if let Some(column) = Column::from_header(header) {
                indices.entry(column).or_insert(index);
            }
        }
        Self { indices }
    }

    fn get(&self, column: Column) -> Option<usize> {
        self.indices.get(&column).copied()
    }
}

struct Row<'a> {
    record: &'a StringRecord,
    columns: &'a ColumnMap,
    line: u64,
}

impl<'a> Row<'a> {
    /// Raw cell, absent when the column is unknown, empty or "N/A"
    fn raw(&self, column: Column) -> Option<&'a str> {
        let index = self.columns.get(column)?;
        let value = self.record.get(index)?;
        if value.trim().is_empty() || value.trim() == NOT_AVAILABLE {
            None
        } else {
            Some(value)
        }
    }

    fn text(&self, column: Column) -> Option<String> {
        self.raw(column).map(str::to_string)
    }

    fn decimal(&self, column: Column, warnings: &mut Vec<ParseWarning>) -> Option<Decimal> {
        let value = self.raw(column)?.trim();
        match parse_decimal(value) {
            Some(number) => Some(number),
            None => {
                push_warning(
                    warnings,
                    self.line,
                    ParseWarningKind::InvalidNumber {
                        column: column.as_str(),
                        value: value.to_string(),
                    },
                );
                None
            }
        }
    }

    fn required<T>(&self, column: Column, value: Option<T>, warnings: &mut Vec<ParseWarning>) -> Option<T> {
        if value.is_none() {
            push_warning(warnings, self.line, ParseWarningKind::MissingField(column.as_str()));
        }
        value
    }

    fn date(&self, warnings: &mut Vec<ParseWarning>) -> Option<NaiveDate> {
        let value = self.raw(Column::Date)?.trim();
        match parse_date(value) {
            Some(date) => Some(date),
            None => {
                push_warning(warnings, self.line, ParseWarningKind::InvalidDate(value.to_string()));
                Some(Local::now().date_naive())
            }
        }
    }

    fn time(&self, warnings: &mut Vec<ParseWarning>) -> Option<NaiveTime> {
        let value = self.raw(Column::Time)?.trim();
        let parsed = NaiveTime::parse_from_str(value, TIME_FORMAT)
            .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
            .ok();
        if parsed.is_none() {
            push_warning(warnings, self.line, ParseWarningKind::InvalidTime(value.to_string()));
        }
        parsed
    }

    fn kind(&self, warnings: &mut Vec<ParseWarning>) -> Option<EntryKind> {
        let value = self.raw(Column::Direction)?;
        match value.parse::<EntryKind>() {
            Ok(kind) => Some(kind),
            Err(_) => {
                push_warning(
                    warnings,
                    self.line,
                    ParseWarningKind::UnknownDirection(value.trim().to_string()),
                );
                None
            }
        }
    }

    fn discipline_rating(&self, warnings: &mut Vec<ParseWarning>) -> DisciplineRating {
        let Some(value) = self.raw(Column::DisciplineRating) else {
            // Files written before the rating existed have no such column
            if self.columns.get(Column::DisciplineRating).is_some() {
                push_warning(warnings, self.line, ParseWarningKind::MissingDisciplineRating);
            }
            return DisciplineRating::MIDPOINT;
        };

        let parsed = value
            .trim()
            .parse::<i64>()
            .ok()
            .or_else(|| {
                value
                    .trim()
                    .parse::<f64>()
                    .ok()
                    .filter(|v| v.fract() == 0.0 && v.is_finite())
                    .map(|v| v as i64)
            })
            .and_then(|v| u8::try_from(v).ok())
            .and_then(|v| DisciplineRating::new(v).ok());

        match parsed {
            Some(rating) => rating,
            None => {
                push_warning(
                    warnings,
                    self.line,
                    ParseWarningKind::InvalidDisciplineRating(value.trim().to_string()),
                );
                DisciplineRating::MIDPOINT
            }
        }
    }

    /// Decodes the row into an entry, or `None` if a required field is unusable
    fn decode(&self, warnings: &mut Vec<ParseWarning>) -> Option<Entry> {
        let date = self.date(warnings);
        let date = self.required(Column::Date, date, warnings)?;

        let time = match self.raw(Column::Time) {
            Some(_) => self.time(warnings)?,
            None => self.required(Column::Time, None, warnings)?,
        };

        let kind = match self.raw(Column::Direction) {
            Some(_) => self.kind(warnings)?,
            None => self.required(Column::Direction, None, warnings)?,
        };

        let market = self.text(Column::Market);
        let market = self.required(Column::Market, market, warnings)?;

        let balance_at_entry = self.decimal(Column::BalanceAtEntry, warnings);
        let balance_at_entry = self.required(Column::BalanceAtEntry, balance_at_entry, warnings)?;

        let discipline_rating = self.discipline_rating(warnings);

        let entry_price = self.decimal(Column::EntryPrice, warnings);
        let stop_loss_price = self.decimal(Column::StopLossPrice, warnings);
        let take_profit_price = self.decimal(Column::TakeProfitPrice, warnings);

        let risk_reward_ratio = self
            .raw(Column::RiskRewardRatio)
            .and_then(|value| RiskReward::from_str(value).ok())
            .unwrap_or_else(|| risk_reward_ratio(kind, entry_price, stop_loss_price, take_profit_price));

        let exit_price = self.decimal(Column::ExitPrice, warnings);
        let mut profit_or_loss = self.decimal(Column::ProfitOrLoss, warnings);
        if kind.is_trade() && exit_price.is_none() {
            if let Some(pnl) = profit_or_loss.take() {
                push_warning(warnings, self.line, ParseWarningKind::ProfitWithoutExit(pnl.to_string()));
            }
        }

        Some(Entry {
            id: self
                .text(Column::Id)
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
            date,
            time,
            kind,
            market,
            entry_price,
            stop_loss_price,
            take_profit_price,
            exit_price,
            position_size: self.decimal(Column::PositionSize, warnings),
            risk_reward_ratio,
            profit_or_loss,
            balance_at_entry,
            screenshot: self.text(Column::Screenshot),
            notes: self.text(Column::Notes),
            emotional_state: self.text(Column::EmotionalState),
            session: self.text(Column::Session),
            reason_for_entry: self.text(Column::ReasonForEntry),
            reason_for_exit: self.text(Column::ReasonForExit),
            discipline_rating,
        })
    }
}

fn parse_decimal(value: &str) -> Option<Decimal> {
    Decimal::from_str(value)
        .or_else(|_| Decimal::from_scientific(value))
        .ok()
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).ok().or_else(|| {
        // ISO timestamps such as 2024-01-05T00:00:00.000Z
        value
            .get(..10)
            .filter(|_| value[10..].starts_with('T') || value[10..].starts_with(' '))
            .and_then(|day| NaiveDate::parse_from_str(day, DATE_FORMAT).ok())
    })
}
