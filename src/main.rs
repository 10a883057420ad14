//! Trade Journal CLI
//!
//! This is the main entry point for the trade journal.

use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate, NaiveTime, Timelike};
use clap::{Args, Parser, Subcommand};
use rust_decimal::Decimal;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;

use trade_journal::app::JournalApp;
use trade_journal::attachments;
use trade_journal::config::JournalConfig;
use trade_journal::table;
use trade_journal_core::{risk_reward_ratio, EntryDraft, EntryKind};
use trade_journal_database::{FileStore, JournalStore};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "JOURNAL_CONFIG")]
    config: Option<String>,

    /// Account to operate on (overrides configuration)
    #[arg(short, long)]
    account: Option<String>,

    /// Directory of the journal store (overrides configuration)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the journal for the account
    Init {
        /// Account display name
        #[arg(long)]
        name: Option<String>,

        /// Starting balance
        #[arg(long)]
        balance: Option<Decimal>,
    },

    /// Compute the risk/reward ratio of a planned trade
    Rrr {
        #[arg(long, value_parser = parse_kind)]
        direction: EntryKind,
        #[arg(long)]
        entry: Decimal,
        #[arg(long)]
        stop: Decimal,
        #[arg(long)]
        target: Decimal,
    },

    /// List accounts in the store
    Accounts,

    #[command(flatten)]
    Journal(JournalCommand),
}

/// Commands that work on the configured account's journal
#[derive(Subcommand, Debug)]
enum JournalCommand {
    /// Record a trade or a no-trade analysis
    Add(EntryArgs),

    /// Record cash added to the account
    Deposit(TransactionArgs),

    /// Record cash taken out of the account
    Withdraw(TransactionArgs),

    /// Replace an entry, keeping every field that is not given
    Edit {
        /// Entry id (a unique prefix is enough)
        id: String,

        #[command(flatten)]
        fields: EntryArgs,
    },

    /// Show all entries
    List,

    /// Show one entry in full
    Show {
        /// Entry id (a unique prefix is enough)
        id: String,
    },

    /// Show balance and performance figures
    Summary,

    /// Replace the journal with the contents of a CSV file
    Import {
        file: PathBuf,

        /// Trust the balances in the file instead of recomputing them
        #[arg(long)]
        keep_balances: bool,
    },

    /// Write the journal to a CSV file
    Export { file: PathBuf },

    /// Remove every entry
    Clear {
        /// Confirm the removal
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Args, Debug, Default)]
struct EntryArgs {
    /// Long, Short or NoTrade
    #[arg(long, value_parser = parse_kind)]
    direction: Option<EntryKind>,

    #[arg(long)]
    market: Option<String>,

    /// YYYY-MM-DD, defaults to today
    #[arg(long, value_parser = parse_date)]
    date: Option<NaiveDate>,

    /// HH:MM, defaults to now
    #[arg(long, value_parser = parse_time)]
    time: Option<NaiveTime>,

    #[arg(long = "entry")]
    entry_price: Option<Decimal>,

    #[arg(long = "stop")]
    stop_loss_price: Option<Decimal>,

    #[arg(long = "target")]
    take_profit_price: Option<Decimal>,

    #[arg(long = "exit")]
    exit_price: Option<Decimal>,

    #[arg(long = "size")]
    position_size: Option<Decimal>,

    /// Realized P/L; estimated from the exit price when omitted
    #[arg(long = "pnl", allow_hyphen_values = true)]
    profit_or_loss: Option<Decimal>,

    #[arg(long)]
    emotion: Option<String>,

    #[arg(long)]
    session: Option<String>,

    #[arg(long)]
    reason_entry: Option<String>,

    #[arg(long)]
    reason_exit: Option<String>,

    /// Discipline rating, 1 to 5
    #[arg(long)]
    rating: Option<u8>,

    #[arg(long)]
    notes: Option<String>,

    /// Image file to embed, or a short reference
    #[arg(long)]
    screenshot: Option<String>,
}

#[derive(Args, Debug)]
struct TransactionArgs {
    /// Amount moved, as a positive number
    #[arg(long)]
    amount: Decimal,

    #[arg(long, value_parser = parse_date)]
    date: Option<NaiveDate>,

    #[arg(long, value_parser = parse_time)]
    time: Option<NaiveTime>,

    #[arg(long)]
    notes: Option<String>,

    #[arg(long)]
    screenshot: Option<String>,
}

fn parse_kind(value: &str) -> Result<EntryKind, String> {
    value.parse().map_err(|e: trade_journal_core::JournalError| e.to_string())
}

fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value, trade_journal_core::DATE_FORMAT)
        .map_err(|e| format!("expected YYYY-MM-DD: {}", e))
}

fn parse_time(value: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(value, trade_journal_core::TIME_FORMAT)
        .map_err(|e| format!("expected HH:MM: {}", e))
}

fn now_to_minute() -> (NaiveDate, NaiveTime) {
    let now = Local::now().naive_local();
    let time = now.time().with_second(0).and_then(|t| t.with_nanosecond(0)).unwrap_or(now.time());
    (now.date(), time)
}

impl EntryArgs {
    /// Copies every given flag onto the draft
    async fn apply(self, draft: &mut EntryDraft) -> Result<()> {
        if let Some(kind) = self.direction {
            draft.kind = kind;
        }
        if let Some(market) = self.market {
            draft.market = market;
        }
        if let Some(date) = self.date {
            draft.date = date;
        }
        if let Some(time) = self.time {
            draft.time = time;
        }
        let prices = [
            (self.entry_price, &mut draft.entry_price),
            (self.stop_loss_price, &mut draft.stop_loss_price),
            (self.take_profit_price, &mut draft.take_profit_price),
            (self.exit_price, &mut draft.exit_price),
            (self.position_size, &mut draft.position_size),
            (self.profit_or_loss, &mut draft.profit_or_loss),
        ];
        for (value, field) in prices {
            if value.is_some() {
                *field = value;
            }
        }
        let texts = [
            (self.emotion, &mut draft.emotional_state),
            (self.session, &mut draft.session),
            (self.reason_entry, &mut draft.reason_for_entry),
            (self.reason_exit, &mut draft.reason_for_exit),
            (self.notes, &mut draft.notes),
        ];
        for (value, field) in texts {
            if value.is_some() {
                *field = value;
            }
        }
        if let Some(rating) = self.rating {
            draft.discipline_rating = rating;
        }
        if let Some(screenshot) = self.screenshot {
            let value = attachments::screenshot_from_arg(&screenshot)
                .await
                .with_context(|| format!("Failed to read screenshot {}", screenshot))?;
            draft.screenshot = Some(value);
        }
        Ok(())
    }
}

impl TransactionArgs {
    async fn into_draft(self, kind: EntryKind) -> Result<EntryDraft> {
        let (today, now) = now_to_minute();
        let amount = match kind {
            EntryKind::Withdrawal => -self.amount.abs(),
            _ => self.amount.abs(),
        };
        let mut draft = EntryDraft::account_transaction(
            kind,
            amount,
            self.date.unwrap_or(today),
            self.time.unwrap_or(now),
        );
        draft.notes = self.notes;
        if let Some(screenshot) = self.screenshot {
            draft.screenshot = Some(attachments::screenshot_from_arg(&screenshot).await?);
        }
        Ok(draft)
    }
}

/// Resolves a full id from a unique prefix
fn resolve_id<S: JournalStore>(app: &JournalApp<S>, prefix: &str) -> Result<String> {
    let matches: Vec<&str> = app
        .journal()
        .entries()
        .iter()
        .map(|e| e.id.as_str())
        .filter(|id| id.starts_with(prefix))
        .collect();
    match matches.as_slice() {
        [id] => Ok(id.to_string()),
        [] => bail!("No entry with id {}", prefix),
        _ => bail!("Id prefix {} matches {} entries", prefix, matches.len()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let mut config = JournalConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(account) = &cli.account {
        config.account_id = account.clone();
    }
    if let Some(data_dir) = &cli.data_dir {
        config.data_dir = data_dir.clone();
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    config.validate().context("Invalid configuration")?;

    let _guard = init_tracing(&config)?;
    info!("Starting trade journal v{}", trade_journal::VERSION);
    info!(
        account_id = %config.account_id,
        data_dir = %config.data_dir.display(),
        "Configuration loaded"
    );

    let store = FileStore::new(config.store_config())
        .await
        .context("Failed to open journal store")?;

    run(cli.command, store, &config).await
}

async fn run(command: Command, store: FileStore, config: &JournalConfig) -> Result<()> {
    let account_id = config.account_id.as_str();

    match command {
        Command::Init { name, balance } => {
            let name = name.unwrap_or_else(|| config.account_name.clone());
            let balance = balance.unwrap_or(config.initial_balance);
            if balance < Decimal::ZERO {
                bail!("Initial balance cannot be negative");
            }
            JournalApp::create(store, account_id, &name, balance).await?;
            println!("Created journal '{}' for account {} with balance {}", name, account_id, balance);
        }
        Command::Rrr { direction, entry, stop, target } => {
            println!("{}", risk_reward_ratio(direction, Some(entry), Some(stop), Some(target)));
        }
        Command::Accounts => {
            for account in store.accounts().await? {
                println!("{}", account);
            }
        }
        Command::Journal(command) => {
            let mut app =
                JournalApp::open_or_create(store, account_id, &config.account_name, config.initial_balance).await?;
            run_on_journal(command, &mut app).await?;
        }
    }

    Ok(())
}

async fn run_on_journal(command: JournalCommand, app: &mut JournalApp<FileStore>) -> Result<()> {
    match command {
        JournalCommand::Add(fields) => {
            let Some(kind) = fields.direction else {
                bail!("--direction is required");
            };
            if kind.is_account_transaction() {
                bail!("Use the deposit or withdraw commands for account transactions");
            }
            let (today, now) = now_to_minute();
            let mut draft = EntryDraft::new(kind, today, now);
            fields.apply(&mut draft).await?;
            let entry = app.submit(draft).await?;
            println!("Recorded {} {} ({})", entry.kind, entry.market, entry.id);
            println!("Risk/reward: {}", entry.risk_reward_ratio);
        }
        JournalCommand::Deposit(args) => {
            let entry = app.submit(args.into_draft(EntryKind::Deposit).await?).await?;
            println!("Deposit of {} recorded ({})", entry.balance_delta(), entry.id);
        }
        JournalCommand::Withdraw(args) => {
            let entry = app.submit(args.into_draft(EntryKind::Withdrawal).await?).await?;
            println!("Withdrawal of {} recorded ({})", entry.balance_delta().abs(), entry.id);
        }
        JournalCommand::Edit { id, fields } => {
            let id = resolve_id(app, &id)?;
            let mut draft = app.draft_for_edit(&id)?;
            fields.apply(&mut draft).await?;
            let entry = app.replace(&id, draft).await?;
            println!("Updated {} {} ({})", entry.kind, entry.market, entry.id);
        }
        JournalCommand::List => {
            print!("{}", table::render_table(app.journal()));
        }
        JournalCommand::Show { id } => {
            let id = resolve_id(app, &id)?;
            if let Some(entry) = app.journal().get(&id) {
                println!("{}", table::render_entry(entry));
            }
        }
        JournalCommand::Summary => {
            println!("{}", table::render_summary(&app.summary()?));
        }
        JournalCommand::Import { file, keep_balances } => {
            let bytes = tokio::fs::read(&file)
                .await
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let report = app.import_csv_bytes(&bytes, !keep_balances).await?;
            for warning in &report.warnings {
                eprintln!("warning: {}", warning);
            }
            println!(
                "Imported {} entries from {} ({} warnings)",
                report.imported,
                file.display(),
                report.warnings.len()
            );
        }
        JournalCommand::Export { file } => {
            let text = app.export_csv();
            tokio::fs::write(&file, text)
                .await
                .with_context(|| format!("Failed to write {}", file.display()))?;
            println!(
                "Exported {} entries to {}",
                app.journal().entries().len(),
                file.display()
            );
        }
        JournalCommand::Clear { yes } => {
            if !yes {
                bail!("Refusing to clear the journal without --yes");
            }
            let removed = app.clear().await?;
            warn!(removed, "Journal cleared from the command line");
            println!("Removed {} entries", removed);
        }
    }

    Ok(())
}

fn init_tracing(config: &JournalConfig) -> Result<WorkerGuard> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

    // Define log file appender (rolling daily)
    let file_appender = tracing_appender::rolling::daily(&config.log_dir, "trade-journal.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = || {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level))
    };

    // Human-readable on stderr so stdout stays clean for command output
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(filter());

    let file_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_writer(non_blocking)
        .with_current_span(true)
        .with_span_list(true)
        .with_filter(filter());

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .try_init()?;

    Ok(guard)
}
