//! Plain-text rendering of journals for the terminal.

use rust_decimal::Decimal;
use trade_journal_core::{Entry, Journal, JournalSummary, TIME_FORMAT};

use crate::attachments;

const HEADERS: [&str; 16] = [
    "No", "Date", "Time", "Direction", "Market", "Entry", "Stop", "Target", "Exit", "Size", "R:R", "P/L",
    "Balance", "Rating", "Screenshot", "Id",
];

fn amount(value: Option<Decimal>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn row(index: usize, entry: &Entry) -> Vec<String> {
    // Trade-only columns stay blank for other kinds
    let trade = |value: Option<Decimal>| if entry.kind.is_trade() { amount(value) } else { String::new() };
    let exit = if entry.is_open() {
        "open".to_string()
    } else {
        trade(entry.exit_price)
    };
    let rating = if entry.kind.is_account_transaction() {
        String::new()
    } else {
        entry.discipline_rating.to_string()
    };

    vec![
        (index + 1).to_string(),
        entry.date.to_string(),
        entry.time.format(TIME_FORMAT).to_string(),
        entry.kind.to_string(),
        entry.market.clone(),
        trade(entry.entry_price),
        trade(entry.stop_loss_price),
        trade(entry.take_profit_price),
        exit,
        trade(entry.position_size),
        if entry.kind.is_trade() { entry.risk_reward_ratio.to_string() } else { String::new() },
        amount(entry.profit_or_loss),
        entry.balance_at_entry.to_string(),
        rating,
        entry.screenshot.as_deref().map(attachments::describe).unwrap_or_default(),
        entry.id.chars().take(8).collect(),
    ]
}

/// Renders every entry as a fixed-width table
pub fn render_table(journal: &Journal) -> String {
    let data = journal.data();
    let rows: Vec<Vec<String>> = data.entries.iter().enumerate().map(|(i, e)| row(i, e)).collect();

    let mut widths: Vec<usize> = HEADERS.iter().map(|h| h.len()).collect();
    for cells in &rows {
        for (width, cell) in widths.iter_mut().zip(cells) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let format_line = |cells: &[String]| {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut out = format!(
        "{} (initial balance {}, current balance {})\n",
        data.account_name,
        data.initial_balance,
        journal.current_balance()
    );
    let header: Vec<String> = HEADERS.iter().map(|h| h.to_string()).collect();
    out.push_str(&format_line(&header));
    out.push('\n');
    out.push_str(&"-".repeat(widths.iter().sum::<usize>() + 2 * (widths.len() - 1)));
    out.push('\n');

    if rows.is_empty() {
        out.push_str("(no entries)\n");
    }
    for cells in &rows {
        out.push_str(&format_line(cells));
        out.push('\n');
    }
    out
}

/// Renders the headline figures of a journal
pub fn render_summary(summary: &JournalSummary) -> String {
    let win_rate = summary
        .win_rate
        .map(|r| format!("{}%", r))
        .unwrap_or_else(|| "n/a".to_string());

    [
        format!("Initial balance:   {}", summary.initial_balance),
        format!("Current balance:   {}", summary.current_balance),
        format!("Realized P/L:      {}", summary.realized_pnl),
        format!("Deposits:          {}", summary.total_deposits),
        format!("Withdrawals:       {}", summary.total_withdrawals),
        format!("Entries:           {}", summary.total_entries),
        format!(
            "Trades:            {} ({} open, {} won, {} lost)",
            summary.trades, summary.open_positions, summary.wins, summary.losses
        ),
        format!("No-trade analyses: {}", summary.no_trades),
        format!("Win rate:          {}", win_rate),
    ]
    .join("\n")
}

/// Renders every field of one entry
pub fn render_entry(entry: &Entry) -> String {
    let optional = |value: &Option<String>| value.clone().unwrap_or_default();
    let screenshot = entry.screenshot.as_deref().map(attachments::describe).unwrap_or_default();

    [
        ("Id", entry.id.clone()),
        ("Date", entry.date.to_string()),
        ("Time", entry.time.format(TIME_FORMAT).to_string()),
        ("Direction", entry.kind.to_string()),
        ("Market", entry.market.clone()),
        ("Entry price", amount(entry.entry_price)),
        ("Stop loss", amount(entry.stop_loss_price)),
        ("Take profit", amount(entry.take_profit_price)),
        ("Exit price", amount(entry.exit_price)),
        ("Position size", amount(entry.position_size)),
        ("Risk/reward", entry.risk_reward_ratio.to_string()),
        ("P/L", amount(entry.profit_or_loss)),
        ("Balance at entry", entry.balance_at_entry.to_string()),
        ("Emotional state", optional(&entry.emotional_state)),
        ("Session", optional(&entry.session)),
        ("Reason for entry", optional(&entry.reason_for_entry)),
        ("Reason for exit", optional(&entry.reason_for_exit)),
        ("Discipline", entry.discipline_rating.to_string()),
        ("Notes", optional(&entry.notes)),
        ("Screenshot", screenshot),
    ]
    .iter()
    .map(|(label, value)| format!("{:<17} {}", format!("{}:", label), value))
    .collect::<Vec<_>>()
    .join("\n")
}
