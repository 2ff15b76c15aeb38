//! Text rendering of board state for the console.
//!
//! Formatting follows the usual dashboard conventions: prices as `$1,234.56`,
//! changes with an explicit sign (`+$2.15`), percentages as `+1.24%`.
use chrono::Local;
use log::{debug, error, info, warn};
use quoteboard_core::model::quote::round_to_cents;
use quoteboard_core::{BoardState, Quote, UpdateReason, ViewStatus, ViewUpdate};

fn group_thousands(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

fn format_dollars(value: f64) -> String {
    let text = format!("{:.2}", round_to_cents(value.abs()));
    let (whole, cents) = text.split_once('.').unwrap_or((text.as_str(), "00"));
    format!("${}.{}", group_thousands(whole), cents)
}

pub fn format_price(price: f64) -> String {
    format_dollars(price)
}

pub fn format_change(change: f64) -> String {
    let sign = if change >= 0.0 { '+' } else { '-' };
    format!("{}{}", sign, format_dollars(change))
}

pub fn format_percent(percent: f64) -> String {
    let sign = if percent >= 0.0 { "+" } else { "" };
    format!("{}{:.2}%", sign, percent)
}

pub fn format_volume(volume: Option<u64>) -> String {
    volume
        .map(|v| group_thousands(&v.to_string()))
        .unwrap_or_else(|| "-".to_string())
}

fn render_quote(quote: &Quote) -> String {
    format!(
        "{:<6} {:<24} {:>12} {:>10} {:>8} {:>14}",
        quote.symbol,
        quote.name,
        format_price(quote.price),
        format_change(quote.change),
        format_percent(quote.change_percent),
        format_volume(quote.volume),
    )
}

/// Renders the overview, the summary line and the table.
pub fn render_lines(state: &BoardState) -> Vec<String> {
    let view = &state.view;
    let stats = &view.stats;
    let mut lines = Vec::with_capacity(view.quotes.len() + 4);

    lines.push(format!(
        "Market: {} stocks | {} gainers | {} losers | avg {}",
        stats.total,
        stats.gainers,
        stats.losers,
        format_percent(stats.average_change_percent)
    ));
    lines.push(format!(
        "Showing {} of {} stocks (search: \"{}\", sort: {} {})",
        view.shown(),
        stats.total,
        view.params.search,
        view.params.sort.field,
        view.params.sort.direction
    ));
    if let Some(updated) = state.last_updated {
        lines.push(format!(
            "Last updated: {}",
            updated.with_timezone(&Local).format("%H:%M:%S")
        ));
    }
    lines.extend(view.quotes.iter().map(render_quote));
    lines
}

/// Logs one state change.
pub fn render_update(update: &ViewUpdate) {
    match update.reason {
        UpdateReason::RefreshStarted => debug!("Refreshing quotes..."),
        UpdateReason::RefreshFailed => match &update.state.status {
            ViewStatus::Unavailable { error: e } => {
                error!("Failed to fetch stock data, nothing to show: {}", e)
            }
            ViewStatus::Stale { error: e } => {
                warn!("Refresh failed, showing previous data: {}", e)
            }
            ViewStatus::Empty | ViewStatus::Ready => {}
        },
        UpdateReason::Closed => info!("Quote updates stopped"),
        UpdateReason::SnapshotPublished | UpdateReason::ParamsChanged => {
            for line in render_lines(&update.state) {
                info!("{}", line);
            }
        }
    }
}
