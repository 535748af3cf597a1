//! Per-instrument performance summary.

use crate::domain::position::{ExitReason, Trade};

#[derive(Debug, Clone, PartialEq)]
pub struct InstrumentSummary {
    pub symbol: String,
    pub total_pnl: f64,
    /// total_pnl / initial_capital * 100
    pub return_pct: f64,
    pub trade_count: usize,
    /// Share of trades with pnl > 0, in percent.
    pub win_rate_pct: f64,
    pub target_exits: usize,
    pub time_stop_exits: usize,
}

/// Summarizes one instrument's trades. Instruments without trades yield `None`
/// and are left off the leaderboard rather than shown as a zero return.
pub fn summarize(symbol: &str, trades: &[Trade], initial_capital: f64) -> Option<InstrumentSummary> {
    if trades.is_empty() {
        return None;
    }

    let trade_count = trades.len();
    let total_pnl: f64 = trades.iter().map(|t| t.pnl).sum();
    let wins = trades.iter().filter(|t| t.is_win()).count();
    let target_exits = trades
        .iter()
        .filter(|t| t.exit_reason == ExitReason::Target)
        .count();

    let return_pct = if initial_capital > 0.0 {
        total_pnl / initial_capital * 100.0
    } else {
        0.0
    };

    Some(InstrumentSummary {
        symbol: symbol.to_string(),
        total_pnl,
        return_pct,
        trade_count,
        win_rate_pct: win_rate_pct(wins, trade_count),
        target_exits,
        time_stop_exits: trade_count - target_exits,
    })
}

fn win_rate_pct(wins: usize, total: usize) -> f64 {
    if total > 0 {
        wins as f64 / total as f64 * 100.0
    } else {
        0.0
    }
}
