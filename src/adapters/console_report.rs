//! Plain-text leaderboard printed to stdout.

use std::io::{self, Write};

use crate::domain::backtest::BacktestConfig;
use crate::domain::error::ScannerError;
use crate::domain::metrics::InstrumentSummary;
use crate::domain::scanner::ScanOutcome;
use crate::domain::strategy::Ifr2Strategy;
use crate::ports::report_port::ReportPort;

pub const DEFAULT_CURRENCY: &str = "R$";

pub const NO_TRADES_MESSAGE: &str =
    "No trades occurred for any instrument with the given parameters.";

pub struct ConsoleReportAdapter {
    currency: String,
}

impl ConsoleReportAdapter {
    pub fn new(currency: impl Into<String>) -> Self {
        Self {
            currency: currency.into(),
        }
    }
}

impl Default for ConsoleReportAdapter {
    fn default() -> Self {
        Self::new(DEFAULT_CURRENCY)
    }
}

/// `R$ 1,234.56`; negatives keep the sign after the currency, `R$ -1,234.56`.
pub fn format_currency(value: f64, currency: &str) -> String {
    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let negative = value < 0.0 && fixed.bytes().any(|b| b.is_ascii_digit() && b != b'0');
    let sign = if negative { "-" } else { "" };
    format!("{} {}{}.{}", currency, sign, grouped, frac_part)
}

fn format_pct(value: f64) -> String {
    format!("{:.2}%", value)
}

fn format_row(rank: usize, summary: &InstrumentSummary, currency: &str) -> String {
    format!(
        "{:>4}  {:<10} {:>11} {:>16} {:>7} {:>13}",
        rank,
        summary.symbol,
        format_pct(summary.return_pct),
        format_currency(summary.total_pnl, currency),
        summary.trade_count,
        format_pct(summary.win_rate_pct),
    )
}

pub fn render_leaderboard(
    outcome: &ScanOutcome,
    config: &BacktestConfig,
    strategy: &Ifr2Strategy,
    currency: &str,
) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "IFR2 scan {} to {} | RSI({}) < {} | target: max high of {} bars | time stop: {} bars | {} shares\n",
        config.start_date,
        config.end_date,
        strategy.rsi_period,
        strategy.oversold_threshold,
        strategy.lookback_days,
        strategy.time_stop_days,
        strategy.shares_per_trade,
    ));
    out.push_str(&format!(
        "Initial capital: {}\n\n",
        format_currency(config.initial_capital, currency)
    ));

    if !outcome.has_trades() {
        out.push_str(NO_TRADES_MESSAGE);
        out.push('\n');
    } else {
        out.push_str(&format!("Top {} by return\n", outcome.leaderboard.len()));
        out.push_str(&format!(
            "{:>4}  {:<10} {:>11} {:>16} {:>7} {:>13}\n",
            "Rank", "Symbol", "Return (%)", "Total PnL", "Trades", "Win Rate (%)"
        ));
        for (idx, summary) in outcome.leaderboard.iter().enumerate() {
            out.push_str(&format_row(idx + 1, summary, currency));
            out.push('\n');
        }
    }

    out.push_str(&format!(
        "\nAnalysed: {} | With trades: {} | Skipped: {}\n",
        outcome.analyzed,
        outcome.traded,
        outcome.skipped.len()
    ));
    out
}

impl ReportPort for ConsoleReportAdapter {
    fn write(
        &self,
        outcome: &ScanOutcome,
        config: &BacktestConfig,
        strategy: &Ifr2Strategy,
    ) -> Result<(), ScannerError> {
        let rendered = render_leaderboard(outcome, config, strategy, &self.currency);
        let mut stdout = io::stdout().lock();
        stdout.write_all(rendered.as_bytes())?;
        stdout.flush()?;
        Ok(())
    }
}
