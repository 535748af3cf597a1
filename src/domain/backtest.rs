//! Run parameters and the single-position IFR2 trade simulator.
//!
//! The simulator walks bars from index 1. While long it advances the holding
//! counter and checks the exits (target first, then time stop); while flat,
//! including right after an exit on the same bar, it enters at the open when the
//! previous bar's RSI is defined and oversold. Target price is the highest high of
//! up to `lookback_days` bars strictly before the entry bar.
//!
//! A position still open on the last bar is discarded, not marked to market.

use chrono::NaiveDate;
use tracing::debug;

use crate::domain::error::ScannerError;
use crate::domain::indicator::OscillatorSeries;
use crate::domain::ohlcv::PriceSeries;
use crate::domain::position::{Position, Trade};
use crate::domain::strategy::Ifr2Strategy;

pub const DEFAULT_INITIAL_CAPITAL: f64 = 50_000.0;
pub const DEFAULT_TOP_N: usize = 20;

#[derive(Debug, Clone)]
pub struct BacktestConfig {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub initial_capital: f64,
    pub top_n: usize,
    pub parallel: bool,
}

impl BacktestConfig {
    /// Rejects a run before anything is fetched.
    pub fn validate(&self) -> Result<(), ScannerError> {
        if self.start_date >= self.end_date {
            return Err(ScannerError::InvalidParameters {
                reason: format!(
                    "start_date ({}) must be before end_date ({})",
                    self.start_date, self.end_date
                ),
            });
        }
        if !(self.initial_capital > 0.0) {
            return Err(ScannerError::InvalidParameters {
                reason: "initial_capital must be positive".into(),
            });
        }
        if self.top_n == 0 {
            return Err(ScannerError::InvalidParameters {
                reason: "top_n must be at least 1".into(),
            });
        }
        Ok(())
    }
}

pub fn simulate(
    series: &PriceSeries,
    oscillator: &OscillatorSeries,
    strategy: &Ifr2Strategy,
) -> Vec<Trade> {
    let bars = series.bars();
    let mut trades = Vec::new();
    let mut position: Option<Position> = None;

    for i in 1..bars.len() {
        let bar = &bars[i];

        if let Some(mut pos) = position.take() {
            pos.bars_held += 1;
            match pos.exit_signal(bar.open, bar.high, strategy.time_stop_days) {
                Some((exit_price, reason)) => {
                    debug!(
                        symbol = series.symbol(),
                        date = %bar.date,
                        %reason,
                        exit_price,
                        "exit"
                    );
                    trades.push(pos.close(bar.date, exit_price, reason, strategy.shares_per_trade));
                }
                None => position = Some(pos),
            }
        }

        if position.is_some() {
            continue;
        }

        // previous bar's reading, never the entry bar's own
        let signal = oscillator
            .value_at(i - 1)
            .is_some_and(|rsi| strategy.is_oversold(rsi));
        if signal {
            let window_start = i.saturating_sub(strategy.lookback_days.max(1));
            let target_price = bars[window_start..i]
                .iter()
                .map(|b| b.high)
                .fold(f64::NEG_INFINITY, f64::max);
            debug!(
                symbol = series.symbol(),
                date = %bar.date,
                entry_price = bar.open,
                target_price,
                "entry"
            );
            position = Some(Position::open(bar.date, bar.open, target_price));
        }
    }

    trades
}
