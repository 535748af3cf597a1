//! RSI (Relative Strength Index) over a simple moving average of gains and losses.
//!
//! For bar `i` the price change is `close[i] - close[i-1]`. Gains and losses are
//! averaged over the trailing `period` changes ending at `i`, so the first defined
//! reading is at index `period`.
//!
//! Formula: RSI = 100 - (100 / (1 + avg_gain / avg_loss))
//! - avg_loss == 0 and avg_gain > 0: RSI = 100
//! - any other non-numeric result (0 / 0): RSI = 50

use crate::domain::indicator::{IndicatorPoint, IndicatorType, OscillatorSeries};
use crate::domain::ohlcv::PriceSeries;

/// Period used by the IFR2 strategy.
pub const IFR2_PERIOD: usize = 2;

const NEUTRAL_RSI: f64 = 50.0;

pub fn calculate_rsi(series: &PriceSeries, period: usize) -> OscillatorSeries {
    let bars = series.bars();

    let mut gains = Vec::with_capacity(bars.len());
    let mut losses = Vec::with_capacity(bars.len());
    for pair in bars.windows(2) {
        let change = pair[1].close - pair[0].close;
        gains.push(change.max(0.0));
        losses.push((-change).max(0.0));
    }

    let values = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| {
            let value = if period == 0 || i < period {
                None
            } else {
                // change for bar i lives at i - 1
                let window = i - period..i;
                let avg_gain = gains[window.clone()].iter().sum::<f64>() / period as f64;
                let avg_loss = losses[window].iter().sum::<f64>() / period as f64;
                Some(rsi_from_averages(avg_gain, avg_loss))
            };
            IndicatorPoint {
                date: bar.date,
                value,
            }
        })
        .collect();

    OscillatorSeries {
        indicator_type: IndicatorType::Rsi(period),
        values,
    }
}

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 && avg_gain > 0.0 {
        return 100.0;
    }
    let rsi = 100.0 - (100.0 / (1.0 + avg_gain / avg_loss));
    if rsi.is_nan() { NEUTRAL_RSI } else { rsi }
}
