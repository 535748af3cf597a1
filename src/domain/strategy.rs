//! IFR2 pullback strategy parameters.

use crate::domain::error::ScannerError;
use crate::domain::indicator::rsi::IFR2_PERIOD;

#[derive(Debug, Clone, PartialEq)]
pub struct Ifr2Strategy {
    /// RSI look-back; 2 for the classic IFR2 setup.
    pub rsi_period: usize,
    /// Enter when the previous bar's RSI is strictly below this level.
    pub oversold_threshold: f64,
    /// Number of bars before entry whose highest high becomes the target.
    pub lookback_days: usize,
    /// Bars held after which the position is closed at the open.
    pub time_stop_days: usize,
    pub shares_per_trade: u64,
}

impl Default for Ifr2Strategy {
    fn default() -> Self {
        Self {
            rsi_period: IFR2_PERIOD,
            oversold_threshold: 20.0,
            lookback_days: 3,
            time_stop_days: 7,
            shares_per_trade: 100,
        }
    }
}

impl Ifr2Strategy {
    pub fn is_oversold(&self, rsi: f64) -> bool {
        rsi < self.oversold_threshold
    }

    pub fn validate(&self) -> Result<(), ScannerError> {
        let reason = if self.rsi_period == 0 {
            "rsi_period must be at least 1"
        } else if !(self.oversold_threshold > 0.0 && self.oversold_threshold <= 100.0) {
            "oversold_threshold must be in (0, 100]"
        } else if self.lookback_days == 0 {
            "lookback_days must be at least 1"
        } else if self.time_stop_days == 0 {
            "time_stop_days must be at least 1"
        } else if self.shares_per_trade == 0 {
            "shares_per_trade must be at least 1"
        } else {
            return Ok(());
        };
        Err(ScannerError::InvalidParameters {
            reason: reason.to_string(),
        })
    }
}
