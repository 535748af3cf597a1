//! Open position state and closed trades.

use chrono::NaiveDate;
use std::fmt;

/// Long position held by the simulator between entry and exit.
#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub entry_date: NaiveDate,
    pub entry_price: f64,
    pub target_price: f64,
    pub bars_held: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    Target,
    TimeStop,
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitReason::Target => write!(f, "Target"),
            ExitReason::TimeStop => write!(f, "TimeStop"),
        }
    }
}

impl Position {
    pub fn open(entry_date: NaiveDate, entry_price: f64, target_price: f64) -> Self {
        Self {
            entry_date,
            entry_price,
            target_price,
            bars_held: 0,
        }
    }

    /// Exit decision for a bar with the given `open` and `high`, after `bars_held`
    /// has been advanced for that bar. The target wins when both conditions hold.
    pub fn exit_signal(&self, open: f64, high: f64, time_stop_days: usize) -> Option<(f64, ExitReason)> {
        if high >= self.target_price {
            Some((self.target_price, ExitReason::Target))
        } else if self.bars_held >= time_stop_days {
            Some((open, ExitReason::TimeStop))
        } else {
            None
        }
    }

    pub fn close(
        self,
        exit_date: NaiveDate,
        exit_price: f64,
        exit_reason: ExitReason,
        shares: u64,
    ) -> Trade {
        Trade {
            entry_date: self.entry_date,
            entry_price: self.entry_price,
            exit_date,
            exit_price,
            exit_reason,
            pnl: (exit_price - self.entry_price) * shares as f64,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Trade {
    pub entry_date: NaiveDate,
    pub entry_price: f64,
    pub exit_date: NaiveDate,
    pub exit_price: f64,
    pub exit_reason: ExitReason,
    pub pnl: f64,
}

impl Trade {
    pub fn is_win(&self) -> bool {
        self.pnl > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    fn sample_position() -> Position {
        Position {
            entry_date: date(4),
            entry_price: 20.0,
            target_price: 22.0,
            bars_held: 1,
        }
    }

    #[test]
    fn open_resets_bars_held() {
        let pos = Position::open(date(4), 20.0, 22.0);
        assert_eq!(pos.bars_held, 0);
        assert_eq!(pos.target_price, 22.0);
    }

    #[test]
    fn exit_on_target_uses_target_price() {
        let pos = sample_position();
        assert_eq!(
            pos.exit_signal(21.0, 22.5, 5),
            Some((22.0, ExitReason::Target))
        );
    }

    #[test]
    fn exit_on_time_stop_uses_open() {
        let mut pos = sample_position();
        pos.bars_held = 5;
        assert_eq!(
            pos.exit_signal(19.5, 21.0, 5),
            Some((19.5, ExitReason::TimeStop))
        );
    }

    #[test]
    fn target_takes_precedence_over_time_stop() {
        let mut pos = sample_position();
        pos.bars_held = 5;
        assert_eq!(
            pos.exit_signal(19.5, 22.0, 5),
            Some((22.0, ExitReason::Target))
        );
    }

    #[test]
    fn no_exit_while_below_target_and_inside_time_stop() {
        let pos = sample_position();
        assert_eq!(pos.exit_signal(20.5, 21.9, 5), None);
    }

    #[test]
    fn close_computes_pnl_per_share_count() {
        let trade = sample_position().close(date(6), 22.0, ExitReason::Target, 100);
        assert!((trade.pnl - 200.0).abs() < 1e-9);
        assert!(trade.is_win());
        assert_eq!(trade.entry_date, date(4));
        assert_eq!(trade.exit_date, date(6));
    }

    #[test]
    fn losing_trade_is_not_a_win() {
        let trade = sample_position().close(date(9), 19.0, ExitReason::TimeStop, 10);
        assert!((trade.pnl + 10.0).abs() < 1e-9);
        assert!(!trade.is_win());
        assert_eq!(trade.exit_reason.to_string(), "TimeStop");
    }
}
