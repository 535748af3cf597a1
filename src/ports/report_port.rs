//! Leaderboard output port.

use crate::domain::backtest::BacktestConfig;
use crate::domain::error::ScannerError;
use crate::domain::scanner::ScanOutcome;
use crate::domain::strategy::Ifr2Strategy;

/// Port for publishing a finished scan.
pub trait ReportPort {
    fn write(
        &self,
        outcome: &ScanOutcome,
        config: &BacktestConfig,
        strategy: &Ifr2Strategy,
    ) -> Result<(), ScannerError>;
}
