//! Leaderboard export as CSV.

use std::path::PathBuf;

use crate::domain::backtest::BacktestConfig;
use crate::domain::error::ScannerError;
use crate::domain::scanner::ScanOutcome;
use crate::domain::strategy::Ifr2Strategy;
use crate::ports::report_port::ReportPort;

const HEADER: [&str; 8] = [
    "rank",
    "symbol",
    "return_pct",
    "total_pnl",
    "trades",
    "win_rate_pct",
    "target_exits",
    "time_stop_exits",
];

pub struct CsvReportAdapter {
    path: PathBuf,
}

impl CsvReportAdapter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

fn report_err(e: impl std::fmt::Display) -> ScannerError {
    ScannerError::Report {
        reason: e.to_string(),
    }
}

impl ReportPort for CsvReportAdapter {
    /// Raw numbers, no currency or percent formatting. An empty leaderboard
    /// still produces the header row.
    fn write(
        &self,
        outcome: &ScanOutcome,
        _config: &BacktestConfig,
        _strategy: &Ifr2Strategy,
    ) -> Result<(), ScannerError> {
        let mut wtr = csv::Writer::from_path(&self.path).map_err(report_err)?;
        wtr.write_record(HEADER).map_err(report_err)?;

        for (idx, summary) in outcome.leaderboard.iter().enumerate() {
            wtr.write_record([
                (idx + 1).to_string(),
                summary.symbol.clone(),
                format!("{:.4}", summary.return_pct),
                format!("{:.2}", summary.total_pnl),
                summary.trade_count.to_string(),
                format!("{:.2}", summary.win_rate_pct),
                summary.target_exits.to_string(),
                summary.time_stop_exits.to_string(),
            ])
            .map_err(report_err)?;
        }

        wtr.flush()?;
        tracing::info!(path = %self.path.display(), rows = outcome.leaderboard.len(), "leaderboard exported");
        Ok(())
    }
}
