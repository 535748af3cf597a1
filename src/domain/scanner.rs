//! Batch scan over a universe of instruments.
//!
//! Each instrument runs fetch -> RSI -> simulate -> summarize on its own. Any
//! error or panic inside that pipeline is contained at the instrument boundary
//! and recorded as a skipped symbol; the remaining instruments still run.
//! With `parallel` set the pipelines run on the rayon pool; results are
//! collected in input order before ranking, so the leaderboard is the same
//! either way.

use std::any::Any;
use std::cell::Cell;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Once;

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::domain::backtest::{simulate, BacktestConfig};
use crate::domain::error::ScannerError;
use crate::domain::indicator::rsi::calculate_rsi;
use crate::domain::leaderboard::rank;
use crate::domain::metrics::{summarize, InstrumentSummary};
use crate::domain::position::Trade;
use crate::domain::strategy::Ifr2Strategy;
use crate::ports::data_port::DataPort;

#[derive(Debug, Clone)]
pub struct InstrumentReport {
    pub symbol: String,
    pub bars: usize,
    pub trades: Vec<Trade>,
    pub summary: Option<InstrumentSummary>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    NoData { reason: String },
    FetchFailed { reason: String },
    Panicked { message: String },
}

#[derive(Debug, Clone)]
pub struct SkippedSymbol {
    pub symbol: String,
    pub reason: SkipReason,
}

#[derive(Debug, Clone)]
pub struct ScanOutcome {
    /// Ranked and truncated to `top_n`.
    pub leaderboard: Vec<InstrumentSummary>,
    /// Instruments whose data was fetched and simulated.
    pub analyzed: usize,
    /// Instruments with at least one closed trade.
    pub traded: usize,
    pub skipped: Vec<SkippedSymbol>,
}

impl ScanOutcome {
    pub fn has_trades(&self) -> bool {
        !self.leaderboard.is_empty()
    }
}

/// Full pipeline for one symbol.
///
/// One extra calendar day is requested past `end_date` so providers with an
/// exclusive upper bound still return the final bar; anything beyond
/// `end_date` is trimmed afterwards.
pub fn analyze_instrument(
    data_port: &dyn DataPort,
    symbol: &str,
    config: &BacktestConfig,
    strategy: &Ifr2Strategy,
) -> Result<InstrumentReport, ScannerError> {
    let fetch_end = config.end_date.succ_opt().unwrap_or(config.end_date);
    let mut series = data_port.fetch_ohlcv(symbol, config.start_date, fetch_end)?;
    series.truncate_after(config.end_date);

    if series.is_empty() {
        return Err(ScannerError::unavailable(symbol, "no bars in the requested range"));
    }

    let rsi = calculate_rsi(&series, strategy.rsi_period);
    let trades = simulate(&series, &rsi, strategy);
    let summary = summarize(symbol, &trades, config.initial_capital);

    debug!(
        symbol,
        bars = series.len(),
        trades = trades.len(),
        "instrument analysed"
    );

    Ok(InstrumentReport {
        symbol: symbol.to_string(),
        bars: series.len(),
        trades,
        summary,
    })
}

thread_local! {
    static INSIDE_INSTRUMENT: Cell<bool> = const { Cell::new(false) };
}

static QUIET_HOOK: Once = Once::new();

/// Chains a hook that stays quiet for panics raised inside an instrument
/// pipeline; those are reported through the skip list instead. Panics anywhere
/// else still reach the previous hook.
fn install_quiet_hook() {
    QUIET_HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if !INSIDE_INSTRUMENT.with(Cell::get) {
                previous(info);
            }
        }));
    });
}

fn contain<T>(f: impl FnOnce() -> T) -> Result<T, Box<dyn Any + Send>> {
    install_quiet_hook();
    let was_inside = INSIDE_INSTRUMENT.with(|flag| flag.replace(true));
    let result = panic::catch_unwind(AssertUnwindSafe(f));
    INSIDE_INSTRUMENT.with(|flag| flag.set(was_inside));
    result
}

fn analyze_guarded(
    data_port: &dyn DataPort,
    symbol: &str,
    config: &BacktestConfig,
    strategy: &Ifr2Strategy,
) -> Result<InstrumentReport, SkipReason> {
    let outcome = contain(|| analyze_instrument(data_port, symbol, config, strategy));

    match outcome {
        Ok(Ok(report)) => Ok(report),
        Ok(Err(ScannerError::DataUnavailable { reason, .. })) => Err(SkipReason::NoData { reason }),
        Ok(Err(e)) => Err(SkipReason::FetchFailed {
            reason: e.to_string(),
        }),
        Err(payload) => Err(SkipReason::Panicked {
            message: panic_message(payload.as_ref()),
        }),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Scans `symbols` and returns the ranked leaderboard.
///
/// Parameters are validated before the first fetch; an invalid date range or
/// strategy rejects the whole run with [`ScannerError::InvalidParameters`].
pub fn run_scan(
    data_port: &(dyn DataPort + Sync),
    symbols: &[String],
    config: &BacktestConfig,
    strategy: &Ifr2Strategy,
) -> Result<ScanOutcome, ScannerError> {
    config.validate()?;
    strategy.validate()?;

    let total = symbols.len();
    info!(
        instruments = total,
        start = %config.start_date,
        end = %config.end_date,
        parallel = config.parallel,
        "starting scan"
    );

    let analyze = |(idx, symbol): (usize, &String)| {
        info!("Analysing {}/{}: {}", idx + 1, total, symbol);
        let result = analyze_guarded(data_port, symbol, config, strategy);
        (symbol.clone(), result)
    };

    let results: Vec<(String, Result<InstrumentReport, SkipReason>)> = if config.parallel {
        symbols.par_iter().enumerate().map(&analyze).collect()
    } else {
        symbols.iter().enumerate().map(&analyze).collect()
    };

    let mut summaries = Vec::new();
    let mut skipped = Vec::new();
    let mut analyzed = 0usize;

    for (symbol, result) in results {
        match result {
            Ok(report) => {
                analyzed += 1;
                match report.summary {
                    Some(summary) => summaries.push(summary),
                    None => debug!(symbol = %report.symbol, "no trades"),
                }
            }
            Err(reason) => {
                warn!(%symbol, ?reason, "skipping instrument");
                skipped.push(SkippedSymbol { symbol, reason });
            }
        }
    }

    let traded = summaries.len();
    let leaderboard = rank(summaries, config.top_n);

    info!(
        analyzed,
        traded,
        skipped = skipped.len(),
        ranked = leaderboard.len(),
        "scan complete"
    );

    Ok(ScanOutcome {
        leaderboard,
        analyzed,
        traded,
        skipped,
    })
}
