//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info};

use crate::adapters::console_report::{ConsoleReportAdapter, DEFAULT_CURRENCY};
use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::backtest::{BacktestConfig, DEFAULT_INITIAL_CAPITAL, DEFAULT_TOP_N};
use crate::domain::config_validation::{
    parse_date, validate_data_config, validate_scan_config, validate_strategy_config,
};
use crate::domain::error::ScannerError;
use crate::domain::scanner::{run_scan, ScanOutcome};
use crate::domain::strategy::Ifr2Strategy;
use crate::domain::universe::{default_universe, parse_symbols};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(
    name = "ifr2scan",
    about = "IFR2 (RSI-2) pullback backtest scanner",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Backtest every instrument in the universe and print the leaderboard
    Scan {
        #[arg(short, long)]
        config: PathBuf,
        /// Comma-separated symbols, overriding [scan] symbols
        #[arg(long)]
        symbols: Option<String>,
        /// Also export the leaderboard as CSV
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Run instruments in parallel
        #[arg(long)]
        parallel: bool,
        /// Validate and print the resolved run without fetching data
        #[arg(long)]
        dry_run: bool,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// List symbols available from the configured data source
    ListSymbols {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Show stored date range per symbol
    Info {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        symbol: Option<String>,
    },
}

/// Everything a scan needs, resolved from config plus CLI overrides.
#[derive(Debug, Clone)]
pub struct ScanPlan {
    pub config: BacktestConfig,
    pub strategy: Ifr2Strategy,
    pub symbols: Vec<String>,
    pub currency: String,
    pub output: Option<PathBuf>,
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Scan {
            config,
            symbols,
            output,
            parallel,
            dry_run,
        } => run_scan_command(&config, symbols.as_deref(), output, parallel, dry_run),
        Command::Validate { config } => run_validate(&config),
        Command::ListSymbols { config } => run_list_symbols(&config),
        Command::Info { config, symbol } => run_info(&config, symbol.as_deref()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            (&e).into()
        }
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ScannerError> {
    info!("Loading config from {}", path.display());
    FileConfigAdapter::from_file(path)
}

pub fn validate_config(config: &dyn ConfigPort) -> Result<(), ScannerError> {
    validate_scan_config(config)?;
    validate_strategy_config(config)?;
    validate_data_config(config)?;
    Ok(())
}

fn get_count(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: usize,
) -> Result<usize, ScannerError> {
    let raw = config.get_int(section, key, default as i64);
    usize::try_from(raw).map_err(|_| ScannerError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: format!("{} must not be negative", key),
    })
}

pub fn build_backtest_config(config: &dyn ConfigPort) -> Result<BacktestConfig, ScannerError> {
    let start_date = parse_date(config.get_string("scan", "start_date").as_deref(), "start_date")?;
    let end_date = parse_date(config.get_string("scan", "end_date").as_deref(), "end_date")?;

    Ok(BacktestConfig {
        start_date,
        end_date,
        initial_capital: config.get_double("scan", "initial_capital", DEFAULT_INITIAL_CAPITAL),
        top_n: get_count(config, "scan", "top_n", DEFAULT_TOP_N)?,
        parallel: config.get_bool("scan", "parallel", false),
    })
}

pub fn build_strategy(config: &dyn ConfigPort) -> Result<Ifr2Strategy, ScannerError> {
    let defaults = Ifr2Strategy::default();
    Ok(Ifr2Strategy {
        rsi_period: get_count(config, "strategy", "rsi_period", defaults.rsi_period)?,
        oversold_threshold: config.get_double(
            "strategy",
            "oversold_threshold",
            defaults.oversold_threshold,
        ),
        lookback_days: get_count(config, "strategy", "lookback_days", defaults.lookback_days)?,
        time_stop_days: get_count(config, "strategy", "time_stop_days", defaults.time_stop_days)?,
        shares_per_trade: get_count(
            config,
            "strategy",
            "shares_per_trade",
            defaults.shares_per_trade as usize,
        )? as u64,
    })
}

/// CLI override first, then `[scan] symbols`, then the built-in IBrA basket.
pub fn resolve_symbols(
    symbols_override: Option<&str>,
    config: &dyn ConfigPort,
) -> Result<Vec<String>, ScannerError> {
    let raw = symbols_override
        .map(str::to_string)
        .filter(|s| !s.trim().is_empty())
        .or_else(|| config.get_string("scan", "symbols"))
        .filter(|s| !s.trim().is_empty());

    match raw {
        Some(list) => parse_symbols(&list).map_err(|e| ScannerError::ConfigInvalid {
            section: "scan".into(),
            key: "symbols".into(),
            reason: e.to_string(),
        }),
        None => Ok(default_universe()),
    }
}

pub fn build_data_port(config: &dyn ConfigPort) -> Result<Box<dyn DataPort + Sync>, ScannerError> {
    validate_data_config(config)?;
    let source = config
        .get_string("data", "source")
        .unwrap_or_else(|| "csv".to_string())
        .trim()
        .to_lowercase();

    if source == "sqlite" {
        return build_sqlite_port(config);
    }

    let dir = config
        .get_string("data", "csv_dir")
        .ok_or_else(|| ScannerError::ConfigMissing {
            section: "data".into(),
            key: "csv_dir".into(),
        })?;
    info!("Reading prices from {}", dir);
    Ok(Box::new(CsvAdapter::new(PathBuf::from(dir))))
}

#[cfg(feature = "sqlite")]
fn build_sqlite_port(config: &dyn ConfigPort) -> Result<Box<dyn DataPort + Sync>, ScannerError> {
    use crate::adapters::sqlite_adapter::SqliteAdapter;

    let adapter = SqliteAdapter::from_config(config)?;
    adapter.initialize_schema()?;
    Ok(Box::new(adapter))
}

#[cfg(not(feature = "sqlite"))]
fn build_sqlite_port(_config: &dyn ConfigPort) -> Result<Box<dyn DataPort + Sync>, ScannerError> {
    Err(ScannerError::ConfigInvalid {
        section: "data".into(),
        key: "source".into(),
        reason: "built without the sqlite feature".into(),
    })
}

/// Resolves and validates a scan without touching the data source.
pub fn build_scan_plan(
    config: &dyn ConfigPort,
    symbols_override: Option<&str>,
    output_override: Option<PathBuf>,
    force_parallel: bool,
) -> Result<ScanPlan, ScannerError> {
    validate_config(config)?;

    let mut backtest_config = build_backtest_config(config)?;
    backtest_config.parallel |= force_parallel;
    backtest_config.validate()?;

    let strategy = build_strategy(config)?;
    strategy.validate()?;

    let symbols = resolve_symbols(symbols_override, config)?;
    let output = output_override.or_else(|| {
        config
            .get_string("report", "output")
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from)
    });
    let currency = config
        .get_string("report", "currency")
        .unwrap_or_else(|| DEFAULT_CURRENCY.to_string());

    Ok(ScanPlan {
        config: backtest_config,
        strategy,
        symbols,
        currency,
        output,
    })
}

pub fn describe_plan(plan: &ScanPlan) -> String {
    let c = &plan.config;
    let s = &plan.strategy;
    let mut out = String::new();
    out.push_str("Scan parameters:\n");
    out.push_str(&format!("  period:             {} to {}\n", c.start_date, c.end_date));
    out.push_str(&format!("  initial_capital:    {:.2}\n", c.initial_capital));
    out.push_str(&format!("  top_n:              {}\n", c.top_n));
    out.push_str(&format!("  parallel:           {}\n", c.parallel));
    out.push_str("Strategy:\n");
    out.push_str(&format!("  rsi_period:         {}\n", s.rsi_period));
    out.push_str(&format!("  oversold_threshold: {}\n", s.oversold_threshold));
    out.push_str(&format!("  lookback_days:      {}\n", s.lookback_days));
    out.push_str(&format!("  time_stop_days:     {}\n", s.time_stop_days));
    out.push_str(&format!("  shares_per_trade:   {}\n", s.shares_per_trade));
    out.push_str(&format!("Universe ({} symbols):\n", plan.symbols.len()));
    out.push_str(&format!("  {}\n", plan.symbols.join(", ")));
    if let Some(ref output) = plan.output {
        out.push_str(&format!("Output: {}\n", output.display()));
    }
    out
}

/// Runs the scan and hands the outcome to every reporter in order.
pub fn run_scan_pipeline(
    data_port: &(dyn DataPort + Sync),
    plan: &ScanPlan,
    reporters: &[&dyn ReportPort],
) -> Result<ScanOutcome, ScannerError> {
    let outcome = run_scan(data_port, &plan.symbols, &plan.config, &plan.strategy)?;
    for reporter in reporters {
        reporter.write(&outcome, &plan.config, &plan.strategy)?;
    }
    Ok(outcome)
}

fn run_scan_command(
    config_path: &Path,
    symbols_override: Option<&str>,
    output_override: Option<PathBuf>,
    force_parallel: bool,
    dry_run: bool,
) -> Result<(), ScannerError> {
    let config = load_config(config_path)?;
    let plan = build_scan_plan(&config, symbols_override, output_override, force_parallel)?;

    if dry_run {
        print!("{}", describe_plan(&plan));
        println!("\nDry run complete: configuration is valid");
        return Ok(());
    }

    let data_port = build_data_port(&config)?;

    let console = ConsoleReportAdapter::new(plan.currency.clone());
    let csv_report = plan.output.as_ref().map(CsvReportAdapter::new);
    let mut reporters: Vec<&dyn ReportPort> = vec![&console];
    if let Some(ref csv_report) = csv_report {
        reporters.push(csv_report);
    }

    run_scan_pipeline(&*data_port, &plan, &reporters)?;
    Ok(())
}

fn run_validate(config_path: &Path) -> Result<(), ScannerError> {
    let config = load_config(config_path)?;
    let plan = build_scan_plan(&config, None, None, false)?;
    println!(
        "Configuration is valid: {} symbols, {} to {}",
        plan.symbols.len(),
        plan.config.start_date,
        plan.config.end_date
    );
    Ok(())
}

fn run_list_symbols(config_path: &Path) -> Result<(), ScannerError> {
    let config = load_config(config_path)?;
    let data_port = build_data_port(&config)?;
    let symbols = data_port.list_symbols()?;

    if symbols.is_empty() {
        println!("No symbols available");
    }
    for symbol in &symbols {
        println!("{}", symbol);
    }
    Ok(())
}

pub fn format_data_range(symbol: &str, range: Option<(NaiveDate, NaiveDate, usize)>) -> String {
    match range {
        Some((first, last, count)) => {
            format!("{}: {} to {} ({} bars)", symbol, first, last, count)
        }
        None => format!("{}: no data", symbol),
    }
}

fn run_info(config_path: &Path, symbol: Option<&str>) -> Result<(), ScannerError> {
    let config = load_config(config_path)?;
    let data_port = build_data_port(&config)?;

    let symbols = match symbol {
        Some(s) => vec![s.trim().to_uppercase()],
        None => data_port.list_symbols()?,
    };

    for symbol in &symbols {
        let range = data_port.get_data_range(symbol)?;
        println!("{}", format_data_range(symbol, range));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(content: &str) -> FileConfigAdapter {
        FileConfigAdapter::from_string(content).unwrap()
    }

    const MINIMAL: &str = "[scan]\nstart_date = 2023-01-01\nend_date = 2023-12-31\n\
                           [data]\ncsv_dir = /tmp/prices\n";

    #[test]
    fn cli_parses_scan_flags() {
        let cli = Cli::try_parse_from([
            "ifr2scan",
            "scan",
            "--config",
            "scan.ini",
            "--symbols",
            "PETR4.SA,VALE3.SA",
            "--parallel",
            "--dry-run",
        ])
        .unwrap();

        match cli.command {
            Command::Scan {
                config,
                symbols,
                output,
                parallel,
                dry_run,
            } => {
                assert_eq!(config, PathBuf::from("scan.ini"));
                assert_eq!(symbols.as_deref(), Some("PETR4.SA,VALE3.SA"));
                assert!(output.is_none());
                assert!(parallel);
                assert!(dry_run);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn cli_requires_config() {
        assert!(Cli::try_parse_from(["ifr2scan", "validate"]).is_err());
    }

    #[test]
    fn backtest_config_defaults() {
        let c = build_backtest_config(&config(MINIMAL)).unwrap();
        assert_eq!(c.initial_capital, 50_000.0);
        assert_eq!(c.top_n, 20);
        assert!(!c.parallel);
    }

    #[test]
    fn strategy_reads_overrides() {
        let s = build_strategy(&config(
            "[strategy]\nrsi_period = 3\noversold_threshold = 10\nshares_per_trade = 200\n",
        ))
        .unwrap();
        assert_eq!(s.rsi_period, 3);
        assert_eq!(s.oversold_threshold, 10.0);
        assert_eq!(s.lookback_days, 3);
        assert_eq!(s.shares_per_trade, 200);
    }

    #[test]
    fn negative_count_is_config_invalid() {
        let err = build_strategy(&config("[strategy]\nlookback_days = -1\n")).unwrap_err();
        assert!(matches!(err, ScannerError::ConfigInvalid { key, .. } if key == "lookback_days"));
    }

    #[test]
    fn symbols_resolution_order() {
        let with_list = config("[scan]\nsymbols = petr4.sa, vale3.sa\n");
        assert_eq!(
            resolve_symbols(None, &with_list).unwrap(),
            vec!["PETR4.SA", "VALE3.SA"]
        );
        assert_eq!(
            resolve_symbols(Some("ITUB4.SA"), &with_list).unwrap(),
            vec!["ITUB4.SA"]
        );
        assert_eq!(resolve_symbols(None, &config("[scan]\n")).unwrap(), default_universe());
    }

    #[test]
    fn duplicate_symbols_are_config_invalid() {
        let err = resolve_symbols(Some("A,B,a"), &config("")).unwrap_err();
        assert!(matches!(err, ScannerError::ConfigInvalid { key, .. } if key == "symbols"));
    }

    #[test]
    fn plan_applies_overrides() {
        let plan = build_scan_plan(
            &config(MINIMAL),
            Some("PETR4.SA"),
            Some(PathBuf::from("out.csv")),
            true,
        )
        .unwrap();
        assert!(plan.config.parallel);
        assert_eq!(plan.symbols, vec!["PETR4.SA"]);
        assert_eq!(plan.output, Some(PathBuf::from("out.csv")));
        assert_eq!(plan.currency, "R$");

        let text = describe_plan(&plan);
        assert!(text.contains("2023-01-01 to 2023-12-31"));
        assert!(text.contains("PETR4.SA"));
    }

    #[test]
    fn plan_rejects_reversed_dates() {
        let err = build_scan_plan(
            &config("[scan]\nstart_date = 2024-01-01\nend_date = 2023-01-01\n[data]\ncsv_dir = x\n"),
            None,
            None,
            false,
        )
        .unwrap_err();
        assert!(matches!(err, ScannerError::InvalidParameters { .. }));
    }

    #[test]
    fn data_range_formatting() {
        let d = |day| NaiveDate::from_ymd_opt(2024, 1, day).unwrap();
        assert_eq!(
            format_data_range("PETR4.SA", Some((d(2), d(31), 21))),
            "PETR4.SA: 2024-01-02 to 2024-01-31 (21 bars)"
        );
        assert_eq!(format_data_range("X", None), "X: no data");
    }
}
