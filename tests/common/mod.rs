#![allow(dead_code)]

use chrono::NaiveDate;
use ifr2scan::domain::backtest::BacktestConfig;
use ifr2scan::domain::error::ScannerError;
pub use ifr2scan::domain::ohlcv::{Bar, PriceSeries};
use ifr2scan::domain::strategy::Ifr2Strategy;
use ifr2scan::ports::data_port::DataPort;
use std::collections::HashMap;
use std::sync::Mutex;

/// In-memory provider. Honours the inclusive date range like a real adapter
/// and records every request so tests can assert on fetch behaviour.
pub struct MockDataPort {
    pub data: HashMap<String, Vec<Bar>>,
    pub errors: HashMap<String, String>,
    pub requests: Mutex<Vec<(String, NaiveDate, NaiveDate)>>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<Bar>) -> Self {
        self.data.insert(symbol.to_string(), bars);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

impl DataPort for MockDataPort {
    fn fetch_ohlcv(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<PriceSeries, ScannerError> {
        self.requests
            .lock()
            .unwrap()
            .push((symbol.to_string(), start_date, end_date));

        if let Some(reason) = self.errors.get(symbol) {
            return Err(ScannerError::Database {
                reason: reason.clone(),
            });
        }
        let bars: Vec<Bar> = self
            .data
            .get(symbol)
            .into_iter()
            .flatten()
            .filter(|b| b.date >= start_date && b.date <= end_date)
            .cloned()
            .collect();
        if bars.is_empty() {
            return Err(ScannerError::unavailable(symbol, "empty result"));
        }
        Ok(PriceSeries::new(symbol, bars))
    }

    fn list_symbols(&self) -> Result<Vec<String>, ScannerError> {
        let mut symbols: Vec<String> = self.data.keys().cloned().collect();
        symbols.sort();
        Ok(symbols)
    }

    fn get_data_range(
        &self,
        symbol: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, ScannerError> {
        match self.data.get(symbol) {
            Some(bars) if !bars.is_empty() => {
                let min = bars.iter().map(|b| b.date).min().unwrap();
                let max = bars.iter().map(|b| b.date).max().unwrap();
                Ok(Some((min, max, bars.len())))
            }
            _ => Ok(None),
        }
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn make_bar(date_str: &str, open: f64, high: f64, low: f64, close: f64) -> Bar {
    Bar {
        date: NaiveDate::parse_from_str(date_str, "%Y-%m-%d").unwrap(),
        open,
        high,
        low,
        close,
        volume: 1000,
    }
}

/// Consecutive calendar days from `start`; open = close, high = close + 0.5,
/// low = close - 0.5.
pub fn bars_from_closes(start: NaiveDate, closes: &[f64]) -> Vec<Bar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| Bar {
            date: start + chrono::Duration::days(i as i64),
            open: close,
            high: close + 0.5,
            low: close - 0.5,
            close,
            volume: 1000,
        })
        .collect()
}

/// Two down closes then a rally through the prior highs. With the default
/// strategy: entry on bar 3 at 9.0, target 10.5 hit on bar 4, pnl +150.
pub fn one_winner(start: NaiveDate) -> Vec<Bar> {
    bars_from_closes(start, &[10.0, 9.0, 8.0, 9.0, 12.0, 12.5])
}

pub fn sample_config() -> BacktestConfig {
    BacktestConfig {
        start_date: date(2024, 1, 1),
        end_date: date(2024, 12, 31),
        initial_capital: 50_000.0,
        top_n: 20,
        parallel: false,
    }
}

pub fn sample_strategy() -> Ifr2Strategy {
    Ifr2Strategy::default()
}
