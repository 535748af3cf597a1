//! CSV directory data adapter.
//!
//! One file per symbol, `<base_path>/<SYMBOL>.csv`, with a header row naming
//! `date,open,high,low,close,volume` in any order and any letter case. Dates may
//! carry a time suffix (`2024-01-02 00:00:00-03:00`); only the day is used.

use crate::domain::error::ScannerError;
use crate::domain::ohlcv::{Bar, PriceSeries};
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::fs;
use std::path::PathBuf;
use tracing::debug;

const REQUIRED_COLUMNS: [&str; 6] = ["date", "open", "high", "low", "close", "volume"];

pub struct CsvAdapter {
    base_path: PathBuf,
}

struct ColumnMap {
    date: usize,
    open: usize,
    high: usize,
    low: usize,
    close: usize,
    volume: usize,
}

impl ColumnMap {
    fn from_headers(symbol: &str, headers: &csv::StringRecord) -> Result<Self, ScannerError> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
                .ok_or_else(|| ScannerError::unavailable(symbol, format!("missing {} column", name)))
        };
        let [date, open, high, low, close, volume] = REQUIRED_COLUMNS;
        Ok(Self {
            date: find(date)?,
            open: find(open)?,
            high: find(high)?,
            low: find(low)?,
            close: find(close)?,
            volume: find(volume)?,
        })
    }
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", symbol))
    }
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    let day = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

/// Missing, non-numeric or non-positive prices yield `None` and drop the row.
fn parse_price(raw: Option<&str>) -> Option<f64> {
    let value: f64 = raw?.trim().parse().ok()?;
    (value.is_finite() && value > 0.0).then_some(value)
}

fn parse_volume(raw: Option<&str>) -> u64 {
    let raw = raw.unwrap_or("").trim();
    raw.parse::<u64>()
        .ok()
        .or_else(|| {
            raw.parse::<f64>()
                .ok()
                .filter(|v| v.is_finite() && *v >= 0.0)
                .map(|v| v as u64)
        })
        .unwrap_or(0)
}

impl DataPort for CsvAdapter {
    fn fetch_ohlcv(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<PriceSeries, ScannerError> {
        let path = self.csv_path(symbol);
        let content = fs::read_to_string(&path).map_err(|e| {
            ScannerError::unavailable(symbol, format!("failed to read {}: {}", path.display(), e))
        })?;

        // Short rows are dropped below, not treated as a broken file.
        let mut rdr = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(content.as_bytes());
        let headers = rdr
            .headers()
            .map_err(|e| ScannerError::unavailable(symbol, format!("CSV header error: {}", e)))?
            .clone();
        let columns = ColumnMap::from_headers(symbol, &headers)?;

        let mut bars = Vec::new();
        let mut dropped = 0usize;

        for result in rdr.records() {
            let record = result
                .map_err(|e| ScannerError::unavailable(symbol, format!("CSV parse error: {}", e)))?;

            let Some(date) = record.get(columns.date).and_then(parse_date) else {
                dropped += 1;
                continue;
            };
            if date < start_date || date > end_date {
                continue;
            }

            let prices = (
                parse_price(record.get(columns.open)),
                parse_price(record.get(columns.high)),
                parse_price(record.get(columns.low)),
                parse_price(record.get(columns.close)),
            );
            let (Some(open), Some(high), Some(low), Some(close)) = prices else {
                dropped += 1;
                continue;
            };

            bars.push(Bar {
                date,
                open,
                high,
                low,
                close,
                volume: parse_volume(record.get(columns.volume)),
            });
        }

        if dropped > 0 {
            debug!(symbol, dropped, "dropped incomplete rows");
        }

        let series = PriceSeries::new(symbol, bars);
        if series.is_empty() {
            return Err(ScannerError::unavailable(symbol, "no bars in range"));
        }
        Ok(series)
    }

    fn list_symbols(&self) -> Result<Vec<String>, ScannerError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| ScannerError::Database {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let mut symbols = Vec::new();

        for entry in entries {
            let entry = entry.map_err(|e| ScannerError::Database {
                reason: format!("directory entry error: {}", e),
            })?;

            let name = entry.file_name();
            let name_str = name.to_string_lossy();

            if let Some(symbol) = name_str.strip_suffix(".csv") {
                symbols.push(symbol.to_string());
            }
        }

        symbols.sort();
        Ok(symbols)
    }

    fn get_data_range(
        &self,
        symbol: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, ScannerError> {
        match self.fetch_ohlcv(symbol, NaiveDate::MIN, NaiveDate::MAX) {
            Ok(series) => Ok(series
                .first_date()
                .zip(series.last_date())
                .map(|(first, last)| (first, last, series.len()))),
            Err(ScannerError::DataUnavailable { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }
}
