//! SQLite data adapter.
//!
//! Daily bars live in a single `ohlcv` table keyed by `(symbol, date)`, with
//! dates stored as `YYYY-MM-DD` text so range filters compare lexically.

use crate::domain::error::ScannerError;
use crate::domain::ohlcv::{Bar, PriceSeries};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;

pub struct SqliteAdapter {
    pool: Pool<SqliteConnectionManager>,
}

fn db_err(e: impl std::fmt::Display) -> ScannerError {
    ScannerError::Database {
        reason: e.to_string(),
    }
}

fn parse_stored_date(raw: &str) -> Result<NaiveDate, ScannerError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(db_err)
}

impl SqliteAdapter {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, ScannerError> {
        let db_path =
            config
                .get_string("sqlite", "path")
                .ok_or_else(|| ScannerError::ConfigMissing {
                    section: "sqlite".into(),
                    key: "path".into(),
                })?;

        let pool_size = config.get_int("sqlite", "pool_size", 4).max(1) as u32;

        let manager = SqliteConnectionManager::file(&db_path);
        let pool = Pool::builder()
            .max_size(pool_size)
            .build(manager)
            .map_err(db_err)?;

        Ok(Self { pool })
    }

    pub fn in_memory() -> Result<Self, ScannerError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder().max_size(1).build(manager).map_err(db_err)?;

        Ok(Self { pool })
    }

    fn conn(&self) -> Result<PooledConnection<SqliteConnectionManager>, ScannerError> {
        self.pool.get().map_err(db_err)
    }

    pub fn initialize_schema(&self) -> Result<(), ScannerError> {
        self.conn()?
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS ohlcv (
                    symbol TEXT NOT NULL,
                    date TEXT NOT NULL,
                    open REAL,
                    high REAL,
                    low REAL,
                    close REAL,
                    volume INTEGER NOT NULL DEFAULT 0,
                    PRIMARY KEY (symbol, date)
                );
                CREATE INDEX IF NOT EXISTS idx_ohlcv_date ON ohlcv(date);",
            )
            .map_err(db_err)
    }

    pub fn insert_bars(&self, symbol: &str, bars: &[Bar]) -> Result<(), ScannerError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(db_err)?;

        for bar in bars {
            tx.execute(
                "INSERT OR REPLACE INTO ohlcv (symbol, date, open, high, low, close, volume)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    symbol,
                    bar.date.format("%Y-%m-%d").to_string(),
                    bar.open,
                    bar.high,
                    bar.low,
                    bar.close,
                    bar.volume as i64
                ],
            )
            .map_err(db_err)?;
        }

        tx.commit().map_err(db_err)
    }
}

impl DataPort for SqliteAdapter {
    fn fetch_ohlcv(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<PriceSeries, ScannerError> {
        let conn = self.conn()?;

        let start_str = start_date.format("%Y-%m-%d").to_string();
        let end_str = end_date.format("%Y-%m-%d").to_string();

        // NULL prices are filtered here so incomplete rows never reach the simulator.
        let query = "SELECT date, open, high, low, close, volume
                     FROM ohlcv
                     WHERE symbol = ?1 AND date >= ?2 AND date <= ?3
                       AND open IS NOT NULL AND high IS NOT NULL
                       AND low IS NOT NULL AND close IS NOT NULL
                     ORDER BY date ASC";

        let mut stmt = conn.prepare(query).map_err(db_err)?;

        let rows = stmt
            .query_map(params![symbol, start_str, end_str], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, f64>(1)?,
                    row.get::<_, f64>(2)?,
                    row.get::<_, f64>(3)?,
                    row.get::<_, f64>(4)?,
                    row.get::<_, i64>(5)?,
                ))
            })
            .map_err(db_err)?;

        let mut bars = Vec::new();
        for row in rows {
            let (date_str, open, high, low, close, volume) = row.map_err(db_err)?;
            bars.push(Bar {
                date: parse_stored_date(&date_str)?,
                open,
                high,
                low,
                close,
                volume: volume.max(0) as u64,
            });
        }

        if bars.is_empty() {
            return Err(ScannerError::unavailable(symbol, "no rows in range"));
        }
        Ok(PriceSeries::new(symbol, bars))
    }

    fn list_symbols(&self) -> Result<Vec<String>, ScannerError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare("SELECT DISTINCT symbol FROM ohlcv ORDER BY symbol")
            .map_err(db_err)?;

        let rows = stmt.query_map([], |row| row.get(0)).map_err(db_err)?;

        let mut symbols = Vec::new();
        for row in rows {
            symbols.push(row.map_err(db_err)?);
        }
        Ok(symbols)
    }

    fn get_data_range(
        &self,
        symbol: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, ScannerError> {
        let conn = self.conn()?;

        let result: (Option<String>, Option<String>, i64) = conn
            .query_row(
                "SELECT MIN(date), MAX(date), COUNT(*) FROM ohlcv WHERE symbol = ?1",
                params![symbol],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .map_err(db_err)?;

        match result {
            (Some(min_str), Some(max_str), count) if count > 0 => Ok(Some((
                parse_stored_date(&min_str)?,
                parse_stored_date(&max_str)?,
                count as usize,
            ))),
            _ => Ok(None),
        }
    }
}
