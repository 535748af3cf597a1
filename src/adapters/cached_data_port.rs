//! In-memory TTL cache in front of any [`DataPort`].
//!
//! Successful fetches are kept per `(symbol, start, end)` request; failures are
//! never cached, so a provider that recovers is retried on the next scan.
//! Only useful when one port serves several scans, e.g. a long-lived embedding
//! process re-running the scanner with different strategy parameters. The CLI
//! is one-shot and reads the provider directly.

use crate::domain::error::ScannerError;
use crate::domain::ohlcv::PriceSeries;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// One hour, matching the refresh cadence of daily price feeds.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(3600);

type CacheKey = (String, NaiveDate, NaiveDate);

struct CacheEntry {
    series: PriceSeries,
    stored_at: Instant,
}

pub struct CachedDataPort<P> {
    inner: P,
    ttl: Duration,
    entries: RwLock<HashMap<CacheKey, CacheEntry>>,
}

impl<P: DataPort> CachedDataPort<P> {
    pub fn new(inner: P, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }

    /// Number of live (unexpired) entries.
    pub fn len(&self) -> usize {
        match self.entries.read() {
            Ok(entries) => entries
                .values()
                .filter(|e| e.stored_at.elapsed() < self.ttl)
                .count(),
            Err(_) => {
                warn!("cache lock poisoned, reporting it as empty");
                0
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        match self.entries.write() {
            Ok(mut entries) => entries.clear(),
            Err(_) => warn!("cache lock poisoned, clear skipped"),
        }
    }

    fn lookup(&self, key: &CacheKey) -> Option<PriceSeries> {
        let Ok(entries) = self.entries.read() else {
            warn!("cache lock poisoned, bypassing lookup");
            return None;
        };
        entries
            .get(key)
            .filter(|entry| entry.stored_at.elapsed() < self.ttl)
            .map(|entry| entry.series.clone())
    }
}

impl<P: DataPort> DataPort for CachedDataPort<P> {
    fn fetch_ohlcv(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<PriceSeries, ScannerError> {
        let key = (symbol.to_string(), start_date, end_date);

        if let Some(series) = self.lookup(&key) {
            debug!(symbol, "cache hit");
            return Ok(series);
        }

        let series = self.inner.fetch_ohlcv(symbol, start_date, end_date)?;

        // A poisoned lock only costs the cache entry, never the fetch.
        match self.entries.write() {
            Ok(mut entries) => {
                entries.retain(|_, entry| entry.stored_at.elapsed() < self.ttl);
                entries.insert(
                    key,
                    CacheEntry {
                        series: series.clone(),
                        stored_at: Instant::now(),
                    },
                );
            }
            Err(_) => warn!(symbol, "cache lock poisoned, result not stored"),
        }
        Ok(series)
    }

    fn list_symbols(&self) -> Result<Vec<String>, ScannerError> {
        self.inner.list_symbols()
    }

    fn get_data_range(
        &self,
        symbol: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, ScannerError> {
        self.inner.get_data_range(symbol)
    }
}
