//! Price data access port.

use crate::domain::error::ScannerError;
use crate::domain::ohlcv::PriceSeries;
use chrono::NaiveDate;

pub trait DataPort {
    /// Daily bars for `symbol` with `start_date <= date <= end_date`, ascending.
    ///
    /// Bars missing any of open/high/low/close never reach the caller. An empty
    /// or malformed source is reported as [`ScannerError::DataUnavailable`].
    fn fetch_ohlcv(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<PriceSeries, ScannerError>;

    fn list_symbols(&self) -> Result<Vec<String>, ScannerError>;

    /// First date, last date and bar count stored for `symbol`.
    fn get_data_range(
        &self,
        symbol: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, ScannerError>;
}
