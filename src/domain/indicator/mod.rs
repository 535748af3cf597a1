//! Oscillator series types.
//!
//! An [`OscillatorSeries`] is aligned 1:1 with the [`PriceSeries`] it was
//! computed from. Warm-up bars carry `None` rather than a sentinel value, so a
//! consumer cannot mistake insufficient history for a real reading.
//!
//! [`PriceSeries`]: crate::domain::ohlcv::PriceSeries

pub mod rsi;

use chrono::NaiveDate;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorPoint {
    pub date: NaiveDate,
    pub value: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndicatorType {
    Rsi(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub struct OscillatorSeries {
    pub indicator_type: IndicatorType,
    pub values: Vec<IndicatorPoint>,
}

impl OscillatorSeries {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Reading at bar `index`; `None` for warm-up bars and out-of-range indices.
    pub fn value_at(&self, index: usize) -> Option<f64> {
        self.values.get(index).and_then(|p| p.value)
    }

    pub fn defined_count(&self) -> usize {
        self.values.iter().filter(|p| p.value.is_some()).count()
    }
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Rsi(period) => write!(f, "RSI({})", period),
        }
    }
}
