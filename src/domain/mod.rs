//! Core domain types and logic.

pub mod ohlcv;
pub mod indicator;
pub mod position;
pub mod strategy;
pub mod backtest;
pub mod metrics;
pub mod leaderboard;
pub mod universe;
pub mod scanner;
pub mod config_validation;
pub mod error;
