//! Configuration validation.
//!
//! Checks every `[scan]` and `[strategy]` field before a scan runs, so a bad
//! config never reaches the data provider.

use crate::domain::error::ScannerError;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

pub fn validate_scan_config(config: &dyn ConfigPort) -> Result<(), ScannerError> {
    validate_dates(config)?;
    validate_initial_capital(config)?;
    validate_min_int(config, "scan", "top_n", 20, 1)?;
    Ok(())
}

pub fn validate_strategy_config(config: &dyn ConfigPort) -> Result<(), ScannerError> {
    validate_min_int(config, "strategy", "rsi_period", 2, 1)?;
    validate_oversold_threshold(config)?;
    validate_min_int(config, "strategy", "lookback_days", 3, 1)?;
    validate_min_int(config, "strategy", "time_stop_days", 7, 1)?;
    validate_min_int(config, "strategy", "shares_per_trade", 100, 1)?;
    Ok(())
}

pub fn validate_data_config(config: &dyn ConfigPort) -> Result<(), ScannerError> {
    let source = config
        .get_string("data", "source")
        .unwrap_or_else(|| "csv".to_string());
    match source.trim().to_lowercase().as_str() {
        "csv" => match config.get_string("data", "csv_dir") {
            Some(dir) if !dir.trim().is_empty() => {}
            _ => {
                return Err(ScannerError::ConfigMissing {
                    section: "data".to_string(),
                    key: "csv_dir".to_string(),
                });
            }
        },
        "sqlite" => {
            if config.get_string("sqlite", "path").is_none() {
                return Err(ScannerError::ConfigMissing {
                    section: "sqlite".to_string(),
                    key: "path".to_string(),
                });
            }
        }
        other => {
            return Err(ScannerError::ConfigInvalid {
                section: "data".to_string(),
                key: "source".to_string(),
                reason: format!("unknown source '{}', expected csv or sqlite", other),
            });
        }
    }
    Ok(())
}

fn validate_initial_capital(config: &dyn ConfigPort) -> Result<(), ScannerError> {
    let value = config.get_double("scan", "initial_capital", 50_000.0);
    if !(value > 0.0) {
        return Err(ScannerError::ConfigInvalid {
            section: "scan".to_string(),
            key: "initial_capital".to_string(),
            reason: "initial_capital must be positive".to_string(),
        });
    }
    Ok(())
}

fn validate_oversold_threshold(config: &dyn ConfigPort) -> Result<(), ScannerError> {
    let value = config.get_double("strategy", "oversold_threshold", 20.0);
    if !(value > 0.0 && value <= 100.0) {
        return Err(ScannerError::ConfigInvalid {
            section: "strategy".to_string(),
            key: "oversold_threshold".to_string(),
            reason: "oversold_threshold must be in (0, 100]".to_string(),
        });
    }
    Ok(())
}

fn validate_min_int(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: i64,
    min: i64,
) -> Result<(), ScannerError> {
    if config.get_int(section, key, default) < min {
        return Err(ScannerError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: format!("{} must be at least {}", key, min),
        });
    }
    Ok(())
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), ScannerError> {
    let start_str = config.get_string("scan", "start_date");
    let end_str = config.get_string("scan", "end_date");

    let start_date = parse_date(start_str.as_deref(), "start_date")?;
    let end_date = parse_date(end_str.as_deref(), "end_date")?;

    if start_date >= end_date {
        return Err(ScannerError::InvalidParameters {
            reason: "start_date must be before end_date".to_string(),
        });
    }
    Ok(())
}

pub fn parse_date(value: Option<&str>, field: &str) -> Result<NaiveDate, ScannerError> {
    match value {
        None => Err(ScannerError::ConfigMissing {
            section: "scan".to_string(),
            key: field.to_string(),
        }),
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| {
            ScannerError::ConfigInvalid {
                section: "scan".to_string(),
                key: field.to_string(),
                reason: format!("invalid {} format, expected YYYY-MM-DD", field),
            }
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct MapConfig(HashMap<(String, String), String>);

    impl MapConfig {
        fn new(entries: &[(&str, &str, &str)]) -> Self {
            Self(
                entries
                    .iter()
                    .map(|(s, k, v)| ((s.to_string(), k.to_string()), v.to_string()))
                    .collect(),
            )
        }
    }

    impl ConfigPort for MapConfig {
        fn get_string(&self, section: &str, key: &str) -> Option<String> {
            self.0.get(&(section.to_string(), key.to_string())).cloned()
        }
        fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
            self.get_string(section, key)
                .and_then(|v| v.parse().ok())
                .unwrap_or(default)
        }
        fn get_double(&self, section: &str, key: &str, default: f64) -> f64 {
            self.get_string(section, key)
                .and_then(|v| v.parse().ok())
                .unwrap_or(default)
        }
        fn get_bool(&self, section: &str, key: &str, default: bool) -> bool {
            self.get_string(section, key)
                .and_then(|v| v.parse().ok())
                .unwrap_or(default)
        }
    }

    fn valid_scan() -> Vec<(&'static str, &'static str, &'static str)> {
        vec![
            ("scan", "start_date", "2020-01-01"),
            ("scan", "end_date", "2024-12-31"),
            ("scan", "initial_capital", "50000"),
        ]
    }

    fn with(extra: (&'static str, &'static str, &'static str)) -> MapConfig {
        let mut entries = valid_scan();
        entries.retain(|(s, k, _)| !(*s == extra.0 && *k == extra.1));
        entries.push(extra);
        MapConfig::new(&entries)
    }

    #[test]
    fn valid_scan_config_passes() {
        assert!(validate_scan_config(&MapConfig::new(&valid_scan())).is_ok());
    }

    #[test]
    fn missing_start_date() {
        let config = MapConfig::new(&[("scan", "end_date", "2024-12-31")]);
        let err = validate_scan_config(&config).unwrap_err();
        assert!(matches!(err, ScannerError::ConfigMissing { key, .. } if key == "start_date"));
    }

    #[test]
    fn bad_date_format() {
        let err = validate_scan_config(&with(("scan", "end_date", "31/12/2024"))).unwrap_err();
        assert!(matches!(err, ScannerError::ConfigInvalid { key, .. } if key == "end_date"));
    }

    #[test]
    fn equal_dates_are_invalid_parameters() {
        let err = validate_scan_config(&with(("scan", "end_date", "2020-01-01"))).unwrap_err();
        assert!(matches!(err, ScannerError::InvalidParameters { .. }));
    }

    #[test]
    fn non_positive_capital() {
        let err = validate_scan_config(&with(("scan", "initial_capital", "0"))).unwrap_err();
        assert!(matches!(err, ScannerError::ConfigInvalid { key, .. } if key == "initial_capital"));
    }

    #[test]
    fn zero_top_n() {
        let err = validate_scan_config(&with(("scan", "top_n", "0"))).unwrap_err();
        assert!(matches!(err, ScannerError::ConfigInvalid { key, .. } if key == "top_n"));
    }

    #[test]
    fn strategy_defaults_pass() {
        assert!(validate_strategy_config(&MapConfig::new(&[])).is_ok());
    }

    #[test]
    fn strategy_threshold_range() {
        let config = MapConfig::new(&[("strategy", "oversold_threshold", "150")]);
        let err = validate_strategy_config(&config).unwrap_err();
        assert!(matches!(err, ScannerError::ConfigInvalid { key, .. } if key == "oversold_threshold"));

        let config = MapConfig::new(&[("strategy", "oversold_threshold", "100")]);
        assert!(validate_strategy_config(&config).is_ok());
    }

    #[test]
    fn strategy_zero_counts_rejected() {
        for key in ["rsi_period", "lookback_days", "time_stop_days", "shares_per_trade"] {
            let config = MapConfig::new(&[("strategy", key, "0")]);
            let err = validate_strategy_config(&config).unwrap_err();
            assert!(matches!(err, ScannerError::ConfigInvalid { key: k, .. } if k == key));
        }
    }

    #[test]
    fn data_config_csv_requires_dir() {
        let err = validate_data_config(&MapConfig::new(&[])).unwrap_err();
        assert!(matches!(err, ScannerError::ConfigMissing { key, .. } if key == "csv_dir"));

        let config = MapConfig::new(&[("data", "csv_dir", "/tmp/prices")]);
        assert!(validate_data_config(&config).is_ok());
    }

    #[test]
    fn data_config_sqlite_requires_path() {
        let config = MapConfig::new(&[("data", "source", "sqlite")]);
        let err = validate_data_config(&config).unwrap_err();
        assert!(matches!(err, ScannerError::ConfigMissing { section, .. } if section == "sqlite"));
    }

    #[test]
    fn data_config_unknown_source() {
        let config = MapConfig::new(&[("data", "source", "yahoo")]);
        let err = validate_data_config(&config).unwrap_err();
        assert!(matches!(err, ScannerError::ConfigInvalid { key, .. } if key == "source"));
    }
}
