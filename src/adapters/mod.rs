//! Concrete adapter implementations for ports.

pub mod cached_data_port;
pub mod console_report;
pub mod csv_adapter;
pub mod csv_report;
pub mod file_config_adapter;
#[cfg(feature = "sqlite")]
pub mod sqlite_adapter;
