//! `tempcast` - monthly temperature prediction dashboard
//!
//! Calls a temperature-prediction UDF hosted in a Snowflake warehouse,
//! compares it with the previous year's NOAA observations and serves the
//! result as an interactive web page.

pub mod api;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod logging;
pub mod models;
pub mod page;
pub mod query;
pub mod service;
pub mod units;
pub mod warehouse;
pub mod web;

// Re-export core types for public API
pub use config::TempcastConfig;
pub use dashboard::Dashboard;
pub use error::TempcastError;
pub use models::{Location, LocationCatalog, Month, Prediction};
pub use service::PredictionService;
pub use warehouse::{InMemoryWarehouse, ResultSet, SqlApiWarehouse, Warehouse};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, TempcastError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
