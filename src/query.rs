//! SQL statement templates for the prediction UDF and the NOAA history tables

use chrono::NaiveDate;

use crate::config::ModelConfig;
use crate::models::{Location, Month};
use crate::{Result, TempcastError};

/// Column alias of the scalar prediction
pub const TEMP_COLUMN: &str = "TEMP";
/// Column alias of the month number in the history query
pub const MONTH_COLUMN: &str = "MONTH";
/// Column alias of the monthly average in the history query
pub const AVG_TEMP_COLUMN: &str = "AVG_TEMP";

/// Validated object names the statements are rendered against
#[derive(Debug, Clone)]
pub struct QueryTemplates {
    udf_name: String,
    timeseries_table: String,
    station_index_table: String,
}

impl QueryTemplates {
    pub fn new(
        udf_name: impl Into<String>,
        timeseries_table: impl Into<String>,
        station_index_table: impl Into<String>,
    ) -> Result<Self> {
        let templates = Self {
            udf_name: udf_name.into(),
            timeseries_table: timeseries_table.into(),
            station_index_table: station_index_table.into(),
        };
        for name in [
            &templates.udf_name,
            &templates.timeseries_table,
            &templates.station_index_table,
        ] {
            if !is_object_name(name) {
                return Err(TempcastError::config(format!(
                    "'{name}' is not a valid SQL object name"
                )));
            }
        }
        Ok(templates)
    }

    pub fn from_config(model: &ModelConfig) -> Result<Self> {
        Self::new(
            model.udf_name.as_str(),
            model.timeseries_table.as_str(),
            model.station_index_table.as_str(),
        )
    }

    /// `SELECT <udf>('<zip>', <month>) as temp`
    #[must_use]
    pub fn prediction_sql(&self, location: &Location, month: Month) -> String {
        format!(
            "SELECT {}({}, {}) as temp",
            self.udf_name,
            quote_literal(&location.postal_code),
            month.number()
        )
    }

    /// Monthly average "Average Temperature" readings for one calendar year
    #[must_use]
    pub fn historical_sql(&self, location: &Location, year: i32) -> String {
        let start = year_start(year);
        let end = year_start(year + 1);
        format!(
            "SELECT\n    \
                EXTRACT(MONTH FROM ts.date) as month,\n    \
                AVG(ts.value) as avg_temp\n\
             FROM {timeseries} ts\n\
             JOIN {index} idx\n    \
                ON ts.noaa_weather_station_id = idx.noaa_weather_station_id\n\
             WHERE ts.variable_name = 'Average Temperature'\n    \
                AND idx.zip_name = {zip}\n    \
                AND ts.date >= '{start}'\n    \
                AND ts.date < '{end}'\n\
             GROUP BY EXTRACT(MONTH FROM ts.date)\n\
             ORDER BY month",
            timeseries = self.timeseries_table,
            index = self.station_index_table,
            zip = quote_literal(&location.postal_code),
        )
    }
}

fn year_start(year: i32) -> String {
    NaiveDate::from_ymd_opt(year, 1, 1)
        .map(|date| date.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| format!("{year:04}-01-01"))
}

/// Render a SQL string literal, doubling embedded single quotes
#[must_use]
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Dotted identifier such as `DB.SCHEMA.TABLE`, each part unquoted
fn is_object_name(name: &str) -> bool {
    !name.is_empty()
        && name.split('.').all(|part| {
            let mut chars = part.chars();
            matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn templates() -> QueryTemplates {
        QueryTemplates::from_config(&ModelConfig::default()).unwrap()
    }

    #[test]
    fn test_prediction_sql() {
        let sql = templates().prediction_sql(&Location::flagstaff(), Month::new(7).unwrap());
        assert_eq!(sql, "SELECT predict_temperature_udf('86005', 7) as temp");
    }

    #[test]
    fn test_historical_sql_covers_one_year() {
        let sql = templates().historical_sql(&Location::flagstaff(), 2024);
        assert!(sql.contains("FROM WEATHER__ENVIRONMENT.CYBERSYN.NOAA_WEATHER_METRICS_TIMESERIES ts"));
        assert!(sql.contains("JOIN WEATHER__ENVIRONMENT.CYBERSYN.NOAA_WEATHER_STATION_INDEX idx"));
        assert!(sql.contains("ts.variable_name = 'Average Temperature'"));
        assert!(sql.contains("idx.zip_name = '86005'"));
        assert!(sql.contains("ts.date >= '2024-01-01'"));
        assert!(sql.contains("ts.date < '2025-01-01'"));
        assert!(sql.contains("GROUP BY EXTRACT(MONTH FROM ts.date)"));
        assert!(sql.trim_end().ends_with("ORDER BY month"));
    }

    #[test]
    fn test_quote_literal_escapes() {
        assert_eq!(quote_literal("86005"), "'86005'");
        assert_eq!(quote_literal("x' OR '1'='1"), "'x'' OR ''1''=''1'");
    }

    #[test]
    fn test_object_names_are_validated() {
        assert!(QueryTemplates::new("db.schema.udf", "a.b.c", "_x$1").is_ok());
        assert!(QueryTemplates::new("udf(); DROP TABLE t", "a", "b").is_err());
        assert!(QueryTemplates::new("udf", "a..b", "c").is_err());
        assert!(QueryTemplates::new("udf", "1table", "c").is_err());
        assert!(QueryTemplates::new("", "a", "b").is_err());
    }
}
