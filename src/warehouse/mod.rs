//! Warehouse access
//!
//! The dashboard only ever needs "run this statement, give me the rows".
//! [`Warehouse`] is that seam; [`SqlApiWarehouse`] talks to the Snowflake
//! SQL API and [`InMemoryWarehouse`] answers from scripted result sets.

pub mod memory;
pub mod sql_api;

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use crate::{Result, TempcastError};

pub use memory::InMemoryWarehouse;
pub use sql_api::SqlApiWarehouse;

/// Executes SQL statements against a data warehouse
#[async_trait]
pub trait Warehouse: Send + Sync {
    async fn execute(&self, sql: &str) -> Result<ResultSet>;
}

#[async_trait]
impl<W: Warehouse + ?Sized> Warehouse for Arc<W> {
    async fn execute(&self, sql: &str) -> Result<ResultSet> {
        (**self).execute(sql).await
    }
}

/// Rows returned by a statement
///
/// Values stay in the SQL API's wire form: every cell is a string or null,
/// typed access goes through the getters.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResultSet {
    columns: Vec<String>,
    rows: Vec<Vec<Option<String>>>,
}

impl ResultSet {
    #[must_use]
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Option<String>>>) -> Self {
        Self { columns, rows }
    }

    /// Convenience constructor for fixtures
    #[must_use]
    pub fn from_rows(columns: &[&str], rows: &[&[Option<&str>]]) -> Self {
        Self {
            columns: columns.iter().map(|c| (*c).to_string()).collect(),
            rows: rows
                .iter()
                .map(|row| row.iter().map(|cell| cell.map(str::to_string)).collect())
                .collect(),
        }
    }

    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub(crate) fn extend_rows(&mut self, rows: Vec<Vec<Option<String>>>) {
        self.rows.extend(rows);
    }

    /// Index of a column, compared case-insensitively
    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c.eq_ignore_ascii_case(name))
            .ok_or_else(|| {
                TempcastError::empty_result(format!(
                    "column '{name}' not in result (columns: {})",
                    self.columns.join(", ")
                ))
            })
    }

    /// Raw cell; `None` for SQL NULL or a short row
    #[must_use]
    pub fn cell(&self, row: usize, column: usize) -> Option<&str> {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .and_then(|cell| cell.as_deref())
    }

    /// Numeric cell; `Ok(None)` for NULL, an error for non-numeric text
    pub fn get_f64(&self, row: usize, column: &str) -> Result<Option<f64>> {
        let index = self.column_index(column)?;
        self.cell(row, index)
            .map(|raw| {
                raw.trim().parse::<f64>().map_err(|_| {
                    TempcastError::validation(format!(
                        "column '{column}' row {row}: '{raw}' is not a number"
                    ))
                })
            })
            .transpose()
    }

    /// Integer cell; accepts `"7"` as well as decimal renderings like `"7.000"`
    pub fn get_u32(&self, row: usize, column: &str) -> Result<Option<u32>> {
        match self.get_f64(row, column)? {
            None => Ok(None),
            Some(value) if value.fract() == 0.0 && value >= 0.0 && value <= f64::from(u32::MAX) => {
                Ok(Some(value as u32))
            }
            Some(value) => Err(TempcastError::validation(format!(
                "column '{column}' row {row}: {value} is not an unsigned integer"
            ))),
        }
    }
}
