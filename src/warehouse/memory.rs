use std::sync::Mutex;

use async_trait::async_trait;

use super::{ResultSet, Warehouse};
use crate::{Result, TempcastError};

type Responder = Box<dyn Fn(&str) -> Result<ResultSet> + Send + Sync>;

/// Warehouse double that answers from registered rules
///
/// Rules are tried in registration order; the first whose pattern is a
/// substring of the statement answers it. Executed statements are recorded.
#[derive(Default)]
pub struct InMemoryWarehouse {
    rules: Vec<(String, Responder)>,
    executed: Mutex<Vec<String>>,
}

impl InMemoryWarehouse {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer statements containing `pattern` with a fixed result set
    #[must_use]
    pub fn with_result(self, pattern: impl Into<String>, result: ResultSet) -> Self {
        self.with_responder(pattern, move |_| Ok(result.clone()))
    }

    /// Answer statements containing `pattern` with a computed result
    #[must_use]
    pub fn with_responder<F>(mut self, pattern: impl Into<String>, responder: F) -> Self
    where
        F: Fn(&str) -> Result<ResultSet> + Send + Sync + 'static,
    {
        self.rules.push((pattern.into(), Box::new(responder)));
        self
    }

    /// Statements executed so far, oldest first
    #[must_use]
    pub fn executed(&self) -> Vec<String> {
        self.executed
            .lock()
            .map(|statements| statements.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Warehouse for InMemoryWarehouse {
    async fn execute(&self, sql: &str) -> Result<ResultSet> {
        if let Ok(mut executed) = self.executed.lock() {
            executed.push(sql.to_string());
        }

        self.rules
            .iter()
            .find(|(pattern, _)| sql.contains(pattern.as_str()))
            .map(|(_, responder)| responder(sql))
            .unwrap_or_else(|| {
                Err(TempcastError::Warehouse {
                    code: "002003".to_string(),
                    sql_state: "42S02".to_string(),
                    message: "no scripted result for statement".to_string(),
                })
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_first_matching_rule_answers() {
        let warehouse = InMemoryWarehouse::new()
            .with_result("udf", ResultSet::from_rows(&["TEMP"], &[&[Some("1")]]))
            .with_result("SELECT", ResultSet::default());

        let rs = warehouse.execute("SELECT udf('1', 1)").await.unwrap();
        assert_eq!(rs.len(), 1);
        let rs = warehouse.execute("SELECT 1").await.unwrap();
        assert!(rs.is_empty());
        assert!(warehouse.execute("SHOW TABLES").await.is_err());
        assert_eq!(warehouse.executed().len(), 3);
    }
}
