//! Snowflake SQL API v2 client
//!
//! Statements are submitted with `POST /api/v2/statements?async=true`, which
//! answers `202` with a statement handle. The handle is polled until a `200`
//! carries the first result partition. Remaining partitions are fetched
//! with `?partition=N`.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware, RequestBuilder};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use super::{ResultSet, Warehouse};
use crate::config::WarehouseConfig;
use crate::{Result, TempcastError};

const TOKEN_TYPE_HEADER: &str = "X-Snowflake-Authorization-Token-Type";
const USER_AGENT: &str = concat!("tempcast/", env!("CARGO_PKG_VERSION"));

/// Request body of `POST /api/v2/statements`
#[derive(Debug, Serialize)]
struct StatementRequest<'a> {
    statement: &'a str,
    timeout: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    database: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    schema: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warehouse: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatementResponse {
    #[serde(default)]
    result_set_meta_data: Option<ResultSetMetaData>,
    #[serde(default)]
    data: Vec<Vec<Option<String>>>,
    #[serde(default)]
    statement_handle: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResultSetMetaData {
    #[serde(default)]
    num_rows: Option<u64>,
    row_type: Vec<RowType>,
    #[serde(default)]
    partition_info: Vec<PartitionInfo>,
}

#[derive(Debug, Deserialize)]
struct RowType {
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PartitionInfo {
    #[serde(default)]
    row_count: Option<u64>,
}

/// Body of a failed request (4xx/5xx, including SQL errors as 422)
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErrorResponse {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    sql_state: Option<String>,
    message: String,
}

enum Outcome {
    Complete(StatementResponse),
    Running(String),
}

/// Warehouse client for the Snowflake SQL REST API
pub struct SqlApiWarehouse {
    client: ClientWithMiddleware,
    base_url: String,
    token: String,
    token_type: String,
    statement_timeout: u32,
    poll_interval: Duration,
    max_polls: u32,
    database: Option<String>,
    schema: Option<String>,
    warehouse: Option<String>,
    role: Option<String>,
}

impl SqlApiWarehouse {
    /// Create a client; the config must carry an account URL and a token
    pub fn new(config: &WarehouseConfig) -> Result<Self> {
        let token = config
            .token
            .clone()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| TempcastError::config("Warehouse token is missing"))?;
        if config.account_url.is_empty() {
            return Err(TempcastError::config("Warehouse account URL is missing"));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds.into()))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| TempcastError::config(format!("Failed to create HTTP client: {e}")))?;

        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(config.max_retries);
        let client = ClientBuilder::new(client)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        Ok(Self {
            client,
            base_url: config.account_url.trim_end_matches('/').to_string(),
            token,
            token_type: config.token_type.clone(),
            statement_timeout: config.statement_timeout_seconds,
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            max_polls: config.max_polls,
            database: config.database.clone(),
            schema: config.schema.clone(),
            warehouse: config.warehouse.clone(),
            role: config.role.clone(),
        })
    }

    fn statements_url(&self) -> String {
        format!("{}/api/v2/statements", self.base_url)
    }

    /// Submissions always run asynchronously: the server answers `202` at once
    /// and the wait happens in the poll loop, never inside one HTTP request
    fn submit_url(&self) -> String {
        format!("{}?async=true", self.statements_url())
    }

    fn handle_url(&self, handle: &str, partition: Option<usize>) -> String {
        let mut url = format!("{}/{}", self.statements_url(), urlencoding::encode(handle));
        if let Some(partition) = partition {
            url.push_str(&format!("?partition={partition}"));
        }
        url
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header(AUTHORIZATION, format!("Bearer {}", self.token))
            .header(TOKEN_TYPE_HEADER, self.token_type.as_str())
            .header(ACCEPT, "application/json")
    }

    async fn submit(&self, sql: &str) -> Result<Outcome> {
        let body = StatementRequest {
            statement: sql,
            timeout: self.statement_timeout,
            database: self.database.as_deref(),
            schema: self.schema.as_deref(),
            warehouse: self.warehouse.as_deref(),
            role: self.role.as_deref(),
        };
        let body = serde_json::to_vec(&body)
            .map_err(|e| TempcastError::validation(format!("Unserializable statement: {e}")))?;

        let response = self
            .authorized(self.client.post(self.submit_url()))
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;
        read_outcome(response).await
    }

    async fn poll(&self, handle: &str) -> Result<Outcome> {
        let response = self
            .authorized(self.client.get(self.handle_url(handle, None)))
            .send()
            .await?;
        read_outcome(response).await
    }

    async fn fetch_partition(
        &self,
        handle: &str,
        partition: usize,
    ) -> Result<Vec<Vec<Option<String>>>> {
        debug!("Fetching result partition {}", partition);
        let response = self
            .authorized(self.client.get(self.handle_url(handle, Some(partition))))
            .send()
            .await?;
        match read_outcome(response).await? {
            Outcome::Complete(page) => Ok(page.data),
            Outcome::Running(_) => Err(TempcastError::http(format!(
                "partition {partition} requested before statement completed"
            ))),
        }
    }
}

#[async_trait]
impl Warehouse for SqlApiWarehouse {
    #[instrument(skip(self, sql), fields(statement = %first_line(sql)))]
    async fn execute(&self, sql: &str) -> Result<ResultSet> {
        let start_time = Instant::now();
        let mut outcome = self.submit(sql).await?;
        let mut polls = 0;

        let response = loop {
            match outcome {
                Outcome::Complete(response) => break response,
                Outcome::Running(handle) => {
                    if polls >= self.max_polls {
                        return Err(TempcastError::timeout(format!(
                            "statement {handle} still running after {polls} polls"
                        )));
                    }
                    polls += 1;
                    debug!("Statement {} running, poll {}", handle, polls);
                    tokio::time::sleep(self.poll_interval).await;
                    outcome = self.poll(&handle).await?;
                }
            }
        };

        let (mut result, partitions) = into_result_set(response)?;
        if let Some((handle, count)) = partitions {
            for partition in 1..count {
                let rows = self.fetch_partition(&handle, partition).await?;
                result.extend_rows(rows);
            }
        }

        let total_duration = start_time.elapsed();
        info!(
            "Statement returned {} rows in {:.3}s",
            result.len(),
            total_duration.as_secs_f64()
        );
        if total_duration.as_secs() > 5 {
            warn!(
                "Slow warehouse response: {:.3}s",
                total_duration.as_secs_f64()
            );
        }

        Ok(result)
    }
}

async fn read_outcome(response: reqwest::Response) -> Result<Outcome> {
    let status = response.status();
    let body = response.text().await?;
    parse_outcome(status, &body)
}

fn parse_outcome(status: StatusCode, body: &str) -> Result<Outcome> {
    match status {
        StatusCode::OK => {
            let response: StatementResponse = serde_json::from_str(body).map_err(|e| {
                TempcastError::http(format!("Invalid statement response: {e}"))
            })?;
            Ok(Outcome::Complete(response))
        }
        StatusCode::ACCEPTED => {
            let response: StatementResponse = serde_json::from_str(body).map_err(|e| {
                TempcastError::http(format!("Invalid statement status response: {e}"))
            })?;
            if let Some(message) = &response.message {
                debug!("{}", message);
            }
            response
                .statement_handle
                .map(Outcome::Running)
                .ok_or_else(|| TempcastError::http("Running statement without a handle"))
        }
        _ => Err(error_from_body(status, body)),
    }
}

fn error_from_body(status: StatusCode, body: &str) -> TempcastError {
    match serde_json::from_str::<ErrorResponse>(body) {
        Ok(error) => TempcastError::Warehouse {
            code: error.code.unwrap_or_else(|| status.as_u16().to_string()),
            sql_state: error.sql_state.unwrap_or_else(|| "00000".to_string()),
            message: error.message,
        },
        Err(_) => TempcastError::http(format!(
            "Warehouse request failed with status {}: {}",
            status,
            body.chars().take(200).collect::<String>()
        )),
    }
}

/// Result set of the first partition, plus the handle and partition count
/// when more partitions remain to be fetched
fn into_result_set(response: StatementResponse) -> Result<(ResultSet, Option<(String, usize)>)> {
    let meta = response
        .result_set_meta_data
        .ok_or_else(|| TempcastError::http("Statement response has no result metadata"))?;

    let columns = meta.row_type.into_iter().map(|c| c.name).collect();
    let result = ResultSet::new(columns, response.data);

    if let Some(num_rows) = meta.num_rows {
        let expected: u64 = meta.partition_info.iter().filter_map(|p| p.row_count).sum();
        if expected != 0 && expected != num_rows {
            warn!(
                "Partition row counts ({}) disagree with numRows ({})",
                expected, num_rows
            );
        }
    }

    let partitions = match (meta.partition_info.len(), response.statement_handle) {
        (count, Some(handle)) if count > 1 => Some((handle, count)),
        _ => None,
    };
    Ok((result, partitions))
}

fn first_line(sql: &str) -> &str {
    sql.trim().lines().next().unwrap_or_default()
}
