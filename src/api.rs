use axum::{
    Json, Router,
    extract::{Query, State},
    response::{IntoResponse, Response},
    routing::get,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::TempcastError;
use crate::dashboard::Dashboard;
use crate::models::{Location, Month};
use crate::web::SharedState;

#[derive(Debug, Default, Deserialize)]
pub struct PredictParams {
    pub location: Option<String>,
    pub month: Option<String>,
}

impl PredictParams {
    /// Resolve against the catalog; absent values fall back to the defaults
    pub fn resolve(&self, state: &SharedState) -> crate::Result<(Location, Month)> {
        let location = match self.location.as_deref() {
            Some(code) => state.catalog.resolve(code)?.clone(),
            None => state.catalog.first().clone(),
        };
        let month = match self.month.as_deref() {
            Some(raw) => {
                let number = raw.trim().parse::<u32>().map_err(|_| {
                    TempcastError::validation(format!("Month must be a number, got: '{raw}'"))
                })?;
                Month::new(number)?
            }
            None => Month::default(),
        };
        Ok((location, month))
    }
}

#[derive(Serialize)]
pub struct ApiMonth {
    pub number: u32,
    pub name: &'static str,
    pub short_name: &'static str,
}

impl From<Month> for ApiMonth {
    fn from(month: Month) -> Self {
        Self {
            number: month.number(),
            name: month.name(),
            short_name: month.short_name(),
        }
    }
}

impl IntoResponse for TempcastError {
    fn into_response(self) -> Response {
        tracing::warn!("Request failed: {}", self);
        let body = Json(json!({ "error": self.user_message() }));
        (self.status_code(), body).into_response()
    }
}

pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/locations", get(get_locations))
        .route("/months", get(get_months))
        .route("/predict", get(get_prediction))
}

async fn get_locations(State(state): State<SharedState>) -> Json<Vec<Location>> {
    Json(state.catalog.iter().cloned().collect())
}

async fn get_months() -> Json<Vec<ApiMonth>> {
    Json(Month::all().map(ApiMonth::from).collect())
}

async fn get_prediction(
    State(state): State<SharedState>,
    Query(params): Query<PredictParams>,
) -> Result<Json<Dashboard>, TempcastError> {
    let (location, month) = params.resolve(&state)?;
    let dashboard = state.service.dashboard(&location, month).await?;
    Ok(Json(dashboard))
}
