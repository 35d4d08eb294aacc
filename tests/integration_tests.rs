//! Integration tests for the tempcast web surface

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use tempcast::config::ModelConfig;
use tempcast::web::{self, AppState};
use tempcast::{InMemoryWarehouse, LocationCatalog, PredictionService, ResultSet, Warehouse};

/// Prediction of `month * 2` °C for every month
fn predictions(warehouse: InMemoryWarehouse) -> InMemoryWarehouse {
    warehouse.with_responder("predict_temperature_udf", |sql| {
        let month: f64 = sql
            .trim_end_matches(") as temp")
            .rsplit(", ")
            .next()
            .and_then(|m| m.parse().ok())
            .unwrap_or(0.0);
        Ok(ResultSet::new(
            vec!["TEMP".to_string()],
            vec![vec![Some((month * 2.0).to_string())]],
        ))
    })
}

fn history(months: &[(u32, f64)]) -> ResultSet {
    ResultSet::new(
        vec!["MONTH".to_string(), "AVG_TEMP".to_string()],
        months
            .iter()
            .map(|(m, t)| vec![Some(m.to_string()), Some(t.to_string())])
            .collect(),
    )
}

fn app(warehouse: Arc<InMemoryWarehouse>) -> axum::Router {
    let warehouse: Arc<dyn Warehouse> = warehouse;
    let service = PredictionService::from_config(warehouse, &ModelConfig::default()).unwrap();
    web::router(AppState::new(LocationCatalog::default(), service))
}

async fn get(app: axum::Router, uri: &str) -> (StatusCode, String) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

#[tokio::test]
async fn test_index_shows_selectors() {
    let (status, body) = get(app(Arc::new(InMemoryWarehouse::new())), "/").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Select Location"));
    assert!(body.contains("<option value=\"7\" selected>July</option>"));
    assert!(body.contains("Predict Average Temperature"));
}

#[tokio::test]
async fn test_health() {
    let (status, body) = get(app(Arc::new(InMemoryWarehouse::new())), "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "ok");
}

#[tokio::test]
async fn test_full_dashboard() {
    let warehouse = Arc::new(
        predictions(InMemoryWarehouse::new())
            .with_result("AVG(ts.value)", history(&[(6, 12.0), (7, 15.0), (8, 14.0)])),
    );
    let (status, body) = get(app(warehouse.clone()), "/api/predict?location=86005&month=7").await;
    assert_eq!(status, StatusCode::OK);

    let json: Value = serde_json::from_str(&body).unwrap();
    // July: 14 °C predicted vs 15 °C observed
    assert_eq!(json["metrics"][0]["label"], "2024 Actual");
    assert_eq!(json["metrics"][0]["value"], "59.0°F");
    assert_eq!(json["metrics"][1]["value"], "57.2°F");
    assert_eq!(json["metrics"][2]["value"], "-1.8°F");
    assert!(json["warning"].is_null());

    let months: Vec<&str> = json["annual_chart"]["data"][0]["x"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(Value::as_str)
        .collect();
    assert_eq!(
        months,
        ["Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec"]
    );
    assert_eq!(json["annual_table"].as_array().unwrap().len(), 12);
    assert_eq!(json["annual_table"][0]["Temperature"], "35.6°F (2.0°C)");

    // 1 prediction + 1 history + 12 annual predictions
    assert_eq!(warehouse.executed().len(), 14);
}

#[tokio::test]
async fn test_missing_month_shows_prediction_only() {
    let warehouse = Arc::new(
        predictions(InMemoryWarehouse::new())
            .with_result("AVG(ts.value)", history(&[(1, -2.0), (2, 0.5)])),
    );
    let (status, body) = get(app(warehouse), "/api/predict?location=86005&month=12").await;
    assert_eq!(status, StatusCode::OK);

    let json: Value = serde_json::from_str(&body).unwrap();
    assert!(json["comparison"].is_null());
    assert_eq!(json["metrics"].as_array().unwrap().len(), 1);
    assert_eq!(json["metrics"][0]["label"], "2025 Prediction");
    assert!(!json["history_chart"].is_null());
}

#[tokio::test]
async fn test_empty_history_renders_warning() {
    let warehouse = Arc::new(
        predictions(InMemoryWarehouse::new()).with_result("AVG(ts.value)", history(&[])),
    );
    let (status, body) = get(app(warehouse.clone()), "/predict?location=86005&month=3").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("No 2024 data available for comparison, but prediction is still valid!"));
    assert!(body.contains("42.8°F"));
    assert!(!body.contains("annual-chart"));
    assert_eq!(warehouse.executed().len(), 2);
}

#[tokio::test]
async fn test_html_dashboard_includes_charts() {
    let warehouse = Arc::new(
        predictions(InMemoryWarehouse::new()).with_result("AVG(ts.value)", history(&[(7, 20.0)])),
    );
    let (status, body) = get(app(warehouse), "/predict?location=86005&month=7").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("history-chart"));
    assert!(body.contains("annual-chart"));
    assert!(body.contains("2024 vs 2025 Prediction - Flagstaff (86005)"));
    assert!(body.contains("<option value=\"7\" selected>July</option>"));
}

#[tokio::test]
async fn test_bad_input_is_rejected() {
    let warehouse = Arc::new(InMemoryWarehouse::new());

    let (status, body) = get(app(warehouse.clone()), "/api/predict?location=86005&month=13").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("between 1 and 12"));

    let (status, _) = get(app(warehouse.clone()), "/api/predict?location=99999&month=1").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = get(app(warehouse.clone()), "/predict?month=july").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("Month must be a number"));

    assert!(warehouse.executed().is_empty());
}

#[tokio::test]
async fn test_warehouse_failure_surfaces() {
    let warehouse = Arc::new(InMemoryWarehouse::new());
    let (status, body) = get(app(warehouse), "/api/predict?location=86005&month=7").await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body.contains("The warehouse rejected the query"));
}

#[tokio::test]
async fn test_catalog_endpoints() {
    let (status, body) = get(app(Arc::new(InMemoryWarehouse::new())), "/api/locations").await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json[0]["postal_code"], "86005");

    let (status, body) = get(app(Arc::new(InMemoryWarehouse::new())), "/api/months").await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json.as_array().unwrap().len(), 12);
    assert_eq!(json[6]["name"], "July");
}
