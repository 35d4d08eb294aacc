use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router,
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::api::{self, PredictParams};
use crate::config::ServerConfig;
use crate::models::{LocationCatalog, Month};
use crate::page::{self, PageBody};
use crate::service::PredictionService;
use crate::warehouse::Warehouse;
use crate::{Result, TempcastError};

/// Immutable state shared by all handlers
pub struct AppState {
    pub catalog: LocationCatalog,
    pub service: PredictionService<Arc<dyn Warehouse>>,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    #[must_use]
    pub fn new(
        catalog: LocationCatalog,
        service: PredictionService<Arc<dyn Warehouse>>,
    ) -> SharedState {
        Arc::new(Self { catalog, service })
    }
}

pub fn router(state: SharedState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(index))
        .route("/predict", get(predict_page))
        .route("/health", get(health))
        .nest("/api", api::router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

async fn index(State(state): State<SharedState>) -> Html<String> {
    Html(page::render(
        &state.catalog,
        state.catalog.first(),
        Month::default(),
        state.service.prediction_year(),
        PageBody::Empty,
    ))
}

async fn predict_page(
    State(state): State<SharedState>,
    Query(params): Query<PredictParams>,
) -> Response {
    let year = state.service.prediction_year();

    let (location, month) = match params.resolve(&state) {
        Ok(selection) => selection,
        Err(err) => {
            let html = page::render(
                &state.catalog,
                state.catalog.first(),
                Month::default(),
                year,
                PageBody::Error(&err.user_message()),
            );
            return (StatusCode::BAD_REQUEST, Html(html)).into_response();
        }
    };

    match state.service.dashboard(&location, month).await {
        Ok(dashboard) => Html(page::render(
            &state.catalog,
            &location,
            month,
            year,
            PageBody::Dashboard(&dashboard),
        ))
        .into_response(),
        Err(err) => {
            tracing::error!("Prediction failed for {}: {}", location.postal_code, err);
            let html = page::render(
                &state.catalog,
                &location,
                month,
                year,
                PageBody::Error(&err.user_message()),
            );
            (err.status_code(), Html(html)).into_response()
        }
    }
}

/// Serve until Ctrl-C; over TLS when a certificate and key are configured
pub async fn run(state: SharedState, server: &ServerConfig) -> Result<()> {
    let app = router(state);
    let addr: SocketAddr = format!("{}:{}", server.host, server.port)
        .parse()
        .map_err(|e| TempcastError::config(format!("Invalid listen address: {e}")))?;

    if let (Some(cert), Some(key)) = (&server.tls_cert_path, &server.tls_key_path) {
        return serve_tls(app, addr, cert, key).await;
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Web server running at http://{}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

#[cfg(feature = "tls")]
async fn serve_tls(
    app: Router,
    addr: SocketAddr,
    cert: &std::path::Path,
    key: &std::path::Path,
) -> Result<()> {
    use axum_server::tls_rustls::RustlsConfig;

    let tls = RustlsConfig::from_pem_file(cert, key).await?;
    let handle = axum_server::Handle::new();
    let shutdown = handle.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        shutdown.graceful_shutdown(None);
    });

    tracing::info!("Web server running at https://{}", addr);
    axum_server::bind_rustls(addr, tls)
        .handle(handle)
        .serve(app.into_make_service())
        .await?;
    Ok(())
}

#[cfg(not(feature = "tls"))]
async fn serve_tls(
    _app: Router,
    _addr: SocketAddr,
    _cert: &std::path::Path,
    _key: &std::path::Path,
) -> Result<()> {
    Err(TempcastError::config(
        "TLS paths are configured but tempcast was built without the `tls` feature",
    ))
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        tracing::warn!("Unable to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
