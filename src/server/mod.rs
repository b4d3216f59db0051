//! HTTP surface: one upload endpoint plus CORS and a root description.
//!
//! ```text
//! GET     /               service description
//! POST    /file-handler   multipart `file` → {filename, markdown, result}
//! OPTIONS /file-handler   200, empty body
//! ```

mod error;
mod handlers;
mod upload;

pub use error::ApiError;
pub use upload::{parse_upload, FILE_FIELD};

use crate::brief::Briefer;
use crate::config::{CorsPolicy, ServerConfig};
use crate::error::BriefError;
use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{info, Level};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub briefer: Arc<Briefer>,
}

impl AppState {
    pub fn new(briefer: Briefer) -> Self {
        Self {
            briefer: Arc::new(briefer),
        }
    }
}

/// Build the CORS layer for `policy`. Credentials are always allowed.
pub fn cors_layer(policy: &CorsPolicy) -> Result<CorsLayer, BriefError> {
    let origin = match policy {
        CorsPolicy::AnyOrigin => AllowOrigin::mirror_request(),
        CorsPolicy::AllowList(origins) => {
            let mut values = Vec::with_capacity(origins.len());
            for origin in origins {
                let value = origin.parse::<HeaderValue>().map_err(|e| {
                    BriefError::InvalidConfig(format!("Invalid CORS origin '{}': {}", origin, e))
                })?;
                values.push(value);
            }
            AllowOrigin::list(values)
        }
    };

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true))
}

/// Assemble the application router.
pub fn router(state: AppState, config: &ServerConfig) -> Result<Router, BriefError> {
    let cors = cors_layer(&config.cors)?;

    Ok(Router::new()
        .route("/", get(handlers::index))
        .route(
            "/file-handler",
            post(handlers::file_handler).options(handlers::preflight),
        )
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state))
}

/// Bind `config.host:config.port` and serve until `shutdown` resolves.
pub async fn serve<F>(config: &ServerConfig, state: AppState, shutdown: F) -> Result<(), BriefError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = router(state, config)?;
    let addr = SocketAddr::new(config.host, config.port);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| BriefError::Internal(format!("Failed to bind {}: {}", addr, e)))?;

    info!("Listening on http://{}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| BriefError::Internal(format!("Server error: {}", e)))?;

    info!("Server stopped");
    Ok(())
}
