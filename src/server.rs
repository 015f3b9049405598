//! HTTP surface: one conversion endpoint plus a health check.
//!
//! ```text
//! POST /api/ConvertPdfToImages   { "pdfBase64": "…" }  →  { "images": [ … ] }
//! GET  /health
//! ```
//!
//! The conversion handler checks, in order: rasterizer availability, that the
//! body is a JSON object, that `pdfBase64` is present and not falsy. Only then
//! does it run the use case. Every failure becomes a JSON body with an
//! `error` string and, for 500s, a `details` string.

use crate::config::ServerConfig;
use crate::convert::ConvertPdfToImages;
use crate::document::PdfPage;
use crate::error::ConvertError;
use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// Path of the conversion endpoint.
pub const CONVERT_ROUTE: &str = "/api/ConvertPdfToImages";

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub use_case: ConvertPdfToImages,
}

/// Errors surfaced by the conversion endpoint.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Poppler is not properly installed")]
    ToolUnavailable(String),

    #[error("Request body must be a valid JSON object")]
    InvalidBody,

    #[error("PDF in base64 format is required")]
    MissingPdf,

    #[error("Error in conversion process")]
    Conversion(#[source] ConvertError),
}

/// Error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, details) = match &self {
            ApiError::ToolUnavailable(detail) => {
                (StatusCode::INTERNAL_SERVER_ERROR, Some(detail.clone()))
            }
            ApiError::InvalidBody | ApiError::MissingPdf => (StatusCode::BAD_REQUEST, None),
            ApiError::Conversion(e) => (StatusCode::INTERNAL_SERVER_ERROR, Some(e.to_string())),
        };

        let body = ErrorResponse {
            error: self.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Successful conversion body.
#[derive(Debug, Serialize)]
pub struct ConvertResponse {
    pub images: Vec<PdfPage>,
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

/// Handler: GET /health
pub async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Handler: POST /api/ConvertPdfToImages
///
/// The body is taken as raw bytes so that malformed JSON gets this
/// endpoint's own 400 rather than the extractor's rejection.
pub async fn handle_convert(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<ConvertResponse>, ApiError> {
    if let Err(e) = state.use_case.converter().check_available().await {
        error!("Rasterizer unavailable: {}", e);
        let detail = match e {
            ConvertError::ToolUnavailable { detail } => detail,
            other => other.to_string(),
        };
        return Err(ApiError::ToolUnavailable(detail));
    }

    let pdf_base64 = pdf_base64_field(&body)?;
    info!("Conversion request: {} base64 chars", pdf_base64.len());

    let images = state.use_case.execute(&pdf_base64).await.map_err(|e| {
        error!("Error in PDF conversion: {}", e);
        ApiError::Conversion(e)
    })?;

    Ok(Json(ConvertResponse { images }))
}

/// Pull `pdfBase64` out of a request body.
///
/// Absent, `null`, `false`, `0` and `""` count as missing. Any other
/// non-string value is present but undecodable, which is a conversion error.
fn pdf_base64_field(body: &[u8]) -> Result<String, ApiError> {
    let Ok(Value::Object(mut fields)) = serde_json::from_slice::<Value>(body) else {
        return Err(ApiError::InvalidBody);
    };
    match fields.remove("pdfBase64") {
        Some(Value::String(s)) if !s.is_empty() => Ok(s),
        None | Some(Value::Null) | Some(Value::Bool(false)) | Some(Value::String(_)) => {
            Err(ApiError::MissingPdf)
        }
        Some(Value::Number(n)) if n.as_f64() == Some(0.0) => Err(ApiError::MissingPdf),
        Some(other) => {
            let found = match other {
                Value::Bool(_) => "boolean",
                Value::Number(_) => "number",
                Value::Array(_) => "array",
                _ => "object",
            };
            error!("Error in PDF conversion: pdfBase64 is a JSON {}", found);
            Err(ApiError::Conversion(ConvertError::PayloadNotText { found }))
        }
    }
}

/// Build the router with all routes and middleware.
pub fn router(state: AppState, body_limit_bytes: usize) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health))
        .route(CONVERT_ROUTE, post(handle_convert))
        .layer(DefaultBodyLimit::max(body_limit_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Bind and serve until Ctrl-C.
pub async fn serve(config: &ServerConfig, state: AppState) -> std::io::Result<()> {
    let app = router(state, config.body_limit_bytes);
    let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;

    info!("Server listening on http://{}", listener.local_addr()?);
    info!("Body limit: {} bytes", config.body_limit_bytes);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}
