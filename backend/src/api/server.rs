//! HTTP Server for the WHX API.
//!
//! Wraps the conversion pipeline for browser uploads. Every request loads
//! its own mapping table and runs the synchronous pipeline on the blocking
//! thread pool, so requests never share conversion state.
//!
//! # API Endpoints
//!
//! | Method | Path           | Description                                  |
//! |--------|----------------|----------------------------------------------|
//! | GET    | `/health`      | Health check                                 |
//! | POST   | `/api/convert` | Upload an order export, download the manifest |
//! | POST   | `/api/preview` | Upload an order export, get manifest as JSON |
//! | GET    | `/api/logs`    | SSE stream for real-time logs                |

use std::{convert::Infallible, sync::Arc, time::Duration};

use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::{header, HeaderValue, Method, StatusCode},
    response::{sse::Event, IntoResponse, Json, Response, Sse},
    routing::{get, post},
    Router,
};
use futures::stream::Stream;
use serde_json::Value;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;

use super::logs::{log_error, log_info, log_success, LOG_BROADCASTER};
use super::types::{attachment_disposition, error_response, HealthResponse, PreviewResponse};
use crate::config::{Settings, MAX_UPLOAD_BYTES};
use crate::error::{ServerError, ServerResult};
use crate::transform::pipeline::{convert_bytes, ConvertedUpload, GenerateOptions};

type ApiError = (StatusCode, Json<Value>);

/// Name used when the upload carries no file name; the format is then sniffed.
const FALLBACK_UPLOAD_NAME: &str = "upload";

/// An uploaded order export
#[derive(Debug)]
pub struct Upload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Build the router with the given pipeline options.
///
/// Requests that take longer than `timeout` to answer get
/// `408 Request Timeout`. The log stream is unaffected once it has started.
pub fn router(options: GenerateOptions, timeout: Duration) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_TYPE, header::CONTENT_DISPOSITION]);

    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/api/convert", post(convert))
        .route("/api/preview", post(preview))
        .route("/api/logs", get(sse_logs))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(TimeoutLayer::new(timeout))
        .layer(cors)
        .with_state(Arc::new(options))
}

/// Start the HTTP server
pub async fn start_server(settings: Settings) -> Result<(), Box<dyn std::error::Error>> {
    let app = router(settings.generate_options(), settings.request_timeout);

    println!("WHX {} running on http://{}", env!("CARGO_PKG_VERSION"), settings.addr);
    println!("   POST /api/convert - Upload order export, download manifest");
    println!("   POST /api/preview - Upload order export, preview manifest");
    println!("   GET  /api/logs    - SSE log stream");
    println!("   GET  /health      - Health check");
    println!("   Mapping: {}", settings.mapping.describe());
    println!("   Request timeout: {}s", settings.request_timeout.as_secs());
    println!();

    let listener = tokio::net::TcpListener::bind(settings.addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Health check endpoint
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}

/// SSE endpoint for real-time log streaming
async fn sse_logs() -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = LOG_BROADCASTER.subscribe();

    let stream = BroadcastStream::new(rx).filter_map(|result| {
        let entry = result.ok()?;
        let json = serde_json::to_string(&entry).ok()?;
        Some(Ok(Event::default().data(json)))
    });

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

/// Convert and return the manifest as a file download
async fn convert(
    State(options): State<Arc<GenerateOptions>>,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    let upload = read_upload(multipart).await.map_err(reject)?;
    let converted = run_conversion(upload, options).await.map_err(reject)?;

    let disposition = HeaderValue::from_str(&attachment_disposition(&converted.file_name))
        .map_err(|e| reject(ServerError::Internal(e.to_string())))?;
    let headers = [
        (header::CONTENT_TYPE, HeaderValue::from_static(converted.format.content_type())),
        (header::CONTENT_DISPOSITION, disposition),
    ];
    Ok((headers, converted.bytes).into_response())
}

/// Convert and return the manifest as JSON with a full preview
async fn preview(
    State(options): State<Arc<GenerateOptions>>,
    multipart: Multipart,
) -> Result<Json<PreviewResponse>, ApiError> {
    let upload = read_upload(multipart).await.map_err(reject)?;
    let converted = run_conversion(upload, options).await.map_err(reject)?;
    Ok(Json(PreviewResponse::from(converted)))
}

/// Pull the `file` field out of a multipart body
async fn read_upload(mut multipart: Multipart) -> ServerResult<Upload> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServerError::BadRequest(format!("cannot read upload: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = upload_name(field.file_name());
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ServerError::BadRequest(format!("cannot read upload: {}", e)))?;
        return Ok(Upload {
            file_name,
            bytes: bytes.to_vec(),
        });
    }
    Err(ServerError::BadRequest("no file provided".to_string()))
}

/// Base name of the uploaded file, without any client-side directories.
pub fn upload_name(raw: Option<&str>) -> String {
    raw.and_then(|name| name.rsplit(['/', '\\']).next())
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or(FALLBACK_UPLOAD_NAME)
        .to_string()
}

async fn run_conversion(
    upload: Upload,
    options: Arc<GenerateOptions>,
) -> ServerResult<ConvertedUpload> {
    log_info(format!(
        "New upload: {} ({} bytes)",
        upload.file_name,
        upload.bytes.len()
    ));

    let converted = tokio::task::spawn_blocking(move || {
        convert_bytes(&upload.bytes, &upload.file_name, &options)
    })
    .await
    .map_err(|e| ServerError::Internal(e.to_string()))??;

    log_success(format!(
        "{} ready: {} rows, {} skipped",
        converted.file_name,
        converted.manifest.len(),
        converted.manifest.skipped.len()
    ));
    Ok(converted)
}

/// HTTP status for a server error
pub fn status_for(err: &ServerError) -> StatusCode {
    match err {
        ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
        ServerError::Pipeline(e) if e.is_input_error() => StatusCode::BAD_REQUEST,
        ServerError::Pipeline(_) | ServerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn reject(err: ServerError) -> ApiError {
    log_error(err.to_string());
    (status_for(&err), Json(error_response(&err.to_string())))
}
