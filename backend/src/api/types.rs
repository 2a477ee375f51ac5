//! REST API types.

use base64::Engine as _;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::models::SkippedRow;
use crate::transform::pipeline::{ConvertedUpload, Preview};

/// Response of `POST /api/preview`.
///
/// Carries the rendered manifest so the client can offer the download
/// without converting a second time.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewResponse {
    /// Unique job identifier
    pub job_id: String,

    /// Download name of the manifest
    pub filename: String,

    /// Manifest file, base64 encoded
    pub file: String,

    /// Number of manifest data rows
    pub row_count: usize,

    /// Input rows left out because SKU or quantity was empty
    pub skipped: Vec<SkippedRow>,

    pub generated_at: DateTime<Utc>,

    /// Every manifest row, padded to the header width
    pub preview: Preview,
}

impl From<ConvertedUpload> for PreviewResponse {
    fn from(upload: ConvertedUpload) -> Self {
        let preview = Preview::from_manifest(&upload.manifest);

        PreviewResponse {
            job_id: Uuid::new_v4().to_string(),
            file: base64::engine::general_purpose::STANDARD.encode(&upload.bytes),
            filename: upload.file_name,
            row_count: upload.manifest.len(),
            skipped: upload.manifest.skipped,
            generated_at: Utc::now(),
            preview,
        }
    }
}

/// Body of `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub endpoints: Value,
}

impl HealthResponse {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            service: "whx".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            endpoints: json!({
                "convert": "POST /api/convert",
                "preview": "POST /api/preview",
                "logs": "GET /api/logs (SSE)"
            }),
        }
    }
}

/// Create an error response
pub fn error_response(error: &str) -> Value {
    json!({
        "jobId": Uuid::new_v4().to_string(),
        "status": "error",
        "error": error,
    })
}

/// `Content-Disposition` value for a download, with an ASCII fallback name
/// and the exact UTF-8 name.
pub fn attachment_disposition(file_name: &str) -> String {
    let fallback: String = file_name
        .chars()
        .map(|c| match c {
            ' ' => c,
            '"' | '\\' => '_',
            c if c.is_ascii_graphic() => c,
            _ => '_',
        })
        .collect();
    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback,
        urlencoding::encode(file_name)
    )
}
