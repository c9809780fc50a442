use axum::{
    Extension, Json,
    extract::State,
    http::{HeaderMap, header},
};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as B64;
use tracing::{error, info};
use uuid::Uuid;

use campus_types::api::{Claims, UploadRequest, UploadResponse};

use crate::auth::AppState;
use crate::error::{ApiError, ApiResult};
use crate::extract::JsonBody;

/// 8 MB limit for decoded images, same as the client enforces.
pub const MAX_IMAGE_BYTES: usize = 8 * 1024 * 1024;

/// Allowed MIME types and the extension each is stored under.
const ALLOWED_IMAGE_TYPES: &[(&str, &str)] = &[
    ("image/jpeg", ".jpg"),
    ("image/png", ".png"),
    ("image/webp", ".webp"),
    ("image/gif", ".gif"),
];

/// POST /upload: accepts `{ dataUrl: "data:image/png;base64,..." }`,
/// stores the decoded bytes under the uploads dir and returns a public URL.
pub async fn upload_image(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    headers: HeaderMap,
    JsonBody(req): JsonBody<UploadRequest>,
) -> ApiResult<Json<UploadResponse>> {
    let (mime, payload) = req
        .data_url
        .as_deref()
        .and_then(parse_data_url)
        .ok_or_else(|| ApiError::bad_request("Invalid dataUrl"))?;

    let ext = extension_for(&mime)
        .ok_or_else(|| ApiError::bad_request("Only jpg, png, webp, gif are allowed."))?;

    let bytes = B64
        .decode(payload)
        .map_err(|_| ApiError::bad_request("Invalid base64 data"))?;
    if bytes.is_empty() {
        return Err(ApiError::bad_request("Empty upload"));
    }
    if bytes.len() > MAX_IMAGE_BYTES {
        return Err(ApiError::bad_request("Image is too large (max 8MB)."));
    }

    let filename = format!("{}{}", Uuid::new_v4(), ext);
    let path = state.uploads_dir.join(&filename);

    // Ensure uploads directory exists
    tokio::fs::create_dir_all(&state.uploads_dir).await.map_err(|e| {
        error!("Failed to create uploads directory {}: {}", state.uploads_dir.display(), e);
        ApiError::Internal("Failed to store upload".into())
    })?;
    tokio::fs::write(&path, &bytes).await.map_err(|e| {
        error!("Failed to write upload {}: {}", path.display(), e);
        ApiError::Internal("Failed to store upload".into())
    })?;

    info!("{} uploaded {} ({} bytes)", claims.email, filename, bytes.len());

    Ok(Json(UploadResponse {
        file_url: format!("{}/uploads/{}", public_origin(&headers), filename),
    }))
}

/// Split `data:<mime>;base64,<payload>` into a lower-cased MIME type and the payload.
fn parse_data_url(data_url: &str) -> Option<(String, &str)> {
    let rest = data_url.strip_prefix("data:")?;
    let (mime, payload) = rest.split_once(";base64,")?;
    if mime.is_empty() || mime.contains(';') || payload.is_empty() {
        return None;
    }
    Some((mime.to_lowercase(), payload))
}

fn extension_for(mime: &str) -> Option<&'static str> {
    ALLOWED_IMAGE_TYPES
        .iter()
        .find(|(allowed, _)| *allowed == mime)
        .map(|(_, ext)| *ext)
}

/// `scheme://host` as seen by the client. The reverse proxy is trusted for the scheme.
fn public_origin(headers: &HeaderMap) -> String {
    let scheme = headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or("http");
    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("localhost");
    format!("{}://{}", scheme, host)
}
