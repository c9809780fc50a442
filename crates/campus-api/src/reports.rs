use axum::{Extension, Json, extract::State};
use uuid::Uuid;

use campus_db::models::ReportRow;
use campus_db::now_timestamp;
use campus_types::api::{Claims, CreateReportRequest, OkResponse};
use campus_types::models::{MAX_REPORT_REASON_LEN, clamp_text};

use crate::auth::AppState;
use crate::error::{ApiError, ApiResult};
use crate::extract::JsonBody;
use crate::{present, with_db};

/// POST /reports: write-only; moderators read the table directly.
pub async fn create_report(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    JsonBody(req): JsonBody<CreateReportRequest>,
) -> ApiResult<Json<OkResponse>> {
    let (Some(listing_id), Some(reason)) = (present(&req.listing_id), present(&req.reason)) else {
        return Err(ApiError::bad_request("listing_id and reason are required."));
    };

    let report = ReportRow {
        id: Uuid::new_v4().to_string(),
        listing_id: listing_id.to_string(),
        reporter_email: claims.email.clone(),
        reason: clamp_text(reason, MAX_REPORT_REASON_LEN),
        created_date: now_timestamp(),
    };

    let stored = report.clone();
    with_db(&state, move |db| db.insert_report(&stored)).await?;
    tracing::info!(
        report_id = %report.id,
        listing_id = %report.listing_id,
        reporter = %report.reporter_email,
        reason = %report.reason,
        "New report"
    );

    Ok(Json(OkResponse::ok()))
}
