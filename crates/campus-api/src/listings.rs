use axum::{
    Extension, Json,
    body::Bytes,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

use campus_db::models::ListingRow;
use campus_db::{ListingFilter, now_timestamp};
use campus_types::api::{Claims, CreateListingRequest, Listing, OkResponse, UpdateListingRequest};
use campus_types::models::{
    Campus, Condition, ListingStatus, MAX_LISTING_IMAGES, MIN_TITLE_LEN,
};

use crate::auth::AppState;
use crate::error::{ApiError, ApiResult};
use crate::extract::{JsonBody, parse_body};
use crate::{present, with_db};

#[derive(Debug, Default, Deserialize)]
pub struct ListingQuery {
    pub id: Option<String>,
    pub status: Option<String>,
    pub seller_email: Option<String>,
}

/// GET /listings: public feed, newest first.
pub async fn list_listings(
    State(state): State<AppState>,
    Query(query): Query<ListingQuery>,
) -> ApiResult<Json<Vec<Listing>>> {
    let filter = ListingFilter {
        id: present(&query.id).map(str::to_string),
        status: present(&query.status).map(str::to_string),
        seller_email: present(&query.seller_email).map(str::to_string),
    };

    let rows = with_db(&state, move |db| db.list_listings(&filter)).await?;
    Ok(Json(rows.into_iter().map(to_listing).collect()))
}

pub async fn create_listing(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    JsonBody(req): JsonBody<CreateListingRequest>,
) -> ApiResult<Json<Listing>> {
    let title = req.title.as_deref().map(str::trim).unwrap_or_default();
    if title.chars().count() < MIN_TITLE_LEN {
        return Err(ApiError::bad_request(format!(
            "Title is required (min {} chars).",
            MIN_TITLE_LEN
        )));
    }
    let price = parse_price(req.price.as_ref())
        .ok_or_else(|| ApiError::bad_request("Price must be a non-negative number."))?;
    let category = present(&req.category)
        .ok_or_else(|| ApiError::bad_request("Category is required."))?;
    let campus = req
        .campus
        .as_deref()
        .and_then(Campus::parse)
        .ok_or_else(|| ApiError::bad_request("Campus must be abbotsford or chilliwack."))?;
    let condition = match present(&req.condition) {
        Some(c) => Condition::parse(c).ok_or_else(|| ApiError::bad_request("Invalid condition."))?,
        None => Condition::default(),
    };
    let images = req.images.clone().unwrap_or_default();
    if images.len() > MAX_LISTING_IMAGES {
        return Err(ApiError::bad_request(format!(
            "At most {} images are allowed.",
            MAX_LISTING_IMAGES
        )));
    }

    let row = ListingRow {
        id: Uuid::new_v4().to_string(),
        title: title.to_string(),
        description: req.description.as_deref().unwrap_or_default().trim().to_string(),
        price,
        category: category.to_string(),
        condition: condition.as_str().to_string(),
        campus: campus.as_str().to_string(),
        images: serde_json::to_string(&images).map_err(anyhow::Error::from)?,
        seller_name: claims.full_name.clone(),
        seller_email: claims.email.clone(),
        status: ListingStatus::Active.as_str().to_string(),
        location: req.location.as_deref().unwrap_or_default().trim().to_string(),
        created_date: now_timestamp(),
    };

    let stored = row.clone();
    with_db(&state, move |db| db.insert_listing(&stored)).await?;
    info!("{} listed '{}' ({})", claims.email, row.title, row.id);

    Ok(Json(to_listing(row)))
}

/// PATCH /listings/{id}: owner-only status change.
///
/// The body stays raw until ownership is settled, so a stranger gets 403
/// whatever they sent.
pub async fn update_listing(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(claims): Extension<Claims>,
    body: Bytes,
) -> ApiResult<Json<Listing>> {
    let mut row = owned_listing(&state, &id, &claims).await?;
    let req: UpdateListingRequest = parse_body(&body)?;

    if let Some(status) = present(&req.status) {
        let status = ListingStatus::parse(status)
            .ok_or_else(|| ApiError::bad_request("Invalid status."))?;
        let listing_id = id.clone();
        with_db(&state, move |db| db.update_listing_status(&listing_id, status.as_str())).await?;
        row.status = status.as_str().to_string();
    }

    Ok(Json(to_listing(row)))
}

/// DELETE /listings/{id}: owner-only.
pub async fn delete_listing(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<Json<OkResponse>> {
    owned_listing(&state, &id, &claims).await?;

    let listing_id = id.clone();
    with_db(&state, move |db| db.delete_listing(&listing_id)).await?;
    info!("{} deleted listing {}", claims.email, id);

    Ok(Json(OkResponse::ok()))
}

/// Load a listing and check the caller sold it. Runs before any payload validation.
async fn owned_listing(state: &AppState, id: &str, claims: &Claims) -> ApiResult<ListingRow> {
    let lookup = id.to_string();
    let row = with_db(state, move |db| db.get_listing(&lookup))
        .await?
        .ok_or_else(|| ApiError::not_found("Listing not found."))?;

    if !row.seller_email.eq_ignore_ascii_case(&claims.email) {
        return Err(ApiError::forbidden("Not your listing."));
    }
    Ok(row)
}

/// Accepts a JSON number or a numeric string; rejects negatives and non-finite values.
fn parse_price(value: Option<&Value>) -> Option<f64> {
    let price = match value? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    (price.is_finite() && price >= 0.0).then_some(price)
}

fn to_listing(row: ListingRow) -> Listing {
    Listing {
        id: row.id.parse().unwrap_or_else(|e| {
            warn!("Corrupt listing id '{}': {}", row.id, e);
            Uuid::default()
        }),
        condition: Condition::parse(&row.condition).unwrap_or_else(|| {
            warn!("Unknown condition '{}' on listing '{}'", row.condition, row.id);
            Condition::default()
        }),
        campus: Campus::parse(&row.campus).unwrap_or_else(|| {
            warn!("Unknown campus '{}' on listing '{}'", row.campus, row.id);
            Campus::Abbotsford
        }),
        status: ListingStatus::parse(&row.status).unwrap_or_else(|| {
            warn!("Unknown status '{}' on listing '{}'", row.status, row.id);
            ListingStatus::default()
        }),
        images: serde_json::from_str(&row.images).unwrap_or_else(|e| {
            warn!("Corrupt images on listing '{}': {}", row.id, e);
            Vec::new()
        }),
        created_date: row.created_date.parse().unwrap_or_else(|e| {
            warn!("Corrupt created_date '{}' on listing '{}': {}", row.created_date, row.id, e);
            chrono::DateTime::default()
        }),
        title: row.title,
        description: row.description,
        price: row.price,
        category: row.category,
        seller_name: row.seller_name,
        seller_email: row.seller_email,
        location: row.location,
    }
}
