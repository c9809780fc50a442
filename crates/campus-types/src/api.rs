use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Campus, Condition, ListingStatus};

// -- JWT Claims --

/// Session token payload. Shared by the login handler that signs it and the
/// bearer middleware that verifies it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub email_verified: bool,
    pub exp: usize,
}

// -- Auth --
//
// Required fields are still `Option` so a missing field produces the same
// JSON error body as an empty one instead of an extractor rejection.

#[derive(Debug, Default, Deserialize)]
pub struct SignupRequest {
    pub email: Option<String>,
    pub name: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SignupResponse {
    pub ok: bool,
    #[serde(rename = "verifyUrl")]
    pub verify_url: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct VerifyEmailRequest {
    pub email: Option<String>,
    pub token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserProfile,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub email_verified: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OkResponse {
    pub ok: bool,
}

impl OkResponse {
    pub fn ok() -> Self {
        Self { ok: true }
    }
}

// -- Uploads --

#[derive(Debug, Default, Deserialize)]
pub struct UploadRequest {
    #[serde(rename = "dataUrl")]
    pub data_url: Option<String>,
    /// Accepted for client compatibility; stored names are always generated.
    pub filename: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub file_url: String,
}

// -- Listings --

#[derive(Debug, Default, Deserialize)]
pub struct CreateListingRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    /// Number or numeric string, checked by the handler.
    pub price: Option<serde_json::Value>,
    pub category: Option<String>,
    pub condition: Option<String>,
    pub campus: Option<String>,
    pub images: Option<Vec<String>>,
    pub location: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateListingRequest {
    pub status: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Listing {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub price: f64,
    pub category: String,
    pub condition: Condition,
    pub campus: Campus,
    pub images: Vec<String>,
    pub seller_name: String,
    pub seller_email: String,
    pub status: ListingStatus,
    pub location: String,
    pub created_date: DateTime<Utc>,
}

// -- Messages --

#[derive(Debug, Default, Deserialize)]
pub struct SendMessageRequest {
    pub listing_id: Option<String>,
    pub receiver_email: Option<String>,
    pub content: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub listing_id: String,
    pub sender_email: String,
    pub sender_name: String,
    pub receiver_email: String,
    pub content: String,
    pub read: bool,
    pub created_date: DateTime<Utc>,
}

// -- Reports --

#[derive(Debug, Default, Deserialize)]
pub struct CreateReportRequest {
    pub listing_id: Option<String>,
    pub reason: Option<String>,
}
