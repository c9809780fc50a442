use axum::{
    Extension, Json,
    extract::{Query, State},
};
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use campus_db::models::MessageRow;
use campus_db::{MessageFilter, now_timestamp};
use campus_types::api::{Claims, Message, SendMessageRequest};
use campus_types::models::{MAX_MESSAGE_LEN, clamp_text, is_student_email};

use crate::auth::AppState;
use crate::error::{ApiError, ApiResult};
use crate::extract::JsonBody;
use crate::{present, with_db};

#[derive(Debug, Default, Deserialize)]
pub struct MessageQuery {
    pub sender_email: Option<String>,
    pub receiver_email: Option<String>,
    pub listing_id: Option<String>,
}

/// GET /messages: only conversations the caller takes part in.
/// Query filters narrow that set further; they can never widen it.
pub async fn list_messages(
    State(state): State<AppState>,
    Query(query): Query<MessageQuery>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<Json<Vec<Message>>> {
    let filter = MessageFilter {
        sender_email: present(&query.sender_email).map(str::to_lowercase),
        receiver_email: present(&query.receiver_email).map(str::to_lowercase),
        listing_id: present(&query.listing_id).map(str::to_string),
    };

    let participant = claims.email.to_lowercase();
    let rows = with_db(&state, move |db| db.list_messages_for(&participant, &filter)).await?;

    Ok(Json(rows.into_iter().map(to_message).collect()))
}

pub async fn send_message(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    JsonBody(req): JsonBody<SendMessageRequest>,
) -> ApiResult<Json<Message>> {
    let (Some(listing_id), Some(receiver_email), Some(content)) = (
        present(&req.listing_id),
        present(&req.receiver_email),
        present(&req.content),
    ) else {
        return Err(ApiError::bad_request(
            "listing_id, receiver_email and content are required.",
        ));
    };

    let receiver_email = receiver_email.trim().to_lowercase();
    if receiver_email == claims.email.to_lowercase() {
        return Err(ApiError::bad_request("Cannot message yourself."));
    }
    if !is_student_email(&claims.email) {
        return Err(ApiError::forbidden("Only UFV students may send messages."));
    }

    let row = MessageRow {
        id: Uuid::new_v4().to_string(),
        listing_id: listing_id.to_string(),
        sender_email: claims.email.clone(),
        sender_name: claims.full_name.clone(),
        receiver_email,
        content: clamp_text(content, MAX_MESSAGE_LEN),
        read: false,
        created_date: now_timestamp(),
    };

    let stored = row.clone();
    with_db(&state, move |db| db.insert_message(&stored)).await?;
    info!("Message {} on listing {} from {}", row.id, row.listing_id, row.sender_email);

    Ok(Json(to_message(row)))
}

fn to_message(row: MessageRow) -> Message {
    Message {
        id: row.id.parse().unwrap_or_else(|e| {
            warn!("Corrupt message id '{}': {}", row.id, e);
            Uuid::default()
        }),
        created_date: row.created_date.parse().unwrap_or_else(|e| {
            warn!("Corrupt created_date '{}' on message '{}': {}", row.created_date, row.id, e);
            chrono::DateTime::default()
        }),
        listing_id: row.listing_id,
        sender_email: row.sender_email,
        sender_name: row.sender_name,
        receiver_email: row.receiver_email,
        content: row.content,
        read: row.read,
    }
}
