use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
};
use serde::de::DeserializeOwned;

use crate::error::{ApiError, ApiResult};

/// JSON request body whose failures answer as `{ "error": .. }`.
///
/// An empty body, or one sent without a JSON content type, reads as `T::default()`
/// so missing fields get the handler's own validation message.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Default + Send,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state).await?;
        parse_body(&bytes).map(JsonBody)
    }
}

/// Decode a raw body. Used directly where the body must only be read after
/// an authorization check.
pub fn parse_body<T>(bytes: &[u8]) -> ApiResult<T>
where
    T: DeserializeOwned + Default,
{
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(bytes).map_err(|e| ApiError::bad_request(format!("Invalid JSON body: {}", e)))
}
