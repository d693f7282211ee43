use crate::modules::{handlers::ApiError, settings::ServerConfig};
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use std::sync::Arc;

pub const API_KEY_HEADER: &str = "x-api-key";

/// Guard for write endpoints. Resolves only when the request carries the configured key,
/// either in `X-API-Key` or as `Authorization: Bearer <key>`.
///
/// Runs before the body is read, so a rejected request never reaches validation.
#[derive(Debug, Clone, Copy)]
pub struct RequireApiKey;

fn non_blank(value: &str) -> Option<&str> {
    let value = value.trim();
    (!value.is_empty()).then_some(value)
}

/// The credential a request presents. Blank values count as absent.
pub fn presented_key(headers: &HeaderMap) -> Option<&str> {
    let from_header = headers
        .get(API_KEY_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(non_blank);
    let from_bearer = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .and_then(non_blank);

    from_header.or(from_bearer)
}

#[async_trait]
impl<S> FromRequestParts<S> for RequireApiKey
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let presented = presented_key(&parts.headers).ok_or(ApiError::Unauthorized)?;

        let expected = parts
            .extensions
            .get::<Arc<ServerConfig>>()
            .and_then(|config| config.api_key.as_deref());

        match expected {
            Some(expected) if expected == presented => Ok(RequireApiKey),
            Some(_) => {
                tracing::warn!("rejected write with a mismatched API key");
                Err(ApiError::Forbidden)
            }
            None => {
                tracing::warn!("rejected write, no API key is configured on this server");
                Err(ApiError::Forbidden)
            }
        }
    }
}
