pub mod problem;
pub mod stats;

use axum::{
    http::{Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};
use problem_vault_libs::api::{ApiIndex, ApiResponse};
use serde_json::{json, Value};
use std::{collections::BTreeMap, fmt::Display};

const SERVICE_NAME: &str = "Problem Vault Backend";
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Every failure a handler can answer with. Rendered as the common envelope.
#[derive(Debug)]
pub enum ApiError {
    BadRequest {
        error: String,
        message: Option<String>,
    },
    Unauthorized,
    Forbidden,
    NotFound {
        error: String,
        message: Option<String>,
    },
    TooManyRequests,
    Internal {
        error: String,
        message: String,
    },
}

impl ApiError {
    pub fn bad_request(error: impl ToString, message: impl ToString) -> Self {
        ApiError::BadRequest {
            error: error.to_string(),
            message: Some(message.to_string()),
        }
    }

    pub fn problem_not_found() -> Self {
        ApiError::NotFound {
            error: String::from("Problem not found"),
            message: None,
        }
    }

    /// Logs `fault` and hides its text from the client unless `development` is set.
    pub fn internal(error: impl ToString, fault: impl Display, development: bool) -> Self {
        let error = error.to_string();
        tracing::error!("{}: {}", error, fault);

        let message = if development {
            fault.to_string()
        } else {
            String::from("Something went wrong")
        };
        ApiError::Internal { error, message }
    }

    fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn into_envelope(self) -> ApiResponse<()> {
        match self {
            ApiError::BadRequest { error, message } | ApiError::NotFound { error, message } => {
                ApiResponse::error(error, message)
            }
            ApiError::Unauthorized => ApiResponse::error(
                "API key required",
                Some(String::from(
                    "Please provide API key in X-API-Key header or Authorization header",
                )),
            ),
            ApiError::Forbidden => ApiResponse::error(
                "Invalid API key",
                Some(String::from("The provided API key is invalid")),
            ),
            ApiError::TooManyRequests => ApiResponse::error(
                "Too many requests from this IP",
                Some(String::from("Please try again later")),
            ),
            ApiError::Internal { error, message } => ApiResponse::error(error, Some(message)),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, Json(self.into_envelope())).into_response()
    }
}

/// Service banner served outside `/api`.
pub async fn root() -> Json<Value> {
    Json(json!({
        "message": SERVICE_NAME,
        "version": VERSION,
        "status": "running",
        "apiEndpoint": "/api",
        "documentation": "Visit /api for API endpoints",
    }))
}

pub async fn api_index() -> Json<ApiIndex> {
    let endpoints = [
        ("GET /api/problems", "Get all problems (public)"),
        (
            "GET /api/problems?search=query",
            "Search problems by title, description, or solution",
        ),
        (
            "GET /api/problems?difficulty=easy&tags=array",
            "Filter problems by difficulty and tags",
        ),
        ("GET /api/problems/:id", "Get specific problem (public)"),
        ("POST /api/problems", "Create or update a problem (requires API key)"),
        ("GET /api/count", "Get problem count (public)"),
        ("GET /api/stats", "Get statistics (public)"),
    ];

    Json(ApiIndex {
        message: format!("{} API", SERVICE_NAME),
        version: String::from(VERSION),
        status: String::from("running"),
        endpoints: endpoints
            .into_iter()
            .map(|(endpoint, description)| (endpoint.to_string(), description.to_string()))
            .collect::<BTreeMap<_, _>>(),
    })
}

pub async fn fallback(method: Method, uri: Uri) -> ApiError {
    ApiError::NotFound {
        error: String::from("API route not found"),
        message: Some(format!("Cannot {} {}", method, uri.path())),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn internal_error_hides_fault_outside_development() {
        let hidden = ApiError::internal("Failed to save problem", "connection refused", false);
        let shown = ApiError::internal("Failed to save problem", "connection refused", true);

        let hidden = hidden.into_envelope();
        assert_eq!(hidden.error.as_deref(), Some("Failed to save problem"));
        assert_eq!(hidden.message.as_deref(), Some("Something went wrong"));
        assert_eq!(
            shown.into_envelope().message.as_deref(),
            Some("connection refused")
        );
    }

    #[test]
    fn statuses_follow_error_kind() {
        assert_eq!(ApiError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::Forbidden.status(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::problem_not_found().status(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::TooManyRequests.status(), StatusCode::TOO_MANY_REQUESTS);
    }
}
