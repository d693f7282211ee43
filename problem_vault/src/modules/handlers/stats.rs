use crate::modules::{handlers::ApiError, settings::ServerConfig, store::SharedStore};
use axum::{extract::Extension, Json};
use problem_vault_libs::api::{ApiResponse, ProblemCount, ProblemStats};
use std::sync::Arc;

pub async fn count_problems(
    Extension(store): Extension<SharedStore>,
    Extension(config): Extension<Arc<ServerConfig>>,
) -> Result<Json<ApiResponse<ProblemCount>>, ApiError> {
    let count = store.count().await.map_err(|e| {
        ApiError::internal("Failed to fetch problem count", e, config.development)
    })?;

    Ok(Json(ApiResponse::ok(ProblemCount { count })))
}

pub async fn problem_stats(
    Extension(store): Extension<SharedStore>,
    Extension(config): Extension<Arc<ServerConfig>>,
) -> Result<Json<ApiResponse<ProblemStats>>, ApiError> {
    let stats = store
        .stats()
        .await
        .map_err(|e| ApiError::internal("Failed to fetch statistics", e, config.development))?;

    Ok(Json(ApiResponse::ok(stats)))
}
