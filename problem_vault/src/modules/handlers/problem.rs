use crate::modules::{
    auth::RequireApiKey,
    handlers::ApiError,
    settings::ServerConfig,
    store::SharedStore,
};
use axum::{
    async_trait,
    extract::{rejection::JsonRejection, Extension, FromRequestParts, Path},
    http::StatusCode,
    Json,
};
use http::request::Parts;
use problem_vault_libs::api::{
    ApiResponse, NewProblem, Pagination, ProblemListParameter, ProblemRecord, ProblemSubmission,
};
use std::sync::Arc;
use tokio::time::Instant;
use validator::Validate;

/// Query string of the listing endpoint, parsed and validated.
pub struct ValidatedListParameter(pub ProblemListParameter);

#[async_trait]
impl<S> FromRequestParts<S> for ValidatedListParameter
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let query = parts.uri.query().unwrap_or_default();
        let params: ProblemListParameter =
            serde_urlencoded::from_str(query).map_err(|rejection| {
                tracing::error!("Parsing error: {}", rejection);
                ApiError::bad_request(
                    "Invalid query parameters",
                    format!("invalid format query string: [{}]", rejection),
                )
            })?;

        params.validate().map_err(|rejection| {
            tracing::error!("Validation error: {}", rejection);
            ApiError::bad_request(
                "Invalid query parameters",
                format!("Validation error: [{}]", rejection).replace('\n', ", "),
            )
        })?;

        Ok(ValidatedListParameter(params))
    }
}

pub async fn list_problems(
    ValidatedListParameter(params): ValidatedListParameter,
    Extension(store): Extension<SharedStore>,
    Extension(config): Extension<Arc<ServerConfig>>,
) -> Result<Json<ApiResponse<Vec<ProblemRecord>>>, ApiError> {
    let start_process = Instant::now();

    let listing = store
        .list(&params)
        .await
        .map_err(|e| ApiError::internal("Failed to fetch problems", e, config.development))?;

    let time = Instant::now().duration_since(start_process).as_millis();
    tracing::info!(
        target: "querylog",
        "elapsed_time={} hits={} params={}",
        time, listing.total, serde_json::to_string(&params).unwrap_or(String::from(""))
    );

    let pagination = Pagination::new(params.page(), params.limit(), listing.total);
    let search_query = params.search().map(String::from);

    Ok(Json(
        ApiResponse::ok(listing.problems)
            .with_pagination(pagination)
            .with_search_query(search_query),
    ))
}

pub async fn get_problem(
    Path(id): Path<String>,
    Extension(store): Extension<SharedStore>,
    Extension(config): Extension<Arc<ServerConfig>>,
) -> Result<Json<ApiResponse<ProblemRecord>>, ApiError> {
    // ids are store-assigned integers, anything else cannot name a record
    let Ok(id) = id.parse::<i64>() else {
        return Err(ApiError::problem_not_found());
    };

    let record = store
        .get(id)
        .await
        .map_err(|e| ApiError::internal("Failed to fetch problem", e, config.development))?
        .ok_or_else(ApiError::problem_not_found)?;

    Ok(Json(ApiResponse::ok(record)))
}

pub async fn upsert_problem(
    _: RequireApiKey,
    Extension(store): Extension<SharedStore>,
    Extension(config): Extension<Arc<ServerConfig>>,
    payload: Result<Json<ProblemSubmission>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<ProblemRecord>>), ApiError> {
    let Json(submission) = payload.map_err(|rejection| {
        tracing::error!("Parsing error: {}", rejection);
        ApiError::bad_request("Invalid request body", rejection.body_text())
    })?;

    let problem = NewProblem::try_from(submission).map_err(|rejection| {
        tracing::warn!("Validation error: {}", rejection);
        ApiError::bad_request(
            "Missing required fields",
            "title, url, and difficulty are required",
        )
    })?;

    let url = problem.url.clone();
    let upserted = store
        .upsert(problem)
        .await
        .map_err(|e| ApiError::internal("Failed to save problem", e, config.development))?;

    let (status, message) = if upserted.is_created() {
        (StatusCode::CREATED, "Problem saved successfully")
    } else {
        (StatusCode::OK, "Problem updated successfully")
    };
    tracing::info!("{} ({})", message, url);

    Ok((
        status,
        Json(ApiResponse::ok(upserted.into_record()).with_message(message)),
    ))
}
