//! Client side of the ingest API.
//!
//! A [`SyncClient`] is built from one [`SyncConfig`] snapshot and keeps it for its whole
//! lifetime. To pick up a changed configuration, build a new client from the snapshot
//! returned by [`ConfigFile::store`].

pub mod config;
pub mod error;

pub use config::{ConfigFile, SyncConfig, DEFAULT_BASE_URL};
pub use error::{Outcome, Result, SyncError};

use crate::api::{
    ApiIndex, ApiResponse, Pagination, ProblemCount, ProblemListParameter, ProblemRecord,
    ProblemStats, ProblemSubmission,
};
use reqwest::{header::CONTENT_TYPE, Client, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

const API_KEY_HEADER: &str = "X-API-Key";

/// Result of a successful `POST /api/problems`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveOutcome {
    pub record: ProblemRecord,
    pub created: bool,
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProblemPage {
    pub problems: Vec<ProblemRecord>,
    pub pagination: Option<Pagination>,
    pub search_query: Option<String>,
}

#[derive(Debug)]
pub struct SyncClient {
    config: SyncConfig,
    base_url: Url,
    client: Client,
}

impl SyncClient {
    pub fn new(config: SyncConfig) -> Result<Self> {
        let base_url = Url::parse(config.base_url())?;
        if base_url.cannot_be_a_base() {
            return Err(SyncError::UnsupportedBaseUrl(base_url.to_string()));
        }

        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;

        Ok(Self {
            config,
            base_url,
            client,
        })
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// `<base>/api/<segments...>`
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| SyncError::UnsupportedBaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .push("api")
            .extend(segments);
        Ok(url)
    }

    pub async fn save_problem(&self, problem: &ProblemSubmission) -> Result<SaveOutcome> {
        let api_key = self.config.api_key().ok_or(SyncError::ApiKeyRequired)?;

        let url = self.endpoint(&["problems"])?;
        tracing::info!("submitting {:?} to {}", problem.url, url);
        let res = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .header(API_KEY_HEADER, api_key)
            .json(problem)
            .send()
            .await?;

        let created = res.status() == StatusCode::CREATED;
        let body: ApiResponse<ProblemRecord> = read_envelope(res).await?;
        let record = body.data.ok_or(SyncError::MissingData("problem"))?;

        Ok(SaveOutcome {
            record,
            created,
            message: body.message,
        })
    }

    pub async fn get_problems(&self, filters: &ProblemListParameter) -> Result<ProblemPage> {
        let url = self.endpoint(&["problems"])?;
        let res = self.client.get(url).query(filters).send().await?;
        let body: ApiResponse<Vec<ProblemRecord>> = read_envelope(res).await?;

        Ok(ProblemPage {
            problems: body.data.unwrap_or_default(),
            pagination: body.pagination,
            search_query: body.search_query,
        })
    }

    pub async fn get_problem(&self, id: i64) -> Result<ProblemRecord> {
        let id = id.to_string();
        let url = self.endpoint(&["problems", id.as_str()])?;
        let res = self.client.get(url).send().await?;
        let body: ApiResponse<ProblemRecord> = read_envelope(res).await?;

        body.data.ok_or(SyncError::MissingData("problem"))
    }

    pub async fn get_stats(&self) -> Result<ProblemStats> {
        let url = self.endpoint(&["stats"])?;
        let res = self.client.get(url).send().await?;
        let body: ApiResponse<ProblemStats> = read_envelope(res).await?;

        body.data.ok_or(SyncError::MissingData("statistics"))
    }

    pub async fn get_problem_count(&self) -> Result<u64> {
        let url = self.endpoint(&["count"])?;
        let res = self.client.get(url).send().await?;
        let body: ApiResponse<ProblemCount> = read_envelope(res).await?;

        Ok(body.data.map(|data| data.count).unwrap_or(0))
    }

    pub async fn test_connection(&self) -> Result<ApiIndex> {
        let url = self.endpoint(&[""])?;
        let res = self.client.get(url).send().await?;
        let status = res.status();
        let body = res.text().await?;
        if !status.is_success() {
            return Err(SyncError::Api {
                status: status.as_u16(),
                message: format!("HTTP {}", status.as_u16()),
            });
        }

        Ok(serde_json::from_str(&body)?)
    }
}

/// Decodes an envelope, turning non-success statuses into [`SyncError::Api`] with the
/// server provided message when there is one.
async fn read_envelope<T: DeserializeOwned>(res: Response) -> Result<ApiResponse<T>> {
    let status = res.status();
    let body = res.text().await?;

    if status.is_success() {
        return Ok(serde_json::from_str(&body)?);
    }

    let message = match serde_json::from_str::<ApiResponse<Value>>(&body) {
        Ok(envelope) => envelope.message.unwrap_or_else(|| {
            format!(
                "HTTP {}: {}",
                status.as_u16(),
                envelope.error.unwrap_or_default()
            )
        }),
        Err(_) => format!("HTTP {}", status.as_u16()),
    };
    tracing::warn!("backend answered {}: {}", status, message);

    Err(SyncError::Api {
        status: status.as_u16(),
        message,
    })
}
