//! Capture agent: reads a problem and the user's latest accepted solution from the
//! source site and assembles them into one payload for the ingest API.
//!
//! Every request is read-only and authenticated with the user's own session.

pub mod graphql;
pub mod strategy;

use self::{
    graphql::{GraphQlRequest, GraphQlResponse, Question, QuestionData},
    strategy::{LatestSubmission, Solution, SolutionStrategy},
};
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use problem_vault_libs::{api::ProblemSubmission, normalize::problem_slug};
use regex::Regex;
use reqwest::{
    header::{CONTENT_TYPE, COOKIE, REFERER},
    Client, RequestBuilder, Url,
};
use serde::Serialize;
use std::{env, time::Duration};
use thiserror::Error;

pub const DEFAULT_SOURCE_HOST: &str = "https://leetcode.com";
pub const DEFAULT_LANGUAGE: &str = "java";

static BARE_SLUG: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").unwrap());

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("`{0}` is neither a problem slug nor a problem page URL")]
    NotAProblemPage(String),
    #[error("invalid source host: {0}")]
    InvalidHost(#[from] url::ParseError),
    #[error("request to the source site failed: {0}")]
    Network(#[from] reqwest::Error),
    #[error("API request failed: {status} ({url})")]
    Status { url: String, status: u16 },
    #[error("source site reported errors: {0}")]
    GraphQl(String),
    #[error("No question data found for `{0}`")]
    QuestionNotFound(String),
    #[error("unexpected response from the source site: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Session of the user on the source site.
#[derive(Debug, Clone, Default)]
pub struct SourceSession {
    pub csrf_token: Option<String>,
    pub session_cookie: Option<String>,
}

impl SourceSession {
    /// `LEETCODE_CSRF_TOKEN` and `LEETCODE_SESSION`.
    pub fn from_env() -> Self {
        let read = |name: &str| env::var(name).ok().filter(|value| !value.trim().is_empty());
        let session = Self {
            csrf_token: read("LEETCODE_CSRF_TOKEN"),
            session_cookie: read("LEETCODE_SESSION"),
        };
        if session.session_cookie.is_none() {
            tracing::warn!("LEETCODE_SESSION environment variable is not set. Submissions will not be readable.");
        }
        session
    }

    fn cookie(&self) -> Option<String> {
        let cookies: Vec<String> = [
            ("LEETCODE_SESSION", &self.session_cookie),
            ("csrftoken", &self.csrf_token),
        ]
        .into_iter()
        .filter_map(|(name, value)| value.as_ref().map(|value| format!("{}={}", name, value)))
        .collect();

        (!cookies.is_empty()).then(|| cookies.join("; "))
    }
}

/// HTTP access to the source site with the session attached to every request.
pub struct SourceClient {
    client: Client,
    host: Url,
    session: SourceSession,
}

impl SourceClient {
    pub fn new(host: &str, session: SourceSession) -> Result<Self, CaptureError> {
        let mut host = Url::parse(host)?;
        if !host.path().ends_with('/') {
            let path = format!("{}/", host.path());
            host.set_path(&path);
        }
        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;

        Ok(Self {
            client,
            host,
            session,
        })
    }

    pub fn endpoint(&self, path: &str) -> Result<Url, CaptureError> {
        Ok(self.host.join(path)?)
    }

    pub fn problem_url(&self, slug: &str) -> Result<Url, CaptureError> {
        self.endpoint(&format!("problems/{}/", slug))
    }

    fn with_session(&self, builder: RequestBuilder, slug: &str) -> RequestBuilder {
        let mut builder = builder.header(
            "X-CSRFToken",
            self.session.csrf_token.as_deref().unwrap_or_default(),
        );
        if let Ok(referer) = self.problem_url(slug) {
            builder = builder.header(REFERER, referer.as_str());
        }
        if let Some(cookie) = self.session.cookie() {
            builder = builder.header(COOKIE, cookie);
        }
        builder
    }

    pub fn get(&self, url: Url, slug: &str) -> RequestBuilder {
        self.with_session(
            self.client
                .get(url)
                .header("accept", "*/*")
                .header(CONTENT_TYPE, "application/json"),
            slug,
        )
    }

    pub fn post(&self, url: Url, slug: &str) -> RequestBuilder {
        self.with_session(self.client.post(url), slug)
    }
}

/// Everything captured for one problem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CapturePayload {
    pub id: String,
    pub title: String,
    pub title_slug: String,
    pub url: String,
    pub difficulty: String,
    pub description: String,
    pub tags: Vec<String>,
    pub hints: Vec<String>,
    pub test_cases: Vec<String>,
    pub solution: String,
    pub solution_language: String,
    pub submission_status: String,
    pub captured_at: DateTime<Utc>,
}

impl CapturePayload {
    /// Body for `POST /api/problems`.
    pub fn to_submission(&self) -> ProblemSubmission {
        ProblemSubmission {
            title: Some(self.title.clone()),
            url: Some(self.url.clone()),
            difficulty: Some(self.difficulty.clone()),
            description: self.description.clone(),
            solution: self.solution.clone(),
            test_cases: self.test_cases.clone(),
            tags: self.tags.clone(),
            user_id: None,
            user_email: String::new(),
        }
    }
}

/// The problem slug named by `target`, a bare slug or any problem page URL.
pub fn resolve_slug(target: &str) -> Result<String, CaptureError> {
    let target = target.trim();
    if let Some(slug) = problem_slug(target) {
        return Ok(slug);
    }
    if BARE_SLUG.is_match(target) {
        return Ok(target.to_string());
    }
    Err(CaptureError::NotAProblemPage(target.to_string()))
}

pub struct CaptureAgent {
    source: SourceClient,
    strategies: Vec<Box<dyn SolutionStrategy>>,
    default_language: String,
}

impl CaptureAgent {
    pub fn new(
        source: SourceClient,
        strategies: Vec<Box<dyn SolutionStrategy>>,
        default_language: &str,
    ) -> Self {
        Self {
            source,
            strategies,
            default_language: default_language.to_string(),
        }
    }

    /// One [`LatestSubmission`] strategy per language, tried in the given order.
    pub fn with_languages(source: SourceClient, languages: &[String]) -> Self {
        let strategies = languages
            .iter()
            .map(|language| Box::new(LatestSubmission::new(language)) as Box<dyn SolutionStrategy>)
            .collect();
        let default_language = languages
            .first()
            .map(String::as_str)
            .unwrap_or(DEFAULT_LANGUAGE);

        Self::new(source, strategies, default_language)
    }

    pub async fn fetch_question(&self, slug: &str) -> Result<Question, CaptureError> {
        let url = self.source.endpoint("graphql/")?;
        tracing::info!("fetching question detail of {}", slug);

        let res = self
            .source
            .post(url.clone(), slug)
            .json(&GraphQlRequest::question_detail(slug))
            .send()
            .await?;

        match res.error_for_status_ref() {
            Ok(_) => {}
            Err(e) => {
                let status = e.status().map(|status| status.as_u16()).unwrap_or_default();
                tracing::error!("error response returned from the source site: {:?}", e);
                return Err(CaptureError::Status {
                    url: url.to_string(),
                    status,
                });
            }
        };

        let body: GraphQlResponse<QuestionData> = serde_json::from_str(&res.text().await?)?;
        if let Some(question) = body.data.and_then(|data| data.question) {
            return Ok(question);
        }
        if !body.errors.is_empty() {
            let messages: Vec<String> = body.errors.into_iter().map(|e| e.message).collect();
            return Err(CaptureError::GraphQl(messages.join("; ")));
        }
        Err(CaptureError::QuestionNotFound(slug.to_string()))
    }

    /// First non-empty solution among the strategies. Failing strategies are skipped.
    pub async fn fetch_solution(&self, question: &Question) -> Option<Solution> {
        for strategy in self.strategies.iter() {
            match strategy.fetch(&self.source, question).await {
                Ok(Some(solution)) => {
                    tracing::info!("solution found by {}", strategy.name());
                    return Some(solution);
                }
                Ok(None) => tracing::debug!("{} found nothing", strategy.name()),
                Err(e) => tracing::warn!("{} failed: {}", strategy.name(), e),
            }
        }

        tracing::warn!("No solution found for {}", question.title_slug);
        None
    }

    /// Captures the problem named by `target`. A missing solution leaves the solution
    /// fields empty; anything wrong with the metadata aborts the capture.
    pub async fn capture(&self, target: &str) -> Result<CapturePayload, CaptureError> {
        let slug = resolve_slug(target)?;
        let question = self.fetch_question(&slug).await?;
        let solution = self.fetch_solution(&question).await;
        let url = self.source.problem_url(&question.title_slug)?;

        let (solution, solution_language, submission_status) = match solution {
            Some(solution) => (
                solution.code,
                solution.language,
                solution.status.unwrap_or_else(|| String::from("Unknown")),
            ),
            None => (
                String::new(),
                self.default_language.clone(),
                String::from("Unknown"),
            ),
        };

        Ok(CapturePayload {
            id: question.question_frontend_id,
            title: question.title,
            title_slug: question.title_slug,
            url: url.to_string(),
            difficulty: question.difficulty,
            description: question.content,
            tags: question.topic_tags.into_iter().map(|tag| tag.name).collect(),
            hints: question.hints,
            test_cases: question.example_testcase_list,
            solution,
            solution_language,
            submission_status,
            captured_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use axum::{
        extract::Query,
        http::{HeaderMap, StatusCode},
        routing, Json, Router,
    };
    use serde_json::{json, Value};
    use std::{
        collections::HashMap,
        net::{SocketAddr, TcpListener},
    };

    async fn graphql(headers: HeaderMap, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
        if headers.get("x-csrftoken").and_then(|v| v.to_str().ok()) != Some("token") {
            return (StatusCode::FORBIDDEN, Json(json!({})));
        }
        let question = match body["variables"]["titleSlug"].as_str() {
            Some("two-sum") => json!({
                "title": "Two Sum",
                "titleSlug": "two-sum",
                "questionFrontendId": "1",
                "content": "<p>Given an array of integers...</p>",
                "difficulty": "Easy",
                "topicTags": [{"name": "Array"}, {"name": "Hash Table"}],
                "hints": ["Use a map."],
                "exampleTestcaseList": ["[2,7,11,15]\n9", "[3,2,4]\n6"]
            }),
            _ => Value::Null,
        };
        (StatusCode::OK, Json(json!({"data": {"question": question}})))
    }

    async fn latest(Query(query): Query<HashMap<String, String>>) -> (StatusCode, Json<Value>) {
        match query.get("lang").map(String::as_str) {
            Some("python3") => (
                StatusCode::OK,
                Json(json!({"code": "class Solution: pass", "status_display": "Accepted"})),
            ),
            Some("java") => (StatusCode::OK, Json(json!({"code": ""}))),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({}))),
        }
    }

    async fn spawn() -> String {
        let app = Router::new()
            .route("/graphql/", routing::post(graphql))
            .route("/submissions/latest/", routing::get(latest));
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr: SocketAddr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::Server::from_tcp(listener)
                .unwrap()
                .serve(app.into_make_service())
                .await
                .unwrap();
        });
        format!("http://{}", addr)
    }

    fn session() -> SourceSession {
        SourceSession {
            csrf_token: Some(String::from("token")),
            session_cookie: Some(String::from("cookie")),
        }
    }

    fn languages(languages: &[&str]) -> Vec<String> {
        languages.iter().map(|language| language.to_string()).collect()
    }

    #[test]
    fn resolves_slugs_and_urls() {
        assert_eq!(resolve_slug("two-sum").unwrap(), "two-sum");
        assert_eq!(
            resolve_slug("https://leetcode.com/problems/two-sum/description/").unwrap(),
            "two-sum"
        );
        assert!(matches!(
            resolve_slug("https://leetcode.com/problemset/"),
            Err(CaptureError::NotAProblemPage(_))
        ));
        assert!(resolve_slug("Two Sum").is_err());
    }

    #[test]
    fn cookie_joins_present_values() {
        assert_eq!(
            session().cookie().as_deref(),
            Some("LEETCODE_SESSION=cookie; csrftoken=token")
        );
        assert_eq!(SourceSession::default().cookie(), None);
    }

    #[tokio::test]
    async fn falls_through_languages_until_one_has_code() {
        let host = spawn().await;
        let source = SourceClient::new(&host, session()).unwrap();
        let agent = CaptureAgent::with_languages(source, &languages(&["cpp", "java", "python3"]));

        let payload = agent.capture("two-sum").await.unwrap();

        assert_eq!(payload.id, "1");
        assert_eq!(payload.url, format!("{}/problems/two-sum/", host));
        assert_eq!(payload.tags, vec!["Array", "Hash Table"]);
        assert_eq!(payload.test_cases.len(), 2);
        assert_eq!(payload.solution, "class Solution: pass");
        assert_eq!(payload.solution_language, "python3");
        assert_eq!(payload.submission_status, "Accepted");
    }

    #[tokio::test]
    async fn missing_solution_is_tolerated() {
        let host = spawn().await;
        let source = SourceClient::new(&host, session()).unwrap();
        let agent = CaptureAgent::with_languages(source, &languages(&["java", "cpp"]));

        let payload = agent.capture("two-sum").await.unwrap();

        assert_eq!(payload.solution, "");
        assert_eq!(payload.solution_language, "java");
        assert_eq!(payload.submission_status, "Unknown");

        let submission = payload.to_submission();
        assert_eq!(submission.title.as_deref(), Some("Two Sum"));
        assert_eq!(submission.difficulty.as_deref(), Some("Easy"));
        assert_eq!(submission.test_cases, payload.test_cases);
    }

    #[tokio::test]
    async fn metadata_failures_abort() {
        let host = spawn().await;

        let source = SourceClient::new(&host, session()).unwrap();
        let agent = CaptureAgent::with_languages(source, &languages(&["java"]));
        assert!(matches!(
            agent.capture("no-such-problem").await,
            Err(CaptureError::QuestionNotFound(_))
        ));

        let source = SourceClient::new(&host, SourceSession::default()).unwrap();
        let agent = CaptureAgent::with_languages(source, &languages(&["java"]));
        assert!(matches!(
            agent.capture("two-sum").await,
            Err(CaptureError::Status { status: 403, .. })
        ));
    }
}
