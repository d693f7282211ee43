use crate::normalize::normalize_problem_url;
use chrono::{DateTime, Utc};
use itertools::Itertools;
use problem_vault_derive::FieldList;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, skip_serializing_none, DefaultOnError, DefaultOnNull};
use std::collections::BTreeMap;
use validator::{Validate, ValidationErrors};

pub const DEFAULT_USER_ID: &str = "anonymous";
pub const DEFAULT_PAGE_SIZE: u32 = 50;
pub const MAX_PAGE_SIZE: u32 = 1000;

pub trait FieldList {
    fn field_list() -> &'static str;
}

/// Envelope shared by every endpoint of the ingest API.
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
    pub message: Option<String>,
    pub pagination: Option<Pagination>,
    pub search_query: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            message: None,
            pagination: None,
            search_query: None,
        }
    }

    pub fn error(error: impl ToString, message: Option<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.to_string()),
            message,
            pagination: None,
            search_query: None,
        }
    }

    pub fn with_message(mut self, message: impl ToString) -> Self {
        self.message = Some(message.to_string());
        self
    }

    pub fn with_pagination(mut self, pagination: Pagination) -> Self {
        self.pagination = Some(pagination);
        self
    }

    pub fn with_search_query(mut self, search_query: Option<String>) -> Self {
        self.search_query = search_query;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub pages: u64,
}

impl Pagination {
    pub fn new(page: u32, limit: u32, total: u64) -> Self {
        let limit = limit.max(1);
        let pages = (total + limit as u64 - 1) / limit as u64;
        Self {
            page,
            limit,
            total,
            pages,
        }
    }
}

/// A captured problem as persisted by the record store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow, FieldList)]
#[serde(rename_all = "camelCase")]
pub struct ProblemRecord {
    pub id: i64,
    pub title: String,
    pub url: String,
    pub difficulty: String,
    pub description: String,
    pub solution: String,
    pub test_cases: Vec<String>,
    pub tags: Vec<String>,
    pub user_id: String,
    pub user_email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body of `POST /api/problems`.
///
/// `title`, `url` and `difficulty` are only checked by [`Validate`], so a body missing them
/// still deserializes and is answered with a validation error instead of a parse error.
/// `testCases` and `tags` fall back to an empty list when they are not arrays of strings.
#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProblemSubmission {
    #[validate(required, length(min = 1))]
    pub title: Option<String>,
    #[validate(required, length(min = 1))]
    pub url: Option<String>,
    #[validate(required, length(min = 1))]
    pub difficulty: Option<String>,
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    pub description: String,
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    pub solution: String,
    #[serde_as(as = "DefaultOnError")]
    #[serde(default)]
    pub test_cases: Vec<String>,
    #[serde_as(as = "DefaultOnError")]
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    pub user_email: String,
}

/// A submission that passed validation, with its URL in canonical form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProblem {
    pub title: String,
    pub url: String,
    pub difficulty: String,
    pub description: String,
    pub solution: String,
    pub test_cases: Vec<String>,
    pub tags: Vec<String>,
    pub user_id: String,
    pub user_email: String,
}

impl NewProblem {
    /// Space separated tags, the form the full-text index consumes.
    pub fn tags_text(&self) -> String {
        self.tags.iter().join(" ")
    }
}

impl TryFrom<ProblemSubmission> for NewProblem {
    type Error = ValidationErrors;

    fn try_from(mut submission: ProblemSubmission) -> Result<Self, Self::Error> {
        submission.url = submission
            .url
            .as_deref()
            .map(normalize_problem_url);
        submission.validate()?;

        let user_id = submission
            .user_id
            .filter(|user_id| !user_id.trim().is_empty())
            .unwrap_or_else(|| String::from(DEFAULT_USER_ID));

        Ok(NewProblem {
            title: submission.title.unwrap_or_default(),
            url: submission.url.unwrap_or_default(),
            difficulty: submission.difficulty.unwrap_or_default(),
            description: submission.description,
            solution: submission.solution,
            test_cases: submission.test_cases,
            tags: submission.tags,
            user_id,
            user_email: submission.user_email,
        })
    }
}

/// Query string of `GET /api/problems`.
#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProblemListParameter {
    #[validate(range(min = 1))]
    pub page: Option<u32>,
    #[validate(range(min = 1, max = 1000))]
    pub limit: Option<u32>,
    pub difficulty: Option<String>,
    pub tags: Option<String>,
    pub user_id: Option<String>,
    #[validate(length(max = 200))]
    pub search: Option<String>,
}

impl ProblemListParameter {
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1)
    }

    pub fn limit(&self) -> u32 {
        self.limit.unwrap_or(DEFAULT_PAGE_SIZE).min(MAX_PAGE_SIZE)
    }

    pub fn offset(&self) -> u64 {
        (self.page().max(1) as u64 - 1) * self.limit() as u64
    }

    pub fn difficulty(&self) -> Option<&str> {
        non_empty(self.difficulty.as_deref())
    }

    pub fn user_id(&self) -> Option<&str> {
        non_empty(self.user_id.as_deref())
    }

    pub fn search(&self) -> Option<&str> {
        non_empty(self.search.as_deref())
    }

    /// Comma separated `tags`, trimmed, empty entries dropped.
    pub fn tag_list(&self) -> Vec<String> {
        self.tags
            .as_deref()
            .map(|tags| {
                tags.split(',')
                    .map(str::trim)
                    .filter(|tag| !tag.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn with_tags<I, T>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let tags = tags.into_iter().map(|tag| tag.as_ref().to_string()).join(",");
        self.tags = if tags.is_empty() { None } else { Some(tags) };
        self
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProblemCount {
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagCount {
    pub tag: String,
    pub count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemStats {
    pub total_problems: u64,
    pub difficulties: BTreeMap<String, u64>,
    pub top_tags: Vec<TagCount>,
}

/// Capability listing served at `GET /api/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiIndex {
    pub message: String,
    pub version: String,
    pub status: String,
    pub endpoints: BTreeMap<String, String>,
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    #[test]
    fn pagination_rounds_pages_up() {
        assert_eq!(Pagination::new(1, 10, 0).pages, 0);
        assert_eq!(Pagination::new(1, 10, 10).pages, 1);
        assert_eq!(Pagination::new(1, 10, 11).pages, 2);
        assert_eq!(Pagination::new(2, 3, 7).pages, 3);
    }

    #[test]
    fn envelope_omits_absent_members() {
        let body = serde_json::to_value(ApiResponse::ok(ProblemCount { count: 3 })).unwrap();
        assert_eq!(body, json!({"success": true, "data": {"count": 3}}));

        let body = serde_json::to_value(ApiResponse::<()>::error(
            "Problem not found",
            None,
        ))
        .unwrap();
        assert_eq!(body, json!({"success": false, "error": "Problem not found"}));
    }

    #[test]
    fn submission_coerces_malformed_lists() {
        let submission: ProblemSubmission = serde_json::from_value(json!({
            "title": "Two Sum",
            "url": "https://leetcode.com/problems/two-sum/",
            "difficulty": "Easy",
            "tags": "Array",
            "testCases": [1, 2],
            "description": null
        }))
        .unwrap();

        assert!(submission.tags.is_empty());
        assert!(submission.test_cases.is_empty());
        assert_eq!(submission.description, "");
    }

    #[test]
    fn new_problem_normalizes_and_fills_defaults() {
        let submission = ProblemSubmission {
            title: Some(String::from("Two Sum")),
            url: Some(String::from("http://leetcode.com/problems/two-sum/description/?lang=en")),
            difficulty: Some(String::from("Easy")),
            tags: vec![String::from("Array"), String::from("Hash Table")],
            ..Default::default()
        };

        let problem = NewProblem::try_from(submission).unwrap();
        assert_eq!(problem.url, "https://leetcode.com/problems/two-sum");
        assert_eq!(problem.user_id, DEFAULT_USER_ID);
        assert_eq!(problem.tags_text(), "Array Hash Table");
    }

    #[test]
    fn new_problem_requires_title_url_and_difficulty() {
        let complete = ProblemSubmission {
            title: Some(String::from("Two Sum")),
            url: Some(String::from("https://leetcode.com/problems/two-sum")),
            difficulty: Some(String::from("Easy")),
            ..Default::default()
        };

        let mut missing_title = complete.clone();
        missing_title.title = None;
        let mut empty_url = complete.clone();
        empty_url.url = Some(String::new());
        let mut missing_difficulty = complete.clone();
        missing_difficulty.difficulty = None;

        assert!(NewProblem::try_from(complete).is_ok());
        assert!(NewProblem::try_from(missing_title).is_err());
        assert!(NewProblem::try_from(empty_url).is_err());
        assert!(NewProblem::try_from(missing_difficulty).is_err());
    }

    #[test]
    fn list_parameter_defaults_and_tags() {
        let params: ProblemListParameter =
            serde_urlencoded::from_str("tags=Array,%20Hash%20Table,,&difficulty=").unwrap();

        assert_eq!(params.page(), 1);
        assert_eq!(params.limit(), DEFAULT_PAGE_SIZE);
        assert_eq!(params.offset(), 0);
        assert_eq!(params.difficulty(), None);
        assert_eq!(params.tag_list(), vec!["Array", "Hash Table"]);

        let params = ProblemListParameter {
            page: Some(3),
            limit: Some(20),
            ..Default::default()
        };
        assert_eq!(params.offset(), 40);
    }

    #[test]
    fn list_parameter_rejects_out_of_range_values() {
        let params = ProblemListParameter {
            page: Some(0),
            ..Default::default()
        };
        assert!(params.validate().is_err());

        let params = ProblemListParameter {
            limit: Some(MAX_PAGE_SIZE + 1),
            ..Default::default()
        };
        assert!(params.validate().is_err());
    }
}
