use super::{
    graphql::{LatestSubmission as LatestSubmissionBody, Question},
    CaptureError, SourceClient,
};
use async_trait::async_trait;

/// Accepted code for a question, found by one strategy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Solution {
    pub code: String,
    pub language: String,
    pub status: Option<String>,
}

/// One way of finding the user's solution. The agent tries its strategies in order
/// and keeps the first non-empty result.
#[async_trait]
pub trait SolutionStrategy: Send + Sync {
    fn name(&self) -> String;

    /// `Ok(None)` when this strategy found nothing.
    async fn fetch(
        &self,
        source: &SourceClient,
        question: &Question,
    ) -> Result<Option<Solution>, CaptureError>;
}

/// Latest submission in one language, via `/submissions/latest/`.
#[derive(Debug, Clone)]
pub struct LatestSubmission {
    language: String,
}

impl LatestSubmission {
    pub fn new(language: &str) -> Self {
        Self {
            language: language.to_string(),
        }
    }
}

#[async_trait]
impl SolutionStrategy for LatestSubmission {
    fn name(&self) -> String {
        format!("latest submission ({})", self.language)
    }

    async fn fetch(
        &self,
        source: &SourceClient,
        question: &Question,
    ) -> Result<Option<Solution>, CaptureError> {
        let mut url = source.endpoint("submissions/latest/")?;
        url.query_pairs_mut()
            .append_pair("qid", &question.question_frontend_id)
            .append_pair("lang", &self.language);

        let res = source
            .get(url.clone(), &question.title_slug)
            .send()
            .await?;
        if let Err(e) = res.error_for_status_ref() {
            return Err(CaptureError::Status {
                url: url.to_string(),
                status: e.status().map(|status| status.as_u16()).unwrap_or_default(),
            });
        }

        let body: LatestSubmissionBody = serde_json::from_str(&res.text().await?)?;
        if body.code.trim().is_empty() {
            return Ok(None);
        }

        Ok(Some(Solution {
            code: body.code,
            language: self.language.clone(),
            status: body.status_display,
        }))
    }
}
