use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DefaultOnNull};

pub const QUESTION_DETAIL_QUERY: &str = r#"query questionDetail($titleSlug: String!) {
  question(titleSlug: $titleSlug) {
    title titleSlug questionFrontendId content difficulty
    topicTags { name } hints exampleTestcaseList
  }
}"#;

#[derive(Debug, Serialize)]
pub struct GraphQlRequest<'a> {
    pub query: &'a str,
    pub variables: QuestionVariables<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionVariables<'a> {
    pub title_slug: &'a str,
}

impl<'a> GraphQlRequest<'a> {
    pub fn question_detail(title_slug: &'a str) -> Self {
        Self {
            query: QUESTION_DETAIL_QUERY,
            variables: QuestionVariables { title_slug },
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct GraphQlResponse<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
pub struct GraphQlError {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct QuestionData {
    pub question: Option<Question>,
}

/// Problem metadata as the source site reports it. Premium problems come back with a
/// `null` content, so every optional part defaults to empty.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub title: String,
    pub title_slug: String,
    pub question_frontend_id: String,
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    pub content: String,
    pub difficulty: String,
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    pub topic_tags: Vec<TopicTag>,
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    pub hints: Vec<String>,
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    pub example_testcase_list: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TopicTag {
    pub name: String,
}

/// Body of `/submissions/latest/`.
#[serde_as]
#[derive(Debug, Clone, Deserialize)]
pub struct LatestSubmission {
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    pub code: String,
    pub status_display: Option<String>,
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_body_shape() {
        let body = serde_json::to_value(GraphQlRequest::question_detail("two-sum")).unwrap();
        assert_eq!(body["variables"], json!({"titleSlug": "two-sum"}));
        assert!(body["query"].as_str().unwrap().starts_with("query questionDetail"));
    }

    #[test]
    fn question_tolerates_nulls() {
        let response: GraphQlResponse<QuestionData> = serde_json::from_value(json!({
            "data": {"question": {
                "title": "Two Sum",
                "titleSlug": "two-sum",
                "questionFrontendId": "1",
                "content": null,
                "difficulty": "Easy",
                "topicTags": [{"name": "Array"}],
                "hints": null
            }}
        }))
        .unwrap();

        let question = response.data.unwrap().question.unwrap();
        assert_eq!(question.content, "");
        assert!(question.hints.is_empty());
        assert!(question.example_testcase_list.is_empty());
        assert_eq!(question.topic_tags, vec![TopicTag { name: String::from("Array") }]);
    }
}
