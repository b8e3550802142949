use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const SORT_FIELDS: &[(&str, &str)] = &[
    ("id", "id"),
    ("userId", "user_id"),
    ("assessmentId", "assessment_id"),
    ("submittedAt", "submitted_at"),
];

#[derive(Debug, Clone, PartialEq, sqlx::FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub id: Uuid,
    pub user_id: Uuid,
    pub assessment_id: Uuid,
    pub github_url: Option<String>,
    pub content: Option<String>,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionInput {
    pub id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    pub assessment_id: Option<Uuid>,
    pub github_url: Option<String>,
    pub content: Option<String>,
}

impl Submission {
    pub fn merge(&mut self, input: SubmissionInput) {
        if let Some(user_id) = input.user_id {
            self.user_id = user_id;
        }
        if let Some(assessment_id) = input.assessment_id {
            self.assessment_id = assessment_id;
        }
        if let Some(github_url) = input.github_url {
            self.github_url = Some(github_url);
        }
        if let Some(content) = input.content {
            self.content = Some(content);
        }
    }
}
