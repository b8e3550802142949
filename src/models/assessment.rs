use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const SORT_FIELDS: &[(&str, &str)] = &[
    ("id", "id"),
    ("name", "name"),
    ("type", "type"),
    ("createdDate", "created_date"),
];

#[derive(Debug, Clone, PartialEq, sqlx::FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assessment {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    /// Free-text category. Several assessments may share one.
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub kind: String,
    pub created_date: DateTime<Utc>,
}

/// Request body for create/update/patch. All fields optional so the same
/// shape serves full and partial updates; handlers check what they need.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentInput {
    pub id: Option<Uuid>,
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

impl Assessment {
    /// Copy every non-null field of `input` over `self`.
    pub fn merge(&mut self, input: AssessmentInput) {
        if let Some(name) = input.name {
            self.name = name;
        }
        if let Some(description) = input.description {
            self.description = Some(description);
        }
        if let Some(kind) = input.kind {
            self.kind = kind;
        }
    }
}
