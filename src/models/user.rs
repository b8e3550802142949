use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Sortable JSON properties and the columns they map to.
pub const SORT_FIELDS: &[(&str, &str)] = &[
    ("id", "id"),
    ("login", "login"),
    ("email", "email"),
    ("firstName", "first_name"),
    ("lastName", "last_name"),
    ("createdDate", "created_date"),
];

#[derive(Debug, Clone, PartialEq, sqlx::FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub login: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub activated: bool,
    #[serde(skip_serializing)]
    pub activation_key: Option<String>,
    #[serde(skip_serializing)]
    pub reset_key: Option<String>,
    pub created_date: DateTime<Utc>,
}

impl User {
    /// A fresh, not yet activated user with a new id.
    pub fn new(login: &str, email: &str) -> Self {
        Self {
            id: Uuid::now_v7(),
            login: login.to_lowercase(),
            email: email.to_lowercase(),
            first_name: None,
            last_name: None,
            activated: false,
            activation_key: None,
            reset_key: None,
            created_date: Utc::now(),
        }
    }
}
