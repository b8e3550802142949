pub mod memory;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::{PgAssessmentStore, PgSubmissionStore, PgUserStore};
use crate::models::{Assessment, Submission, User};
use crate::pagination::{Page, PageRequest};

use self::memory::MemoryStore;

#[derive(Debug)]
pub enum StoreError {
    Database(sqlx::Error),
    /// A unique login, email or id was already taken.
    Conflict(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Database(err) => write!(f, "database error: {err}"),
            StoreError::Conflict(msg) => write!(f, "conflict: {msg}"),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                StoreError::Conflict(db_err.message().to_string())
            }
            _ => StoreError::Database(err),
        }
    }
}

/// Which submissions a listing covers once every filter has been resolved to an id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionQuery {
    All,
    ByUser(Uuid),
    ByAssessment(Uuid),
    ByUserAndAssessment { user_id: Uuid, assessment_id: Uuid },
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    /// Full-value, case-insensitive match on `login`.
    async fn find_by_login_ignore_case(&self, login: &str) -> Result<Option<User>, StoreError>;

    /// Full-value, case-insensitive match on `email`.
    async fn find_by_email_ignore_case(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn find_by_activation_key(&self, key: &str) -> Result<Option<User>, StoreError>;

    /// Users that never activated, still hold an activation key and were
    /// created strictly before `before`.
    async fn find_unactivated_created_before(
        &self,
        before: DateTime<Utc>,
    ) -> Result<Vec<User>, StoreError>;

    async fn find_activated_page(&self, page: &PageRequest) -> Result<Page<User>, StoreError>;

    /// Insert or replace by id.
    async fn save(&self, user: &User) -> Result<User, StoreError>;

    async fn delete(&self, id: Uuid) -> Result<(), StoreError>;
}

#[async_trait]
pub trait AssessmentStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Assessment>, StoreError>;

    /// First assessment whose `type` equals `kind` ignoring case, in store order.
    async fn find_first_by_type_ignore_case(
        &self,
        kind: &str,
    ) -> Result<Option<Assessment>, StoreError>;

    /// Exact `type` match when `kind` is given, everything otherwise.
    async fn find_page(
        &self,
        kind: Option<&str>,
        page: &PageRequest,
    ) -> Result<Page<Assessment>, StoreError>;

    async fn save(&self, assessment: &Assessment) -> Result<Assessment, StoreError>;

    async fn delete(&self, id: Uuid) -> Result<(), StoreError>;
}

#[async_trait]
pub trait SubmissionStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Submission>, StoreError>;

    async fn find_page(
        &self,
        query: &SubmissionQuery,
        page: &PageRequest,
    ) -> Result<Page<Submission>, StoreError>;

    async fn save(&self, submission: &Submission) -> Result<Submission, StoreError>;

    async fn delete(&self, id: Uuid) -> Result<(), StoreError>;
}

/// The three stores the service talks to, shared by every request.
#[derive(Clone)]
pub struct Stores {
    pub users: Arc<dyn UserStore>,
    pub assessments: Arc<dyn AssessmentStore>,
    pub submissions: Arc<dyn SubmissionStore>,
}

impl Stores {
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            users: Arc::new(PgUserStore::new(pool.clone())),
            assessments: Arc::new(PgAssessmentStore::new(pool.clone())),
            submissions: Arc::new(PgSubmissionStore::new(pool)),
        }
    }

    pub fn memory() -> Self {
        Self::from_memory(Arc::new(MemoryStore::new()))
    }

    pub fn from_memory(store: Arc<MemoryStore>) -> Self {
        Self {
            users: store.clone(),
            assessments: store.clone(),
            submissions: store,
        }
    }
}
