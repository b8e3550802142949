#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use uuid::Uuid;

use cat_server::cache::{CacheError, CacheName, InMemoryUserCache, UserCache};
use cat_server::config::Config;
use cat_server::lookup::EntityLookup;
use cat_server::models::{Assessment, Submission, User};
use cat_server::pagination::{Page, PageRequest};
use cat_server::state::SharedState;
use cat_server::store::{
    AssessmentStore, StoreError, Stores, SubmissionQuery, SubmissionStore, UserStore,
};

/// A running server on a random port over an in-memory store.
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: Client,
    pub state: SharedState,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Store an activated user directly, bypassing HTTP.
    pub async fn create_user(&self, login: &str) -> User {
        let mut user = User::new(login, &format!("{login}@example.com"));
        user.activated = true;
        self.state
            .lookup
            .save_user(&user)
            .await
            .expect("save user failed")
    }

    /// Create an assessment, return its JSON.
    pub async fn create_assessment(&self, name: &str, kind: &str) -> Value {
        let (body, status) = self
            .post("/api/assessments", &json!({ "name": name, "type": kind }))
            .await;
        assert_eq!(status, StatusCode::CREATED, "create assessment failed: {body}");
        body
    }

    /// Create a submission linking a user and an assessment, return its JSON.
    pub async fn create_submission(&self, user: &User, assessment: &Value) -> Value {
        let (body, status) = self
            .post(
                "/api/submissions",
                &json!({
                    "userId": user.id,
                    "assessmentId": assessment["id"],
                    "githubUrl": format!("https://github.com/{}/solution", user.login),
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create submission failed: {body}");
        body
    }

    /// GET, returning body, status and headers.
    pub async fn get(&self, path: &str) -> (Value, StatusCode, reqwest::header::HeaderMap) {
        let resp = self
            .client
            .get(self.url(path))
            .send()
            .await
            .expect("get request failed");
        let status = resp.status();
        let headers = resp.headers().clone();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status, headers)
    }

    pub async fn post(&self, path: &str, body: &Value) -> (Value, StatusCode) {
        let resp = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("post request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    pub async fn put(&self, path: &str, body: &Value) -> (Value, StatusCode) {
        let resp = self
            .client
            .put(self.url(path))
            .json(body)
            .send()
            .await
            .expect("put request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    pub async fn patch(&self, path: &str, body: &Value) -> (Value, StatusCode) {
        let resp = self
            .client
            .patch(self.url(path))
            .json(body)
            .send()
            .await
            .expect("patch request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    pub async fn delete(&self, path: &str) -> (StatusCode, reqwest::header::HeaderMap) {
        let resp = self
            .client
            .delete(self.url(path))
            .send()
            .await
            .expect("delete request failed");
        (resp.status(), resp.headers().clone())
    }
}

/// Defaults as the binary would load them, on the memory store.
pub fn test_config() -> Config {
    let mut config = Config::from_lookup(|key| (key == "CAT_STORE").then(|| "memory".to_string()))
        .expect("default config failed");
    config.host = "127.0.0.1".parse().unwrap();
    config.port = 0; // unused, we bind to random port
    config.log_level = "warn".to_string();
    config.user_cache_capacity = 0;
    config
}

/// Spawn a test app over a fresh in-memory store.
pub async fn spawn_app() -> TestApp {
    spawn_app_with(Stores::memory()).await
}

/// Spawn a test app over the given stores.
pub async fn spawn_app_with(stores: Stores) -> TestApp {
    let (app, state) = cat_server::build_app(stores, test_config()).expect("build app failed");

    // Bind to random port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind to random port");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Server failed");
    });

    TestApp {
        addr,
        client: Client::new(),
        state,
    }
}

/// Lookup over `store` with its own cache.
pub fn lookup_over(stores: &Stores) -> EntityLookup {
    EntityLookup::new(
        stores.users.clone(),
        stores.assessments.clone(),
        Arc::new(InMemoryUserCache::new(0)),
    )
}

pub fn page(page: i64, size: i64) -> PageRequest {
    PageRequest::new(page, size, vec![]).unwrap()
}

// ── Instrumented collaborators ──────────────────────────────────

/// Ordered record of store calls, shared by the counting wrappers.
#[derive(Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<&'static str>>>);

impl CallLog {
    fn record(&self, call: &'static str) {
        self.0.lock().unwrap().push(call);
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.0.lock().unwrap().clone()
    }

    pub fn count(&self, call: &str) -> usize {
        self.calls().iter().filter(|c| **c == call).count()
    }

    pub fn count_prefix(&self, prefix: &str) -> usize {
        self.calls().iter().filter(|c| c.starts_with(prefix)).count()
    }
}

/// Wrap every store in `inner` so calls are recorded in the returned log.
pub fn counting(inner: Stores) -> (Stores, CallLog) {
    let log = CallLog::default();
    let stores = Stores {
        users: Arc::new(CountingUsers {
            inner: inner.users,
            log: log.clone(),
        }),
        assessments: Arc::new(CountingAssessments {
            inner: inner.assessments,
            log: log.clone(),
        }),
        submissions: Arc::new(CountingSubmissions {
            inner: inner.submissions,
            log: log.clone(),
        }),
    };
    (stores, log)
}

struct CountingUsers {
    inner: Arc<dyn UserStore>,
    log: CallLog,
}

#[async_trait]
impl UserStore for CountingUsers {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        self.log.record("users.find_by_id");
        self.inner.find_by_id(id).await
    }

    async fn find_by_login_ignore_case(&self, login: &str) -> Result<Option<User>, StoreError> {
        self.log.record("users.find_by_login");
        self.inner.find_by_login_ignore_case(login).await
    }

    async fn find_by_email_ignore_case(&self, email: &str) -> Result<Option<User>, StoreError> {
        self.log.record("users.find_by_email");
        self.inner.find_by_email_ignore_case(email).await
    }

    async fn find_by_activation_key(&self, key: &str) -> Result<Option<User>, StoreError> {
        self.log.record("users.find_by_activation_key");
        self.inner.find_by_activation_key(key).await
    }

    async fn find_unactivated_created_before(
        &self,
        before: DateTime<Utc>,
    ) -> Result<Vec<User>, StoreError> {
        self.log.record("users.find_unactivated");
        self.inner.find_unactivated_created_before(before).await
    }

    async fn find_activated_page(&self, page: &PageRequest) -> Result<Page<User>, StoreError> {
        self.log.record("users.find_activated_page");
        self.inner.find_activated_page(page).await
    }

    async fn save(&self, user: &User) -> Result<User, StoreError> {
        self.log.record("users.save");
        self.inner.save(user).await
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        self.log.record("users.delete");
        self.inner.delete(id).await
    }
}

struct CountingAssessments {
    inner: Arc<dyn AssessmentStore>,
    log: CallLog,
}

#[async_trait]
impl AssessmentStore for CountingAssessments {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Assessment>, StoreError> {
        self.log.record("assessments.find_by_id");
        self.inner.find_by_id(id).await
    }

    async fn find_first_by_type_ignore_case(
        &self,
        kind: &str,
    ) -> Result<Option<Assessment>, StoreError> {
        self.log.record("assessments.find_by_type");
        self.inner.find_first_by_type_ignore_case(kind).await
    }

    async fn find_page(
        &self,
        kind: Option<&str>,
        page: &PageRequest,
    ) -> Result<Page<Assessment>, StoreError> {
        self.log.record("assessments.find_page");
        self.inner.find_page(kind, page).await
    }

    async fn save(&self, assessment: &Assessment) -> Result<Assessment, StoreError> {
        self.log.record("assessments.save");
        self.inner.save(assessment).await
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        self.log.record("assessments.delete");
        self.inner.delete(id).await
    }
}

struct CountingSubmissions {
    inner: Arc<dyn SubmissionStore>,
    log: CallLog,
}

#[async_trait]
impl SubmissionStore for CountingSubmissions {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Submission>, StoreError> {
        self.log.record("submissions.find_by_id");
        self.inner.find_by_id(id).await
    }

    async fn find_page(
        &self,
        query: &SubmissionQuery,
        page: &PageRequest,
    ) -> Result<Page<Submission>, StoreError> {
        self.log.record("submissions.find_page");
        self.inner.find_page(query, page).await
    }

    async fn save(&self, submission: &Submission) -> Result<Submission, StoreError> {
        self.log.record("submissions.save");
        self.inner.save(submission).await
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        self.log.record("submissions.delete");
        self.inner.delete(id).await
    }
}

/// A cache whose every operation fails.
pub struct UnavailableCache;

impl UserCache for UnavailableCache {
    fn get(&self, _cache: CacheName, _key: &str) -> Result<Option<User>, CacheError> {
        Err(CacheError::Unavailable("connection refused".to_string()))
    }

    fn insert_if_absent(
        &self,
        _cache: CacheName,
        _key: &str,
        _user: &User,
    ) -> Result<(), CacheError> {
        Err(CacheError::Unavailable("connection refused".to_string()))
    }

    fn evict(&self, _cache: CacheName, _key: &str) -> Result<(), CacheError> {
        Err(CacheError::Unavailable("connection refused".to_string()))
    }
}
