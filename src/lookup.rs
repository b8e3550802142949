use std::future::Future;
use std::sync::Arc;

use crate::cache::{CacheName, UserCache};
use crate::models::{Assessment, User};
use crate::store::{AssessmentStore, StoreError, UserStore};

#[derive(Clone)]
pub struct EntityLookup {
    users: Arc<dyn UserStore>,
    assessments: Arc<dyn AssessmentStore>,
    cache: Arc<dyn UserCache>,
}

impl EntityLookup {
    pub fn new(
        users: Arc<dyn UserStore>,
        assessments: Arc<dyn AssessmentStore>,
        cache: Arc<dyn UserCache>,
    ) -> Self {
        Self {
            users,
            assessments,
            cache,
        }
    }

    /// User whose login equals `pattern` ignoring case. The pattern is taken
    /// literally; no wildcard or regex syntax is interpreted.
    pub async fn find_user_by_login_pattern(
        &self,
        pattern: &str,
    ) -> Result<Option<User>, StoreError> {
        self.find_one_by_login(pattern).await
    }

    /// First assessment whose type equals `pattern` ignoring case. Types are
    /// not unique, and which match comes first is up to the store.
    pub async fn find_assessment_by_type_pattern(
        &self,
        pattern: &str,
    ) -> Result<Option<Assessment>, StoreError> {
        self.assessments.find_first_by_type_ignore_case(pattern).await
    }

    pub async fn find_one_by_login(&self, login: &str) -> Result<Option<User>, StoreError> {
        self.cached(CacheName::UsersByLogin, login, || {
            self.users.find_by_login_ignore_case(login)
        })
        .await
    }

    pub async fn find_one_by_email_ignore_case(
        &self,
        email: &str,
    ) -> Result<Option<User>, StoreError> {
        self.cached(CacheName::UsersByEmail, email, || {
            self.users.find_by_email_ignore_case(email)
        })
        .await
    }

    /// Write a user through the store and drop cache entries for both its
    /// previous and its new login and email.
    pub async fn save_user(&self, user: &User) -> Result<User, StoreError> {
        let previous = self.users.find_by_id(user.id).await?;
        let saved = self.users.save(user).await?;
        if let Some(previous) = previous {
            self.evict(&previous);
        }
        self.evict(&saved);
        Ok(saved)
    }

    pub async fn delete_user(&self, user: &User) -> Result<(), StoreError> {
        self.users.delete(user.id).await?;
        self.evict(user);
        Ok(())
    }

    pub fn evict(&self, user: &User) {
        for (cache, key) in [
            (CacheName::UsersByLogin, &user.login),
            (CacheName::UsersByEmail, &user.email),
        ] {
            if let Err(e) = self.cache.evict(cache, key) {
                tracing::warn!("Failed to evict '{key}' from {}: {e}", cache.as_str());
            }
        }
    }

    /// Read-through on `cache`. Only hits are stored, and cache errors fall
    /// back to `load` instead of failing the lookup.
    async fn cached<F, Fut>(
        &self,
        cache: CacheName,
        key: &str,
        load: F,
    ) -> Result<Option<User>, StoreError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Option<User>, StoreError>>,
    {
        match self.cache.get(cache, key) {
            Ok(Some(user)) => return Ok(Some(user)),
            Ok(None) => {}
            Err(e) => tracing::warn!("Cache {} lookup failed, reading store: {e}", cache.as_str()),
        }

        let found = load().await?;

        if let Some(user) = &found {
            if let Err(e) = self.cache.insert_if_absent(cache, key, user) {
                tracing::warn!("Cache {} insert failed: {e}", cache.as_str());
            }
        }

        Ok(found)
    }
}
