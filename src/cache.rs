use dashmap::DashMap;

use crate::models::User;

/// The two named user caches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheName {
    UsersByLogin,
    UsersByEmail,
}

impl CacheName {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheName::UsersByLogin => "usersByLogin",
            CacheName::UsersByEmail => "usersByEmail",
        }
    }
}

#[derive(Debug)]
pub enum CacheError {
    Unavailable(String),
}

impl std::fmt::Display for CacheError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheError::Unavailable(msg) => write!(f, "cache unavailable: {msg}"),
        }
    }
}

impl std::error::Error for CacheError {}

/// Best-effort memo of positive user lookups. Keys are compared ignoring case.
/// Callers must treat every error as a miss.
pub trait UserCache: Send + Sync {
    fn get(&self, cache: CacheName, key: &str) -> Result<Option<User>, CacheError>;

    /// Store `user` under `key` unless an entry already exists.
    fn insert_if_absent(&self, cache: CacheName, key: &str, user: &User) -> Result<(), CacheError>;

    fn evict(&self, cache: CacheName, key: &str) -> Result<(), CacheError>;
}

/// Process-local cache, one concurrent map per name.
pub struct InMemoryUserCache {
    by_login: DashMap<String, User>,
    by_email: DashMap<String, User>,
    /// Maximum entries per map, 0 for unbounded.
    capacity: usize,
}

impl InMemoryUserCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            by_login: DashMap::new(),
            by_email: DashMap::new(),
            capacity,
        }
    }

    fn map(&self, cache: CacheName) -> &DashMap<String, User> {
        match cache {
            CacheName::UsersByLogin => &self.by_login,
            CacheName::UsersByEmail => &self.by_email,
        }
    }

    pub fn len(&self, cache: CacheName) -> usize {
        self.map(cache).len()
    }

    pub fn is_empty(&self, cache: CacheName) -> bool {
        self.map(cache).is_empty()
    }
}

impl UserCache for InMemoryUserCache {
    fn get(&self, cache: CacheName, key: &str) -> Result<Option<User>, CacheError> {
        Ok(self
            .map(cache)
            .get(&key.to_lowercase())
            .map(|entry| entry.value().clone()))
    }

    fn insert_if_absent(&self, cache: CacheName, key: &str, user: &User) -> Result<(), CacheError> {
        let map = self.map(cache);
        let key = key.to_lowercase();

        if self.capacity > 0 && map.len() >= self.capacity && !map.contains_key(&key) {
            tracing::debug!("Cache {} is full, not caching '{key}'", cache.as_str());
            return Ok(());
        }

        map.entry(key).or_insert_with(|| user.clone());
        Ok(())
    }

    fn evict(&self, cache: CacheName, key: &str) -> Result<(), CacheError> {
        self.map(cache).remove(&key.to_lowercase());
        Ok(())
    }
}
