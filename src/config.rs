use std::net::IpAddr;

use regex::Regex;

use crate::pagination::PageLimits;

#[derive(Debug, Clone)]
pub struct Config {
    pub store: StoreBackend,
    pub database_url: Option<String>,
    pub host: IpAddr,
    pub port: u16,
    pub base_url: String,
    /// Prefix of the entity alert headers, e.g. `X-catApp-alert`.
    pub app_name: String,
    pub log_level: String,
    pub page_limits: PageLimits,
    /// Entries per user cache, 0 for unbounded.
    pub user_cache_capacity: usize,
    pub unactivated_user_ttl_days: i64,
    pub housekeeping_interval_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from any key/value source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var_or = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let store = match var_or("CAT_STORE", "postgres").as_str() {
            "postgres" => StoreBackend::Postgres,
            "memory" => StoreBackend::Memory,
            other => return Err(format!("Invalid CAT_STORE '{other}', expected postgres or memory")),
        };

        let database_url = lookup("DATABASE_URL");
        if store == StoreBackend::Postgres && database_url.is_none() {
            return Err("Missing required environment variable: DATABASE_URL".to_string());
        }

        let host: IpAddr = var_or("CAT_HOST", "0.0.0.0")
            .parse()
            .map_err(|e| format!("Invalid CAT_HOST: {e}"))?;

        let port: u16 = var_or("CAT_PORT", "8080")
            .parse()
            .map_err(|e| format!("Invalid CAT_PORT: {e}"))?;

        // Empty keeps Link headers relative to the request
        let base_url = var_or("CAT_BASE_URL", "");

        let app_name = var_or("CAT_APP_NAME", "catApp");
        let app_name_pattern = Regex::new("^[A-Za-z0-9_-]+$").map_err(|e| e.to_string())?;
        if !app_name_pattern.is_match(&app_name) {
            return Err(format!(
                "Invalid CAT_APP_NAME '{app_name}': only letters, digits, '-' and '_' are allowed"
            ));
        }

        let log_level = var_or("CAT_LOG_LEVEL", "info");

        let default_size: u64 = var_or("CAT_DEFAULT_PAGE_SIZE", "20")
            .parse()
            .map_err(|e| format!("Invalid CAT_DEFAULT_PAGE_SIZE: {e}"))?;
        let max_size: u64 = var_or("CAT_MAX_PAGE_SIZE", "2000")
            .parse()
            .map_err(|e| format!("Invalid CAT_MAX_PAGE_SIZE: {e}"))?;
        if default_size == 0 || max_size == 0 {
            return Err("Page sizes must be at least 1".to_string());
        }

        let user_cache_capacity: usize = var_or("CAT_USER_CACHE_CAPACITY", "10000")
            .parse()
            .map_err(|e| format!("Invalid CAT_USER_CACHE_CAPACITY: {e}"))?;

        let unactivated_user_ttl_days: i64 = var_or("CAT_UNACTIVATED_USER_TTL_DAYS", "3")
            .parse()
            .map_err(|e| format!("Invalid CAT_UNACTIVATED_USER_TTL_DAYS: {e}"))?;

        let housekeeping_interval_secs: u64 = var_or("CAT_HOUSEKEEPING_INTERVAL_SECS", "3600")
            .parse()
            .map_err(|e| format!("Invalid CAT_HOUSEKEEPING_INTERVAL_SECS: {e}"))?;

        Ok(Config {
            store,
            database_url,
            host,
            port,
            base_url,
            app_name,
            log_level,
            page_limits: PageLimits {
                default_size,
                max_size,
            },
            user_cache_capacity,
            unactivated_user_ttl_days,
            housekeeping_interval_secs,
        })
    }
}
