pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod headers;
pub mod housekeeping;
pub mod lookup;
pub mod models;
pub mod pagination;
pub mod resolver;
pub mod routes;
pub mod state;
pub mod store;

use std::sync::Arc;

use axum::http::{HeaderName, HeaderValue};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::cache::{InMemoryUserCache, UserCache};
use crate::config::Config;
use crate::headers::{AlertHeaders, X_TOTAL_COUNT};
use crate::lookup::EntityLookup;
use crate::state::{AppState, SharedState};
use crate::store::Stores;

/// Build the router over `stores` with a fresh in-process user cache.
pub fn build_app(stores: Stores, config: Config) -> Result<(Router, SharedState), String> {
    let cache = Arc::new(InMemoryUserCache::new(config.user_cache_capacity));
    build_app_with_cache(stores, cache, config)
}

pub fn build_app_with_cache(
    stores: Stores,
    cache: Arc<dyn UserCache>,
    config: Config,
) -> Result<(Router, SharedState), String> {
    let alerts = AlertHeaders::new(&config.app_name)?;
    let lookup = EntityLookup::new(stores.users.clone(), stores.assessments.clone(), cache);

    let state: SharedState = Arc::new(AppState {
        config,
        stores,
        lookup,
        alerts,
    });

    // Clients read the pagination headers cross-origin
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers([X_TOTAL_COUNT, axum::http::header::LINK]);

    let app = Router::new()
        .merge(routes::api_routes())
        .route("/health", axum::routing::get(health))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(SetResponseHeaderLayer::overriding(
                    HeaderName::from_static("x-content-type-options"),
                    HeaderValue::from_static("nosniff"),
                ))
                .layer(SetResponseHeaderLayer::overriding(
                    HeaderName::from_static("x-frame-options"),
                    HeaderValue::from_static("DENY"),
                ))
                .layer(SetResponseHeaderLayer::overriding(
                    HeaderName::from_static("referrer-policy"),
                    HeaderValue::from_static("strict-origin-when-cross-origin"),
                )),
        )
        .with_state(state.clone());

    Ok((app, state))
}

async fn health() -> &'static str {
    "ok"
}
