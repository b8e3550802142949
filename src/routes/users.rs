use axum::extract::{OriginalUri, Path, State};
use axum::http::HeaderMap;
use axum::Json;

use crate::error::AppError;
use crate::headers::pagination_headers;
use crate::models::user::SORT_FIELDS;
use crate::models::User;
use crate::pagination::PageRequest;
use crate::state::SharedState;

/// `GET /api/users`: activated users only.
pub async fn list(
    State(state): State<SharedState>,
    OriginalUri(uri): OriginalUri,
) -> Result<(HeaderMap, Json<Vec<User>>), AppError> {
    tracing::debug!("REST request to get all public User names");
    let page_request = PageRequest::from_query(uri.query(), SORT_FIELDS, state.config.page_limits)?;

    let page = state.stores.users.find_activated_page(&page_request).await?;

    let headers = pagination_headers(&state.config.base_url, &uri, &page);
    Ok((headers, Json(page.content)))
}

pub async fn get(
    State(state): State<SharedState>,
    Path(login): Path<String>,
) -> Result<Json<User>, AppError> {
    tracing::debug!("REST request to get User : {login}");
    let user = state
        .lookup
        .find_one_by_login(&login)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
    Ok(Json(user))
}
