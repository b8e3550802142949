use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;

use crate::error::AppError;
use crate::models::User;
use crate::state::SharedState;

#[derive(Deserialize)]
pub struct ActivateParams {
    pub key: String,
}

/// `GET /api/activate?key=`: activate the user holding `key`.
pub async fn activate(
    State(state): State<SharedState>,
    Query(params): Query<ActivateParams>,
) -> Result<Json<User>, AppError> {
    tracing::debug!("Activating user for activation key {}", params.key);
    let mut user = state
        .stores
        .users
        .find_by_activation_key(&params.key)
        .await?
        .ok_or_else(|| AppError::NotFound("No user was found for this activation key".to_string()))?;

    user.activated = true;
    user.activation_key = None;
    let saved = state.lookup.save_user(&user).await?;

    tracing::debug!("Activated user: {}", saved.login);
    Ok(Json(saved))
}
