use axum::extract::{OriginalUri, Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::headers::pagination_headers;
use crate::models::assessment::{AssessmentInput, SORT_FIELDS};
use crate::models::Assessment;
use crate::pagination::PageRequest;
use crate::state::SharedState;

const ENTITY_NAME: &str = "assessment";

#[derive(Deserialize)]
pub struct ListParams {
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

pub async fn create(
    State(state): State<SharedState>,
    Json(input): Json<AssessmentInput>,
) -> Result<(StatusCode, HeaderMap, Json<Assessment>), AppError> {
    tracing::debug!("REST request to save Assessment : {input:?}");
    if input.id.is_some() {
        return Err(AppError::bad_request(
            "A new assessment cannot already have an ID",
            ENTITY_NAME,
            "idexists",
        ));
    }

    let (name, kind) = required_fields(&input)?;
    let assessment = Assessment {
        id: Uuid::now_v7(),
        name,
        description: input.description,
        kind,
        created_date: Utc::now(),
    };
    let saved = state.stores.assessments.save(&assessment).await?;

    let id = saved.id.to_string();
    let headers = state
        .alerts
        .created(ENTITY_NAME, &format!("/api/assessments/{id}"), &id);
    Ok((StatusCode::CREATED, headers, Json(saved)))
}

pub async fn update(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(input): Json<AssessmentInput>,
) -> Result<(HeaderMap, Json<Assessment>), AppError> {
    tracing::debug!("REST request to update Assessment : {id}, {input:?}");
    let existing = existing_for_update(&state, id, input.id).await?;

    let (name, kind) = required_fields(&input)?;
    let assessment = Assessment {
        id,
        name,
        description: input.description,
        kind,
        created_date: existing.created_date,
    };
    let saved = state.stores.assessments.save(&assessment).await?;

    let headers = state.alerts.updated(ENTITY_NAME, &id.to_string());
    Ok((headers, Json(saved)))
}

pub async fn partial_update(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(input): Json<AssessmentInput>,
) -> Result<(HeaderMap, Json<Assessment>), AppError> {
    tracing::debug!("REST request to partial update Assessment partially : {id}, {input:?}");
    let mut assessment = existing_for_update(&state, id, input.id).await?;

    assessment.merge(input);
    let saved = state.stores.assessments.save(&assessment).await?;

    let headers = state.alerts.updated(ENTITY_NAME, &id.to_string());
    Ok((headers, Json(saved)))
}

pub async fn list(
    State(state): State<SharedState>,
    OriginalUri(uri): OriginalUri,
    Query(params): Query<ListParams>,
) -> Result<(HeaderMap, Json<Vec<Assessment>>), AppError> {
    tracing::debug!("REST request to get a page of Assessments");
    let page_request = PageRequest::from_query(uri.query(), SORT_FIELDS, state.config.page_limits)?;

    let page = state
        .stores
        .assessments
        .find_page(params.kind.as_deref(), &page_request)
        .await?;

    let headers = pagination_headers(&state.config.base_url, &uri, &page);
    Ok((headers, Json(page.content)))
}

pub async fn get(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Assessment>, AppError> {
    tracing::debug!("REST request to get Assessment : {id}");
    let assessment = state
        .stores
        .assessments
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Assessment not found".to_string()))?;
    Ok(Json(assessment))
}

pub async fn delete(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, HeaderMap), AppError> {
    tracing::debug!("REST request to delete Assessment : {id}");
    state.stores.assessments.delete(id).await?;
    let headers = state.alerts.deleted(ENTITY_NAME, &id.to_string());
    Ok((StatusCode::NO_CONTENT, headers))
}

async fn existing_for_update(
    state: &SharedState,
    id: Uuid,
    body_id: Option<Uuid>,
) -> Result<Assessment, AppError> {
    let Some(body_id) = body_id else {
        return Err(AppError::bad_request("Invalid id", ENTITY_NAME, "idnull"));
    };
    if body_id != id {
        return Err(AppError::bad_request("Invalid ID", ENTITY_NAME, "idinvalid"));
    }
    state
        .stores
        .assessments
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::bad_request("Entity not found", ENTITY_NAME, "idnotfound"))
}

fn required_fields(input: &AssessmentInput) -> Result<(String, String), AppError> {
    let name = match input.name.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => return Err(AppError::bad_request("Name is required", ENTITY_NAME, "namerequired")),
    };
    let kind = match input.kind.as_deref().map(str::trim) {
        Some(kind) if !kind.is_empty() => kind.to_string(),
        _ => return Err(AppError::bad_request("Type is required", ENTITY_NAME, "typerequired")),
    };
    Ok((name, kind))
}
