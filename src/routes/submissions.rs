use axum::extract::{OriginalUri, Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::headers::pagination_headers;
use crate::models::submission::{SubmissionInput, SORT_FIELDS};
use crate::models::Submission;
use crate::pagination::PageRequest;
use crate::resolver;
use crate::state::SharedState;

const ENTITY_NAME: &str = "submission";

#[derive(Deserialize)]
pub struct ListParams {
    pub user: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

pub async fn create(
    State(state): State<SharedState>,
    Json(input): Json<SubmissionInput>,
) -> Result<(StatusCode, HeaderMap, Json<Submission>), AppError> {
    tracing::debug!("REST request to save Submission : {input:?}");
    if input.id.is_some() {
        return Err(AppError::bad_request(
            "A new submission cannot already have an ID",
            ENTITY_NAME,
            "idexists",
        ));
    }

    let (user_id, assessment_id) = references(&state, &input).await?;
    let submission = Submission {
        id: Uuid::now_v7(),
        user_id,
        assessment_id,
        github_url: input.github_url,
        content: input.content,
        submitted_at: Utc::now(),
    };
    let saved = state.stores.submissions.save(&submission).await?;

    let id = saved.id.to_string();
    let headers = state
        .alerts
        .created(ENTITY_NAME, &format!("/api/submissions/{id}"), &id);
    Ok((StatusCode::CREATED, headers, Json(saved)))
}

pub async fn update(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(input): Json<SubmissionInput>,
) -> Result<(HeaderMap, Json<Submission>), AppError> {
    tracing::debug!("REST request to update Submission : {id}, {input:?}");
    let existing = existing_for_update(&state, id, input.id).await?;

    let (user_id, assessment_id) = references(&state, &input).await?;
    let submission = Submission {
        id,
        user_id,
        assessment_id,
        github_url: input.github_url,
        content: input.content,
        submitted_at: existing.submitted_at,
    };
    let saved = state.stores.submissions.save(&submission).await?;

    let headers = state.alerts.updated(ENTITY_NAME, &id.to_string());
    Ok((headers, Json(saved)))
}

pub async fn partial_update(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(input): Json<SubmissionInput>,
) -> Result<(HeaderMap, Json<Submission>), AppError> {
    tracing::debug!("REST request to partial update Submission partially : {id}, {input:?}");
    let mut submission = existing_for_update(&state, id, input.id).await?;

    if input.user_id.is_some() || input.assessment_id.is_some() {
        let merged = SubmissionInput {
            user_id: input.user_id.or(Some(submission.user_id)),
            assessment_id: input.assessment_id.or(Some(submission.assessment_id)),
            ..SubmissionInput::default()
        };
        references(&state, &merged).await?;
    }

    submission.merge(input);
    let saved = state.stores.submissions.save(&submission).await?;

    let headers = state.alerts.updated(ENTITY_NAME, &id.to_string());
    Ok((headers, Json(saved)))
}

/// `GET /api/submissions`: all submissions, optionally narrowed by `user`
/// login and assessment `type`.
pub async fn list(
    State(state): State<SharedState>,
    OriginalUri(uri): OriginalUri,
    Query(params): Query<ListParams>,
) -> Result<(HeaderMap, Json<Vec<Submission>>), AppError> {
    tracing::debug!("REST request to get a page of Submissions based on search");
    let page_request = PageRequest::from_query(uri.query(), SORT_FIELDS, state.config.page_limits)?;

    let page = resolver::resolve_submission_query(
        &state.lookup,
        state.stores.submissions.as_ref(),
        params.user,
        params.kind,
        &page_request,
    )
    .await?;

    let headers = pagination_headers(&state.config.base_url, &uri, &page);
    Ok((headers, Json(page.content)))
}

/// `GET /api/submissions/search`: like [`list`], but honours a single filter
/// and returns nothing when none is given.
pub async fn search(
    State(state): State<SharedState>,
    OriginalUri(uri): OriginalUri,
    Query(params): Query<ListParams>,
) -> Result<(HeaderMap, Json<Vec<Submission>>), AppError> {
    tracing::debug!("REST request to search a page of Submissions");
    let page_request = PageRequest::from_query(uri.query(), SORT_FIELDS, state.config.page_limits)?;

    let page = resolver::resolve_submission_search(
        &state.lookup,
        state.stores.submissions.as_ref(),
        params.user,
        params.kind,
        &page_request,
    )
    .await?;

    let headers = pagination_headers(&state.config.base_url, &uri, &page);
    Ok((headers, Json(page.content)))
}

pub async fn get(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Submission>, AppError> {
    tracing::debug!("REST request to get Submission : {id}");
    let submission = state
        .stores
        .submissions
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Submission not found".to_string()))?;
    Ok(Json(submission))
}

pub async fn delete(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, HeaderMap), AppError> {
    tracing::debug!("REST request to delete Submission : {id}");
    state.stores.submissions.delete(id).await?;
    let headers = state.alerts.deleted(ENTITY_NAME, &id.to_string());
    Ok((StatusCode::NO_CONTENT, headers))
}

/// Id checks shared by PUT and PATCH, returning the stored submission.
async fn existing_for_update(
    state: &SharedState,
    id: Uuid,
    body_id: Option<Uuid>,
) -> Result<Submission, AppError> {
    let Some(body_id) = body_id else {
        return Err(AppError::bad_request("Invalid id", ENTITY_NAME, "idnull"));
    };
    if body_id != id {
        return Err(AppError::bad_request("Invalid ID", ENTITY_NAME, "idinvalid"));
    }
    state
        .stores
        .submissions
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::bad_request("Entity not found", ENTITY_NAME, "idnotfound"))
}

/// Both references must be present and point at stored entities.
async fn references(
    state: &SharedState,
    input: &SubmissionInput,
) -> Result<(Uuid, Uuid), AppError> {
    let user_id = input
        .user_id
        .ok_or_else(|| AppError::bad_request("A submission needs a userId", ENTITY_NAME, "userrequired"))?;
    let assessment_id = input.assessment_id.ok_or_else(|| {
        AppError::bad_request("A submission needs an assessmentId", ENTITY_NAME, "assessmentrequired")
    })?;

    if state.stores.users.find_by_id(user_id).await?.is_none() {
        return Err(AppError::bad_request("Referenced user not found", ENTITY_NAME, "usernotfound"));
    }
    if state.stores.assessments.find_by_id(assessment_id).await?.is_none() {
        return Err(AppError::bad_request(
            "Referenced assessment not found",
            ENTITY_NAME,
            "assessmentnotfound",
        ));
    }
    Ok((user_id, assessment_id))
}
