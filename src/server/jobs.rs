use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use uuid::Uuid;

use crate::auth::AuthedAdmin;
use crate::server::AppState;
use crate::server::dto::{CreateJobRequest, UpdateJobRequest};
use crate::server::response::{ApiError, ApiResponse, StoreOptionExt};
use crate::server::validation::{validate_slug, validate_title};
use crate::store::NewJob;
use crate::types::JobPatch;

pub async fn create_job(
    _admin: AuthedAdmin,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateJobRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_title(&req.title)?;
    validate_slug(&req.slug)?;

    let job = state.store.create_job(&NewJob {
        external_id: Uuid::new_v4().to_string(),
        title: req.title.trim().to_string(),
        slug: req.slug,
        details: req.details.unwrap_or_else(|| json!({})),
        description: req.description.unwrap_or_else(|| json!({})),
        basic_fields: req.basic_form_schema.unwrap_or_else(|| json!([])),
        application_steps: req.application_form_schema.unwrap_or_else(|| json!({})),
    })?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(job))))
}

pub async fn list_jobs(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let jobs = state.store.list_jobs()?;
    Ok(Json(ApiResponse::success(jobs)))
}

pub async fn update_job(
    _admin: AuthedAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateJobRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if let Some(title) = &req.title {
        validate_title(title)?;
    }
    if let Some(slug) = &req.slug {
        validate_slug(slug)?;
    }

    let patch = JobPatch {
        title: req.title.map(|t| t.trim().to_string()),
        slug: req.slug,
        details: req.details,
        description: req.description,
        basic_fields: req.basic_form_schema,
        application_steps: req.application_form_schema,
    };

    if patch.is_empty() {
        return Err(ApiError::bad_request("no fields supplied"));
    }

    state.store.update_job(id, &patch).map_err(|e| match e {
        crate::error::Error::NotFound => ApiError::not_found("Job not found"),
        other => ApiError::from(other),
    })?;

    let job = state
        .store
        .get_job_with_schema(id)?
        .or_not_found("Job not found")?;

    Ok(Json(ApiResponse::success(job)))
}

pub async fn delete_job(
    _admin: AuthedAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    // Resume files for this posting's applicants are removed before the
    // rows cascade away.
    let applicants = state.store.list_job_applicants(id)?;

    if !state.store.delete_job(id)? {
        return Err(ApiError::not_found("Job not found"));
    }

    for applicant in applicants {
        super::uploads::remove_resume(&state.uploads_dir, &applicant.resume_path).await;
    }

    Ok(StatusCode::NO_CONTENT)
}
