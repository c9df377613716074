use std::sync::Arc;

use axum::{
    Json,
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::Value;
use uuid::Uuid;

use crate::auth::AuthedAdmin;
use crate::server::AppState;
use crate::server::dto::{ApplicantDetail, StageUpdateRequest, SubmissionResponse};
use crate::server::response::{ApiError, ApiResponse, StoreOptionExt};
use crate::server::uploads::{
    MAX_RESUME_BYTES, RESUME_CONTENT_TYPE, remove_resume, save_resume,
};
use crate::store::{NewApplicant, contact::extract_contact};
use crate::types::{PipelinePatch, Status};

#[derive(Default)]
struct SubmissionParts {
    job_id: Option<i64>,
    basic_answers: Option<Value>,
    application_answers: Option<Value>,
    resume_name: Option<String>,
    resume_data: Option<Vec<u8>>,
}

async fn read_submission(multipart: &mut Multipart) -> Result<SubmissionParts, ApiError> {
    let mut parts = SubmissionParts::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("invalid multipart body: {e}")))?
    {
        match field.name().unwrap_or_default() {
            "job_id" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("invalid job_id field: {e}")))?;
                parts.job_id = Some(
                    text.trim()
                        .parse()
                        .map_err(|_| ApiError::bad_request("job_id must be an integer"))?,
                );
            }
            "basicFormData" => {
                let text = field.text().await.map_err(|e| {
                    ApiError::bad_request(format!("invalid basicFormData field: {e}"))
                })?;
                parts.basic_answers = Some(
                    serde_json::from_str(&text)
                        .map_err(|e| ApiError::bad_request(format!("basicFormData: {e}")))?,
                );
            }
            "applicationData" => {
                let text = field.text().await.map_err(|e| {
                    ApiError::bad_request(format!("invalid applicationData field: {e}"))
                })?;
                parts.application_answers = Some(
                    serde_json::from_str(&text)
                        .map_err(|e| ApiError::bad_request(format!("applicationData: {e}")))?,
                );
            }
            "resume" => {
                let content_type = field.content_type().unwrap_or_default().to_string();
                if content_type != RESUME_CONTENT_TYPE {
                    return Err(ApiError::bad_request("resume must be a PDF"));
                }

                parts.resume_name = Some(
                    field
                        .file_name()
                        .unwrap_or("resume.pdf")
                        .to_string(),
                );

                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("failed to read resume: {e}")))?;
                if data.len() > MAX_RESUME_BYTES {
                    return Err(ApiError::bad_request("resume exceeds the size limit"));
                }
                parts.resume_data = Some(data.to_vec());
            }
            _ => {}
        }
    }

    Ok(parts)
}

/// POST /applicants: public multipart submission. The applicant row and
/// its pipeline entry are written in one transaction; if that fails after
/// the resume landed on disk, the file is removed best-effort.
pub async fn submit_applicant(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let parts = read_submission(&mut multipart).await?;

    let job_id = parts
        .job_id
        .ok_or_else(|| ApiError::bad_request("job_id is required"))?;
    let basic_answers = parts
        .basic_answers
        .ok_or_else(|| ApiError::bad_request("basicFormData is required"))?;
    let application_answers = parts
        .application_answers
        .unwrap_or_else(|| Value::Object(Default::default()));
    let (resume_name, resume_data) = match (parts.resume_name, parts.resume_data) {
        (Some(name), Some(data)) => (name, data),
        _ => return Err(ApiError::bad_request("resume file is required")),
    };

    let contact = extract_contact(&basic_answers);
    let full_name = contact
        .full_name
        .ok_or_else(|| ApiError::bad_request("full name could not be resolved"))?;
    let email = contact
        .email
        .ok_or_else(|| ApiError::bad_request("email could not be resolved"))?;

    state
        .store
        .get_job(job_id)?
        .ok_or_else(|| ApiError::bad_request("job_id does not match any posting"))?;

    let resume_path = save_resume(&state.uploads_dir, &resume_name, &resume_data)
        .await
        .map_err(ApiError::from)?;

    let created = state.store.create_applicant(&NewApplicant {
        external_id: Uuid::new_v4().to_string(),
        job_id,
        basic_answers,
        application_answers,
        resume_path: resume_path.clone(),
        full_name,
        email,
        phone: contact.phone,
    });

    let applicant = match created {
        Ok(applicant) => applicant,
        Err(e) => {
            remove_resume(&state.uploads_dir, &resume_path).await;
            return Err(ApiError::from(e));
        }
    };

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(SubmissionResponse {
            applicant_id: applicant.id,
            external_id: applicant.external_id,
            resume_path,
        })),
    ))
}

pub async fn list_applicants(
    _admin: AuthedAdmin,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let applicants = state.store.list_applicants()?;
    Ok(Json(ApiResponse::success(applicants)))
}

pub async fn list_shortlisted(
    _admin: AuthedAdmin,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let applicants = state.store.list_applicants_by_status(Status::Shortlisted)?;
    Ok(Json(ApiResponse::success(applicants)))
}

pub async fn list_rejected(
    _admin: AuthedAdmin,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let applicants = state.store.list_applicants_by_status(Status::Rejected)?;
    Ok(Json(ApiResponse::success(applicants)))
}

pub async fn list_hired(
    _admin: AuthedAdmin,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let applicants = state.store.list_applicants_by_status(Status::Hired)?;
    Ok(Json(ApiResponse::success(applicants)))
}

pub async fn get_applicant(
    _admin: AuthedAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let applicant = state
        .store
        .get_applicant(id)?
        .or_not_found("Applicant not found")?;

    let pipeline = state.store.get_pipeline_entry(id)?;

    Ok(Json(ApiResponse::success(ApplicantDetail {
        applicant,
        pipeline,
    })))
}

pub async fn list_job_applicants(
    _admin: AuthedAdmin,
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .store
        .get_job(job_id)?
        .or_not_found("Job not found")?;

    let applicants = state.store.list_job_applicants(job_id)?;
    Ok(Json(ApiResponse::success(applicants)))
}

/// PATCH /applicants/{id}/stage: applies any combination of stage,
/// status, rating, and note. A missing pipeline entry is synthesized
/// inside the same transaction, so the update succeeds for any existing
/// applicant.
pub async fn update_stage(
    _admin: AuthedAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(req): Json<StageUpdateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let patch = PipelinePatch {
        stage: req.stage,
        status: req.status,
        rating: req.rating,
        note: req.note,
    };

    if patch.is_empty() {
        return Err(ApiError::bad_request("no fields supplied"));
    }

    let entry = state.store.update_pipeline(id, &patch).map_err(|e| match e {
        crate::error::Error::NotFound => ApiError::not_found("Applicant not found"),
        other => ApiError::from(other),
    })?;

    Ok(Json(ApiResponse::success(entry)))
}

pub async fn delete_applicant(
    _admin: AuthedAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let applicant = state
        .store
        .get_applicant(id)?
        .or_not_found("Applicant not found")?;

    state.store.delete_applicant(id)?;
    remove_resume(&state.uploads_dir, &applicant.resume_path).await;

    Ok(StatusCode::NO_CONTENT)
}
