use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::{AdminAccount, Applicant, PipelineEntry, Stage, Status};

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub full_name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub account: AdminAccount,
}

#[derive(Debug, Deserialize)]
pub struct CreateAccountRequest {
    pub full_name: String,
    pub email: String,
    #[serde(default)]
    pub role: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateAccountRequest {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// Posting create payload. `applicationForm` is the historical name for
/// the step schema; both spellings are accepted and normalized.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateJobRequest {
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub details: Option<Value>,
    #[serde(default)]
    pub description: Option<Value>,
    #[serde(default)]
    pub basic_form_schema: Option<Value>,
    #[serde(default, alias = "applicationForm")]
    pub application_form_schema: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateJobRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub details: Option<Value>,
    #[serde(default)]
    pub description: Option<Value>,
    #[serde(default)]
    pub basic_form_schema: Option<Value>,
    #[serde(default, alias = "applicationForm")]
    pub application_form_schema: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
pub struct StageUpdateRequest {
    #[serde(default)]
    pub stage: Option<Stage>,
    #[serde(default)]
    pub status: Option<Status>,
    #[serde(default)]
    pub rating: Option<i64>,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SubmissionResponse {
    pub applicant_id: i64,
    pub external_id: String,
    pub resume_path: String,
}

/// Single-applicant view: the raw submission plus its pipeline record.
#[derive(Debug, Serialize)]
pub struct ApplicantDetail {
    #[serde(flatten)]
    pub applicant: Applicant,
    pub pipeline: Option<PipelineEntry>,
}
