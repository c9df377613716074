use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{Stage, Status};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminAccount {
    pub id: i64,
    pub external_id: String,
    pub full_name: String,
    pub email: String,
    #[serde(skip)]
    pub password_hash: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A bearer session issued at login. The raw token is never stored; only
/// its argon2id hash plus a short lookup prefix for indexed retrieval.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: i64,
    pub token_hash: String,
    pub token_lookup: String,
    pub account_id: i64,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub last_used_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobPosting {
    pub id: i64,
    pub external_id: String,
    pub title: String,
    pub slug: String,
    pub details: Value,
    pub description: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Applicant {
    pub id: i64,
    pub external_id: String,
    pub job_id: i64,
    pub basic_answers: Value,
    pub application_answers: Value,
    pub resume_path: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineEntry {
    pub id: i64,
    pub job_id: i64,
    pub applicant_id: i64,
    pub full_name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub rating: i64,
    pub status: Status,
    pub stage: Stage,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Posting joined with its form schema (basic fields + application steps)
/// for the public listing. The form schema lives 1:1 with the posting in
/// its own table; its two JSON columns surface here.
#[derive(Debug, Clone, Serialize)]
pub struct JobWithSchema {
    #[serde(flatten)]
    pub job: JobPosting,
    #[serde(rename = "basicFormSchema")]
    pub basic_form_schema: Value,
    #[serde(rename = "applicationFormSchema")]
    pub application_form_schema: Value,
}

/// Applicant joined with pipeline entry and posting for list views.
#[derive(Debug, Clone, Serialize)]
pub struct ApplicantSummary {
    pub id: i64,
    pub external_id: String,
    pub job_id: i64,
    pub job_title: String,
    pub job_slug: String,
    pub full_name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub rating: i64,
    pub status: Status,
    #[serde(rename = "currentStage")]
    pub stage: Stage,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub resume_path: String,
    pub applied_at: DateTime<Utc>,
}

/// Fields applied to a pipeline entry by the stage-update operation.
/// Absent fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct PipelinePatch {
    pub stage: Option<Stage>,
    pub status: Option<Status>,
    pub rating: Option<i64>,
    pub note: Option<String>,
}

impl PipelinePatch {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stage.is_none()
            && self.status.is_none()
            && self.rating.is_none()
            && self.note.is_none()
    }
}

/// Fields applied to a posting by the partial-update operation.
/// `None` means "preserve the stored value", including the schema fields.
#[derive(Debug, Clone, Default)]
pub struct JobPatch {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub details: Option<Value>,
    pub description: Option<Value>,
    pub basic_fields: Option<Value>,
    pub application_steps: Option<Value>,
}

impl JobPatch {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.slug.is_none()
            && self.details.is_none()
            && self.description.is_none()
            && self.basic_fields.is_none()
            && self.application_steps.is_none()
    }
}
