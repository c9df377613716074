pub mod contact;
mod schema;
mod sqlite;

pub use sqlite::SqliteStore;

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::error::Result;
use crate::types::*;

/// Insert payload for an admin account; the row id is assigned by the store.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub external_id: String,
    pub full_name: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
}

/// Partial account update; `None` preserves the stored value.
#[derive(Debug, Clone, Default)]
pub struct AccountPatch {
    pub full_name: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewSession {
    pub token_hash: String,
    pub token_lookup: String,
    pub account_id: i64,
    pub expires_at: DateTime<Utc>,
}

/// Insert payload for a posting plus its attached form schema. Both rows
/// are written in one transaction.
#[derive(Debug, Clone)]
pub struct NewJob {
    pub external_id: String,
    pub title: String,
    pub slug: String,
    pub details: Value,
    pub description: Value,
    pub basic_fields: Value,
    pub application_steps: Value,
}

/// Insert payload for a public submission. The pipeline entry seeded from
/// the contact fields is written in the same transaction.
#[derive(Debug, Clone)]
pub struct NewApplicant {
    pub external_id: String,
    pub job_id: i64,
    pub basic_answers: Value,
    pub application_answers: Value,
    pub resume_path: String,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
}

/// Store defines the database interface.
pub trait Store: Send + Sync {
    fn initialize(&self) -> Result<()>;

    // Account operations
    fn create_account(&self, account: &NewAccount) -> Result<AdminAccount>;
    fn get_account(&self, id: i64) -> Result<Option<AdminAccount>>;
    fn get_account_by_email(&self, email: &str) -> Result<Option<AdminAccount>>;
    fn list_accounts(&self) -> Result<Vec<AdminAccount>>;
    fn update_account(&self, id: i64, patch: &AccountPatch) -> Result<()>;
    fn update_account_password(&self, id: i64, password_hash: &str) -> Result<()>;
    fn delete_account(&self, id: i64) -> Result<bool>;

    // Session operations
    fn create_session(&self, session: &NewSession) -> Result<Session>;
    fn get_session_by_lookup(&self, lookup: &str) -> Result<Option<Session>>;
    fn touch_session(&self, id: i64) -> Result<()>;

    // Job posting operations
    fn create_job(&self, job: &NewJob) -> Result<JobWithSchema>;
    fn get_job(&self, id: i64) -> Result<Option<JobPosting>>;
    fn get_job_with_schema(&self, id: i64) -> Result<Option<JobWithSchema>>;
    fn list_jobs(&self) -> Result<Vec<JobWithSchema>>;
    fn update_job(&self, id: i64, patch: &JobPatch) -> Result<()>;
    fn delete_job(&self, id: i64) -> Result<bool>;

    // Applicant operations
    fn create_applicant(&self, applicant: &NewApplicant) -> Result<Applicant>;
    fn get_applicant(&self, id: i64) -> Result<Option<Applicant>>;
    fn list_applicants(&self) -> Result<Vec<ApplicantSummary>>;
    fn list_applicants_by_status(&self, status: Status) -> Result<Vec<ApplicantSummary>>;
    fn list_job_applicants(&self, job_id: i64) -> Result<Vec<ApplicantSummary>>;
    fn delete_applicant(&self, id: i64) -> Result<bool>;

    // Pipeline operations
    fn get_pipeline_entry(&self, applicant_id: i64) -> Result<Option<PipelineEntry>>;
    fn update_pipeline(&self, applicant_id: i64, patch: &PipelinePatch) -> Result<PipelineEntry>;

    fn close(&self) -> Result<()>;
}
