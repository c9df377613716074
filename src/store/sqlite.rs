use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, params};
use serde_json::Value;

use super::schema::SCHEMA;
use super::{AccountPatch, NewAccount, NewApplicant, NewJob, NewSession, Store, contact};
use crate::error::{Error, Result};
use crate::types::*;

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = Connection::open(db_path)?;

        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.pragma_update(None, "journal_mode", "WAL")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Returns a guard to the underlying database connection.
    /// This allows consuming applications to execute custom SQL.
    pub fn connection(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn()
    }
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            // Handle SQLite's default datetime format: "YYYY-MM-DD HH:MM:SS"
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            tracing::error!("Invalid datetime in database: '{}' - {}", s, e);
            Utc::now()
        })
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

/// Reads a TEXT column holding JSON with a typed, fallible parse. Malformed
/// persisted data surfaces as a conversion error instead of an empty value.
fn json_col(row: &Row, idx: usize) -> rusqlite::Result<Value> {
    let raw: String = row.get(idx)?;
    serde_json::from_str(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn stage_col(row: &Row, idx: usize) -> rusqlite::Result<Stage> {
    let raw: String = row.get(idx)?;
    raw.parse()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn status_col(row: &Row, idx: usize) -> rusqlite::Result<Status> {
    let raw: String = row.get(idx)?;
    raw.parse()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Maps a UNIQUE constraint failure to a domain conflict.
fn constraint_to_conflict(err: rusqlite::Error, message: &str) -> Error {
    match err {
        rusqlite::Error::SqliteFailure(e, _)
            if e.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            Error::Conflict(message.to_string())
        }
        e => Error::from(e),
    }
}

fn account_from_row(row: &Row) -> rusqlite::Result<AdminAccount> {
    Ok(AdminAccount {
        id: row.get(0)?,
        external_id: row.get(1)?,
        full_name: row.get(2)?,
        email: row.get(3)?,
        password_hash: row.get(4)?,
        role: row.get(5)?,
        created_at: parse_datetime(&row.get::<_, String>(6)?),
        updated_at: parse_datetime(&row.get::<_, String>(7)?),
    })
}

const ACCOUNT_COLUMNS: &str =
    "id, external_id, full_name, email, password_hash, role, created_at, updated_at";

fn job_with_schema_from_row(row: &Row) -> rusqlite::Result<JobWithSchema> {
    Ok(JobWithSchema {
        job: JobPosting {
            id: row.get(0)?,
            external_id: row.get(1)?,
            title: row.get(2)?,
            slug: row.get(3)?,
            details: json_col(row, 4)?,
            description: json_col(row, 5)?,
            created_at: parse_datetime(&row.get::<_, String>(6)?),
            updated_at: parse_datetime(&row.get::<_, String>(7)?),
        },
        basic_form_schema: json_col(row, 8)?,
        application_form_schema: json_col(row, 9)?,
    })
}

const JOB_SCHEMA_SELECT: &str = "SELECT j.id, j.external_id, j.title, j.slug, j.details, j.description, j.created_at, j.updated_at,
        COALESCE(s.basic_fields, '[]'), COALESCE(s.application_steps, '{}')
 FROM jobs j
 LEFT JOIN form_schemas s ON s.job_id = j.id";

fn applicant_from_row(row: &Row) -> rusqlite::Result<Applicant> {
    Ok(Applicant {
        id: row.get(0)?,
        external_id: row.get(1)?,
        job_id: row.get(2)?,
        basic_answers: json_col(row, 3)?,
        application_answers: json_col(row, 4)?,
        resume_path: row.get(5)?,
        created_at: parse_datetime(&row.get::<_, String>(6)?),
    })
}

fn summary_from_row(row: &Row) -> rusqlite::Result<ApplicantSummary> {
    Ok(ApplicantSummary {
        id: row.get(0)?,
        external_id: row.get(1)?,
        job_id: row.get(2)?,
        job_title: row.get(3)?,
        job_slug: row.get(4)?,
        full_name: row.get(5)?,
        email: row.get(6)?,
        phone: row.get(7)?,
        rating: row.get(8)?,
        status: status_col(row, 9)?,
        stage: stage_col(row, 10)?,
        note: row.get(11)?,
        resume_path: row.get(12)?,
        applied_at: parse_datetime(&row.get::<_, String>(13)?),
    })
}

const SUMMARY_SELECT: &str = "SELECT a.id, a.external_id, a.job_id, j.title, j.slug,
        COALESCE(p.full_name, ''), COALESCE(p.email, ''), p.phone,
        COALESCE(p.rating, 0),
        COALESCE(p.status, 'New Application'),
        COALESCE(p.stage, 'Application Screening'),
        p.note, a.resume_path, a.created_at
 FROM applicants a
 JOIN jobs j ON j.id = a.job_id
 LEFT JOIN pipeline_entries p ON p.applicant_id = a.id";

fn entry_from_row(row: &Row) -> rusqlite::Result<PipelineEntry> {
    Ok(PipelineEntry {
        id: row.get(0)?,
        job_id: row.get(1)?,
        applicant_id: row.get(2)?,
        full_name: row.get(3)?,
        email: row.get(4)?,
        phone: row.get(5)?,
        rating: row.get(6)?,
        status: status_col(row, 7)?,
        stage: stage_col(row, 8)?,
        note: row.get(9)?,
        created_at: parse_datetime(&row.get::<_, String>(10)?),
        updated_at: parse_datetime(&row.get::<_, String>(11)?),
    })
}

const ENTRY_COLUMNS: &str = "id, job_id, applicant_id, full_name, email, phone, rating, status, stage, note, created_at, updated_at";

impl Store for SqliteStore {
    fn initialize(&self) -> Result<()> {
        let conn = self.conn();
        conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    // Account operations

    fn create_account(&self, account: &NewAccount) -> Result<AdminAccount> {
        let now = Utc::now();
        let conn = self.conn();
        conn.execute(
            "INSERT INTO accounts (external_id, full_name, email, password_hash, role, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                account.external_id,
                account.full_name,
                account.email,
                account.password_hash,
                account.role,
                format_datetime(&now),
                format_datetime(&now),
            ],
        )
        .map_err(|e| constraint_to_conflict(e, "email already registered"))?;

        Ok(AdminAccount {
            id: conn.last_insert_rowid(),
            external_id: account.external_id.clone(),
            full_name: account.full_name.clone(),
            email: account.email.clone(),
            password_hash: account.password_hash.clone(),
            role: account.role.clone(),
            created_at: now,
            updated_at: now,
        })
    }

    fn get_account(&self, id: i64) -> Result<Option<AdminAccount>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = ?1"),
            params![id],
            account_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn get_account_by_email(&self, email: &str) -> Result<Option<AdminAccount>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE email = ?1"),
            params![email],
            account_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_accounts(&self) -> Result<Vec<AdminAccount>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts ORDER BY created_at DESC, id DESC"
        ))?;

        let rows = stmt.query_map([], account_from_row)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn update_account(&self, id: i64, patch: &AccountPatch) -> Result<()> {
        let rows = self
            .conn()
            .execute(
                "UPDATE accounts SET
                    full_name = COALESCE(?1, full_name),
                    email = COALESCE(?2, email),
                    updated_at = ?3
                 WHERE id = ?4",
                params![patch.full_name, patch.email, format_datetime(&Utc::now()), id],
            )
            .map_err(|e| constraint_to_conflict(e, "email already registered"))?;

        if rows == 0 {
            return Err(Error::NotFound);
        }
        Ok(())
    }

    fn update_account_password(&self, id: i64, password_hash: &str) -> Result<()> {
        let rows = self.conn().execute(
            "UPDATE accounts SET password_hash = ?1, updated_at = ?2 WHERE id = ?3",
            params![password_hash, format_datetime(&Utc::now()), id],
        )?;

        if rows == 0 {
            return Err(Error::NotFound);
        }
        Ok(())
    }

    fn delete_account(&self, id: i64) -> Result<bool> {
        let rows = self
            .conn()
            .execute("DELETE FROM accounts WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    // Session operations

    fn create_session(&self, session: &NewSession) -> Result<Session> {
        let now = Utc::now();
        let conn = self.conn();
        conn.execute(
            "INSERT INTO sessions (token_hash, token_lookup, account_id, created_at, expires_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                session.token_hash,
                session.token_lookup,
                session.account_id,
                format_datetime(&now),
                format_datetime(&session.expires_at),
            ],
        )
        .map_err(|e| constraint_to_conflict(e, "session lookup collision"))?;

        Ok(Session {
            id: conn.last_insert_rowid(),
            token_hash: session.token_hash.clone(),
            token_lookup: session.token_lookup.clone(),
            account_id: session.account_id,
            created_at: now,
            expires_at: session.expires_at,
            last_used_at: None,
        })
    }

    fn get_session_by_lookup(&self, lookup: &str) -> Result<Option<Session>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT id, token_hash, token_lookup, account_id, created_at, expires_at, last_used_at
             FROM sessions WHERE token_lookup = ?1",
            params![lookup],
            |row| {
                Ok(Session {
                    id: row.get(0)?,
                    token_hash: row.get(1)?,
                    token_lookup: row.get(2)?,
                    account_id: row.get(3)?,
                    created_at: parse_datetime(&row.get::<_, String>(4)?),
                    expires_at: parse_datetime(&row.get::<_, String>(5)?),
                    last_used_at: row.get::<_, Option<String>>(6)?.map(|s| parse_datetime(&s)),
                })
            },
        )
        .optional()
        .map_err(Error::from)
    }

    fn touch_session(&self, id: i64) -> Result<()> {
        self.conn().execute(
            "UPDATE sessions SET last_used_at = ?1 WHERE id = ?2",
            params![format_datetime(&Utc::now()), id],
        )?;
        Ok(())
    }

    // Job posting operations

    fn create_job(&self, job: &NewJob) -> Result<JobWithSchema> {
        let now = Utc::now();
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        tx.execute(
            "INSERT INTO jobs (external_id, title, slug, details, description, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                job.external_id,
                job.title,
                job.slug,
                job.details.to_string(),
                job.description.to_string(),
                format_datetime(&now),
                format_datetime(&now),
            ],
        )
        .map_err(|e| constraint_to_conflict(e, "slug already exists"))?;
        let job_id = tx.last_insert_rowid();

        tx.execute(
            "INSERT INTO form_schemas (external_id, job_id, basic_fields, application_steps, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                uuid::Uuid::new_v4().to_string(),
                job_id,
                job.basic_fields.to_string(),
                job.application_steps.to_string(),
                format_datetime(&now),
                format_datetime(&now),
            ],
        )?;

        tx.commit()?;

        Ok(JobWithSchema {
            job: JobPosting {
                id: job_id,
                external_id: job.external_id.clone(),
                title: job.title.clone(),
                slug: job.slug.clone(),
                details: job.details.clone(),
                description: job.description.clone(),
                created_at: now,
                updated_at: now,
            },
            basic_form_schema: job.basic_fields.clone(),
            application_form_schema: job.application_steps.clone(),
        })
    }

    fn get_job(&self, id: i64) -> Result<Option<JobPosting>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT id, external_id, title, slug, details, description, created_at, updated_at
             FROM jobs WHERE id = ?1",
            params![id],
            |row| {
                Ok(JobPosting {
                    id: row.get(0)?,
                    external_id: row.get(1)?,
                    title: row.get(2)?,
                    slug: row.get(3)?,
                    details: json_col(row, 4)?,
                    description: json_col(row, 5)?,
                    created_at: parse_datetime(&row.get::<_, String>(6)?),
                    updated_at: parse_datetime(&row.get::<_, String>(7)?),
                })
            },
        )
        .optional()
        .map_err(Error::from)
    }

    fn get_job_with_schema(&self, id: i64) -> Result<Option<JobWithSchema>> {
        let conn = self.conn();
        conn.query_row(
            &format!("{JOB_SCHEMA_SELECT} WHERE j.id = ?1"),
            params![id],
            job_with_schema_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_jobs(&self) -> Result<Vec<JobWithSchema>> {
        let conn = self.conn();
        let mut stmt =
            conn.prepare(&format!("{JOB_SCHEMA_SELECT} ORDER BY j.created_at DESC, j.id DESC"))?;

        let rows = stmt.query_map([], job_with_schema_from_row)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn update_job(&self, id: i64, patch: &JobPatch) -> Result<()> {
        let now = format_datetime(&Utc::now());
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        let rows = tx
            .execute(
                "UPDATE jobs SET
                    title = COALESCE(?1, title),
                    slug = COALESCE(?2, slug),
                    details = COALESCE(?3, details),
                    description = COALESCE(?4, description),
                    updated_at = ?5
                 WHERE id = ?6",
                params![
                    patch.title,
                    patch.slug,
                    patch.details.as_ref().map(Value::to_string),
                    patch.description.as_ref().map(Value::to_string),
                    now,
                    id,
                ],
            )
            .map_err(|e| constraint_to_conflict(e, "slug already exists"))?;

        if rows == 0 {
            return Err(Error::NotFound);
        }

        // Schema fields are preserved when absent; the row is only touched
        // when the caller actually supplied one of them.
        if patch.basic_fields.is_some() || patch.application_steps.is_some() {
            let updated = tx.execute(
                "UPDATE form_schemas SET
                    basic_fields = COALESCE(?1, basic_fields),
                    application_steps = COALESCE(?2, application_steps),
                    updated_at = ?3
                 WHERE job_id = ?4",
                params![
                    patch.basic_fields.as_ref().map(Value::to_string),
                    patch.application_steps.as_ref().map(Value::to_string),
                    now,
                    id,
                ],
            )?;

            if updated == 0 {
                tx.execute(
                    "INSERT INTO form_schemas (external_id, job_id, basic_fields, application_steps, created_at, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
                    params![
                        uuid::Uuid::new_v4().to_string(),
                        id,
                        patch
                            .basic_fields
                            .as_ref()
                            .map_or_else(|| "[]".to_string(), Value::to_string),
                        patch
                            .application_steps
                            .as_ref()
                            .map_or_else(|| "{}".to_string(), Value::to_string),
                        now,
                    ],
                )?;
            }
        }

        tx.commit()?;
        Ok(())
    }

    fn delete_job(&self, id: i64) -> Result<bool> {
        let rows = self
            .conn()
            .execute("DELETE FROM jobs WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    // Applicant operations

    fn create_applicant(&self, applicant: &NewApplicant) -> Result<Applicant> {
        let now = Utc::now();
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        tx.execute(
            "INSERT INTO applicants (external_id, job_id, basic_answers, application_answers, resume_path, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                applicant.external_id,
                applicant.job_id,
                applicant.basic_answers.to_string(),
                applicant.application_answers.to_string(),
                applicant.resume_path,
                format_datetime(&now),
            ],
        )?;
        let applicant_id = tx.last_insert_rowid();

        tx.execute(
            "INSERT INTO pipeline_entries (job_id, applicant_id, full_name, email, phone, status, stage, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)",
            params![
                applicant.job_id,
                applicant_id,
                applicant.full_name,
                applicant.email,
                applicant.phone,
                Status::default().as_str(),
                Stage::default().as_str(),
                format_datetime(&now),
            ],
        )?;

        tx.commit()?;

        Ok(Applicant {
            id: applicant_id,
            external_id: applicant.external_id.clone(),
            job_id: applicant.job_id,
            basic_answers: applicant.basic_answers.clone(),
            application_answers: applicant.application_answers.clone(),
            resume_path: applicant.resume_path.clone(),
            created_at: now,
        })
    }

    fn get_applicant(&self, id: i64) -> Result<Option<Applicant>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT id, external_id, job_id, basic_answers, application_answers, resume_path, created_at
             FROM applicants WHERE id = ?1",
            params![id],
            applicant_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_applicants(&self) -> Result<Vec<ApplicantSummary>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "{SUMMARY_SELECT} ORDER BY a.created_at DESC, a.id DESC"
        ))?;

        let rows = stmt.query_map([], summary_from_row)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn list_applicants_by_status(&self, status: Status) -> Result<Vec<ApplicantSummary>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "{SUMMARY_SELECT} WHERE p.status = ?1 ORDER BY a.created_at DESC, a.id DESC"
        ))?;

        let rows = stmt.query_map(params![status.as_str()], summary_from_row)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn list_job_applicants(&self, job_id: i64) -> Result<Vec<ApplicantSummary>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "{SUMMARY_SELECT} WHERE a.job_id = ?1 ORDER BY a.created_at DESC, a.id DESC"
        ))?;

        let rows = stmt.query_map(params![job_id], summary_from_row)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn delete_applicant(&self, id: i64) -> Result<bool> {
        let rows = self
            .conn()
            .execute("DELETE FROM applicants WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    // Pipeline operations

    fn get_pipeline_entry(&self, applicant_id: i64) -> Result<Option<PipelineEntry>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {ENTRY_COLUMNS} FROM pipeline_entries WHERE applicant_id = ?1"),
            params![applicant_id],
            entry_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn update_pipeline(&self, applicant_id: i64, patch: &PipelinePatch) -> Result<PipelineEntry> {
        let now = format_datetime(&Utc::now());
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        let applicant: Option<(i64, String)> = tx
            .query_row(
                "SELECT job_id, basic_answers FROM applicants WHERE id = ?1",
                params![applicant_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        let (job_id, basic_answers) = applicant.ok_or(Error::NotFound)?;

        // Get-or-create: older submissions may predate the pipeline row.
        // The UNIQUE applicant_id column makes this safe under concurrent
        // first updates.
        let answers: Value = serde_json::from_str(&basic_answers)?;
        let found = contact::extract_contact(&answers);
        tx.execute(
            "INSERT INTO pipeline_entries (job_id, applicant_id, full_name, email, phone, status, stage, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)
             ON CONFLICT (applicant_id) DO NOTHING",
            params![
                job_id,
                applicant_id,
                found.full_name.unwrap_or_default(),
                found.email.unwrap_or_default(),
                found.phone,
                Status::default().as_str(),
                Stage::default().as_str(),
                now,
            ],
        )?;

        if let Some(next) = patch.stage {
            let current = tx.query_row(
                "SELECT stage FROM pipeline_entries WHERE applicant_id = ?1",
                params![applicant_id],
                |row| stage_col(row, 0),
            )?;

            if !current.can_advance_to(next) {
                return Err(Error::BadRequest(format!(
                    "cannot move applicant from '{current}' to '{next}'"
                )));
            }
        }

        tx.execute(
            "UPDATE pipeline_entries SET
                stage = COALESCE(?1, stage),
                status = COALESCE(?2, status),
                rating = COALESCE(?3, rating),
                note = COALESCE(?4, note),
                updated_at = ?5
             WHERE applicant_id = ?6",
            params![
                patch.stage.map(Stage::as_str),
                patch.status.map(Status::as_str),
                patch.rating,
                patch.note,
                now,
                applicant_id,
            ],
        )?;

        let entry = tx.query_row(
            &format!("SELECT {ENTRY_COLUMNS} FROM pipeline_entries WHERE applicant_id = ?1"),
            params![applicant_id],
            entry_from_row,
        )?;

        tx.commit()?;
        Ok(entry)
    }

    fn close(&self) -> Result<()> {
        Ok(())
    }
}
