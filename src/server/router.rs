use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::{DefaultBodyLimit, Request};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::{
    Router,
    routing::{delete, get, patch, post},
};

use super::uploads::MAX_RESUME_BYTES;
use super::{accounts, applicants, jobs, uploads};
use crate::store::Store;

pub struct AppState {
    pub store: Arc<dyn Store>,
    pub uploads_dir: PathBuf,
}

async fn health() -> &'static str {
    "OK"
}

async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    let response = next.run(request).await;

    let latency = start.elapsed();
    let status = response.status();

    tracing::info!(
        "{} {} {} {}ms",
        method,
        uri.path(),
        status.as_u16(),
        latency.as_millis()
    );

    response
}

pub fn create_router(state: Arc<AppState>) -> Router {
    // Multipart submissions carry a resume plus form answers, so the body
    // limit sits above the per-file cap.
    let body_limit = MAX_RESUME_BYTES + 1024 * 1024;

    Router::new()
        .route("/health", get(health))
        .route("/signup", post(accounts::signup))
        .route("/login", post(accounts::login))
        .route("/", get(accounts::list_accounts))
        .route("/add-user", post(accounts::add_account))
        .route("/update-user/{id}", patch(accounts::update_account))
        .route("/update-password/{id}", patch(accounts::update_password))
        .route("/delete-user/{id}", delete(accounts::delete_account))
        .route("/jobs", get(jobs::list_jobs))
        .route("/add-job", post(jobs::create_job))
        .route("/jobs/{id}", patch(jobs::update_job).delete(jobs::delete_job))
        .route(
            "/applicants",
            post(applicants::submit_applicant).get(applicants::list_applicants),
        )
        .route("/applicants/shortlisted", get(applicants::list_shortlisted))
        .route("/applicants/rejected", get(applicants::list_rejected))
        .route("/applicants/hired", get(applicants::list_hired))
        .route("/applicants/job/{job_id}", get(applicants::list_job_applicants))
        .route(
            "/applicants/{id}",
            get(applicants::get_applicant).delete(applicants::delete_applicant),
        )
        .route("/applicants/{id}/stage", patch(applicants::update_stage))
        .route("/uploads/{filename}", get(uploads::serve_upload))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(middleware::from_fn(log_request))
        .with_state(state)
}
