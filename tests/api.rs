mod common;

use reqwest::StatusCode;
use reqwest::multipart::{Form, Part};
use serde_json::{Value, json};

use common::test_server::TestServer;

const PASSWORD: &str = "Sup3rSecret!";
const PDF_BYTES: &[u8] = b"%PDF-1.4\n1 0 obj\n<< /Type /Catalog >>\nendobj\ntrailer\n<< >>\n%%EOF\n";

async fn signup_and_login(client: &reqwest::Client, base_url: &str, email: &str) -> String {
    let resp = client
        .post(format!("{}/signup", base_url))
        .json(&json!({
            "full_name": "Test Admin",
            "email": email,
            "password": PASSWORD,
        }))
        .send()
        .await
        .expect("signup");
    assert_eq!(resp.status(), StatusCode::CREATED);

    let resp: Value = client
        .post(format!("{}/login", base_url))
        .json(&json!({"email": email, "password": PASSWORD}))
        .send()
        .await
        .expect("login")
        .json()
        .await
        .expect("parse login response");

    resp["data"]["token"].as_str().expect("token").to_string()
}

async fn create_job(client: &reqwest::Client, base_url: &str, token: &str, slug: &str) -> i64 {
    let resp = client
        .post(format!("{}/add-job", base_url))
        .bearer_auth(token)
        .json(&json!({
            "title": "Backend Engineer",
            "slug": slug,
            "details": {"location": "Remote", "type": "Full-time"},
            "description": {"blocks": [{"type": "paragraph", "text": "Build things."}]},
            "basicFormSchema": [
                {"label": "Full Name", "type": "text", "required": true},
                {"label": "Email", "type": "email", "required": true},
                {"label": "Phone", "type": "tel", "required": false}
            ],
            "applicationFormSchema": [
                {"step": "Experience", "fields": [{"label": "Years of Rust", "type": "number"}]}
            ]
        }))
        .send()
        .await
        .expect("create job");
    assert_eq!(resp.status(), StatusCode::CREATED);

    let body: Value = resp.json().await.expect("parse job response");
    body["data"]["id"].as_i64().expect("job id")
}

async fn submit_applicant(
    client: &reqwest::Client,
    base_url: &str,
    job_id: i64,
    name: &str,
    email: &str,
) -> Value {
    let basic = json!([
        {"label": "Full Name", "value": name},
        {"label": "Email", "value": email},
        {"label": "Phone", "value": "+1 555 0100"},
    ]);
    let application = json!({"Years of Rust": 3});

    let form = Form::new()
        .text("job_id", job_id.to_string())
        .text("basicFormData", basic.to_string())
        .text("applicationData", application.to_string())
        .part(
            "resume",
            Part::bytes(PDF_BYTES.to_vec())
                .file_name("My Resume.pdf")
                .mime_str("application/pdf")
                .expect("pdf mime"),
        );

    let resp = client
        .post(format!("{}/applicants", base_url))
        .multipart(form)
        .send()
        .await
        .expect("submit applicant");
    assert_eq!(resp.status(), StatusCode::CREATED);

    let body: Value = resp.json().await.expect("parse submission response");
    assert!(body["data"]["applicant_id"].is_i64());
    assert!(body["data"]["external_id"].is_string());
    body["data"].clone()
}

#[tokio::test]
async fn account_lifecycle() {
    let server = TestServer::start().await;
    let client = reqwest::Client::new();
    let base = &server.base_url;

    // Weak passwords are rejected before any row is written.
    let resp = client
        .post(format!("{}/signup", base))
        .json(&json!({"full_name": "A", "email": "a@x.com", "password": "short"}))
        .send()
        .await
        .expect("weak signup");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let token = signup_and_login(&client, base, "admin@x.com").await;

    // Duplicate email conflicts.
    let resp = client
        .post(format!("{}/signup", base))
        .json(&json!({"full_name": "B", "email": "admin@x.com", "password": PASSWORD}))
        .send()
        .await
        .expect("dup signup");
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    // Wrong password is a 401, unknown email a 404.
    let resp = client
        .post(format!("{}/login", base))
        .json(&json!({"email": "admin@x.com", "password": "Wr0ngPass!x"}))
        .send()
        .await
        .expect("bad login");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = client
        .post(format!("{}/login", base))
        .json(&json!({"email": "nobody@x.com", "password": PASSWORD}))
        .send()
        .await
        .expect("unknown login");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    // Add a second account; it gets the well-known starter password.
    let resp: Value = client
        .post(format!("{}/add-user", base))
        .bearer_auth(&token)
        .json(&json!({"full_name": "Recruiter", "email": "rec@x.com", "role": "recruiter"}))
        .send()
        .await
        .expect("add user")
        .json()
        .await
        .expect("parse add user");
    let rec_id = resp["data"]["id"].as_i64().expect("recruiter id");
    assert_eq!(resp["data"]["role"], "recruiter");

    let resp = client
        .post(format!("{}/login", base))
        .json(&json!({"email": "rec@x.com", "password": "ChangeMe123!"}))
        .send()
        .await
        .expect("recruiter login");
    assert_eq!(resp.status(), StatusCode::OK);

    // Listing shows both, newest first.
    let resp: Value = client
        .get(format!("{}/", base))
        .bearer_auth(&token)
        .send()
        .await
        .expect("list accounts")
        .json()
        .await
        .expect("parse accounts");
    let accounts = resp["data"].as_array().expect("accounts array");
    assert_eq!(accounts.len(), 2);
    assert!(accounts[0]["password_hash"].is_null());
    // The signup carried no role field, so the default applies.
    assert_eq!(accounts[1]["role"], "admin");

    // A blank role also falls back to the default.
    let resp: Value = client
        .post(format!("{}/add-user", base))
        .bearer_auth(&token)
        .json(&json!({"full_name": "Temp", "email": "temp@x.com", "role": "  "}))
        .send()
        .await
        .expect("add blank-role user")
        .json()
        .await
        .expect("parse blank-role user");
    assert_eq!(resp["data"]["role"], "admin");

    // Rename; response carries the fresh row.
    let resp: Value = client
        .patch(format!("{}/update-user/{}", base, rec_id))
        .bearer_auth(&token)
        .json(&json!({"full_name": "Senior Recruiter"}))
        .send()
        .await
        .expect("update user")
        .json()
        .await
        .expect("parse update");
    assert_eq!(resp["data"]["full_name"], "Senior Recruiter");

    // Password change needs the current password.
    let resp = client
        .patch(format!("{}/update-password/{}", base, rec_id))
        .bearer_auth(&token)
        .json(&json!({"current_password": "nope", "new_password": "N3wSecret!ok"}))
        .send()
        .await
        .expect("bad password change");
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = client
        .patch(format!("{}/update-password/{}", base, rec_id))
        .bearer_auth(&token)
        .json(&json!({"current_password": "ChangeMe123!", "new_password": "N3wSecret!ok"}))
        .send()
        .await
        .expect("password change");
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = client
        .post(format!("{}/login", base))
        .json(&json!({"email": "rec@x.com", "password": "N3wSecret!ok"}))
        .send()
        .await
        .expect("login after change");
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = client
        .delete(format!("{}/delete-user/{}", base, rec_id))
        .bearer_auth(&token)
        .send()
        .await
        .expect("delete user");
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = client
        .delete(format!("{}/delete-user/{}", base, rec_id))
        .bearer_auth(&token)
        .send()
        .await
        .expect("delete again");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn expired_session_rejected() {
    let server = TestServer::start().await;
    let client = reqwest::Client::new();
    let base = &server.base_url;
    let token = signup_and_login(&client, base, "expiry@x.com").await;

    let resp = client
        .get(format!("{}/", base))
        .bearer_auth(&token)
        .send()
        .await
        .expect("fresh session");
    assert_eq!(resp.status(), StatusCode::OK);

    // Rewind the session so its validity window has passed.
    let conn = rusqlite::Connection::open(server.data_dir().join("hireline.db")).expect("open db");
    conn.execute(
        "UPDATE sessions SET expires_at = '2000-01-01T00:00:00+00:00'",
        [],
    )
    .expect("rewind expiry");
    drop(conn);

    let resp = client
        .get(format!("{}/", base))
        .bearer_auth(&token)
        .send()
        .await
        .expect("expired session");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = resp.json().await.expect("parse error body");
    assert_eq!(body["error"], "Token expired");
}

#[tokio::test]
async fn protected_routes_require_token() {
    let server = TestServer::start().await;
    let client = reqwest::Client::new();
    let base = &server.base_url;

    let resp = client
        .get(format!("{}/applicants", base))
        .send()
        .await
        .expect("no auth");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = resp.json().await.expect("parse error body");
    assert!(body["data"].is_null());
    assert!(body["error"].is_string());

    let resp = client
        .get(format!("{}/", base))
        .bearer_auth("hireline_deadbeef_aaaaaaaaaaaaaaaaaaaaaaaa")
        .send()
        .await
        .expect("bad token");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    // The public surface stays open.
    let resp = client
        .get(format!("{}/jobs", base))
        .send()
        .await
        .expect("public jobs");
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn job_posting_lifecycle() {
    let server = TestServer::start().await;
    let client = reqwest::Client::new();
    let base = &server.base_url;
    let token = signup_and_login(&client, base, "jobs@x.com").await;

    let job_id = create_job(&client, base, &token, "backend-engineer").await;

    // Slugs are unique.
    let resp = client
        .post(format!("{}/add-job", base))
        .bearer_auth(&token)
        .json(&json!({"title": "Another", "slug": "backend-engineer"}))
        .send()
        .await
        .expect("dup slug");
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let resp = client
        .post(format!("{}/add-job", base))
        .bearer_auth(&token)
        .json(&json!({"title": "Bad Slug", "slug": "Not A Slug"}))
        .send()
        .await
        .expect("bad slug");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    // Public listing carries the schema columns under their wire names.
    let resp: Value = client
        .get(format!("{}/jobs", base))
        .send()
        .await
        .expect("list jobs")
        .json()
        .await
        .expect("parse jobs");
    let jobs = resp["data"].as_array().expect("jobs array");
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0]["slug"], "backend-engineer");
    assert_eq!(jobs[0]["basicFormSchema"].as_array().expect("basic schema").len(), 3);
    assert!(jobs[0]["applicationFormSchema"].is_array());

    // A title-only patch leaves the schema untouched.
    let resp: Value = client
        .patch(format!("{}/jobs/{}", base, job_id))
        .bearer_auth(&token)
        .json(&json!({"title": "Staff Backend Engineer"}))
        .send()
        .await
        .expect("patch title")
        .json()
        .await
        .expect("parse patch");
    assert_eq!(resp["data"]["title"], "Staff Backend Engineer");
    assert_eq!(
        resp["data"]["basicFormSchema"].as_array().expect("schema kept").len(),
        3
    );

    // A schema patch replaces it.
    let resp: Value = client
        .patch(format!("{}/jobs/{}", base, job_id))
        .bearer_auth(&token)
        .json(&json!({"basicFormSchema": [{"label": "Email", "type": "email"}]}))
        .send()
        .await
        .expect("patch schema")
        .json()
        .await
        .expect("parse schema patch");
    assert_eq!(
        resp["data"]["basicFormSchema"].as_array().expect("new schema").len(),
        1
    );

    let resp = client
        .patch(format!("{}/jobs/{}", base, job_id))
        .bearer_auth(&token)
        .json(&json!({}))
        .send()
        .await
        .expect("empty patch");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = client
        .delete(format!("{}/jobs/{}", base, job_id))
        .bearer_auth(&token)
        .send()
        .await
        .expect("delete job");
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = client
        .patch(format!("{}/jobs/{}", base, job_id))
        .bearer_auth(&token)
        .json(&json!({"title": "Ghost"}))
        .send()
        .await
        .expect("patch deleted");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn applicant_submission_and_pipeline() {
    let server = TestServer::start().await;
    let client = reqwest::Client::new();
    let base = &server.base_url;
    let token = signup_and_login(&client, base, "pipeline@x.com").await;
    let job_id = create_job(&client, base, &token, "platform-engineer").await;

    let submission = submit_applicant(&client, base, job_id, "Jo Doe", "jo@x.com").await;
    let applicant_id = submission["applicant_id"].as_i64().expect("applicant id");
    let resume_path = submission["resume_path"].as_str().expect("resume path");

    // The stored resume streams back as a PDF.
    let resp = client
        .get(format!("{}/uploads/{}", base, resume_path))
        .send()
        .await
        .expect("fetch resume");
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers()["content-type"].to_str().expect("content type"),
        "application/pdf"
    );
    assert_eq!(resp.bytes().await.expect("resume bytes").as_ref(), PDF_BYTES);

    // New submissions land at the top of the funnel.
    let resp: Value = client
        .get(format!("{}/applicants", base))
        .bearer_auth(&token)
        .send()
        .await
        .expect("list applicants")
        .json()
        .await
        .expect("parse applicants");
    let applicants = resp["data"].as_array().expect("applicants array");
    assert_eq!(applicants.len(), 1);
    assert_eq!(applicants[0]["full_name"], "Jo Doe");
    assert_eq!(applicants[0]["currentStage"], "Application Screening");
    assert_eq!(applicants[0]["status"], "New Application");
    assert_eq!(applicants[0]["rating"], 0);
    assert_eq!(applicants[0]["job_title"], "Backend Engineer");

    // Detail view pairs the raw submission with its pipeline record.
    let resp: Value = client
        .get(format!("{}/applicants/{}", base, applicant_id))
        .bearer_auth(&token)
        .send()
        .await
        .expect("get applicant")
        .json()
        .await
        .expect("parse applicant");
    assert_eq!(resp["data"]["basic_answers"][1]["value"], "jo@x.com");
    assert_eq!(resp["data"]["pipeline"]["stage"], "Application Screening");

    // Shortlist with a rating and a note.
    let resp: Value = client
        .patch(format!("{}/applicants/{}/stage", base, applicant_id))
        .bearer_auth(&token)
        .json(&json!({
            "stage": "Shortlisted",
            "status": "Shortlisted",
            "rating": 4,
            "note": "Strong systems background"
        }))
        .send()
        .await
        .expect("shortlist")
        .json()
        .await
        .expect("parse shortlist");
    assert_eq!(resp["data"]["stage"], "Shortlisted");
    assert_eq!(resp["data"]["rating"], 4);
    assert_eq!(resp["data"]["note"], "Strong systems background");

    let resp: Value = client
        .get(format!("{}/applicants/shortlisted", base))
        .bearer_auth(&token)
        .send()
        .await
        .expect("shortlisted view")
        .json()
        .await
        .expect("parse shortlisted");
    assert_eq!(resp["data"].as_array().expect("shortlisted").len(), 1);

    // The funnel only moves forward.
    let resp = client
        .patch(format!("{}/applicants/{}/stage", base, applicant_id))
        .bearer_auth(&token)
        .json(&json!({"stage": "Application Screening"}))
        .send()
        .await
        .expect("illegal transition");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = client
        .patch(format!("{}/applicants/{}/stage", base, applicant_id))
        .bearer_auth(&token)
        .json(&json!({"stage": "Hired", "status": "Hired"}))
        .send()
        .await
        .expect("hire");
    assert_eq!(resp.status(), StatusCode::OK);

    let resp: Value = client
        .get(format!("{}/applicants/hired", base))
        .bearer_auth(&token)
        .send()
        .await
        .expect("hired view")
        .json()
        .await
        .expect("parse hired");
    assert_eq!(resp["data"].as_array().expect("hired").len(), 1);

    // Job-scoped listing, and a 404 for a posting that does not exist.
    let resp: Value = client
        .get(format!("{}/applicants/job/{}", base, job_id))
        .bearer_auth(&token)
        .send()
        .await
        .expect("job applicants")
        .json()
        .await
        .expect("parse job applicants");
    assert_eq!(resp["data"].as_array().expect("job applicants").len(), 1);

    let resp = client
        .get(format!("{}/applicants/job/9999", base))
        .bearer_auth(&token)
        .send()
        .await
        .expect("missing job applicants");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    // Deleting the applicant also drops the stored resume.
    let resp = client
        .delete(format!("{}/applicants/{}", base, applicant_id))
        .bearer_auth(&token)
        .send()
        .await
        .expect("delete applicant");
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = client
        .get(format!("{}/uploads/{}", base, resume_path))
        .send()
        .await
        .expect("fetch deleted resume");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn submission_validation() {
    let server = TestServer::start().await;
    let client = reqwest::Client::new();
    let base = &server.base_url;
    let token = signup_and_login(&client, base, "intake@x.com").await;
    let job_id = create_job(&client, base, &token, "qa-engineer").await;

    let basic = json!([
        {"label": "Full Name", "value": "Jo"},
        {"label": "Email", "value": "jo@x.com"},
    ]);

    // A non-PDF resume is refused.
    let form = Form::new()
        .text("job_id", job_id.to_string())
        .text("basicFormData", basic.to_string())
        .part(
            "resume",
            Part::bytes(b"plain text".to_vec())
                .file_name("resume.txt")
                .mime_str("text/plain")
                .expect("mime"),
        );
    let resp = client
        .post(format!("{}/applicants", base))
        .multipart(form)
        .send()
        .await
        .expect("non-pdf resume");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    // An unknown posting is refused before the file is kept.
    let form = Form::new()
        .text("job_id", "9999")
        .text("basicFormData", basic.to_string())
        .part(
            "resume",
            Part::bytes(PDF_BYTES.to_vec())
                .file_name("resume.pdf")
                .mime_str("application/pdf")
                .expect("mime"),
        );
    let resp = client
        .post(format!("{}/applicants", base))
        .multipart(form)
        .send()
        .await
        .expect("unknown job");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    // Contact details must be resolvable from the basic answers.
    let form = Form::new()
        .text("job_id", job_id.to_string())
        .text("basicFormData", json!([{"label": "Email", "value": "jo@x.com"}]).to_string())
        .part(
            "resume",
            Part::bytes(PDF_BYTES.to_vec())
                .file_name("resume.pdf")
                .mime_str("application/pdf")
                .expect("mime"),
        );
    let resp = client
        .post(format!("{}/applicants", base))
        .multipart(form)
        .send()
        .await
        .expect("missing name");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    // A resume one byte over the 10 MiB cap is refused.
    let mut oversized = PDF_BYTES.to_vec();
    oversized.resize(10 * 1024 * 1024 + 1, 0);
    let form = Form::new()
        .text("job_id", job_id.to_string())
        .text("basicFormData", basic.to_string())
        .part(
            "resume",
            Part::bytes(oversized)
                .file_name("resume.pdf")
                .mime_str("application/pdf")
                .expect("mime"),
        );
    let resp = client
        .post(format!("{}/applicants", base))
        .multipart(form)
        .send()
        .await
        .expect("oversized resume");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    // The resume part is mandatory.
    let form = Form::new()
        .text("job_id", job_id.to_string())
        .text("basicFormData", basic.to_string());
    let resp = client
        .post(format!("{}/applicants", base))
        .multipart(form)
        .send()
        .await
        .expect("missing resume");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    // Nothing was accepted, so the funnel stays empty.
    let resp: Value = client
        .get(format!("{}/applicants", base))
        .bearer_auth(&token)
        .send()
        .await
        .expect("list applicants")
        .json()
        .await
        .expect("parse applicants");
    assert_eq!(resp["data"].as_array().expect("applicants").len(), 0);

    // No orphan files linger in the uploads directory either.
    let uploads = server.data_dir().join("uploads");
    let leftover = std::fs::read_dir(&uploads)
        .map(|entries| entries.count())
        .unwrap_or(0);
    assert_eq!(leftover, 0);
}

#[tokio::test]
async fn delete_job_cascades_to_applicants() {
    let server = TestServer::start().await;
    let client = reqwest::Client::new();
    let base = &server.base_url;
    let token = signup_and_login(&client, base, "cascade@x.com").await;
    let job_id = create_job(&client, base, &token, "data-engineer").await;

    let submission = submit_applicant(&client, base, job_id, "Sam Lee", "sam@x.com").await;
    let resume_path = submission["resume_path"].as_str().expect("resume path").to_string();

    let resp = client
        .delete(format!("{}/jobs/{}", base, job_id))
        .bearer_auth(&token)
        .send()
        .await
        .expect("delete job");
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp: Value = client
        .get(format!("{}/applicants", base))
        .bearer_auth(&token)
        .send()
        .await
        .expect("list applicants")
        .json()
        .await
        .expect("parse applicants");
    assert_eq!(resp["data"].as_array().expect("applicants").len(), 0);

    let resp = client
        .get(format!("{}/uploads/{}", base, resume_path))
        .send()
        .await
        .expect("fetch resume");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
