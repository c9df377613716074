use std::path::{Path as FsPath, PathBuf};
use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use tokio_util::io::ReaderStream;
use tracing::warn;

use super::AppState;
use super::response::ApiError;
use crate::error::Result;

/// Uploaded resumes must be PDFs and are size-capped.
pub const RESUME_CONTENT_TYPE: &str = "application/pdf";
pub const MAX_RESUME_BYTES: usize = 10 * 1024 * 1024;

const MAX_FILENAME_LEN: usize = 80;

/// Rewrites a client-supplied filename into something safe to place on
/// disk: path separators and anything exotic become hyphens.
#[must_use]
pub fn sanitize_filename(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '-'
            }
        })
        .collect();

    let cleaned = cleaned.trim_matches(['-', '.']).to_string();
    if cleaned.is_empty() {
        return "resume.pdf".to_string();
    }
    cleaned.chars().take(MAX_FILENAME_LEN).collect()
}

/// Writes a resume under the uploads directory and returns the stored
/// filename (unique per upload).
pub async fn save_resume(uploads_dir: &FsPath, original_name: &str, data: &[u8]) -> Result<String> {
    let filename = format!(
        "{}_{}",
        uuid::Uuid::new_v4(),
        sanitize_filename(original_name)
    );

    tokio::fs::create_dir_all(uploads_dir).await?;
    tokio::fs::write(uploads_dir.join(&filename), data).await?;

    Ok(filename)
}

/// Best-effort removal, used both by intake compensation and applicant
/// deletion. Failures are logged and ignored.
pub async fn remove_resume(uploads_dir: &FsPath, filename: &str) {
    let path = uploads_dir.join(filename);
    if let Err(e) = tokio::fs::remove_file(&path).await {
        warn!("Failed to remove resume {}: {e}", path.display());
    }
}

fn resolve_upload(uploads_dir: &FsPath, filename: &str) -> Option<PathBuf> {
    // Stored names never contain separators; reject anything that does.
    if filename.is_empty()
        || filename.contains('/')
        || filename.contains('\\')
        || filename.contains("..")
    {
        return None;
    }
    Some(uploads_dir.join(filename))
}

/// GET /uploads/{filename}: streams a stored resume back to the client.
pub async fn serve_upload(
    State(state): State<Arc<AppState>>,
    Path(filename): Path<String>,
) -> std::result::Result<Response, ApiError> {
    let path = resolve_upload(&state.uploads_dir, &filename)
        .ok_or_else(|| ApiError::bad_request("invalid file name"))?;

    let file = match tokio::fs::File::open(&path).await {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ApiError::not_found("File not found"));
        }
        Err(e) => {
            warn!("Failed to open upload {}: {e}", path.display());
            return Err(ApiError::internal("Internal server error"));
        }
    };

    let stream = ReaderStream::new(file);
    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, RESUME_CONTENT_TYPE)
        .body(Body::from_stream(stream))
        .map_err(|_| ApiError::internal("Internal server error"))?;

    Ok(response.into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_keeps_simple_names() {
        assert_eq!(sanitize_filename("resume.pdf"), "resume.pdf");
        assert_eq!(sanitize_filename("jo_doe-2026.pdf"), "jo_doe-2026.pdf");
    }

    #[test]
    fn test_sanitize_strips_separators() {
        assert_eq!(sanitize_filename("../../etc/passwd"), "etc-passwd");
        assert_eq!(sanitize_filename("a/b\\c.pdf"), "a-b-c.pdf");
    }

    #[test]
    fn test_sanitize_empty_falls_back() {
        assert_eq!(sanitize_filename("///"), "resume.pdf");
    }

    #[test]
    fn test_resolve_rejects_traversal() {
        let dir = FsPath::new("/tmp/uploads");
        assert!(resolve_upload(dir, "../secret").is_none());
        assert!(resolve_upload(dir, "a/b.pdf").is_none());
        assert!(resolve_upload(dir, "").is_none());
        assert!(resolve_upload(dir, "ok.pdf").is_some());
    }
}
