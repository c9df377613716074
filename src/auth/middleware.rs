use std::sync::Arc;

use axum::{
    Json,
    extract::FromRequestParts,
    http::{StatusCode, header::AUTHORIZATION, request::Parts},
    response::{IntoResponse, Response},
};
use chrono::Utc;
use serde_json::json;

use super::{PasswordHasher, parse_token};
use crate::server::AppState;
use crate::types::{AdminAccount, Session};

/// Extractor that requires a valid login session. The verified account
/// travels with the request for downstream use.
pub struct AuthedAdmin {
    pub session: Session,
    pub account: AdminAccount,
}

#[derive(Debug)]
pub enum AuthError {
    MissingAuth,
    InvalidScheme,
    InvalidToken,
    TokenExpired,
    InternalError,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthError::MissingAuth => (StatusCode::UNAUTHORIZED, "Authentication required"),
            AuthError::InvalidScheme => (StatusCode::UNAUTHORIZED, "Invalid authorization scheme"),
            AuthError::InvalidToken => (StatusCode::UNAUTHORIZED, "Invalid token"),
            AuthError::TokenExpired => (StatusCode::UNAUTHORIZED, "Token expired"),
            AuthError::InternalError => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        let body = json!({ "data": null, "error": message });

        let mut response = (status, Json(body)).into_response();

        if status == StatusCode::UNAUTHORIZED {
            response.headers_mut().insert(
                "WWW-Authenticate",
                "Bearer realm=\"hireline\"".parse().unwrap(),
            );
        }

        response
    }
}

impl FromRequestParts<Arc<AppState>> for AuthedAdmin {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok());

        let raw_token = match auth_header {
            Some(header) if header.starts_with("Bearer ") => {
                header.strip_prefix("Bearer ").unwrap().to_string()
            }
            Some(_) => return Err(AuthError::InvalidScheme),
            None => return Err(AuthError::MissingAuth),
        };

        validate_session(state, &raw_token)
    }
}

fn validate_session(state: &Arc<AppState>, raw_token: &str) -> Result<AuthedAdmin, AuthError> {
    let (lookup, _secret) = parse_token(raw_token).map_err(|_| AuthError::InvalidToken)?;

    let session = state
        .store
        .get_session_by_lookup(&lookup)
        .map_err(|_| AuthError::InternalError)?
        .ok_or(AuthError::InvalidToken)?;

    let hasher = PasswordHasher::new();
    if !hasher
        .verify(raw_token, &session.token_hash)
        .map_err(|_| AuthError::InternalError)?
    {
        return Err(AuthError::InvalidToken);
    }

    if session.expires_at < Utc::now() {
        return Err(AuthError::TokenExpired);
    }

    let account = state
        .store
        .get_account(session.account_id)
        .map_err(|_| AuthError::InternalError)?
        .ok_or(AuthError::InvalidToken)?;

    if let Err(e) = state.store.touch_session(session.id) {
        tracing::warn!("Failed to update session last_used_at: {e}");
    }

    Ok(AuthedAdmin { session, account })
}
