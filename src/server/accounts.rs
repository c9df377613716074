use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::auth::{
    AuthedAdmin, PasswordHasher, SESSION_TTL_DAYS, generate_token, validate_password,
};
use crate::server::AppState;
use crate::server::dto::{
    CreateAccountRequest, LoginRequest, LoginResponse, SignupRequest, UpdateAccountRequest,
    UpdatePasswordRequest,
};
use crate::server::response::{ApiError, ApiResponse, StoreOptionExt};
use crate::store::{AccountPatch, NewAccount, NewSession};

/// Placeholder assigned by `add_user`; the new admin is expected to change
/// it through the password route.
const DEFAULT_PASSWORD: &str = "ChangeMe123!";

const DEFAULT_ROLE: &str = "admin";

fn resolve_role(role: Option<String>) -> String {
    match role {
        Some(r) if !r.trim().is_empty() => r,
        _ => DEFAULT_ROLE.to_string(),
    }
}

pub async fn signup(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SignupRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_password(&req.password).map_err(ApiError::bad_request)?;

    if req.full_name.trim().is_empty() {
        return Err(ApiError::bad_request("full_name cannot be empty"));
    }
    if req.email.trim().is_empty() {
        return Err(ApiError::bad_request("email cannot be empty"));
    }

    let hasher = PasswordHasher::new();
    let password_hash = hasher.hash(&req.password)?;

    let account = state.store.create_account(&NewAccount {
        external_id: Uuid::new_v4().to_string(),
        full_name: req.full_name.trim().to_string(),
        email: req.email.trim().to_lowercase(),
        password_hash,
        role: resolve_role(req.role),
    })?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(account))))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let account = state
        .store
        .get_account_by_email(&req.email.trim().to_lowercase())?
        .or_not_found("No account with this email")?;

    let hasher = PasswordHasher::new();
    if !hasher.verify(&req.password, &account.password_hash)? {
        return Err(ApiError::unauthorized("Invalid credentials"));
    }

    let (raw_token, lookup) = generate_token();
    let token_hash = hasher.hash(&raw_token)?;

    state.store.create_session(&NewSession {
        token_hash,
        token_lookup: lookup,
        account_id: account.id,
        expires_at: Utc::now() + Duration::days(SESSION_TTL_DAYS),
    })?;

    Ok(Json(ApiResponse::success(LoginResponse {
        token: raw_token,
        account,
    })))
}

pub async fn list_accounts(
    _admin: AuthedAdmin,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let accounts = state.store.list_accounts()?;
    Ok(Json(ApiResponse::success(accounts)))
}

pub async fn add_account(
    _admin: AuthedAdmin,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateAccountRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.full_name.trim().is_empty() {
        return Err(ApiError::bad_request("full_name cannot be empty"));
    }

    let email = req.email.trim().to_lowercase();
    if email.is_empty() {
        return Err(ApiError::bad_request("email cannot be empty"));
    }

    if state.store.get_account_by_email(&email)?.is_some() {
        return Err(ApiError::conflict("email already registered"));
    }

    let hasher = PasswordHasher::new();
    let password_hash = hasher.hash(DEFAULT_PASSWORD)?;

    let account = state.store.create_account(&NewAccount {
        external_id: Uuid::new_v4().to_string(),
        full_name: req.full_name.trim().to_string(),
        email,
        password_hash,
        role: resolve_role(req.role),
    })?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(account))))
}

pub async fn update_account(
    _admin: AuthedAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateAccountRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.full_name.is_none() && req.email.is_none() {
        return Err(ApiError::bad_request("no fields supplied"));
    }

    let patch = AccountPatch {
        full_name: req.full_name,
        email: req.email.map(|e| e.trim().to_lowercase()),
    };

    state.store.update_account(id, &patch).map_err(|e| match e {
        crate::error::Error::NotFound => ApiError::not_found("Account not found"),
        other => ApiError::from(other),
    })?;

    let account = state
        .store
        .get_account(id)?
        .or_not_found("Account not found")?;

    Ok(Json(ApiResponse::success(account)))
}

pub async fn update_password(
    _admin: AuthedAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(req): Json<UpdatePasswordRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let account = state
        .store
        .get_account(id)?
        .or_not_found("Account not found")?;

    let hasher = PasswordHasher::new();
    if !hasher.verify(&req.current_password, &account.password_hash)? {
        return Err(ApiError::forbidden("Current password is incorrect"));
    }

    validate_password(&req.new_password).map_err(ApiError::bad_request)?;

    let password_hash = hasher.hash(&req.new_password)?;
    state.store.update_account_password(id, &password_hash)?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_account(
    _admin: AuthedAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    if !state.store.delete_account(id)? {
        return Err(ApiError::not_found("Account not found"));
    }

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_defaults_when_absent_or_blank() {
        assert_eq!(resolve_role(None), "admin");
        assert_eq!(resolve_role(Some(String::new())), "admin");
        assert_eq!(resolve_role(Some("   ".to_string())), "admin");
    }

    #[test]
    fn test_role_kept_when_supplied() {
        assert_eq!(resolve_role(Some("recruiter".to_string())), "recruiter");
    }
}
