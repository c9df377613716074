use crate::server::response::ApiError;

const MAX_TITLE_LEN: usize = 200;
const MAX_SLUG_LEN: usize = 100;

fn is_valid_slug_char(c: char) -> bool {
    c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'
}

fn validate_slug_str(slug: &str) -> Result<(), String> {
    if slug.is_empty() {
        return Err("slug cannot be empty".to_string());
    }
    if slug.len() > MAX_SLUG_LEN {
        return Err(format!("slug cannot exceed {MAX_SLUG_LEN} characters"));
    }
    if !slug.chars().all(is_valid_slug_char) {
        return Err("slug can only contain lowercase letters, digits, and hyphens".to_string());
    }
    if slug.starts_with('-') || slug.ends_with('-') {
        return Err("slug cannot start or end with a hyphen".to_string());
    }
    Ok(())
}

pub fn validate_slug(slug: &str) -> Result<(), ApiError> {
    validate_slug_str(slug).map_err(ApiError::bad_request)
}

pub fn validate_title(title: &str) -> Result<(), ApiError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(ApiError::bad_request("title cannot be empty"));
    }
    if trimmed.len() > MAX_TITLE_LEN {
        return Err(ApiError::bad_request(format!(
            "title cannot exceed {MAX_TITLE_LEN} characters"
        )));
    }
    Ok(())
}
