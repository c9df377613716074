mod middleware;
mod password;
mod token;

pub use middleware::{AuthError, AuthedAdmin};
pub use password::{PasswordHasher, validate_password};
pub use token::{SESSION_TTL_DAYS, generate_token, parse_token};
