//! HTTP layer: router, handlers, and response envelope.

mod accounts;
mod applicants;
mod dto;
mod jobs;
mod response;
mod router;
mod uploads;
mod validation;

pub use router::{AppState, create_router};
