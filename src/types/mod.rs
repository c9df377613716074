mod models;
mod pipeline;

pub use models::*;
pub use pipeline::{Stage, Status};
