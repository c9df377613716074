//! # Hireline
//!
//! Admin backend for a job-posting and applicant-tracking product, usable
//! both as a standalone binary and as a library.
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use std::path::PathBuf;
//! use hireline::server::{AppState, create_router};
//! use hireline::store::SqliteStore;
//!
//! let store = SqliteStore::new(&PathBuf::from("./data/hireline.db")).unwrap();
//! store.initialize().unwrap();
//!
//! let state = Arc::new(AppState {
//!     store: Arc::new(store),
//!     uploads_dir: PathBuf::from("./data/uploads"),
//! });
//! let router = create_router(state);
//! // Serve with axum...
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod server;
pub mod store;
pub mod types;
