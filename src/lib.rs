//! # Templo
//!
//! A self-hostable server that publishes gated grimoires and courses to readers
//! ranked on an eight-tier role ladder. Items inside a section or course unlock
//! one after another as reading progress crosses a threshold.
//!
//! ## Library Usage
//!
//! ```toml
//! [dependencies]
//! templo = { version = "0.0.1", default-features = false }
//! ```
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use templo::config::ServerConfig;
//! use templo::server::{AppState, create_router};
//! use templo::store::{SqliteStore, Store};
//!
//! let config = ServerConfig::default();
//! let store = SqliteStore::new(config.db_path()).unwrap();
//! store.initialize().unwrap();
//!
//! let state = Arc::new(AppState::new(Arc::new(store), &config));
//! let router = create_router(state);
//! // Serve with axum...
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` (default): Builds the `templo` binary. Disable with `default-features = false`.

pub mod auth;
pub mod config;
pub mod error;
pub mod reading;
pub mod server;
pub mod setup;
pub mod store;
pub mod types;
pub mod unlock;
