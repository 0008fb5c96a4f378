//! Curator API
//!
//! HTTP front end of the job pipeline: accepts creative workflow submissions,
//! stores them as `pending` jobs, queues them for workers and serves status
//! and listing queries. Optionally runs worker loops in-process.

pub mod api;
pub mod config;
pub mod service;
pub mod state;

pub use api::create_router;
pub use config::ApiConfig;
pub use state::AppState;
