//! Service Module
//!
//! Business logic layer for the API.
//! Services sit between the HTTP handlers and the job store, the queue and
//! the tool registry.

pub mod health;
pub mod job;
pub mod tool;

// Re-export for convenience
pub use health as health_service;
pub use job as job_service;
pub use tool as tool_service;
