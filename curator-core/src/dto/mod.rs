//! Data Transfer Objects for the HTTP API
//!
//! Request and response shapes shared by the API service and its clients.

pub mod health;
pub mod job;
pub mod tool;
