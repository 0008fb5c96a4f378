//! Curator Core
//!
//! Core types shared by every Curator process.
//!
//! This crate contains:
//! - Domain types: the job record, its status machine and the workflow result
//! - DTOs: request/response shapes exchanged with the HTTP API

pub mod domain;
pub mod dto;
