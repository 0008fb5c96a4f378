//! Scheduler layer for the worker
//!
//! Pulls tasks off the queue and drives each job from `pending` to a terminal
//! state. Every loop handles one job at a time; parallelism comes from running
//! several loops against the same queue.

pub mod worker;

pub use worker::{
    Worker, WorkerError, drain_workers, error_chain, spawn_workers, summarize_error,
};
