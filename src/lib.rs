#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Bulk Tasks
//!
//! Bulk task submission workflow for batch-processing services whose
//! "add task collection" endpoint only accepts bounded-size requests.
//!
//! ## Overview
//!
//! Adding thousands of tasks to a batch job through an endpoint capped at a
//! fixed request size means sharding, retrying, and aggregating: oversized
//! requests must shrink, transient server failures must be retried, and
//! per-task rejections must be reported without losing track of a single
//! task. This crate implements that workflow once, generically, over any
//! caller-supplied task type and any generated service client.
//!
//! ## Module Organization
//!
//! - [`models`] - Wire-facing task and per-item result types
//! - [`client`] - The add-collection collaborator seam
//! - [`error`] - Service, per-task, and aggregate error types
//! - [`submitter`] - The submission workflow itself
//!
//! ## Guarantees
//!
//! - Every input task reaches exactly one determinate outcome: returned as a
//!   result, recorded as a failure, or reported as pending after early
//!   termination. No task is lost or duplicated across retries.
//! - The shared per-request ceiling only ever shrinks within a submission.
//! - Workers are joined explicitly before any aggregate error is built.
//!
//! ## Quick Start
//!
//! See [`submitter::BulkTaskSubmitter`] for a complete example wiring a
//! service client to the submitter.

pub mod client;
pub mod error;
pub mod models;
pub mod submitter;

mod state;

// Re-export the public surface at the crate root for easy access
pub use client::TaskCollectionClient;
pub use error::{AggregateSubmissionError, ServiceError, SubmitError, TaskFailure};
pub use models::{
    error_codes, AddCollectionResponse, BatchErrorDetail, SubmittableTask, TaskAddResult,
    TaskAddStatus, TaskSpec, MAX_TASKS_PER_REQUEST,
};
pub use submitter::{BulkTaskSubmitter, SubmitterConfig};
