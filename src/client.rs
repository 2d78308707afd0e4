//! # Add-Collection Collaborator Seam
//!
//! The generated REST operation that actually performs the "add task
//! collection" network call, consumed here as a black box.
//!
//! ## Overview
//!
//! The submitter never touches HTTP directly. It depends on a single trait,
//! [`TaskCollectionClient`], whose one operation either returns a per-task
//! verdict for every submitted task or raises a structured
//! [`ServiceError`](crate::error::ServiceError). Production implementations
//! wrap the generated service client; tests supply scripted mocks.
//!
//! This trait allows for multiple implementations targeting different
//! transports:
//! - Generated REST clients
//! - In-process fakes for samples and benchmarks
//! - Test mocks

use async_trait::async_trait;

use crate::error::ServiceError;
use crate::models::{AddCollectionResponse, SubmittableTask};

/// The remote batch-add endpoint for a job's task collection.
#[async_trait]
pub trait TaskCollectionClient<T: SubmittableTask>: Send + Sync {
    /// Add a bounded-size collection of tasks to the given job.
    ///
    /// Returns one [`TaskAddResult`](crate::models::TaskAddResult) per
    /// submitted task, or a [`ServiceError`] if the request failed as a
    /// whole. Per-request timeouts are this layer's concern, not the
    /// submitter's.
    async fn add_collection(
        &self,
        job_id: &str,
        tasks: &[T],
    ) -> Result<AddCollectionResponse, ServiceError>;
}
