//! # Submission Error Taxonomy
//!
//! Error types for the bulk submission workflow.
//!
//! ## Overview
//!
//! The workflow distinguishes four kinds of failure:
//!
//! - **Retryable-transient**: whole-request HTTP 5xx or per-item
//!   `server_error` verdicts. Handled internally by requeueing; never
//!   surfaced to the caller.
//! - **Retryable-oversized**: `RequestBodyTooLarge` on a multi-task chunk.
//!   Handled internally by splitting and shrinking the shared chunk limit.
//! - **Non-retryable-item**: per-item `client_error` verdicts (other than
//!   `TaskExists`), and single-task chunks that are still oversized. Collected
//!   as [`TaskFailure`] values and surfaced once, after all workers finish,
//!   inside an [`AggregateSubmissionError`].
//! - **Fatal/unexpected**: any other [`ServiceError`] from the transport.
//!   Re-raised verbatim as [`SubmitError::Service`] to preserve diagnostic
//!   fidelity.

use crate::models::{error_codes, SubmittableTask, TaskAddResult};

/// Structured error raised by the add-collection collaborator.
///
/// Mirrors the service exception shape: an optional HTTP status, an optional
/// machine-readable error code, and a message. The submitter keys its retry
/// and split decisions off [`ServiceError::is_server_error`] and
/// [`ServiceError::is_request_body_too_large`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("service request failed: {message} (status: {status_code:?}, code: {error_code:?})")]
pub struct ServiceError {
    /// HTTP status code of the failed request, when known.
    pub status_code: Option<u16>,
    /// Machine-readable service error code, when present.
    pub error_code: Option<String>,
    /// Human-readable message.
    pub message: String,
}

impl ServiceError {
    /// Create a service error with only a message.
    pub fn new<S: Into<String>>(message: S) -> Self {
        Self {
            status_code: None,
            error_code: None,
            message: message.into(),
        }
    }

    /// Set the HTTP status code.
    pub fn with_status(mut self, status_code: u16) -> Self {
        self.status_code = Some(status_code);
        self
    }

    /// Set the service error code.
    pub fn with_code<S: Into<String>>(mut self, error_code: S) -> Self {
        self.error_code = Some(error_code.into());
        self
    }

    /// Whether the request failed server-side (HTTP 500-599) and is safe to
    /// retry as-is.
    pub fn is_server_error(&self) -> bool {
        matches!(self.status_code, Some(500..=599))
    }

    /// Whether the serialized request exceeded the service's size limit.
    pub fn is_request_body_too_large(&self) -> bool {
        self.error_code.as_deref() == Some(error_codes::REQUEST_BODY_TOO_LARGE)
    }
}

/// One terminal, non-retryable per-task failure.
#[derive(Debug, Clone)]
pub enum TaskFailure<T: SubmittableTask> {
    /// The service rejected the task with a `client_error` verdict.
    Rejected(TaskAddResult),
    /// A chunk containing only this task still exceeded the request size
    /// limit; the task can never be submitted at any chunk size.
    Unsubmittable {
        /// The task that cannot be submitted.
        task: T,
        /// The oversized-request error that proved it.
        error: ServiceError,
    },
}

impl<T: SubmittableTask> TaskFailure<T> {
    /// Identifier of the task this failure applies to.
    pub fn task_id(&self) -> &str {
        match self {
            TaskFailure::Rejected(result) => &result.task_id,
            TaskFailure::Unsubmittable { task, .. } => task.task_id(),
        }
    }
}

/// Raised by `submit` when one or more tasks permanently failed.
///
/// Carries every non-retryable per-task failure plus any tasks that were
/// still pending when submission stopped (non-empty only after early
/// termination). Callers wanting partial results inspect `failures` for
/// per-task diagnostics and `pending_tasks` for work that was never
/// attempted.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct AggregateSubmissionError<T: SubmittableTask> {
    /// Summary of the failure counts.
    pub message: String,
    /// Every task the service rejected, plus any task proven unsubmittable.
    pub failures: Vec<TaskFailure<T>>,
    /// Tasks abandoned in the pending queue by early termination.
    pub pending_tasks: Vec<T>,
}

impl<T: SubmittableTask> AggregateSubmissionError<T> {
    pub(crate) fn new(failures: Vec<TaskFailure<T>>, pending_tasks: Vec<T>) -> Self {
        Self {
            message: format!(
                "{} task(s) could not be added to the job; {} task(s) were left unsubmitted",
                failures.len(),
                pending_tasks.len()
            ),
            failures,
            pending_tasks,
        }
    }
}

/// Errors returned by the bulk submission entry point.
#[derive(Debug, thiserror::Error)]
pub enum SubmitError<T: SubmittableTask> {
    /// A usage error in the call itself; no network calls were made.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// An unexpected service error, re-raised verbatim.
    #[error(transparent)]
    Service(#[from] ServiceError),

    /// One or more tasks permanently failed.
    #[error(transparent)]
    Aggregate(#[from] AggregateSubmissionError<T>),
}
