//! # Bulk Submission Data Model
//!
//! Wire-facing types for the batch add-task-collection operation.
//!
//! ## Overview
//!
//! The submission workflow is generic over the caller's task type: anything
//! implementing [`SubmittableTask`] can be submitted in bulk, and the only
//! requirement is a stable unique identifier used to match per-item results
//! back to their inputs across retries. [`TaskSpec`] is a minimal concrete
//! model for callers that do not carry their own task type.
//!
//! The response types mirror the service's per-item verdicts: each submitted
//! task comes back with a [`TaskAddStatus`] and, for rejected items, a
//! structured [`BatchErrorDetail`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// Default ceiling on the number of tasks in a single add-collection request.
///
/// The service also enforces a serialized payload size limit, which is what
/// drives the adaptive chunk splitting in the submitter; this constant is
/// only the starting point.
pub const MAX_TASKS_PER_REQUEST: usize = 100;

/// Service error codes the submission workflow reacts to by name.
pub mod error_codes {
    /// The serialized request exceeded the service's payload size limit.
    pub const REQUEST_BODY_TOO_LARGE: &str = "RequestBodyTooLarge";

    /// The task already exists in the job (idempotent retry landed twice).
    pub const TASK_EXISTS: &str = "TaskExists";
}

/// A caller-supplied unit of work that can be submitted in bulk.
///
/// Implementations must return the same identifier for the lifetime of a
/// submission; the submitter uses it to match per-item results and to
/// requeue individual tasks after transient failures.
pub trait SubmittableTask: Clone + Send + Sync + fmt::Debug + 'static {
    /// Stable unique identifier of this task within its job.
    fn task_id(&self) -> &str;
}

/// Minimal concrete task model: an identifier plus a free-form JSON payload.
///
/// Callers with richer task types implement [`SubmittableTask`] directly;
/// this type exists for tests, examples, and thin callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSpec {
    /// Unique task identifier within the target job.
    pub id: String,
    /// Opaque task payload forwarded to the service.
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub payload: serde_json::Value,
}

impl TaskSpec {
    /// Create a task spec with an empty payload.
    pub fn new<S: Into<String>>(id: S) -> Self {
        Self {
            id: id.into(),
            payload: serde_json::Value::Null,
        }
    }

    /// Attach a payload.
    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }
}

impl SubmittableTask for TaskSpec {
    fn task_id(&self) -> &str {
        &self.id
    }
}

/// The service's verdict on one task within an otherwise-successful
/// add-collection response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskAddStatus {
    /// The task was added.
    Success,
    /// The task was rejected and retrying will not help.
    ClientError,
    /// The service failed to process the task; safe to retry.
    ServerError,
}

impl fmt::Display for TaskAddStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskAddStatus::Success => write!(f, "success"),
            TaskAddStatus::ClientError => write!(f, "client_error"),
            TaskAddStatus::ServerError => write!(f, "server_error"),
        }
    }
}

/// Structured error detail attached to a rejected task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchErrorDetail {
    /// Machine-readable error code (e.g. `TaskExists`).
    pub code: Option<String>,
    /// Human-readable message.
    pub message: Option<String>,
}

impl BatchErrorDetail {
    /// Create an error detail with both code and message set.
    pub fn new<C: Into<String>, M: Into<String>>(code: C, message: M) -> Self {
        Self {
            code: Some(code.into()),
            message: Some(message.into()),
        }
    }

    /// Check the error code against a known constant.
    pub fn code_is(&self, code: &str) -> bool {
        self.code.as_deref() == Some(code)
    }
}

/// Per-task result within an add-collection response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskAddResult {
    /// Identifier of the task this verdict applies to.
    pub task_id: String,
    /// The service's verdict.
    pub status: TaskAddStatus,
    /// Error detail, present for rejected or server-errored items.
    pub error: Option<BatchErrorDetail>,
}

impl TaskAddResult {
    /// A successful per-task result.
    pub fn success<S: Into<String>>(task_id: S) -> Self {
        Self {
            task_id: task_id.into(),
            status: TaskAddStatus::Success,
            error: None,
        }
    }

    /// A non-retryable per-task rejection.
    pub fn client_error<S: Into<String>, C: Into<String>, M: Into<String>>(
        task_id: S,
        code: C,
        message: M,
    ) -> Self {
        Self {
            task_id: task_id.into(),
            status: TaskAddStatus::ClientError,
            error: Some(BatchErrorDetail::new(code, message)),
        }
    }

    /// A retryable per-task server failure.
    pub fn server_error<S: Into<String>, M: Into<String>>(task_id: S, message: M) -> Self {
        Self {
            task_id: task_id.into(),
            status: TaskAddStatus::ServerError,
            error: Some(BatchErrorDetail {
                code: None,
                message: Some(message.into()),
            }),
        }
    }
}

/// Response to one add-collection request: one verdict per submitted task.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AddCollectionResponse {
    /// Per-task results, in service processing order (unspecified).
    pub value: Vec<TaskAddResult>,
}

impl AddCollectionResponse {
    /// Build a response from per-task results.
    pub fn new(value: Vec<TaskAddResult>) -> Self {
        Self { value }
    }

    /// Build an all-success response for the given tasks.
    pub fn all_success<T: SubmittableTask>(tasks: &[T]) -> Self {
        Self {
            value: tasks
                .iter()
                .map(|t| TaskAddResult::success(t.task_id()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_uses_snake_case_on_the_wire() {
        let json = serde_json::to_string(&TaskAddStatus::ClientError).unwrap();
        assert_eq!(json, "\"client_error\"");
    }

    #[test]
    fn error_detail_code_matching() {
        let detail = BatchErrorDetail::new(error_codes::TASK_EXISTS, "already there");
        assert!(detail.code_is(error_codes::TASK_EXISTS));
        assert!(!detail.code_is(error_codes::REQUEST_BODY_TOO_LARGE));

        let codeless = BatchErrorDetail {
            code: None,
            message: None,
        };
        assert!(!codeless.code_is(error_codes::TASK_EXISTS));
    }

    #[test]
    fn task_spec_builder() {
        let task = TaskSpec::new("task-1").with_payload(serde_json::json!({"cmd": "echo hi"}));
        assert_eq!(task.task_id(), "task-1");
        assert_eq!(task.payload["cmd"], "echo hi");
    }
}
