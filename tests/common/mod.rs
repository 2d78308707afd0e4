//! Shared test infrastructure: a scripted mock add-collection client and
//! small builders used across the integration suites.
#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet, VecDeque};

use bulk_tasks::{
    error_codes, AddCollectionResponse, ServiceError, TaskAddResult, TaskCollectionClient, TaskSpec,
};

/// Scripted per-task behavior of the mock service.
#[derive(Debug, Clone)]
pub enum TaskBehavior {
    /// The task is added on every attempt.
    Success,
    /// The service reports the task as already existing (client_error with
    /// code `TaskExists`).
    TaskExists,
    /// The service rejects the task with the given error code.
    ClientError(String),
    /// The first attempt comes back as a per-item server error; subsequent
    /// attempts succeed.
    ServerErrorOnce,
}

/// Mock add-collection client with scripted request- and task-level behavior.
///
/// Tasks without an explicit behavior succeed. Request-level failures are
/// consumed in order, one per call, after the oversize check.
pub struct MockBatchClient {
    behaviors: HashMap<String, TaskBehavior>,
    oversize_above: Option<usize>,
    request_failures: Mutex<VecDeque<ServiceError>>,
    seen_server_errors: Mutex<HashSet<String>>,
    chunk_sizes: Mutex<Vec<usize>>,
}

impl MockBatchClient {
    pub fn new() -> Self {
        Self {
            behaviors: HashMap::new(),
            oversize_above: None,
            request_failures: Mutex::new(VecDeque::new()),
            seen_server_errors: Mutex::new(HashSet::new()),
            chunk_sizes: Mutex::new(Vec::new()),
        }
    }

    /// Script the behavior of one task.
    pub fn with_behavior<S: Into<String>>(mut self, task_id: S, behavior: TaskBehavior) -> Self {
        self.behaviors.insert(task_id.into(), behavior);
        self
    }

    /// Any request carrying more than `limit` tasks fails with
    /// `RequestBodyTooLarge`. `limit = 0` makes every request oversized,
    /// including single-task ones.
    pub fn oversized_above(mut self, limit: usize) -> Self {
        self.oversize_above = Some(limit);
        self
    }

    /// Queue a request-level failure; consumed by the next call.
    pub fn fail_next_request(self, error: ServiceError) -> Self {
        self.request_failures.lock().push_back(error);
        self
    }

    /// Chunk sizes of every call received, in order.
    pub fn chunk_sizes(&self) -> Vec<usize> {
        self.chunk_sizes.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.chunk_sizes.lock().len()
    }
}

#[async_trait]
impl TaskCollectionClient<TaskSpec> for MockBatchClient {
    async fn add_collection(
        &self,
        _job_id: &str,
        tasks: &[TaskSpec],
    ) -> Result<AddCollectionResponse, ServiceError> {
        self.chunk_sizes.lock().push(tasks.len());

        if let Some(limit) = self.oversize_above {
            if tasks.len() > limit {
                return Err(ServiceError::new("the request body exceeds the maximum size")
                    .with_status(413)
                    .with_code(error_codes::REQUEST_BODY_TOO_LARGE));
            }
        }

        if let Some(error) = self.request_failures.lock().pop_front() {
            return Err(error);
        }

        let mut value = Vec::with_capacity(tasks.len());
        for task in tasks {
            let behavior = self
                .behaviors
                .get(&task.id)
                .cloned()
                .unwrap_or(TaskBehavior::Success);
            let result = match behavior {
                TaskBehavior::Success => TaskAddResult::success(&task.id),
                TaskBehavior::TaskExists => TaskAddResult::client_error(
                    &task.id,
                    error_codes::TASK_EXISTS,
                    "The specified task already exists in the job",
                ),
                TaskBehavior::ClientError(code) => {
                    TaskAddResult::client_error(&task.id, code, "The task was rejected")
                }
                TaskBehavior::ServerErrorOnce => {
                    if self.seen_server_errors.lock().insert(task.id.clone()) {
                        TaskAddResult::server_error(&task.id, "Internal error adding the task")
                    } else {
                        TaskAddResult::success(&task.id)
                    }
                }
            };
            value.push(result);
        }
        Ok(AddCollectionResponse::new(value))
    }
}

/// Build `count` tasks with ids `task-0` through `task-{count-1}`.
pub fn task_specs(count: usize) -> Vec<TaskSpec> {
    (0..count)
        .map(|i| TaskSpec::new(format!("task-{i}")))
        .collect()
}

/// Install a test subscriber once; later calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
