//! # Bulk Task Submitter
//!
//! Orchestrates parallel or sequential submission of a task collection to a
//! bounded-size batch-add endpoint.
//!
//! ## Overview
//!
//! The submitter shards the input into chunks bounded by a shared, shrinking
//! per-request ceiling, dispatches chunks to the add-collection collaborator
//! from one or more workers, and reacts to the endpoint's verdicts:
//!
//! - oversized requests are split in half and retried, permanently lowering
//!   the shared ceiling;
//! - whole-request 5xx failures and per-item `server_error` verdicts are
//!   requeued for any worker to retry;
//! - per-item `client_error` verdicts (other than `TaskExists`, which is
//!   success-equivalent) are recorded and surfaced once, after all workers
//!   join, as an [`AggregateSubmissionError`];
//! - a single-task chunk that is still oversized can never succeed, so it
//!   halts all further submission.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────┐   pop chunk   ┌─────────────┐   add_collection   ┌─────────┐
//! │ Pending    │──────────────▶│ Worker loop │───────────────────▶│ Service │
//! │ queue      │◀──────────────│ (xN)        │◀───────────────────│ client  │
//! └────────────┘ requeue/split └─────────────┘  per-item verdicts └─────────┘
//!                                     │
//!                                     ▼
//!                      results / failures / halt flag
//! ```
//!
//! Workers are joined explicitly before the aggregate error is built, so
//! finalization never depends on thread-count introspection.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use async_trait::async_trait;
//! use bulk_tasks::{
//!     AddCollectionResponse, BulkTaskSubmitter, ServiceError, TaskCollectionClient, TaskSpec,
//! };
//!
//! struct GeneratedClient;
//!
//! #[async_trait]
//! impl TaskCollectionClient<TaskSpec> for GeneratedClient {
//!     async fn add_collection(
//!         &self,
//!         _job_id: &str,
//!         tasks: &[TaskSpec],
//!     ) -> Result<AddCollectionResponse, ServiceError> {
//!         // Wraps the generated REST operation in production.
//!         Ok(AddCollectionResponse::all_success(tasks))
//!     }
//! }
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let submitter = BulkTaskSubmitter::new(Arc::new(GeneratedClient), "job-1");
//! let tasks: Vec<TaskSpec> = (0..250).map(|i| TaskSpec::new(format!("task-{i}"))).collect();
//!
//! let results = submitter.submit(tasks, 4).await?;
//! assert_eq!(results.len(), 250);
//! # Ok(())
//! # }
//! ```

use futures::future::{BoxFuture, FutureExt};
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::client::TaskCollectionClient;
use crate::error::{AggregateSubmissionError, SubmitError, TaskFailure};
use crate::models::{
    error_codes, AddCollectionResponse, SubmittableTask, TaskAddResult, TaskAddStatus,
    MAX_TASKS_PER_REQUEST,
};
use crate::state::{SubmissionOutcome, SubmissionState};

/// Configuration for a [`BulkTaskSubmitter`].
#[derive(Debug, Clone)]
pub struct SubmitterConfig {
    /// Per-request task ceiling at the start of a submission. The ceiling
    /// shrinks during the run whenever the service reports an oversized
    /// request; it never grows back.
    pub initial_chunk_size: usize,
}

impl Default for SubmitterConfig {
    fn default() -> Self {
        Self {
            initial_chunk_size: MAX_TASKS_PER_REQUEST,
        }
    }
}

impl SubmitterConfig {
    /// Create a configuration with the default per-request ceiling.
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the initial per-request task ceiling.
    pub fn with_initial_chunk_size(mut self, initial_chunk_size: usize) -> Self {
        self.initial_chunk_size = initial_chunk_size;
        self
    }
}

/// Submits arbitrarily large task collections to a bounded-size batch-add
/// endpoint with automatic oversized-request splitting, transient-error
/// retry, and per-task outcome tracking.
pub struct BulkTaskSubmitter<C> {
    client: Arc<C>,
    job_id: String,
    config: SubmitterConfig,
}

impl<C> Clone for BulkTaskSubmitter<C> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
            job_id: self.job_id.clone(),
            config: self.config.clone(),
        }
    }
}

impl<C> BulkTaskSubmitter<C> {
    /// Create a submitter for the given job with default configuration.
    pub fn new<S: Into<String>>(client: Arc<C>, job_id: S) -> Self {
        Self::with_config(client, job_id, SubmitterConfig::default())
    }

    /// Create a submitter with custom configuration.
    pub fn with_config<S: Into<String>>(client: Arc<C>, job_id: S, config: SubmitterConfig) -> Self {
        Self {
            client,
            job_id: job_id.into(),
            config,
        }
    }

    /// The job this submitter adds tasks to.
    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    /// Submit `tasks` to the job using `worker_count` concurrent workers.
    ///
    /// `worker_count == 0` runs the submission loop inline on the calling
    /// task; a negative value is a usage error. Upon return every input task
    /// has a determinate outcome: present in the returned results, recorded
    /// in the aggregate error's `failures`, or (after early termination)
    /// reported in its `pending_tasks`.
    ///
    /// Per-item `server_error` verdicts and whole-request 5xx failures are
    /// retried until they resolve; there is no overall deadline at this
    /// layer.
    pub async fn submit<T>(
        &self,
        tasks: Vec<T>,
        worker_count: i32,
    ) -> Result<Vec<TaskAddResult>, SubmitError<T>>
    where
        T: SubmittableTask,
        C: TaskCollectionClient<T> + 'static,
    {
        if worker_count < 0 {
            return Err(SubmitError::InvalidArgument(format!(
                "worker_count must be >= 0, got {worker_count}"
            )));
        }
        if tasks.is_empty() {
            return Ok(Vec::new());
        }

        let task_count = tasks.len();
        info!(
            job_id = %self.job_id,
            task_count,
            worker_count,
            initial_chunk_size = self.config.initial_chunk_size,
            "starting bulk task submission"
        );

        let state = Arc::new(SubmissionState::new(tasks, self.config.initial_chunk_size));

        if worker_count == 0 {
            self.worker_loop(&state).await;
        } else {
            let mut workers = JoinSet::new();
            for worker_index in 0..worker_count as usize {
                let submitter = self.clone();
                let state = Arc::clone(&state);
                workers.spawn(async move {
                    debug!(worker_index, "submission worker started");
                    submitter.worker_loop(&state).await;
                    debug!(worker_index, "submission worker finished");
                });
            }
            // Explicit join: the aggregate error below is only built once
            // every worker has stopped touching the shared state.
            while let Some(joined) = workers.join_next().await {
                if let Err(join_error) = joined {
                    warn!(error = %join_error, "submission worker aborted unexpectedly");
                }
            }
        }

        let mut completed = Vec::new();
        for outcome in state.take_outcomes() {
            match outcome {
                SubmissionOutcome::Completed(result) => completed.push(result),
                SubmissionOutcome::Fatal(error) => {
                    warn!(job_id = %self.job_id, error = %error, "re-raising unexpected service error");
                    return Err(SubmitError::Service(error));
                }
            }
        }

        let failures = state.take_failures();
        if !failures.is_empty() {
            let pending_tasks = state.drain_pending();
            warn!(
                job_id = %self.job_id,
                failure_count = failures.len(),
                pending_count = pending_tasks.len(),
                "bulk task submission completed with failures"
            );
            return Err(SubmitError::Aggregate(AggregateSubmissionError::new(
                failures,
                pending_tasks,
            )));
        }

        info!(
            job_id = %self.job_id,
            result_count = completed.len(),
            "bulk task submission complete"
        );
        Ok(completed)
    }

    /// Scheduling driver: pull chunks sized by the current ceiling until the
    /// pending queue drains or submission halts.
    async fn worker_loop<T>(&self, state: &SubmissionState<T>)
    where
        T: SubmittableTask,
        C: TaskCollectionClient<T>,
    {
        while !state.is_halted() {
            let limit = state.chunk_limit();
            let chunk = state.pop_chunk(limit);
            if chunk.is_empty() {
                break;
            }
            self.submit_chunk(state, chunk).await;
        }
    }

    /// Submit one chunk and triage the outcome.
    ///
    /// Recursion depth is bounded: an oversized chunk is halved each time,
    /// so the inline resubmission of the head half recurses at most
    /// log2(chunk length) deep.
    fn submit_chunk<'a, T>(
        &'a self,
        state: &'a SubmissionState<T>,
        mut chunk: Vec<T>,
    ) -> BoxFuture<'a, ()>
    where
        T: SubmittableTask,
        C: TaskCollectionClient<T>,
    {
        async move {
            match self.client.add_collection(&self.job_id, &chunk).await {
                Err(error) if error.is_request_body_too_large() => {
                    if chunk.len() == 1 {
                        // Irreducible: this task exceeds the size limit on
                        // its own and can never be submitted.
                        if let Some(task) = chunk.pop() {
                            warn!(
                                job_id = %self.job_id,
                                task_id = %task.task_id(),
                                "single task exceeds the request size limit, halting submission"
                            );
                            state.record_failure(TaskFailure::Unsubmittable { task, error });
                        }
                        state.halt();
                    } else {
                        let mid = chunk.len() / 2;
                        debug!(
                            job_id = %self.job_id,
                            chunk_len = chunk.len(),
                            retry_len = mid,
                            "request body too large, splitting chunk"
                        );
                        state.shrink_chunk_limit(mid);
                        let tail = chunk.split_off(mid);
                        state.requeue_front(tail);
                        // Resubmit the carved-out head immediately to bound
                        // its retry latency.
                        self.submit_chunk(state, chunk).await;
                    }
                }
                Err(error) if error.is_server_error() => {
                    debug!(
                        job_id = %self.job_id,
                        status_code = ?error.status_code,
                        chunk_len = chunk.len(),
                        "server error on add-collection request, requeueing chunk"
                    );
                    state.requeue_front(chunk);
                }
                Err(error) => {
                    warn!(
                        job_id = %self.job_id,
                        error = %error,
                        "unexpected service error, capturing for re-raise"
                    );
                    state.record_fatal(error);
                }
                Ok(response) => self.triage_response(state, chunk, response),
            }
        }
        .boxed()
    }

    /// Interpret the per-item verdicts of a successful request.
    fn triage_response<T>(
        &self,
        state: &SubmissionState<T>,
        mut chunk: Vec<T>,
        response: AddCollectionResponse,
    ) where
        T: SubmittableTask,
    {
        for result in response.value {
            match result.status {
                TaskAddStatus::ServerError => {
                    if let Some(position) = chunk
                        .iter()
                        .position(|task| task.task_id() == result.task_id)
                    {
                        let task = chunk.swap_remove(position);
                        debug!(
                            job_id = %self.job_id,
                            task_id = %result.task_id,
                            "task hit a server error, requeueing"
                        );
                        state.requeue_front(vec![task]);
                    } else {
                        warn!(
                            job_id = %self.job_id,
                            task_id = %result.task_id,
                            "server_error verdict does not match any submitted task"
                        );
                    }
                }
                TaskAddStatus::ClientError => {
                    let already_exists = result
                        .error
                        .as_ref()
                        .is_some_and(|detail| detail.code_is(error_codes::TASK_EXISTS));
                    if already_exists {
                        // Idempotent retry landed on an already-created task.
                        debug!(
                            job_id = %self.job_id,
                            task_id = %result.task_id,
                            "task already exists, treating as success"
                        );
                    } else {
                        debug!(
                            job_id = %self.job_id,
                            task_id = %result.task_id,
                            error_code = ?result.error.as_ref().and_then(|e| e.code.as_deref()),
                            "task rejected by the service"
                        );
                        state.record_failure(TaskFailure::Rejected(result));
                    }
                }
                TaskAddStatus::Success => state.record_completed(result),
            }
        }
    }
}
