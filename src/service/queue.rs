use super::{ErrorHandler, FinalCallback};
use crate::config::Configuration;
use crate::deserialize::{Deserializable, Linkable, Updatable};
use crate::error::{body_string, ErrorContext};
use crate::request::Call;
use crate::transform::TransformController;
use crate::transport::{NetworkTask, Session, TaskOutcome, TaskState};
use crate::{Error, Result};
use bytes::Bytes;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, RwLock, Weak};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Open,
    Finished,
    Invalidated,
}

pub(super) struct QueueState {
    outstanding: HashSet<NetworkTask>,
    failed: Option<HashSet<NetworkTask>>,
    final_callback: Option<FinalCallback>,
    phase: Phase,
}

impl QueueState {
    pub(super) fn new(final_callback: Option<FinalCallback>) -> Self {
        Self {
            outstanding: HashSet::new(),
            failed: None,
            final_callback,
            phase: Phase::Open,
        }
    }
}

/// What removing a task from the outstanding set left behind.
enum Settled {
    /// The task was no longer tracked (the queue was invalidated).
    Dropped,
    Pending,
    Drained {
        final_callback: Option<FinalCallback>,
        failed: Option<HashSet<NetworkTask>>,
    },
}

pub(super) struct Shared {
    pub(super) config: Arc<Configuration>,
    pub(super) session: Arc<dyn Session>,
    pub(super) transform: TransformController,
    pub(super) error_handler: ErrorHandler,
    pub(super) state: Mutex<QueueState>,
}

impl Shared {
    fn state(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn report(&self, error: &Error) {
        (self.error_handler)(error);
    }

    /// Transport error first, then the status code, then the body.
    fn validate(outcome: TaskOutcome) -> Result<Option<Bytes>> {
        if let Some(error) = outcome.error {
            return Err(Error::Transport(error));
        }
        let Some(head) = outcome.response else {
            return match outcome.data {
                Some(data) => Ok(Some(data)),
                None => Err(Error::General),
            };
        };
        let body = outcome
            .data
            .as_deref()
            .filter(|d| !d.is_empty())
            .map(body_string);
        if let Some(error) = Error::from_http_status(head.status, body) {
            return Err(error);
        }
        Ok(outcome.data)
    }

    fn settle(&self, task: &NetworkTask, failed: bool) -> Settled {
        let mut state = self.state();
        if !state.outstanding.remove(task) {
            return Settled::Dropped;
        }
        if failed {
            state
                .failed
                .get_or_insert_with(HashSet::new)
                .insert(task.clone());
        }
        debug!(
            task_id = %task.id(),
            failed,
            outstanding = state.outstanding.len(),
            "task settled"
        );
        if !state.outstanding.is_empty() {
            return Settled::Pending;
        }
        state.phase = Phase::Finished;
        Settled::Drained {
            final_callback: state.final_callback.take(),
            failed: state.failed.take(),
        }
    }
}

/// Tracks a set of network tasks and reports once all of them are done.
///
/// Every `perform*` creates exactly one task through the [`Session`] and
/// routes its completion back here: the response is validated and decoded,
/// the task leaves the outstanding set (joining the failed set on error),
/// the per-call completion runs, and when the outstanding set becomes empty
/// the final callback runs exactly once with the failed tasks.
///
/// A queue is single use. Once the final callback has fired, or after
/// [`invalidate_and_cancel`](Self::invalidate_and_cancel), new work is
/// rejected with [`Error::Malformed`]; create a new queue instead.
///
/// With a session that completes tasks concurrently, such as
/// [`HttpSession`](crate::transport::HttpSession) on a multi-thread runtime,
/// the first task may finish before the second is enqueued, which finishes
/// the queue. To run a batch, enqueue every call with `auto_start = false`
/// and then call [`resume_all`](Self::resume_all).
pub struct ServiceQueue {
    pub(super) shared: Arc<Shared>,
}

impl ServiceQueue {
    /// Decode the response into one `M`.
    pub fn perform<M, F>(&self, call: &Call, auto_start: bool, complete: F) -> Option<NetworkTask>
    where
        M: Deserializable + Send + 'static,
        F: FnOnce(Result<M>) + Send + 'static,
    {
        let root = call.root_node().map(str::to_string);
        self.enqueue(
            call,
            auto_start,
            move |transform, data| transform.respond::<M>(data.unwrap_or_default(), root.as_deref()),
            complete,
        )
    }

    /// Decode the response into a `Vec<M>` in payload order.
    pub fn perform_collection<M, F>(&self, call: &Call, auto_start: bool, complete: F) -> Option<NetworkTask>
    where
        M: Deserializable + Send + 'static,
        F: FnOnce(Result<Vec<M>>) + Send + 'static,
    {
        let root = call.root_node().map(str::to_string);
        self.enqueue(
            call,
            auto_start,
            move |transform, data| {
                transform.respond_collection::<M>(data.unwrap_or_default(), root.as_deref())
            },
            complete,
        )
    }

    /// For calls without a meaningful response body. Any 2xx succeeds.
    pub fn perform_write<F>(&self, call: &Call, auto_start: bool, complete: F) -> Option<NetworkTask>
    where
        F: FnOnce(Result<()>) + Send + 'static,
    {
        self.enqueue(call, auto_start, |_, _| Ok(()), complete)
    }

    /// Refresh `model` in place from a single object. Keys the payload omits
    /// keep their current values and linked collections are reconciled, so
    /// holders of the `Arc` observe an update rather than a replacement.
    pub fn perform_update<M, F>(
        &self,
        model: Arc<RwLock<M>>,
        call: &Call,
        auto_start: bool,
        complete: F,
    ) -> Option<NetworkTask>
    where
        M: Updatable + Clone + Send + Sync + 'static,
        F: FnOnce(Result<Arc<RwLock<M>>>) + Send + 'static,
    {
        let root = call.root_node().map(str::to_string);
        self.enqueue(
            call,
            auto_start,
            move |transform, data| {
                {
                    let mut target = model.write().unwrap_or_else(|e| e.into_inner());
                    transform.respond_update(&mut *target, data.unwrap_or_default(), root.as_deref())?;
                }
                Ok(model)
            },
            complete,
        )
    }

    /// Reconcile `models` with the array in the response by link: matches are
    /// updated in place, unmatched existing elements removed, new elements
    /// appended. On failure `models` is left unchanged.
    pub fn perform_update_collection<M, F>(
        &self,
        models: Arc<RwLock<Vec<M>>>,
        call: &Call,
        auto_start: bool,
        complete: F,
    ) -> Option<NetworkTask>
    where
        M: Updatable + Linkable + Clone + Send + Sync + 'static,
        F: FnOnce(Result<Arc<RwLock<Vec<M>>>>) + Send + 'static,
    {
        let root = call.root_node().map(str::to_string);
        self.enqueue(
            call,
            auto_start,
            move |transform, data| {
                {
                    let mut existing = models.write().unwrap_or_else(|e| e.into_inner());
                    transform.reconcile(&mut *existing, data.unwrap_or_default(), root.as_deref())?;
                }
                Ok(models)
            },
            complete,
        )
    }

    fn enqueue<T, D, F>(&self, call: &Call, auto_start: bool, decode: D, complete: F) -> Option<NetworkTask>
    where
        T: Send + 'static,
        D: FnOnce(&TransformController, Option<&[u8]>) -> Result<T> + Send + 'static,
        F: FnOnce(Result<T>) + Send + 'static,
    {
        let shared = &self.shared;
        let phase = shared.state().phase;
        if let Some(e) = closed_error(phase) {
            shared.report(&e);
            complete(Err(e));
            return None;
        }

        let request = match call.request(&shared.config) {
            Ok(request) => request,
            Err(e) => {
                shared.report(&e);
                complete(Err(e));
                return None;
            }
        };

        let task = match shared.session.create_task(request) {
            Ok(task) => task,
            Err(e) => {
                let error = Error::Network {
                    status: -1,
                    body: Some(e.to_string()),
                };
                shared.report(&error);
                complete(Err(error));
                return None;
            }
        };

        {
            let mut state = shared.state();
            if let Some(e) = closed_error(state.phase) {
                drop(state);
                shared.session.cancel(&task);
                shared.report(&e);
                complete(Err(e));
                return None;
            }
            state.outstanding.insert(task.clone());
        }
        debug!(task_id = %task.id(), call = %call, auto_start, "task queued");

        let weak: Weak<Shared> = Arc::downgrade(shared);
        let described = call.to_string();
        let tracked = task.clone();
        shared.session.set_completion(
            &task,
            Box::new(move |outcome| match weak.upgrade() {
                Some(shared) => Self::finish(&shared, &tracked, outcome, &described, decode, complete),
                None => complete(Err(Error::Network {
                    status: -1,
                    body: Some("service queue dropped before completion".to_string()),
                })),
            }),
        );

        if auto_start {
            shared.session.resume(&task);
        }
        Some(task)
    }

    fn finish<T, D, F>(
        shared: &Shared,
        task: &NetworkTask,
        outcome: TaskOutcome,
        call: &str,
        decode: D,
        complete: F,
    ) where
        D: FnOnce(&TransformController, Option<&[u8]>) -> Result<T>,
        F: FnOnce(Result<T>),
    {
        let result = Shared::validate(outcome).and_then(|data| {
            decode(&shared.transform, data.as_deref())
                .map_err(|e| e.into_decoding(data.as_deref().unwrap_or_default(), call))
        });

        let settled = shared.settle(task, result.is_err());
        if matches!(settled, Settled::Dropped) {
            debug!(task_id = %task.id(), "completion after invalidation dropped");
            return;
        }

        if let Err(e) = &result {
            shared.report(e);
        }
        complete(result);

        if let Settled::Drained {
            final_callback,
            failed,
        } = settled
        {
            info!(
                failed = failed.as_ref().map_or(0, HashSet::len),
                "all tasks finished"
            );
            if let Some(final_callback) = final_callback {
                final_callback(failed);
            }
        }
    }

    /// Start `task` if this queue tracks it. Running or finished tasks are left alone.
    pub fn resume(&self, task: &NetworkTask) {
        let tracked = self.shared.state().outstanding.contains(task);
        if tracked && task.state() == TaskState::Created {
            self.shared.session.resume(task);
        }
    }

    pub fn resume_all(&self) {
        let created: Vec<NetworkTask> = self
            .shared
            .state()
            .outstanding
            .iter()
            .filter(|task| task.state() == TaskState::Created)
            .cloned()
            .collect();
        debug!(count = created.len(), "resuming all tasks");
        for task in &created {
            self.shared.session.resume(task);
        }
    }

    /// Cancel every outstanding task without firing the final callback.
    pub fn invalidate_and_cancel(&self) {
        let tasks: Vec<NetworkTask> = {
            let mut state = self.shared.state();
            state.phase = Phase::Invalidated;
            state.final_callback = None;
            state.failed = None;
            state.outstanding.drain().collect()
        };
        info!(cancelled = tasks.len(), "service queue invalidated");
        for task in &tasks {
            self.shared.session.cancel(task);
        }
    }

    pub fn has_outstanding_tasks(&self) -> bool {
        !self.shared.state().outstanding.is_empty()
    }

    pub fn outstanding_tasks(&self) -> HashSet<NetworkTask> {
        self.shared.state().outstanding.clone()
    }

    pub fn failed_tasks(&self) -> Option<HashSet<NetworkTask>> {
        self.shared.state().failed.clone()
    }

    /// True once the final callback has been handed out.
    pub fn is_finished(&self) -> bool {
        self.shared.state().phase == Phase::Finished
    }

    pub fn is_invalidated(&self) -> bool {
        self.shared.state().phase == Phase::Invalidated
    }

    pub fn configuration(&self) -> &Configuration {
        &self.shared.config
    }
}

fn closed_error(phase: Phase) -> Option<Error> {
    let info = match phase {
        Phase::Open => return None,
        Phase::Finished => "service queue already finished",
        Phase::Invalidated => "service queue was invalidated",
    };
    Some(Error::malformed_with_context(
        info,
        ErrorContext::new().with_details("create a new queue for more tasks"),
    ))
}

impl std::fmt::Debug for ServiceQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.shared.state();
        f.debug_struct("ServiceQueue")
            .field("phase", &state.phase)
            .field("outstanding", &state.outstanding.len())
            .field("failed", &state.failed.as_ref().map_or(0, HashSet::len))
            .finish()
    }
}
