//! Session collaborators: the boundary between the service queue and the network.
//!
//! A [`Session`] creates [`NetworkTask`]s from [`HttpRequest`]s, starts and
//! cancels them, and invokes the completion routine registered for a task
//! exactly once unless the task was cancelled first. Completions for one
//! session run one at a time.
//!
//! | Session | Description |
//! |---------|-------------|
//! | [`HttpSession`] | reqwest on the current tokio runtime, serial completion dispatcher |
//! | [`MockSession`] | canned responses from a [`MockSource`], immediate or manual delivery |

pub mod http;
pub mod mock;
pub mod task;

pub use http::HttpSession;
pub use mock::{DeliveryMode, InMemoryMockSource, MockResponse, MockSession, MockSource};
pub use task::{NetworkTask, TaskId, TaskState};

use crate::request::HttpRequest;
use crate::Result;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::Mutex;

/// Status line and headers of a received response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseHead {
    pub status: u16,
    pub headers: Vec<(String, String)>,
}

impl ResponseHead {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: Vec::new(),
        }
    }
}

/// What a session reports for a finished task.
#[derive(Debug, Default)]
pub struct TaskOutcome {
    pub data: Option<Bytes>,
    pub response: Option<ResponseHead>,
    pub error: Option<TransportError>,
}

impl TaskOutcome {
    pub fn response(head: ResponseHead, data: Option<Bytes>) -> Self {
        Self {
            data,
            response: Some(head),
            error: None,
        }
    }

    pub fn failure(error: TransportError) -> Self {
        Self {
            data: None,
            response: None,
            error: Some(error),
        }
    }
}

/// Routine a session runs when a task finishes.
pub type Completion = Box<dyn FnOnce(TaskOutcome) + Send + 'static>;

pub trait Session: Send + Sync {
    /// Create a task in the `Created` state. Nothing is sent yet.
    fn create_task(&self, request: HttpRequest) -> Result<NetworkTask>;

    /// Register the routine to run when `task` finishes, replacing any previous one.
    fn set_completion(&self, task: &NetworkTask, completion: Completion);

    /// Start `task`. No-op unless it is `Created`.
    fn resume(&self, task: &NetworkTask);

    /// Cancel `task`. Its completion routine is dropped without running.
    fn cancel(&self, task: &NetworkTask);
}

/// Completion routines keyed by task identity.
#[derive(Default)]
pub(crate) struct CompletionTable {
    routines: Mutex<HashMap<TaskId, Completion>>,
}

impl CompletionTable {
    pub(crate) fn insert(&self, id: TaskId, completion: Completion) {
        self.routines
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(id, completion);
    }

    pub(crate) fn take(&self, id: TaskId) -> Option<Completion> {
        self.routines
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&id)
    }

    /// Move `task` to `Completed` and run its routine outside the lock.
    pub(crate) fn complete(&self, task: &NetworkTask, outcome: TaskOutcome) -> bool {
        if !task.mark_completed() {
            return false;
        }
        match self.take(task.id()) {
            Some(routine) => {
                routine(outcome);
                true
            }
            None => false,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("No mock response for '{0}'")]
    MockNotFound(String),

    #[error("Transport error: {0}")]
    Other(String),
}
