use crate::request::HttpRequest;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use uuid::Uuid;

/// Identity of a [`NetworkTask`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(Uuid);

impl TaskId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TaskState {
    Created = 0,
    Running = 1,
    Completed = 2,
    Cancelled = 3,
}

impl TaskState {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => TaskState::Created,
            1 => TaskState::Running,
            2 => TaskState::Completed,
            _ => TaskState::Cancelled,
        }
    }
}

struct TaskInner {
    id: TaskId,
    request: HttpRequest,
    state: AtomicU8,
}

/// Handle to one outstanding request.
///
/// Clones share identity and state; equality and hashing go by [`TaskId`].
/// Only the session that created a task moves it between states, through the
/// `mark_*` transitions, each of which succeeds at most once.
#[derive(Clone)]
pub struct NetworkTask {
    inner: Arc<TaskInner>,
}

impl NetworkTask {
    pub fn new(request: HttpRequest) -> Self {
        Self {
            inner: Arc::new(TaskInner {
                id: TaskId::new(),
                request,
                state: AtomicU8::new(TaskState::Created as u8),
            }),
        }
    }

    pub fn id(&self) -> TaskId {
        self.inner.id
    }

    pub fn request(&self) -> &HttpRequest {
        &self.inner.request
    }

    pub fn state(&self) -> TaskState {
        TaskState::from_u8(self.inner.state.load(Ordering::Acquire))
    }

    /// Created → Running.
    pub fn mark_running(&self) -> bool {
        self.transition(TaskState::Created, TaskState::Running)
    }

    /// Running → Completed.
    pub fn mark_completed(&self) -> bool {
        self.transition(TaskState::Running, TaskState::Completed)
    }

    /// Created or Running → Cancelled.
    pub fn mark_cancelled(&self) -> bool {
        self.transition(TaskState::Created, TaskState::Cancelled)
            || self.transition(TaskState::Running, TaskState::Cancelled)
    }

    fn transition(&self, from: TaskState, to: TaskState) -> bool {
        self.inner
            .state
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

impl PartialEq for NetworkTask {
    fn eq(&self, other: &Self) -> bool {
        self.inner.id == other.inner.id
    }
}

impl Eq for NetworkTask {}

impl Hash for NetworkTask {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.id.hash(state);
    }
}

impl fmt::Debug for NetworkTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NetworkTask")
            .field("id", &self.inner.id)
            .field("state", &self.state())
            .field("method", &self.inner.request.method)
            .field("url", &self.inner.request.url.as_str())
            .finish()
    }
}
