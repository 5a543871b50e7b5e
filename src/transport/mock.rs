//! Canned-response session for tests and offline development.
//!
//! Responses are looked up by [`HttpRequest::mock_key`], e.g. `"GET /v1/games"`.
//! In [`DeliveryMode::Manual`] nothing completes until the test calls
//! [`MockSession::deliver_next`] or [`MockSession::deliver_all`], which makes
//! queue ordering observable step by step.

use super::{Completion, CompletionTable, NetworkTask, ResponseHead, Session, TaskOutcome, TransportError};
use crate::request::HttpRequest;
use crate::{Error, Result};
use bytes::Bytes;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockResponse {
    pub status: u16,
    pub body: Option<Bytes>,
    pub headers: Vec<(String, String)>,
}

impl MockResponse {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            body: None,
            headers: Vec::new(),
        }
    }

    /// 200 with `value` as the JSON body.
    pub fn json(value: &Value) -> Self {
        Self::new(200).with_json(value)
    }

    pub fn with_json(mut self, value: &Value) -> Self {
        self.body = Some(Bytes::from(value.to_string()));
        self.headers
            .push(("content-type".to_string(), "application/json".to_string()));
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// Supplies canned responses by mock key.
pub trait MockSource: Send + Sync {
    fn lookup(&self, key: &str) -> Option<MockResponse>;
}

impl<F> MockSource for F
where
    F: Fn(&str) -> Option<MockResponse> + Send + Sync,
{
    fn lookup(&self, key: &str) -> Option<MockResponse> {
        self(key)
    }
}

/// Map-backed [`MockSource`] with an optional fallback for unknown keys.
#[derive(Debug, Default)]
pub struct InMemoryMockSource {
    responses: RwLock<HashMap<String, MockResponse>>,
    fallback: RwLock<Option<MockResponse>>,
}

impl InMemoryMockSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, key: impl Into<String>, response: MockResponse) -> Self {
        self.insert(key, response);
        self
    }

    pub fn insert(&self, key: impl Into<String>, response: MockResponse) {
        self.responses
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.into(), response);
    }

    pub fn set_fallback(&self, response: Option<MockResponse>) {
        *self.fallback.write().unwrap_or_else(|e| e.into_inner()) = response;
    }
}

impl MockSource for InMemoryMockSource {
    fn lookup(&self, key: &str) -> Option<MockResponse> {
        let found = self
            .responses
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(key)
            .cloned();
        found.or_else(|| self.fallback.read().unwrap_or_else(|e| e.into_inner()).clone())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeliveryMode {
    /// Complete inside `resume`.
    #[default]
    Immediate,
    /// Hold resumed tasks until `deliver_next`/`deliver_all`.
    Manual,
}

pub struct MockSession {
    source: Arc<dyn MockSource>,
    mode: DeliveryMode,
    completions: CompletionTable,
    pending: Mutex<VecDeque<NetworkTask>>,
    sent: Mutex<Vec<HttpRequest>>,
    refuse: AtomicBool,
}

impl MockSession {
    pub fn new(source: impl MockSource + 'static) -> Self {
        Self::with_source(Arc::new(source))
    }

    pub fn with_source(source: Arc<dyn MockSource>) -> Self {
        Self {
            source,
            mode: DeliveryMode::Immediate,
            completions: CompletionTable::default(),
            pending: Mutex::new(VecDeque::new()),
            sent: Mutex::new(Vec::new()),
            refuse: AtomicBool::new(false),
        }
    }

    pub fn with_mode(mut self, mode: DeliveryMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn mode(&self) -> DeliveryMode {
        self.mode
    }

    /// Make `create_task` fail until switched back.
    pub fn refuse_new_tasks(&self, refuse: bool) {
        self.refuse.store(refuse, Ordering::SeqCst);
    }

    /// Requests of every resumed task, in resume order.
    pub fn sent_requests(&self) -> Vec<HttpRequest> {
        self.sent.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Resumed tasks still waiting for manual delivery.
    pub fn pending_count(&self) -> usize {
        self.pending.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Complete the oldest pending task. Returns false when nothing was delivered.
    pub fn deliver_next(&self) -> bool {
        loop {
            let next = self
                .pending
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .pop_front();
            let Some(task) = next else {
                return false;
            };
            if self.deliver(&task) {
                return true;
            }
        }
    }

    /// Deliver until nothing is pending, including tasks resumed by completions.
    pub fn deliver_all(&self) -> usize {
        let mut delivered = 0;
        while self.deliver_next() {
            delivered += 1;
        }
        delivered
    }

    fn deliver(&self, task: &NetworkTask) -> bool {
        let outcome = self.outcome_for(task.request());
        self.completions.complete(task, outcome)
    }

    fn outcome_for(&self, request: &HttpRequest) -> TaskOutcome {
        let key = request.mock_key();
        match self.source.lookup(&key) {
            Some(response) => {
                let head = ResponseHead {
                    status: response.status,
                    headers: response.headers,
                };
                TaskOutcome::response(head, response.body)
            }
            None => {
                debug!(key = key.as_str(), "no mock response");
                TaskOutcome::failure(TransportError::MockNotFound(key))
            }
        }
    }
}

impl Session for MockSession {
    fn create_task(&self, request: HttpRequest) -> Result<NetworkTask> {
        if self.refuse.load(Ordering::SeqCst) {
            return Err(Error::Transport(TransportError::Other(
                "mock session refuses new tasks".to_string(),
            )));
        }
        Ok(NetworkTask::new(request))
    }

    fn set_completion(&self, task: &NetworkTask, completion: Completion) {
        self.completions.insert(task.id(), completion);
    }

    fn resume(&self, task: &NetworkTask) {
        if !task.mark_running() {
            return;
        }
        self.sent
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(task.request().clone());
        match self.mode {
            DeliveryMode::Immediate => {
                self.deliver(task);
            }
            DeliveryMode::Manual => self
                .pending
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .push_back(task.clone()),
        }
    }

    fn cancel(&self, task: &NetworkTask) {
        if task.mark_cancelled() {
            drop(self.completions.take(task.id()));
        }
    }
}

impl std::fmt::Debug for MockSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockSession")
            .field("mode", &self.mode)
            .field("pending", &self.pending_count())
            .finish()
    }
}
