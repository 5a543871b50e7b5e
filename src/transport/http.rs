use super::{Completion, CompletionTable, NetworkTask, ResponseHead, Session, TaskId, TaskOutcome, TransportError};
use crate::config::Configuration;
use crate::request::{HttpMethod, HttpRequest};
use crate::{Error, Result};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use tracing::{debug, warn};

type InFlight = Arc<Mutex<HashMap<TaskId, AbortHandle>>>;

/// Session backed by reqwest on the tokio runtime it was created in.
///
/// Requests run concurrently; their outcomes go through one dispatcher task,
/// so completion routines never overlap.
pub struct HttpSession {
    client: reqwest::Client,
    runtime: Handle,
    completions: Arc<CompletionTable>,
    inflight: InFlight,
    dispatch: mpsc::UnboundedSender<(NetworkTask, TaskOutcome)>,
}

impl HttpSession {
    /// Must be called from within a tokio runtime.
    pub fn new(config: &Configuration) -> Result<Self> {
        let runtime = Handle::try_current().map_err(|e| {
            Error::Transport(TransportError::Other(format!("no tokio runtime: {}", e)))
        })?;

        let mut builder = reqwest::Client::builder().timeout(config.timeout());
        if let Some(agent) = config.user_agent() {
            builder = builder.user_agent(agent);
        }
        let client = builder
            .build()
            .map_err(|e| Error::Transport(TransportError::Other(e.to_string())))?;

        let completions = Arc::new(CompletionTable::default());
        let inflight: InFlight = Arc::new(Mutex::new(HashMap::new()));
        let (dispatch, rx) = mpsc::unbounded_channel();
        runtime.spawn(run_dispatcher(rx, completions.clone(), inflight.clone()));

        Ok(Self {
            client,
            runtime,
            completions,
            inflight,
            dispatch,
        })
    }
}

async fn run_dispatcher(
    mut rx: mpsc::UnboundedReceiver<(NetworkTask, TaskOutcome)>,
    completions: Arc<CompletionTable>,
    inflight: InFlight,
) {
    while let Some((task, outcome)) = rx.recv().await {
        inflight
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&task.id());
        if !completions.complete(&task, outcome) {
            debug!(task = %task.id(), "outcome dropped for cancelled task");
        }
    }
}

async fn execute(client: reqwest::Client, request: HttpRequest) -> TaskOutcome {
    let method = match request.method {
        HttpMethod::Get => reqwest::Method::GET,
        HttpMethod::Post => reqwest::Method::POST,
        HttpMethod::Put => reqwest::Method::PUT,
        HttpMethod::Patch => reqwest::Method::PATCH,
        HttpMethod::Delete => reqwest::Method::DELETE,
    };

    let mut builder = client.request(method, request.url.clone());
    for (name, value) in &request.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    if let Some(body) = request.body.clone() {
        builder = builder.body(body);
    }

    let response = match builder.send().await {
        Ok(response) => response,
        Err(e) => {
            warn!(url = %request.url, error = %e, "request failed");
            return TaskOutcome::failure(TransportError::Http(e));
        }
    };

    let head = ResponseHead {
        status: response.status().as_u16(),
        headers: response
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.as_str().to_string(), v.to_string())))
            .collect(),
    };
    match response.bytes().await {
        Ok(data) => TaskOutcome::response(head, Some(data)),
        Err(e) => TaskOutcome::failure(TransportError::Http(e)),
    }
}

impl Session for HttpSession {
    fn create_task(&self, request: HttpRequest) -> Result<NetworkTask> {
        Ok(NetworkTask::new(request))
    }

    fn set_completion(&self, task: &NetworkTask, completion: Completion) {
        self.completions.insert(task.id(), completion);
    }

    fn resume(&self, task: &NetworkTask) {
        if !task.mark_running() {
            return;
        }
        debug!(task = %task.id(), method = %task.request().method, url = %task.request().url, "resuming task");

        let client = self.client.clone();
        let dispatch = self.dispatch.clone();
        let task = task.clone();

        // Held across spawn so the dispatcher cannot remove the entry before it exists.
        let mut inflight = self.inflight.lock().unwrap_or_else(|e| e.into_inner());
        let id = task.id();
        let handle = self.runtime.spawn(async move {
            let outcome = execute(client, task.request().clone()).await;
            let _ = dispatch.send((task, outcome));
        });
        inflight.insert(id, handle.abort_handle());
    }

    fn cancel(&self, task: &NetworkTask) {
        if !task.mark_cancelled() {
            return;
        }
        debug!(task = %task.id(), "cancelling task");
        if let Some(handle) = self
            .inflight
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&task.id())
        {
            handle.abort();
        }
        drop(self.completions.take(task.id()));
    }
}

impl std::fmt::Debug for HttpSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inflight = self.inflight.lock().map(|m| m.len()).unwrap_or(0);
        f.debug_struct("HttpSession").field("inflight", &inflight).finish()
    }
}
