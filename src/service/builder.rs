use super::queue::{QueueState, ServiceQueue, Shared};
use super::{log_errors, ErrorHandler, FinalCallback};
use crate::config::Configuration;
use crate::transform::TransformController;
use crate::transport::{NetworkTask, Session};
use crate::Error;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

/// Builder for [`ServiceQueue`].
pub struct ServiceQueueBuilder {
    config: Arc<Configuration>,
    session: Arc<dyn Session>,
    final_callback: Option<FinalCallback>,
    error_handler: ErrorHandler,
}

impl ServiceQueueBuilder {
    pub fn new(config: Arc<Configuration>, session: Arc<dyn Session>) -> Self {
        Self {
            config,
            session,
            final_callback: None,
            error_handler: log_errors(),
        }
    }

    /// Called once with the failed tasks (`None` if none failed) when the
    /// last outstanding task completes.
    pub fn on_final<F>(mut self, callback: F) -> Self
    where
        F: FnOnce(Option<HashSet<NetworkTask>>) + Send + 'static,
    {
        self.final_callback = Some(Box::new(callback));
        self
    }

    /// Replace the default handler, which logs each error.
    pub fn error_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&Error) + Send + Sync + 'static,
    {
        self.error_handler = Arc::new(handler);
        self
    }

    pub fn build(self) -> ServiceQueue {
        ServiceQueue {
            shared: Arc::new(Shared {
                config: self.config,
                session: self.session,
                transform: TransformController::new(),
                error_handler: self.error_handler,
                state: Mutex::new(QueueState::new(self.final_callback)),
            }),
        }
    }
}

impl ServiceQueue {
    pub fn builder(config: Arc<Configuration>, session: Arc<dyn Session>) -> ServiceQueueBuilder {
        ServiceQueueBuilder::new(config, session)
    }

    /// A queue that calls `final_callback` once all its tasks are done.
    pub fn new<F>(config: Arc<Configuration>, session: Arc<dyn Session>, final_callback: F) -> Self
    where
        F: FnOnce(Option<HashSet<NetworkTask>>) + Send + 'static,
    {
        Self::builder(config, session).on_final(final_callback).build()
    }
}
