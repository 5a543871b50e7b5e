//! Shared fixtures for the integration tests
#![allow(dead_code)]

pub mod mock_server;
pub mod models;

use std::sync::{Arc, Mutex};

/// Collects values handed to callbacks.
#[derive(Clone)]
pub struct Recorder<T> {
    inner: Arc<Mutex<Vec<T>>>,
}

impl<T: Clone + Send + 'static> Recorder<T> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn push(&self, value: T) {
        self.inner.lock().unwrap().push(value);
    }

    pub fn take(&self) -> Vec<T> {
        std::mem::take(&mut *self.inner.lock().unwrap())
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().len()
    }

    pub fn snapshot(&self) -> Vec<T> {
        self.inner.lock().unwrap().clone()
    }
}

/// Route `tracing` output to the test harness; honors `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
