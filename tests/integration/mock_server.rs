//! Mock HTTP server setup for integration tests

use mockito::{Mock, Server, ServerGuard};
use rivet::transport::HttpSession;
use rivet::Configuration;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Test fixture that manages a mock server
pub struct MockServerFixture {
    pub server: Arc<Mutex<ServerGuard>>,
    pub base_url: String,
}

impl MockServerFixture {
    pub async fn new() -> Self {
        let server = Server::new_async().await;
        let base_url = server.url();
        Self {
            server: Arc::new(Mutex::new(server)),
            base_url,
        }
    }

    /// Configuration pointing at the mock server
    pub fn config(&self) -> Arc<Configuration> {
        Arc::new(
            Configuration::builder(self.base_url.as_str())
                .timeout(Duration::from_secs(5))
                .header("Accept", "application/json")
                .user_agent("rivet-tests")
                .build()
                .expect("mock server url"),
        )
    }

    /// Session on the current runtime, talking to the mock server
    pub fn session(&self) -> Arc<HttpSession> {
        Arc::new(HttpSession::new(&self.config()).expect("tokio runtime"))
    }

    /// Create a mock for a JSON response
    pub async fn mock_json_response(&self, method: &str, path: &str, status: usize, body: &str) -> Mock {
        let mut server = self.server.lock().await;
        server
            .mock(method, path)
            .with_status(status)
            .with_header("content-type", "application/json")
            .with_body(body)
            .create_async()
            .await
    }

    /// Create a mock for an error response without a body
    pub async fn mock_status(&self, method: &str, path: &str, status: usize) -> Mock {
        let mut server = self.server.lock().await;
        server
            .mock(method, path)
            .with_status(status)
            .create_async()
            .await
    }
}
