//! Shared infrastructure for the integration tests.

pub mod end_to_end_test;
pub mod request_chaining_test;

use restfile::executor::{HttpTransport, PreparedRequest, RequestError, TransportResponse};
use restfile::models::Headers;
use std::collections::HashMap;
use std::sync::{Mutex, Once};

static INIT: Once = Once::new();

/// Initialize test environment (run once)
pub fn init_test_env() {
    INIT.call_once(|| {
        let _ = env_logger::builder().is_test(true).try_init();
    });
}

/// Transport answering from a table keyed by `METHOD url`, recording every
/// request it receives.
#[derive(Default)]
pub struct ScriptedTransport {
    routes: HashMap<String, TransportResponse>,
    sent: Mutex<Vec<PreparedRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(mut self, method: &str, url: &str, status: u16, headers: &[(&str, &str)], body: &str) -> Self {
        let headers: Headers = headers.iter().copied().collect();
        self.routes.insert(
            format!("{} {}", method, url),
            TransportResponse::new(status, headers, body),
        );
        self
    }

    pub fn sent(&self) -> Vec<PreparedRequest> {
        self.sent.lock().unwrap().clone()
    }
}

impl HttpTransport for ScriptedTransport {
    fn send(&self, request: &PreparedRequest) -> Result<TransportResponse, RequestError> {
        self.sent.lock().unwrap().push(request.clone());
        let key = format!("{} {}", request.method, request.url);
        self.routes
            .get(&key)
            .cloned()
            .ok_or_else(|| RequestError::Network(format!("no route for {}", key)))
    }
}
