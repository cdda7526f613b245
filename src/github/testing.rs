//! Scripted transport for tests. Each route holds a queue of responses that
//! are replayed in order; requesting an unscripted route panics so a test
//! that drifts from its fixture fails loudly.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use super::{ApiResponse, GithubError, Transport};

#[derive(Default)]
pub struct MockTransport {
    routes: Mutex<HashMap<String, VecDeque<ApiResponse>>>,
}

impl MockTransport {
    pub fn new() -> Self {
        MockTransport::default()
    }

    /// Queue `responses` for `path_and_query`, consumed one per request.
    pub fn on(&self, path_and_query: &str, responses: Vec<ApiResponse>) {
        self.routes
            .lock()
            .unwrap()
            .entry(path_and_query.to_string())
            .or_default()
            .extend(responses);
    }

    /// Queue a single 200 response with `body`.
    pub fn on_ok(&self, path_and_query: &str, body: &str) {
        self.on(
            path_and_query,
            vec![ApiResponse {
                status: 200,
                body: body.to_string(),
            }],
        );
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn get(&self, path_and_query: &str) -> Result<ApiResponse, GithubError> {
        let mut routes = self.routes.lock().unwrap();
        let queue = routes
            .get_mut(path_and_query)
            .unwrap_or_else(|| panic!("no scripted response for {path_and_query}"));
        // Replay the last response forever once the queue is down to one,
        // so repeated polls against a terminal state stay scripted.
        if queue.len() == 1 {
            Ok(queue.front().cloned().unwrap())
        } else {
            Ok(queue.pop_front().unwrap())
        }
    }
}
