//! # Mock API Client & Testing Guide
//!
//! [`MockApiClient`] implements [`ApiClient`] entirely in memory. You queue
//! expectations in the order requests will arrive, each with the response to return,
//! then hand the mock to the consumer under test. Every request is recorded so tests
//! can assert on exactly what the consumer sent.
//!
//! ## When to use the mock
//!
//! | Feature | MockApiClient | Real API client |
//! |---------|---------------|-----------------|
//! | **Speed** | Instant (in-memory) | Network round-trip |
//! | **Determinism** | 100% Deterministic | Subject to the server |
//! | **Assertions** | Recorded requests | Server-side logs |
//! | **Error Injection** | Easy (`return_err`, `return_problem`) | Hard |
//!
//! ## Example
//!
//! ```rust
//! use resource_consumer::mock::MockApiClient;
//! use resource_consumer::{ApiClient, CallOptions, Consumer, ProblemDetails};
//! use serde::Deserialize;
//! use serde_json::json;
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! #[derive(Debug, Deserialize)]
//! struct Widget { id: String }
//!
//! #[tokio::main]
//! async fn main() {
//!     // 1. Setup expectations
//!     let mut mock = MockApiClient::new();
//!     mock.expect_get("widgets/1").return_ok(json!({ "id": "1" }));
//!     mock.expect_get("widgets/2").return_problem(ProblemDetails::new(404, "Not Found"));
//!
//!     // 2. Create the consumer with the mock
//!     let client: Arc<dyn ApiClient> = Arc::new(mock.clone());
//!     let widgets: Consumer<Widget> = Consumer::new(client, "widgets").unwrap();
//!
//!     // 3. Exercise
//!     let found = widgets.get(Some("1"), &CallOptions::new(), CancellationToken::new()).await;
//!     assert_eq!(found.unwrap().id, "1");
//!     let missing = widgets.get(Some("2"), &CallOptions::new(), CancellationToken::new()).await;
//!     assert_eq!(missing.unwrap_err().status(), Some(404));
//!
//!     // 4. Verify every expectation was consumed
//!     mock.verify();
//! }
//! ```
//!
//! ## Cancellation
//!
//! A request whose token is already cancelled fails with
//! [`ConsumerError::Cancelled`] and does not consume an expectation. It is still
//! recorded.

use crate::client::{ApiClient, Method};
use crate::error::ConsumerError;
use crate::options::{RequestOptions, RequestUploadOptions};
use crate::problem::ProblemDetails;
use crate::response::ApiResponse;
use async_trait::async_trait;
use bytes::Bytes;
use serde_json::Value;
use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio_util::sync::CancellationToken;

// =============================================================================
// EXPECTATION BUILDER API
// =============================================================================

/// A queued request expectation and the response it produces.
struct Expectation {
    method: Method,
    uri: String,
    response: Result<ApiResponse, ConsumerError>,
}

/// A request received by the mock, as the consumer sent it.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub method: Method,
    pub uri: String,
    pub body: Option<Value>,
    pub query: BTreeMap<String, String>,
    pub headers: BTreeMap<String, String>,
    pub allow_anonymous: bool,
    pub file_name: Option<String>,
    pub content: Option<Bytes>,
    pub cancelled: bool,
}

#[derive(Default)]
struct MockState {
    expectations: VecDeque<Expectation>,
    requests: Vec<RecordedRequest>,
}

/// A scripted API client with expectation tracking for fluent testing.
///
/// Clones share the same expectations and recorded requests, so a test can keep
/// one handle for assertions while the consumer owns another.
#[derive(Clone, Default)]
pub struct MockApiClient {
    state: Arc<Mutex<MockState>>,
}

impl MockApiClient {
    /// Creates a new mock client with no expectations.
    pub fn new() -> Self {
        Self::default()
    }

    /// Expects a `get` request for `uri`.
    pub fn expect_get(&mut self, uri: impl Into<String>) -> ExpectationBuilder {
        self.expect(Method::Get, uri)
    }

    /// Expects a `post` request for `uri`.
    pub fn expect_post(&mut self, uri: impl Into<String>) -> ExpectationBuilder {
        self.expect(Method::Post, uri)
    }

    /// Expects a `put` request for `uri`.
    pub fn expect_put(&mut self, uri: impl Into<String>) -> ExpectationBuilder {
        self.expect(Method::Put, uri)
    }

    /// Expects a `delete` request for `uri`.
    pub fn expect_delete(&mut self, uri: impl Into<String>) -> ExpectationBuilder {
        self.expect(Method::Delete, uri)
    }

    /// Expects an `upload` request for `uri`.
    pub fn expect_upload(&mut self, uri: impl Into<String>) -> ExpectationBuilder {
        self.expect(Method::Upload, uri)
    }

    fn expect(&mut self, method: Method, uri: impl Into<String>) -> ExpectationBuilder {
        ExpectationBuilder {
            method,
            uri: uri.into(),
            state: Arc::clone(&self.state),
        }
    }

    /// Returns every request received so far, in arrival order.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.lock().requests.clone()
    }

    /// Verifies that all expectations were met.
    pub fn verify(&self) {
        let state = self.lock();
        if !state.expectations.is_empty() {
            panic!(
                "Not all expectations were met. {} remaining",
                state.expectations.len()
            );
        }
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        // A panicking test thread must not hide the recorded requests from the others.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn respond(&self, request: RecordedRequest) -> Result<ApiResponse, ConsumerError> {
        let mut state = self.lock();
        let cancelled = request.cancelled;
        let method = request.method;
        let uri = request.uri.clone();
        state.requests.push(request);

        if cancelled {
            return Err(ConsumerError::Cancelled);
        }

        match state.expectations.pop_front() {
            Some(expectation) if expectation.method == method && expectation.uri == uri => {
                expectation.response
            }
            Some(expectation) => panic!(
                "Unexpected request: {} {} (expected {} {})",
                method, uri, expectation.method, expectation.uri
            ),
            None => panic!("Unexpected request: {} {} (no expectations left)", method, uri),
        }
    }
}

fn record(method: Method, options: RequestOptions, cancel: &CancellationToken) -> RecordedRequest {
    RecordedRequest {
        method,
        uri: options.uri,
        body: options.body,
        query: options.query,
        headers: options.headers,
        allow_anonymous: options.allow_anonymous,
        file_name: None,
        content: None,
        cancelled: cancel.is_cancelled(),
    }
}

#[async_trait]
impl ApiClient for MockApiClient {
    async fn get(
        &self,
        options: RequestOptions,
        cancel: CancellationToken,
    ) -> Result<ApiResponse, ConsumerError> {
        self.respond(record(Method::Get, options, &cancel))
    }

    async fn post(
        &self,
        options: RequestOptions,
        cancel: CancellationToken,
    ) -> Result<ApiResponse, ConsumerError> {
        self.respond(record(Method::Post, options, &cancel))
    }

    async fn put(
        &self,
        options: RequestOptions,
        cancel: CancellationToken,
    ) -> Result<ApiResponse, ConsumerError> {
        self.respond(record(Method::Put, options, &cancel))
    }

    async fn delete(
        &self,
        options: RequestOptions,
        cancel: CancellationToken,
    ) -> Result<ApiResponse, ConsumerError> {
        self.respond(record(Method::Delete, options, &cancel))
    }

    async fn upload(
        &self,
        options: RequestUploadOptions,
        cancel: CancellationToken,
    ) -> Result<ApiResponse, ConsumerError> {
        let request = RecordedRequest {
            method: Method::Upload,
            uri: options.uri,
            body: None,
            query: BTreeMap::new(),
            headers: options.headers,
            allow_anonymous: options.allow_anonymous,
            file_name: Some(options.file_name),
            content: Some(options.content),
            cancelled: cancel.is_cancelled(),
        };
        self.respond(request)
    }
}

/// Builder for a single expectation. Finish it with one of the `return_*` methods.
pub struct ExpectationBuilder {
    method: Method,
    uri: String,
    state: Arc<Mutex<MockState>>,
}

impl ExpectationBuilder {
    /// Responds with status 200 and `body`.
    pub fn return_ok(self, body: Value) {
        self.push(Ok(ApiResponse::ok(body)));
    }

    /// Responds with an arbitrary status and optional body.
    pub fn return_status(self, status: u16, body: Option<Value>) {
        self.push(Ok(ApiResponse::new(status, body)));
    }

    /// Responds with a problem-details document; the status comes from `details`.
    pub fn return_problem(self, details: ProblemDetails) {
        self.push(Ok(ApiResponse::problem(&details)));
    }

    /// Fails the exchange itself, as a transport would.
    pub fn return_err(self, error: ConsumerError) {
        self.push(Err(error));
    }

    fn push(self, response: Result<ApiResponse, ConsumerError>) {
        let mut state = self
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        state.expectations.push_back(Expectation {
            method: self.method,
            uri: self.uri,
            response,
        });
    }
}
