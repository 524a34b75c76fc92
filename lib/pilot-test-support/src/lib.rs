//! Scripted transport for testing code built on pilot.
//!
//! [`MockClient`] implements both [`HttpClient`] and [`BlockingHttpClient`].
//! It answers every request with the current [`Mock`] and records the
//! requests it receives.
//!
//! # Example
//!
//! ```
//! use pilot_test_support::{Mock, MockClient};
//!
//! let client = MockClient::with_mock(Mock::json(
//!     404,
//!     r#"{"error":{"code":404,"description":"Invalid flight id."}}"#,
//! ));
//! assert!(client.requests().is_empty());
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bytes::Bytes;
use pilot_core::{BlockingHttpClient, HttpClient, Outcome, Request, Response, TransportError};

/// Message of the error returned when no mock is installed.
pub const MISSING_MOCK: &str = "missing mock";

/// A scripted answer.
///
/// When `error` is set the transport fails with it, whatever the status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mock {
    status: u16,
    error: Option<TransportError>,
    headers: HashMap<String, String>,
    body: Option<Bytes>,
}

impl Mock {
    /// A mock answering with `status`, failing with `error` if set, and
    /// sending `body` if set.
    #[must_use]
    pub fn new(status: u16, error: Option<TransportError>, body: Option<Bytes>) -> Self {
        Self {
            status,
            error,
            headers: HashMap::new(),
            body,
        }
    }

    /// A successful transport answer carrying a JSON document.
    #[must_use]
    pub fn json(status: u16, json: &str) -> Self {
        Self::new(status, None, Some(Bytes::copy_from_slice(json.as_bytes())))
            .header("Content-Type", "application/json")
    }

    /// A transport failure.
    #[must_use]
    pub fn failure(status: u16, error: TransportError) -> Self {
        Self::new(status, Some(error), None)
    }

    /// Add a response header.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Scripted status code.
    #[must_use]
    pub const fn status(&self) -> u16 {
        self.status
    }

    fn respond(&self) -> Outcome {
        if let Some(error) = &self.error {
            return Err(error.clone());
        }
        Ok(Response::new(
            self.status,
            self.headers.clone(),
            self.body.clone().unwrap_or_default(),
        ))
    }
}

#[derive(Debug, Default)]
struct State {
    mock: Option<Mock>,
    requests: Vec<Request>,
}

/// Transport answering from a [`Mock`].
///
/// Clones share the same mock and request log.
#[derive(Debug, Clone, Default)]
pub struct MockClient {
    state: Arc<Mutex<State>>,
}

impl MockClient {
    /// A client without mock: every call fails with [`MISSING_MOCK`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A client answering with `mock`.
    #[must_use]
    pub fn with_mock(mock: Mock) -> Self {
        let client = Self::new();
        client.set_mock(mock);
        client
    }

    /// Replace the current mock.
    pub fn set_mock(&self, mock: Mock) {
        self.lock().mock = Some(mock);
    }

    /// Remove the current mock.
    pub fn clear_mock(&self) {
        self.lock().mock = None;
    }

    /// Requests received so far, oldest first.
    #[must_use]
    pub fn requests(&self) -> Vec<Request> {
        self.lock().requests.clone()
    }

    /// The most recent request.
    #[must_use]
    pub fn last_request(&self) -> Option<Request> {
        self.lock().requests.last().cloned()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn respond(&self, request: Request) -> Outcome {
        let mut state = self.lock();
        state.requests.push(request);
        match &state.mock {
            Some(mock) => mock.respond(),
            None => Err(TransportError::invalid_request(MISSING_MOCK)),
        }
    }
}

impl HttpClient for MockClient {
    async fn execute(&self, request: Request) -> Outcome {
        self.respond(request)
    }
}

impl BlockingHttpClient for MockClient {
    fn execute(&self, request: Request) -> Outcome {
        self.respond(request)
    }
}
