//! Diagnostic records emitted around each call.
//!
//! A [`Pilot`](crate::Pilot) reports what it does to a [`DiagnosticSink`]:
//! one [`Record::Request`] before dispatch, one [`Record::Response`] when the
//! transport produced a response, and one [`Record::Failure`] when the call
//! ends in an error. Sinks are fire-and-forget: they cannot alter the outcome.
//!
//! The default sink is [`NoopSink`], which also skips building the records.
//!
//! ```
//! use std::sync::{Arc, Mutex};
//! use pilot::Pilot;
//! use pilot::diagnostics::{Record, TracingSink};
//! use pilot_test_support::MockClient;
//!
//! // Through `tracing`
//! let traced: Pilot<(), _> = Pilot::new(MockClient::new()).with_diagnostics(TracingSink);
//!
//! // Or through any closure
//! let lines = Arc::new(Mutex::new(Vec::new()));
//! let sink = {
//!     let lines = Arc::clone(&lines);
//!     move |record: &Record<'_>| lines.lock().unwrap().push(record.to_string())
//! };
//! let collected: Pilot<(), _> = Pilot::new(MockClient::new()).with_diagnostics(sink);
//! # let _ = (traced, collected);
//! ```

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use pilot_core::{Error, Headers, Method, Outcome, Request};
use tracing::{debug, warn};
use url::Url;

/// One diagnostic event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record<'a> {
    /// About to dispatch a request.
    Request {
        /// HTTP method.
        method: Method,
        /// Full request URL, query included.
        url: &'a Url,
        /// Request headers.
        headers: &'a Headers,
    },
    /// The transport returned a response.
    Response {
        /// HTTP status code.
        status: u16,
        /// Body text, invalid UTF-8 replaced.
        body: Cow<'a, str>,
    },
    /// The call ended in an error.
    Failure {
        /// Description of the error.
        error: String,
    },
}

impl fmt::Display for Record<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Request { method, url, .. } => write!(f, "--> {method} {url}"),
            Self::Response { status, body } => write!(f, "<-- {status} {body}"),
            Self::Failure { error } => write!(f, "xxx {error}"),
        }
    }
}

/// Receives diagnostic records.
///
/// Implemented for any `Fn(&Record)` closure.
pub trait DiagnosticSink: Send + Sync {
    /// Handle one record.
    fn record(&self, record: &Record<'_>);

    /// Whether records should be built at all.
    fn enabled(&self) -> bool {
        true
    }
}

impl<F> DiagnosticSink for F
where
    F: Fn(&Record<'_>) + Send + Sync,
{
    fn record(&self, record: &Record<'_>) {
        self(record);
    }
}

/// Sink discarding everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl DiagnosticSink for NoopSink {
    fn record(&self, _record: &Record<'_>) {}

    fn enabled(&self) -> bool {
        false
    }
}

/// Sink forwarding records to `tracing`.
///
/// Traffic is logged at debug level, failures at warn level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn record(&self, record: &Record<'_>) {
        match record {
            Record::Request {
                method,
                url,
                headers,
            } => {
                debug!(method = %method, url = %url, headers = ?headers, "sending request");
            }
            Record::Response { status, body } => {
                debug!(status = *status, body = %body, "received response");
            }
            Record::Failure { error } => {
                warn!(error = %error, "request failed");
            }
        }
    }
}

/// Shared handle on a sink, carried by every pilot.
#[derive(Clone)]
pub(crate) struct Diagnostics {
    sink: Arc<dyn DiagnosticSink>,
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self::new(NoopSink)
    }
}

impl fmt::Debug for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Diagnostics")
            .field("enabled", &self.sink.enabled())
            .finish()
    }
}

impl Diagnostics {
    pub(crate) fn new(sink: impl DiagnosticSink + 'static) -> Self {
        Self {
            sink: Arc::new(sink),
        }
    }

    pub(crate) fn request(&self, request: &Request) {
        if self.sink.enabled() {
            self.sink.record(&Record::Request {
                method: request.method(),
                url: request.url(),
                headers: request.headers(),
            });
        }
    }

    pub(crate) fn outcome(&self, outcome: &Outcome) {
        if !self.sink.enabled() {
            return;
        }
        if let Ok(response) = outcome {
            self.sink.record(&Record::Response {
                status: response.status(),
                body: String::from_utf8_lossy(response.body()),
            });
        }
    }

    pub(crate) fn result<T, E>(&self, result: &Result<T, Error<E>>) {
        if !self.sink.enabled() {
            return;
        }
        if let Err(error) = result {
            self.sink.record(&Record::Failure {
                error: describe(error),
            });
        }
    }
}

fn describe<E>(error: &Error<E>) -> String {
    match error {
        Error::Decoding(err) => err.to_string(),
        Error::Underlying(err) => err.to_string(),
        Error::Designated(_) => format!("designated error {}", std::any::type_name::<E>()),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use assert2::check;
    use bytes::Bytes;
    use pilot_core::{DecodeError, Response, TransportError};

    use super::*;

    fn collecting() -> (Diagnostics, Arc<Mutex<Vec<String>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = {
            let seen = Arc::clone(&seen);
            move |record: &Record<'_>| seen.lock().expect("lock").push(record.to_string())
        };
        (Diagnostics::new(sink), seen)
    }

    #[test]
    fn records_request_line() {
        let (diagnostics, seen) = collecting();
        let url = "https://api.example.com/flights/ABC123".parse().expect("valid URL");
        diagnostics.request(&Request::builder(Method::Get, url).build());

        check!(*seen.lock().expect("lock") == ["--> GET https://api.example.com/flights/ABC123"]);
    }

    #[test]
    fn records_response_only_for_transport_success() {
        let (diagnostics, seen) = collecting();
        diagnostics.outcome(&Ok(Response::new(
            404,
            HashMap::new(),
            Bytes::from_static(b"not found"),
        )));
        diagnostics.outcome(&Err(TransportError::Timeout));

        check!(*seen.lock().expect("lock") == ["<-- 404 not found"]);
    }

    #[test]
    fn records_failures() {
        let (diagnostics, seen) = collecting();
        diagnostics.result::<(), String>(&Err(Error::Underlying(TransportError::Timeout)));
        diagnostics.result::<(), String>(&Err(Error::Decoding(DecodeError::new("code", "missing"))));
        diagnostics.result::<(), String>(&Err(Error::Designated("gone".to_string())));
        diagnostics.result::<(), String>(&Ok(()));

        let seen = seen.lock().expect("lock");
        check!(seen.len() == 3);
        check!(seen[0] == "xxx request timeout");
        check!(seen[1] == "xxx failed to decode object at 'code': missing");
        check!(seen[2].starts_with("xxx designated error"));
        check!(seen[2].contains("String"));
    }

    #[test]
    fn noop_sink_is_disabled() {
        check!(!NoopSink.enabled());
        check!(TracingSink.enabled());
        check!(format!("{:?}", Diagnostics::default()).contains("enabled: false"));
    }
}
