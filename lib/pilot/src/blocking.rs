//! Blocking calling convention.
//!
//! [`BlockingPilot`] runs the same pipeline as [`Pilot`](crate::Pilot) over a
//! [`BlockingHttpClient`]. [`BlockingHyperClient`] adapts the hyper transport
//! by driving it on a private runtime.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use bytes::Bytes;
use pilot_core::decode::{envelope, target, target_or_designated};
use pilot_core::{
    BlockingHttpClient, HttpClient, JsonDecoder, Outcome, Request, Response, Result, Route,
    TransportError,
};
use serde::de::DeserializeOwned;
use tokio::runtime::{self, Runtime};

use crate::HyperClient;
use crate::config::ClientConfig;
use crate::diagnostics::{DiagnosticSink, Diagnostics};

/// Owns the private runtime; shuts it down without blocking so the last
/// clone can be dropped from any context, async tasks included.
struct OwnedRuntime(Option<Runtime>);

impl Drop for OwnedRuntime {
    fn drop(&mut self) {
        if let Some(runtime) = self.0.take() {
            runtime.shutdown_background();
        }
    }
}

/// Blocking transport over [`HyperClient`].
///
/// Owns a one-worker tokio runtime that keeps pooled connections alive
/// between calls. Must not be used from inside an async runtime: such calls
/// fail with [`TransportError::Runtime`]. Dropping it is fine anywhere.
#[derive(Clone)]
pub struct BlockingHyperClient {
    client: HyperClient,
    runtime: Arc<OwnedRuntime>,
}

impl fmt::Debug for BlockingHyperClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlockingHyperClient")
            .field("client", &self.client)
            .finish_non_exhaustive()
    }
}

impl BlockingHyperClient {
    /// Create a blocking client with default configuration.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Runtime`] if the runtime cannot be started.
    pub fn new() -> std::result::Result<Self, TransportError> {
        Self::with_client(HyperClient::new())
    }

    /// Create a blocking client with custom configuration.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Runtime`] if the runtime cannot be started.
    pub fn with_config(config: ClientConfig) -> std::result::Result<Self, TransportError> {
        Self::with_client(HyperClient::with_config(config))
    }

    /// Drive an existing client, layers included.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Runtime`] if the runtime cannot be started.
    pub fn with_client(client: HyperClient) -> std::result::Result<Self, TransportError> {
        let runtime = runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("pilot-blocking")
            .enable_all()
            .build()
            .map_err(|err| TransportError::runtime(format!("failed to create runtime: {err}")))?;

        Ok(Self {
            client,
            runtime: Arc::new(OwnedRuntime(Some(runtime))),
        })
    }

    /// The driven client.
    #[must_use]
    pub const fn client(&self) -> &HyperClient {
        &self.client
    }
}

impl BlockingHttpClient for BlockingHyperClient {
    fn execute(&self, request: Request<Bytes>) -> Outcome {
        if runtime::Handle::try_current().is_ok() {
            return Err(TransportError::runtime(
                "blocking call from inside an async runtime",
            ));
        }
        let Some(runtime) = self.runtime.0.as_ref() else {
            return Err(TransportError::runtime("runtime already shut down"));
        };
        runtime.block_on(HttpClient::execute(&self.client, request))
    }
}

/// Blocking typed client for one family of routes.
///
/// Same operations and outcomes as [`Pilot`](crate::Pilot); each call
/// returns once the transport is done.
///
/// ```no_run
/// use pilot::{BlockingHyperClient, BlockingPilot};
/// use pilot::prelude::*;
///
/// struct Health;
///
/// impl Route for Health {
///     fn base_url(&self) -> url::Url {
///         "https://api.example.com".parse().expect("valid URL")
///     }
///     fn path(&self) -> String {
///         "health".into()
///     }
///     fn method(&self) -> Method {
///         Method::Get
///     }
/// }
///
/// let pilot = BlockingPilot::new(BlockingHyperClient::new()?);
/// let response = pilot.request(&Health)?;
/// println!("{}", response.status());
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct BlockingPilot<R, C = BlockingHyperClient> {
    client: C,
    diagnostics: Diagnostics,
    _route: PhantomData<fn(&R)>,
}

impl<R, C> BlockingPilot<R, C> {
    /// Create a pilot over the given transport, without diagnostics.
    #[must_use]
    pub fn new(client: C) -> Self {
        Self {
            client,
            diagnostics: Diagnostics::default(),
            _route: PhantomData,
        }
    }

    /// Report every call to `sink`.
    #[must_use]
    pub fn with_diagnostics(mut self, sink: impl DiagnosticSink + 'static) -> Self {
        self.diagnostics = Diagnostics::new(sink);
        self
    }

    /// The underlying transport.
    #[must_use]
    pub const fn client(&self) -> &C {
        &self.client
    }
}

impl<R, C> BlockingPilot<R, C>
where
    R: Route,
    C: BlockingHttpClient,
{
    /// Execute the route and return the raw response, whatever its status.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Underlying`](pilot_core::Error::Underlying) if the
    /// transport failed.
    pub fn request(&self, route: &R) -> Result<Response> {
        let result = envelope(self.execute(route));
        self.diagnostics.result(&result);
        result
    }

    /// Execute the route and decode the body as `T`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Underlying`](pilot_core::Error::Underlying) if the
    /// transport failed, or [`Error::Decoding`](pilot_core::Error::Decoding)
    /// if the body does not match `T`.
    pub fn request_target<T>(&self, route: &R, decoder: &JsonDecoder) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let result = target(self.execute(route), decoder);
        self.diagnostics.result(&result);
        result
    }

    /// Execute the route and decode the body as `T`, or as the designated
    /// error shape `E` when `T` does not match.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Underlying`](pilot_core::Error::Underlying) if the
    /// transport failed, [`Error::Designated`](pilot_core::Error::Designated)
    /// if the body matches `E` but not `T`, or
    /// [`Error::Decoding`](pilot_core::Error::Decoding) if it matches neither.
    pub fn request_target_failure<T, E>(&self, route: &R, decoder: &JsonDecoder) -> Result<T, E>
    where
        T: DeserializeOwned,
        E: DeserializeOwned,
    {
        let result = target_or_designated(self.execute(route), decoder);
        self.diagnostics.result(&result);
        result
    }

    fn execute(&self, route: &R) -> Outcome {
        let request = Request::from_route(route);
        self.diagnostics.request(&request);
        let outcome = self.client.execute(request);
        self.diagnostics.outcome(&outcome);
        outcome
    }
}

impl<R, C: Clone> Clone for BlockingPilot<R, C> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            diagnostics: self.diagnostics.clone(),
            _route: PhantomData,
        }
    }
}

impl<R, C: fmt::Debug> fmt::Debug for BlockingPilot<R, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlockingPilot")
            .field("client", &self.client)
            .field("diagnostics", &self.diagnostics)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use assert2::{check, let_assert};
    use pilot_core::{Error, Method, ParameterEncoding, Parameters};
    use pilot_test_support::{Mock, MockClient};
    use serde_json::json;

    use super::*;

    struct Search(Parameters);

    impl Route for Search {
        fn base_url(&self) -> url::Url {
            "https://api.example.com".parse().expect("valid URL")
        }

        fn path(&self) -> String {
            "search".to_string()
        }

        fn method(&self) -> Method {
            Method::Get
        }

        fn parameters(&self) -> Option<Parameters> {
            Some(self.0.clone())
        }

        fn parameter_encoding(&self) -> Option<ParameterEncoding> {
            Some(ParameterEncoding::Query)
        }
    }

    fn search() -> Search {
        let_assert!(serde_json::Value::Object(parameters) = json!({"q": "ABC", "page": 2}));
        Search(parameters)
    }

    #[test]
    fn blocking_request_returns_raw_envelope() {
        let client = MockClient::with_mock(Mock::json(500, r#"{"oops":true}"#));
        let pilot = BlockingPilot::new(client.clone());

        let_assert!(Ok(response) = pilot.request(&search()));
        check!(response.status() == 500);
        let_assert!(Some(request) = client.last_request());
        check!(request.url().query() == Some("q=ABC"));
    }

    #[test]
    fn blocking_target_failure_falls_back() {
        #[derive(Debug, serde::Deserialize)]
        struct Hits {
            #[allow(dead_code)]
            hits: Vec<String>,
        }

        let pilot = BlockingPilot::new(MockClient::with_mock(Mock::json(400, r#""bad query""#)));
        let result = pilot.request_target_failure::<Hits, String>(&search(), &JsonDecoder::new());
        let_assert!(Err(Error::Designated(message)) = result);
        check!(message == "bad query");
    }

    #[test]
    fn hyper_client_refuses_nested_runtime() {
        let_assert!(Ok(client) = BlockingHyperClient::new());
        let nested = runtime::Builder::new_current_thread()
            .build()
            .expect("runtime");
        let url = "http://127.0.0.1:1/".parse().expect("valid URL");

        let outcome = nested.block_on(async {
            BlockingHttpClient::execute(&client, Request::builder(Method::Get, url).build())
        });
        let_assert!(Err(TransportError::Runtime(message)) = outcome);
        check!(message.contains("inside an async runtime"));
    }

    #[tokio::test]
    async fn hyper_client_can_be_dropped_inside_a_runtime() {
        let_assert!(Ok(client) = BlockingHyperClient::new());
        let clone = client.clone();
        drop(client);
        drop(clone);
    }

    #[test]
    fn hyper_client_dropped_inside_block_on() {
        let nested = runtime::Builder::new_current_thread()
            .build()
            .expect("runtime");
        nested.block_on(async {
            let_assert!(Ok(client) = BlockingHyperClient::new());
            drop(client);
        });
    }
}
