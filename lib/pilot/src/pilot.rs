//! The async route client.

use std::fmt;
use std::future::Future;
use std::marker::PhantomData;

use pilot_core::decode::{envelope, target, target_or_designated};
use pilot_core::{
    HttpClient, JsonDecoder, Outcome, Request, Response, Result, Route, RouteClient,
};
use serde::de::DeserializeOwned;

use crate::HyperClient;
use crate::deferred::DeferredPilot;
use crate::diagnostics::{DiagnosticSink, Diagnostics};

/// Typed client for one family of routes.
///
/// Each operation builds the request described by the route, executes it
/// once through the transport, and maps the outcome. Whether the call
/// succeeded is decided by the shape the body decodes into, never by the
/// status code.
///
/// A `Pilot` carries no per-call state: share it freely between tasks.
///
/// # Example
///
/// ```no_run
/// use pilot::prelude::*;
/// use pilot::Pilot;
/// use serde::Deserialize;
///
/// struct FlightById(String);
///
/// impl Route for FlightById {
///     fn base_url(&self) -> url::Url {
///         "https://api.example.com".parse().expect("valid URL")
///     }
///     fn path(&self) -> String {
///         format!("flights/{}", self.0)
///     }
///     fn method(&self) -> Method {
///         Method::Get
///     }
/// }
///
/// #[derive(Debug, Deserialize)]
/// struct Flight {
///     code: String,
/// }
///
/// #[derive(Debug, Deserialize)]
/// struct ApiError {
///     message: String,
/// }
///
/// # async fn run() -> pilot::Result<(), ApiError> {
/// let pilot: Pilot<FlightById> = Pilot::default();
/// let flight: Flight = pilot
///     .request_target_failure(&FlightById("ABC123".into()), &JsonDecoder::new())
///     .await?;
/// println!("{}", flight.code);
/// # Ok(())
/// # }
/// ```
pub struct Pilot<R, C = HyperClient> {
    client: C,
    diagnostics: Diagnostics,
    _route: PhantomData<fn(&R)>,
}

impl<R, C> Pilot<R, C> {
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

    /// Observable-style view: each operation returns a one-shot stream.
    #[must_use]
    pub const fn deferred(&self) -> DeferredPilot<'_, R, C> {
        DeferredPilot::new(self)
    }
}

impl<R, C> Pilot<R, C>
where
    R: Route,
    C: HttpClient,
{
    /// Execute the route and return the raw response, whatever its status.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Underlying`](pilot_core::Error::Underlying) if the
    /// transport failed.
    pub async fn request(&self, route: &R) -> Result<Response> {
        let result = envelope(self.execute(route).await);
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
    pub async fn request_target<T>(&self, route: &R, decoder: &JsonDecoder) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let result = target(self.execute(route).await, decoder);
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
    pub async fn request_target_failure<T, E>(
        &self,
        route: &R,
        decoder: &JsonDecoder,
    ) -> Result<T, E>
    where
        T: DeserializeOwned,
        E: DeserializeOwned,
    {
        let result = target_or_designated(self.execute(route).await, decoder);
        self.diagnostics.result(&result);
        result
    }

    async fn execute(&self, route: &R) -> Outcome {
        let request = Request::from_route(route);
        self.diagnostics.request(&request);
        let outcome = self.client.execute(request).await;
        self.diagnostics.outcome(&outcome);
        outcome
    }
}

impl<R> Default for Pilot<R> {
    fn default() -> Self {
        Self::new(HyperClient::new())
    }
}

impl<R, C: Clone> Clone for Pilot<R, C> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            diagnostics: self.diagnostics.clone(),
            _route: PhantomData,
        }
    }
}

impl<R, C: fmt::Debug> fmt::Debug for Pilot<R, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pilot")
            .field("client", &self.client)
            .field("diagnostics", &self.diagnostics)
            .finish()
    }
}

impl<R, C> RouteClient for Pilot<R, C>
where
    R: Route + Sync,
    C: HttpClient,
{
    type Route = R;

    fn request(&self, route: &R) -> impl Future<Output = Result<Response>> + Send {
        Self::request(self, route)
    }

    fn request_target<T>(
        &self,
        route: &R,
        decoder: &JsonDecoder,
    ) -> impl Future<Output = Result<T>> + Send
    where
        T: DeserializeOwned + Send,
    {
        Self::request_target(self, route, decoder)
    }

    fn request_target_failure<T, E>(
        &self,
        route: &R,
        decoder: &JsonDecoder,
    ) -> impl Future<Output = Result<T, E>> + Send
    where
        T: DeserializeOwned + Send,
        E: DeserializeOwned + Send,
    {
        Self::request_target_failure(self, route, decoder)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use assert2::{check, let_assert};
    use pilot_core::{Error, Method, TransportError};
    use pilot_test_support::{Mock, MockClient};
    use serde::Deserialize;

    use super::*;
    use crate::diagnostics::Record;

    struct Ping;

    impl Route for Ping {
        fn base_url(&self) -> url::Url {
            "https://api.example.com".parse().expect("valid URL")
        }

        fn path(&self) -> String {
            "ping".to_string()
        }

        fn method(&self) -> Method {
            Method::Get
        }
    }

    #[derive(Debug, Deserialize)]
    struct Pong {
        pong: bool,
    }

    #[tokio::test]
    async fn request_builds_from_route() {
        let client = MockClient::with_mock(Mock::json(200, r#"{"pong":true}"#));
        let pilot = Pilot::new(client.clone());

        let_assert!(Ok(pong) = pilot.request_target::<Pong>(&Ping, &JsonDecoder::new()).await);
        check!(pong.pong);
        let_assert!(Some(request) = client.last_request());
        check!(request.url().as_str() == "https://api.example.com/ping");
    }

    #[tokio::test]
    async fn status_is_not_consulted() {
        let pilot = Pilot::new(MockClient::with_mock(Mock::json(503, r#"{"pong":false}"#)));
        let_assert!(Ok(pong) = pilot.request_target::<Pong>(&Ping, &JsonDecoder::new()).await);
        check!(!pong.pong);
    }

    #[tokio::test]
    async fn diagnostics_follow_the_call() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = {
            let seen = Arc::clone(&seen);
            move |record: &Record<'_>| seen.lock().expect("lock").push(record.to_string())
        };
        let pilot = Pilot::new(MockClient::with_mock(Mock::json(200, "[]"))).with_diagnostics(sink);

        let result = pilot.request_target::<Pong>(&Ping, &JsonDecoder::new()).await;
        check!(result.is_err());

        let seen = seen.lock().expect("lock");
        check!(seen.len() == 3);
        check!(seen[0] == "--> GET https://api.example.com/ping");
        check!(seen[1] == "<-- 200 []");
        check!(seen[2].starts_with("xxx failed to decode object"));
    }

    #[tokio::test]
    async fn pilot_is_usable_through_route_client() {
        async fn fetch<P: RouteClient<Route = Ping>>(pilot: &P) -> Result<Pong> {
            pilot.request_target(&Ping, &JsonDecoder::new()).await
        }

        let pilot = Pilot::new(MockClient::with_mock(Mock::failure(
            200,
            TransportError::connection("refused"),
        )));
        let_assert!(Err(Error::Underlying(err)) = fetch(&pilot).await);
        check!(err.is_connection());
    }

    #[test]
    fn pilot_is_clone_and_debug() {
        let pilot: Pilot<Ping, MockClient> = Pilot::new(MockClient::new());
        let cloned = pilot.clone();
        check!(format!("{cloned:?}").contains("Pilot"));
    }
}
