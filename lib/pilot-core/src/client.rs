//! Transport and client traits.
//!
//! - [`HttpClient`] - deferred transport: execution is a future
//! - [`BlockingHttpClient`] - blocking transport: execution returns when done
//! - [`RouteClient`] - the typed route operations, for callers that want to
//!   substitute their own implementation (e.g. in tests)

use std::future::Future;

use bytes::Bytes;
use serde::de::DeserializeOwned;

use crate::decode::Outcome;
use crate::{JsonDecoder, Request, Response, Result, Route};

/// Deferred HTTP transport.
///
/// Dropping the returned future must abandon the in-flight call.
pub trait HttpClient: Send + Sync {
    /// Execute an HTTP request and return the response.
    ///
    /// Any status code is a successful execution; only failures to obtain a
    /// response are errors.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails for any reason:
    /// - Network errors
    /// - TLS errors
    /// - Timeouts
    fn execute(&self, request: Request<Bytes>) -> impl Future<Output = Outcome> + Send;
}

impl<C: HttpClient + ?Sized> HttpClient for &C {
    fn execute(&self, request: Request<Bytes>) -> impl Future<Output = Outcome> + Send {
        (**self).execute(request)
    }
}

/// Blocking HTTP transport.
pub trait BlockingHttpClient: Send + Sync {
    /// Execute an HTTP request, blocking the current thread until it completes.
    ///
    /// # Errors
    ///
    /// Same as [`HttpClient::execute`].
    fn execute(&self, request: Request<Bytes>) -> Outcome;
}

impl<C: BlockingHttpClient + ?Sized> BlockingHttpClient for &C {
    fn execute(&self, request: Request<Bytes>) -> Outcome {
        (**self).execute(request)
    }
}

/// Typed operations over one family of routes.
///
/// Implemented by `pilot::Pilot`. Code written against this trait can be
/// exercised with a fake implementation instead of a real transport.
pub trait RouteClient: Send + Sync {
    /// The route type this client serves.
    type Route: Route + Sync;

    /// Execute the route and return the raw response, whatever its status.
    fn request(&self, route: &Self::Route) -> impl Future<Output = Result<Response>> + Send;

    /// Execute the route and decode the body as `T`.
    fn request_target<T>(
        &self,
        route: &Self::Route,
        decoder: &JsonDecoder,
    ) -> impl Future<Output = Result<T>> + Send
    where
        T: DeserializeOwned + Send;

    /// Execute the route and decode the body as `T`, or as the designated
    /// error shape `E` when `T` does not match.
    fn request_target_failure<T, E>(
        &self,
        route: &Self::Route,
        decoder: &JsonDecoder,
    ) -> impl Future<Output = Result<T, E>> + Send
    where
        T: DeserializeOwned + Send,
        E: DeserializeOwned + Send;
}
