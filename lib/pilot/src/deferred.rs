//! Observable-style calling convention.
//!
//! [`DeferredPilot`] exposes the [`Pilot`] operations as [`Deferred`]
//! handles: streams that stay idle until first polled, deliver exactly one
//! result, then end. Dropping a handle drops the in-flight call with it.

use std::convert::Infallible;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll, ready};

use futures_core::Stream;
use futures_core::stream::FusedStream;
use futures_util::future::BoxFuture;
use pilot_core::{HttpClient, JsonDecoder, Response, Result, Route};
use serde::de::DeserializeOwned;

use crate::Pilot;

/// One-shot stream over a single call.
///
/// Nothing is sent before the first poll.
#[must_use = "streams do nothing unless polled"]
pub struct Deferred<'a, T, E = Infallible> {
    future: Option<BoxFuture<'a, Result<T, E>>>,
}

impl<'a, T, E> Deferred<'a, T, E> {
    /// Wrap a future producing the single item.
    pub fn new<F>(future: F) -> Self
    where
        F: Future<Output = Result<T, E>> + Send + 'a,
    {
        Self {
            future: Some(Box::pin(future)),
        }
    }
}

impl<T, E> Stream for Deferred<'_, T, E> {
    type Item = Result<T, E>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let Some(future) = self.future.as_mut() else {
            return Poll::Ready(None);
        };
        let item = ready!(future.as_mut().poll(cx));
        self.future = None;
        Poll::Ready(Some(item))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = usize::from(self.future.is_some());
        (remaining, Some(remaining))
    }
}

impl<T, E> FusedStream for Deferred<'_, T, E> {
    fn is_terminated(&self) -> bool {
        self.future.is_none()
    }
}

impl<T, E> fmt::Debug for Deferred<'_, T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deferred")
            .field("terminated", &self.future.is_none())
            .finish()
    }
}

/// [`Pilot`] operations returning [`Deferred`] handles.
///
/// Obtained from [`Pilot::deferred`].
pub struct DeferredPilot<'p, R, C> {
    pilot: &'p Pilot<R, C>,
}

impl<'p, R, C> DeferredPilot<'p, R, C> {
    pub(crate) const fn new(pilot: &'p Pilot<R, C>) -> Self {
        Self { pilot }
    }
}

impl<R, C> Clone for DeferredPilot<'_, R, C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R, C> Copy for DeferredPilot<'_, R, C> {}

impl<R, C: fmt::Debug> fmt::Debug for DeferredPilot<'_, R, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeferredPilot")
            .field("pilot", self.pilot)
            .finish()
    }
}

impl<'p, R, C> DeferredPilot<'p, R, C>
where
    R: Route + Sync,
    C: HttpClient,
{
    /// Deferred [`Pilot::request`].
    pub fn request<'a>(&self, route: &'a R) -> Deferred<'a, Response>
    where
        'p: 'a,
    {
        let pilot = self.pilot;
        Deferred::new(async move { pilot.request(route).await })
    }

    /// Deferred [`Pilot::request_target`].
    pub fn request_target<'a, T>(&self, route: &'a R, decoder: &JsonDecoder) -> Deferred<'a, T>
    where
        'p: 'a,
        T: DeserializeOwned + Send + 'a,
    {
        let pilot = self.pilot;
        let decoder = *decoder;
        Deferred::new(async move { pilot.request_target(route, &decoder).await })
    }

    /// Deferred [`Pilot::request_target_failure`].
    pub fn request_target_failure<'a, T, E>(
        &self,
        route: &'a R,
        decoder: &JsonDecoder,
    ) -> Deferred<'a, T, E>
    where
        'p: 'a,
        T: DeserializeOwned + Send + 'a,
        E: DeserializeOwned + Send + 'a,
    {
        let pilot = self.pilot;
        let decoder = *decoder;
        Deferred::new(async move { pilot.request_target_failure(route, &decoder).await })
    }
}

#[cfg(test)]
mod tests {
    use assert2::{check, let_assert};
    use futures_util::StreamExt;
    use pilot_core::{Error, Method};
    use pilot_test_support::{Mock, MockClient};

    use super::*;

    struct Status;

    impl Route for Status {
        fn base_url(&self) -> url::Url {
            "https://api.example.com".parse().expect("valid URL")
        }

        fn path(&self) -> String {
            "status".to_string()
        }

        fn method(&self) -> Method {
            Method::Get
        }
    }

    #[tokio::test]
    async fn yields_once_then_ends() {
        let pilot = Pilot::new(MockClient::with_mock(Mock::json(200, "42")));
        let mut stream = pilot.deferred().request_target::<u32>(&Status, &JsonDecoder::new());

        check!(stream.size_hint() == (1, Some(1)));
        let_assert!(Some(Ok(value)) = stream.next().await);
        check!(value == 42);
        check!(stream.is_terminated());
        check!(stream.next().await.is_none());
        check!(stream.size_hint() == (0, Some(0)));
    }

    #[tokio::test]
    async fn nothing_is_sent_before_polling() {
        let client = MockClient::with_mock(Mock::json(200, "{}"));
        let pilot = Pilot::new(client.clone());

        let stream = pilot.deferred().request(&Status);
        check!(client.requests().is_empty());
        drop(stream);
        check!(client.requests().is_empty());
    }

    #[tokio::test]
    async fn custom_future_is_wrapped() {
        let mut stream: Deferred<'_, u8, String> =
            Deferred::new(async { Err(Error::Designated("nope".to_string())) });
        let_assert!(Some(Err(Error::Designated(message))) = stream.next().await);
        check!(message == "nope");
        check!(format!("{stream:?}").contains("terminated: true"));
    }
}
