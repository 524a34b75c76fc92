//! HTTP transport implementation using hyper-util.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use std::task::{Context, Poll};
use std::time::Duration;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::{
    client::legacy::{Client, connect::HttpConnector},
    rt::TokioExecutor,
};
use pilot_core::{HttpClient, Outcome, Request, Response, TransportError};
use tower::{Layer, ServiceExt};
use tower::util::BoxCloneService;
use tower_service::Service;

use crate::config::{ClientConfig, ClientConfigBuilder};

/// Type-erased transport service, the unit of layer composition.
pub type BoxedService = BoxCloneService<Request<Bytes>, Response<Bytes>, TransportError>;

/// Future type for the [`Service`] implementation.
pub type ServiceFuture = Pin<Box<dyn Future<Output = Outcome> + Send + 'static>>;

/// Makes a [`BoxedService`] shareable: [`HttpClient`] requires `Sync`.
#[derive(Clone)]
struct SyncService {
    inner: Arc<Mutex<BoxedService>>,
}

impl SyncService {
    fn new(service: BoxedService) -> Self {
        Self {
            inner: Arc::new(Mutex::new(service)),
        }
    }

    fn call(&self, request: Request<Bytes>) -> ServiceFuture {
        // Hold the lock only long enough to clone the service
        let service = self
            .inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        Box::pin(service.oneshot(request))
    }
}

/// HTTPS connector with rustls and the Mozilla root certificates.
///
/// Plain `http://` URLs are accepted too.
fn https_connector(connect_timeout: Duration) -> HttpsConnector<HttpConnector> {
    let root_store: rustls::RootCertStore =
        webpki_roots::TLS_SERVER_ROOTS.iter().cloned().collect();

    let tls_config = rustls::ClientConfig::builder()
        .with_root_certificates(root_store)
        .with_no_client_auth();

    let mut http = HttpConnector::new();
    http.enforce_http(false);
    http.set_connect_timeout(Some(connect_timeout));

    HttpsConnectorBuilder::new()
        .with_tls_config(tls_config)
        .https_or_http()
        .enable_http1()
        .enable_http2()
        .wrap_connector(http)
}

/// The innermost service: one hyper round trip per request.
#[derive(Clone)]
struct RawHyperClient {
    inner: Client<HttpsConnector<HttpConnector>, Full<Bytes>>,
    config: ClientConfig,
}

impl RawHyperClient {
    fn new(config: ClientConfig) -> Self {
        let inner = Client::builder(TokioExecutor::new())
            .pool_idle_timeout(config.pool_idle_timeout)
            .pool_max_idle_per_host(config.pool_idle_per_host)
            .build(https_connector(config.connect_timeout));

        Self { inner, config }
    }

    fn build_hyper_request(
        &self,
        request: Request<Bytes>,
    ) -> Result<http::Request<Full<Bytes>>, TransportError> {
        let user_agent = self
            .config
            .user_agent
            .as_deref()
            .filter(|_| request.header("user-agent").is_none());
        let (method, url, headers, body) = request.into_parts();

        let mut builder = http::Request::builder()
            .method(http::Method::from(method))
            .uri(url.as_str());

        for (name, value) in &headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(user_agent) = user_agent {
            builder = builder.header(http::header::USER_AGENT, user_agent);
        }

        builder
            .body(body.map_or_else(Full::default, Full::new))
            .map_err(|err| TransportError::invalid_request(err.to_string()))
    }

    fn extract_headers(headers: &http::HeaderMap) -> HashMap<String, String> {
        headers
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.to_string(), value.to_string()))
            })
            .collect()
    }

    // The timeout covers the whole round trip, body included.
    async fn execute(&self, request: Request<Bytes>) -> Outcome {
        let hyper_request = self.build_hyper_request(request)?;

        tokio::time::timeout(self.config.timeout, self.round_trip(hyper_request))
            .await
            .map_err(|_| TransportError::Timeout)?
    }

    async fn round_trip(&self, hyper_request: http::Request<Full<Bytes>>) -> Outcome {
        let response = self
            .inner
            .request(hyper_request)
            .await
            .map_err(Self::map_hyper_error)?;

        let status = response.status().as_u16();
        let headers = Self::extract_headers(response.headers());

        let body = response
            .into_body()
            .collect()
            .await
            .map_err(|err| TransportError::connection(err.to_string()))?
            .to_bytes();

        Ok(Response::new(status, headers, body))
    }

    #[allow(clippy::needless_pass_by_value)]
    fn map_hyper_error(err: hyper_util::client::legacy::Error) -> TransportError {
        let msg = format!("{err:?}");

        if err.is_connect() {
            return TransportError::connection(msg);
        }

        let lower = msg.to_ascii_lowercase();
        if lower.contains("ssl") || lower.contains("tls") || lower.contains("certificate") {
            return TransportError::tls(msg);
        }

        TransportError::connection(msg)
    }
}

impl Service<Request<Bytes>> for RawHyperClient {
    type Response = Response<Bytes>;
    type Error = TransportError;
    type Future = ServiceFuture;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), TransportError>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request<Bytes>) -> Self::Future {
        let client = self.clone();
        Box::pin(async move { client.execute(request).await })
    }
}

/// HTTP transport using hyper-util, with connection pooling, TLS, and
/// support for tower layers.
///
/// Every status code is a successful execution; only failures to obtain a
/// response map to a [`TransportError`]. Dropping the future returned by
/// [`HttpClient::execute`] abandons the in-flight call.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use pilot::HyperClient;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let client = HyperClient::builder()
///     .timeout(Duration::from_secs(5))
///     .user_agent("flights/1.0")
///     .build();
/// assert_eq!(client.config().timeout, Duration::from_secs(5));
/// # }
/// ```
#[derive(Clone)]
pub struct HyperClient {
    service: SyncService,
    config: ClientConfig,
}

impl std::fmt::Debug for HyperClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HyperClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl HyperClient {
    /// Create a new client with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(ClientConfig::default())
    }

    /// Create a new client with custom configuration and no layers.
    #[must_use]
    pub fn with_config(config: ClientConfig) -> Self {
        let raw = RawHyperClient::new(config.clone());
        Self::with_service(BoxCloneService::new(raw), config)
    }

    fn with_service(service: BoxedService, config: ClientConfig) -> Self {
        Self {
            service: SyncService::new(service),
            config,
        }
    }

    /// Create a new client builder.
    #[must_use]
    pub fn builder() -> HyperClientBuilder {
        HyperClientBuilder::default()
    }

    /// Get the client configuration.
    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }
}

impl Default for HyperClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient for HyperClient {
    async fn execute(&self, request: Request<Bytes>) -> Outcome {
        self.service.call(request).await
    }
}

impl Service<Request<Bytes>> for HyperClient {
    type Response = Response<Bytes>;
    type Error = TransportError;
    type Future = ServiceFuture;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), TransportError>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request<Bytes>) -> Self::Future {
        self.service.call(request)
    }
}

/// Builder for [`HyperClient`].
#[derive(Default)]
pub struct HyperClientBuilder {
    config: ClientConfigBuilder,
    layers: Vec<Arc<dyn Fn(BoxedService) -> BoxedService + Send + Sync>>,
}

impl std::fmt::Debug for HyperClientBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HyperClientBuilder")
            .field("config", &self.config)
            .field("layers_count", &self.layers.len())
            .finish()
    }
}

impl HyperClientBuilder {
    /// Set the request timeout.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.timeout(timeout);
        self
    }

    /// Set the connection timeout.
    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.connect_timeout(timeout);
        self
    }

    /// Set the maximum idle connections per host.
    #[must_use]
    pub fn pool_idle_per_host(mut self, count: usize) -> Self {
        self.config = self.config.pool_idle_per_host(count);
        self
    }

    /// Set the idle connection timeout.
    #[must_use]
    pub fn pool_idle_timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.pool_idle_timeout(timeout);
        self
    }

    /// Set the default `User-Agent`.
    #[must_use]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config = self.config.user_agent(user_agent);
        self
    }

    /// Add a tower layer around the transport.
    ///
    /// Layers are applied in order: first added = innermost, last added sees
    /// the request first.
    #[must_use]
    pub fn layer<L>(mut self, layer: L) -> Self
    where
        L: Layer<BoxedService> + Send + Sync + 'static,
        L::Service: Service<Request<Bytes>, Response = Response<Bytes>, Error = TransportError>
            + Clone
            + Send
            + 'static,
        <L::Service as Service<Request<Bytes>>>::Future: Send,
    {
        self.layers.push(Arc::new(move |service| {
            BoxCloneService::new(layer.layer(service))
        }));
        self
    }

    /// Build the client with all configured layers.
    #[must_use]
    pub fn build(self) -> HyperClient {
        let config = self.config.build();
        let mut service: BoxedService = BoxCloneService::new(RawHyperClient::new(config.clone()));

        for layer_fn in self.layers {
            service = layer_fn(service);
        }

        HyperClient::with_service(service, config)
    }
}

#[cfg(test)]
mod tests {
    use assert2::{check, let_assert};
    use pilot_core::Method;
    use tower::layer::layer_fn;
    use tower::service_fn;

    use super::*;

    #[test]
    fn client_default() {
        let client = HyperClient::new();
        check!(client.config().timeout == Duration::from_secs(30));
    }

    #[test]
    fn client_builder() {
        let client = HyperClient::builder()
            .timeout(Duration::from_secs(60))
            .pool_idle_per_host(16)
            .build();

        check!(client.config().timeout == Duration::from_secs(60));
        check!(client.config().pool_idle_per_host == 16);
    }

    #[test]
    fn client_is_debug() {
        let builder = HyperClient::builder().layer(layer_fn(|service: BoxedService| service));
        let debug = format!("{builder:?}");
        check!(debug.contains("layers_count: 1"));
        check!(format!("{:?}", HyperClient::new()).contains("HyperClient"));
    }

    #[test]
    fn hyper_request_adds_default_user_agent() {
        let raw = RawHyperClient::new(ClientConfig::default());
        let url = "http://localhost/flights".parse().expect("valid URL");
        let request = Request::builder(Method::Get, url).build();

        let_assert!(Ok(hyper_request) = raw.build_hyper_request(request));
        let_assert!(Some(agent) = hyper_request.headers().get(http::header::USER_AGENT));
        check!(agent.to_str().is_ok_and(|agent| agent.starts_with("pilot/")));
    }

    #[test]
    fn hyper_request_keeps_caller_user_agent() {
        let raw = RawHyperClient::new(ClientConfig::default());
        let url = "http://localhost/flights".parse().expect("valid URL");
        let request = Request::builder(Method::Post, url)
            .header("User-Agent", "custom/2.0")
            .body(Bytes::from_static(b"{}"))
            .build();

        let_assert!(Ok(hyper_request) = raw.build_hyper_request(request));
        check!(hyper_request.method() == http::Method::POST);
        let agents: Vec<_> = hyper_request
            .headers()
            .get_all(http::header::USER_AGENT)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .collect();
        check!(agents == ["custom/2.0"]);
    }

    #[tokio::test]
    async fn layers_wrap_the_transport() {
        let short_circuit = layer_fn(|_inner: BoxedService| {
            service_fn(|_request: Request<Bytes>| async {
                Ok::<_, TransportError>(Response::new(418, HashMap::new(), Bytes::new()))
            })
        });
        let client = HyperClient::builder().layer(short_circuit).build();
        let url = "http://localhost/teapot".parse().expect("valid URL");

        let request = Request::builder(Method::Get, url).build();
        let_assert!(Ok(response) = client.execute(request).await);
        check!(response.status() == 418);
    }
}
