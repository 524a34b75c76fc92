//! Typed HTTP route client.
//!
//! Describe endpoints as [`Route`] values, then let a [`Pilot`] build the
//! request, execute it once, and decode the body:
//!
//! - [`Pilot::request`] returns the raw [`Response`] whatever its status
//! - [`Pilot::request_target`] decodes the body as the success type
//! - [`Pilot::request_target_failure`] decodes the success type, falling back
//!   to a designated error type the server uses for structured failures
//!
//! Outcomes are a closed taxonomy ([`Error`]): the transport failed
//! ([`Error::Underlying`]), the body matched the designated error
//! ([`Error::Designated`]), or it matched nothing ([`Error::Decoding`]).
//! The status code never decides the outcome.
//!
//! The same operations are offered as one-shot streams through
//! [`Pilot::deferred`], and synchronously by [`BlockingPilot`].
//!
//! # Example
//!
//! ```no_run
//! use pilot::prelude::*;
//!
//! enum FlightRoute {
//!     ById(String),
//! }
//!
//! impl Route for FlightRoute {
//!     fn base_url(&self) -> url::Url {
//!         "https://api.example.com".parse().expect("valid URL")
//!     }
//!     fn path(&self) -> String {
//!         match self {
//!             Self::ById(id) => format!("flights/{id}"),
//!         }
//!     }
//!     fn method(&self) -> Method {
//!         Method::Get
//!     }
//! }
//!
//! #[derive(Debug, Deserialize)]
//! #[serde(rename_all = "camelCase")]
//! struct Flight {
//!     code: String,
//!     departure_time: Timestamp,
//! }
//!
//! #[derive(Debug, Deserialize)]
//! struct ApiError {
//!     error: ErrorDetail,
//! }
//!
//! #[derive(Debug, Deserialize)]
//! struct ErrorDetail {
//!     code: i32,
//!     description: String,
//! }
//!
//! # async fn run() {
//! let pilot = Pilot::new(HyperClient::new()).with_diagnostics(TracingSink);
//! let decoder = JsonDecoder::new()
//!     .key_decoding(KeyDecoding::ConvertFromSnakeCase)
//!     .date_decoding(DateDecoding::SecondsSinceEpoch);
//!
//! match pilot
//!     .request_target_failure::<Flight, ApiError>(&FlightRoute::ById("ABC123".into()), &decoder)
//!     .await
//! {
//!     Ok(flight) => println!("{} leaves at {}", flight.code, flight.departure_time),
//!     Err(Error::Designated(api)) => println!("{}: {}", api.error.code, api.error.description),
//!     Err(err) => println!("failed: {err}"),
//! }
//! # }
//! ```

mod blocking;
mod client;
mod config;
mod deferred;
pub mod diagnostics;
mod pilot;
pub mod prelude;

pub use blocking::{BlockingHyperClient, BlockingPilot};
pub use client::{BoxedService, HyperClient, HyperClientBuilder, ServiceFuture};
pub use config::{ClientConfig, ClientConfigBuilder};
pub use deferred::{Deferred, DeferredPilot};
pub use diagnostics::{DiagnosticSink, NoopSink, Record, TracingSink};
pub use pilot::Pilot;

// Re-export tower for layer composition
pub use tower;

// Re-export core types
pub use pilot_core::{
    BlockingHttpClient, DateDecoding, DecodeError, Error, Headers, HttpClient, JsonDecoder,
    KeyDecoding, Method, Outcome, ParameterEncoding, Parameters, Request, RequestBuilder, Response,
    Result, Route, RouteClient, StatusCode, Timestamp, TransportError, decode,
};

// Re-export crates used in route definitions
pub use url;
