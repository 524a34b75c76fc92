//! Core types and traits for the pilot typed route client.
//!
//! This crate provides the foundational types used by pilot:
//! - [`Route`] - Declarative endpoint descriptor
//! - [`Method`] - HTTP method enum
//! - [`Request`] and [`RequestBuilder`] - HTTP request types, built from routes
//! - [`Response`] - Raw response envelope
//! - [`Error`], [`TransportError`], [`DecodeError`] and [`Result`] - Error taxonomy
//! - [`JsonDecoder`] - Decoder configuration (key casing, date representation)
//! - [`decode`] - The decode pipeline shared by every calling convention
//! - [`HttpClient`] and [`BlockingHttpClient`] - Transport traits
//! - [`RouteClient`] - Typed route operations
//! - [`StatusCode`] - HTTP status codes (re-exported from `http` crate)

mod client;
pub mod decode;
mod decoder;
mod error;
mod method;
pub mod prelude;
mod request;
mod response;
mod route;

pub use client::{BlockingHttpClient, HttpClient, RouteClient};
pub use decode::Outcome;
pub use decoder::{DateDecoding, JsonDecoder, KeyDecoding, Timestamp};
pub use error::{DecodeError, Error, Result, TransportError};
pub use method::Method;
pub use request::{APPLICATION_JSON, Request, RequestBuilder};
pub use response::Response;
pub use route::{Headers, ParameterEncoding, Parameters, Route};

// Re-export http crate status codes
pub use http::StatusCode;
