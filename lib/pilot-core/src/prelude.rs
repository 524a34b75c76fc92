//! Prelude module for convenient imports.
//!
//! This module re-exports the most commonly used types for easy glob importing:
//!
//! ```ignore
//! use pilot_core::prelude::*;
//! ```

pub use crate::{
    DateDecoding, Error, Headers, HttpClient, JsonDecoder, KeyDecoding, Method, ParameterEncoding,
    Parameters, Request, Response, Result, Route, RouteClient, Timestamp, TransportError,
};
