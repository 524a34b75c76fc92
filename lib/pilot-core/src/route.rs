//! Declarative endpoint descriptors.
//!
//! A [`Route`] describes one API call: where it goes, which method it uses,
//! which headers it carries and how its parameters are encoded. Routes are
//! usually enums with one variant per endpoint.
//!
//! # Example
//!
//! ```
//! use pilot_core::{Method, ParameterEncoding, Parameters, Route};
//! use serde_json::json;
//! use url::Url;
//!
//! enum FlightRoute {
//!     List,
//!     Get(String),
//! }
//!
//! impl Route for FlightRoute {
//!     fn base_url(&self) -> Url {
//!         Url::parse("https://api.example.com/flights").expect("valid URL")
//!     }
//!
//!     fn path(&self) -> String {
//!         match self {
//!             Self::List => String::new(),
//!             Self::Get(id) => id.clone(),
//!         }
//!     }
//!
//!     fn method(&self) -> Method {
//!         Method::Get
//!     }
//!
//!     fn parameters(&self) -> Option<Parameters> {
//!         match self {
//!             Self::List => json!({ "size": "20" }).as_object().cloned(),
//!             Self::Get(_) => None,
//!         }
//!     }
//!
//!     fn parameter_encoding(&self) -> Option<ParameterEncoding> {
//!         matches!(self, Self::List).then_some(ParameterEncoding::Query)
//!     }
//! }
//!
//! assert_eq!(
//!     FlightRoute::Get("ABC123".into()).url().as_str(),
//!     "https://api.example.com/flights/ABC123"
//! );
//! ```

use std::collections::HashMap;

use url::Url;

use crate::Method;

/// Header name/value pairs attached to a route.
pub type Headers = HashMap<String, String>;

/// Parameters attached to a route, in insertion order.
pub type Parameters = serde_json::Map<String, serde_json::Value>;

/// Where a route's [`Parameters`] are placed in the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterEncoding {
    /// Appended to the URL query string, percent-encoded. Only string values
    /// are sent.
    Query,
    /// Serialized as a JSON object request body.
    JsonBody,
}

/// Description of one HTTP endpoint call.
///
/// Only [`base_url`](Route::base_url), [`path`](Route::path) and
/// [`method`](Route::method) are required.
///
/// Parameters are only used when both [`parameters`](Route::parameters) and
/// [`parameter_encoding`](Route::parameter_encoding) return `Some`; a route
/// providing one without the other sends no parameters.
pub trait Route {
    /// Base address shared by the API's endpoints.
    fn base_url(&self) -> Url;

    /// Path appended to [`base_url`](Route::base_url); empty for the base itself.
    fn path(&self) -> String;

    /// HTTP method.
    fn method(&self) -> Method;

    /// Request headers.
    fn headers(&self) -> Headers {
        Headers::new()
    }

    /// Request parameters.
    fn parameters(&self) -> Option<Parameters> {
        None
    }

    /// Parameter placement.
    fn parameter_encoding(&self) -> Option<ParameterEncoding> {
        None
    }

    /// Full URL: the base address with the path's segments appended.
    fn url(&self) -> Url {
        join_path(self.base_url(), &self.path())
    }
}

impl<R: Route + ?Sized> Route for &R {
    fn base_url(&self) -> Url {
        (**self).base_url()
    }

    fn path(&self) -> String {
        (**self).path()
    }

    fn method(&self) -> Method {
        (**self).method()
    }

    fn headers(&self) -> Headers {
        (**self).headers()
    }

    fn parameters(&self) -> Option<Parameters> {
        (**self).parameters()
    }

    fn parameter_encoding(&self) -> Option<ParameterEncoding> {
        (**self).parameter_encoding()
    }

    fn url(&self) -> Url {
        (**self).url()
    }
}

fn join_path(mut url: Url, path: &str) -> Url {
    if path.is_empty() {
        return url;
    }
    // Cannot-be-a-base URLs (e.g. `mailto:`) have no path to extend.
    if let Ok(mut segments) = url.path_segments_mut() {
        segments
            .pop_if_empty()
            .extend(path.split('/').filter(|segment| !segment.is_empty()));
    }
    url
}
