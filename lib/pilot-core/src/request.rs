//! HTTP request building.
//!
//! [`Request::from_route`] turns a [`Route`] into a transport-ready request.
//! [`Request::builder`] remains available for hand-built requests.
//!
//! # Example
//!
//! ```
//! use pilot_core::{Method, Request};
//! use bytes::Bytes;
//!
//! let request = Request::<Bytes>::builder(Method::Get, "https://api.example.com".parse().unwrap())
//!     .header("Accept", "application/json")
//!     .query("page", "1")
//!     .build();
//! ```

use bytes::Bytes;
use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};

use crate::{Headers, Method, ParameterEncoding, Parameters, Route};

/// Content type set on requests carrying JSON parameters.
pub const APPLICATION_JSON: &str = "application/json";

// Spaces become `%20`; pair separators and `+` are escaped so values
// round-trip through form decoding on the server.
const QUERY_COMPONENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'<')
    .add(b'>')
    .add(b'`')
    .add(b'{')
    .add(b'}')
    .add(b'%')
    .add(b'&')
    .add(b'=')
    .add(b'+');

/// An HTTP request with method, URL, headers, and optional body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request<B = Bytes> {
    method: Method,
    url: url::Url,
    headers: Headers,
    body: Option<B>,
}

impl<B> Request<B> {
    /// Creates a new [`RequestBuilder`].
    #[must_use]
    pub fn builder(method: Method, url: url::Url) -> RequestBuilder<B> {
        RequestBuilder::new(method, url)
    }

    /// HTTP method.
    #[must_use]
    pub const fn method(&self) -> Method {
        self.method
    }

    /// Request URL.
    #[must_use]
    pub fn url(&self) -> &url::Url {
        &self.url
    }

    /// Request headers.
    #[must_use]
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Single header value by name, ignoring ASCII case.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Request body.
    #[must_use]
    pub const fn body(&self) -> Option<&B> {
        self.body.as_ref()
    }

    /// Consume into (method, url, headers, body).
    #[must_use]
    pub fn into_parts(self) -> (Method, url::Url, Headers, Option<B>) {
        (self.method, self.url, self.headers, self.body)
    }
}

impl Request<Bytes> {
    /// Build the request described by a route.
    ///
    /// Never fails: parameters that cannot be encoded are dropped.
    ///
    /// - [`ParameterEncoding::Query`] keeps the URL's existing query pairs and
    ///   appends one pair per string-valued parameter, in parameter order
    /// - [`ParameterEncoding::JsonBody`] sends the parameters as a JSON object
    ///   with `Content-Type: application/json`, overriding any route header of
    ///   the same name
    #[must_use]
    pub fn from_route<R: Route + ?Sized>(route: &R) -> Self {
        let builder = RequestBuilder::new(route.method(), route.url()).headers(route.headers());

        match (route.parameters(), route.parameter_encoding()) {
            (Some(parameters), Some(ParameterEncoding::Query)) => {
                builder.query_pairs(string_pairs(parameters))
            }
            // A parameter map that cannot be serialized leaves the request without a body.
            (Some(parameters), Some(ParameterEncoding::JsonBody)) => {
                builder.clone().json(&parameters).unwrap_or(builder)
            }
            _ => builder,
        }
        .build()
    }
}

fn string_pairs(parameters: Parameters) -> impl Iterator<Item = (String, String)> {
    parameters.into_iter().filter_map(|(name, value)| match value {
        serde_json::Value::String(value) => Some((name, value)),
        _ => None,
    })
}

/// Builder for constructing [`Request`] instances.
#[derive(Debug, Clone)]
pub struct RequestBuilder<B = Bytes> {
    method: Method,
    url: url::Url,
    headers: Headers,
    body: Option<B>,
}

impl<B> RequestBuilder<B> {
    /// Creates a new builder.
    #[must_use]
    pub fn new(method: Method, url: url::Url) -> Self {
        Self {
            method,
            url,
            headers: Headers::new(),
            body: None,
        }
    }

    /// Sets a header, replacing any header with the same name in another case.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        self.headers.retain(|key, _| !key.eq_ignore_ascii_case(&name));
        self.headers.insert(name, value.into());
        self
    }

    /// Sets multiple headers.
    #[must_use]
    pub fn headers(self, headers: impl IntoIterator<Item = (String, String)>) -> Self {
        headers
            .into_iter()
            .fold(self, |builder, (name, value)| builder.header(name, value))
    }

    /// Appends a query parameter to the URL.
    #[must_use]
    pub fn query(self, name: &str, value: &str) -> Self {
        self.query_pairs([(name.to_string(), value.to_string())])
    }

    /// Appends multiple query parameters to the URL, after any existing ones.
    ///
    /// Names and values are percent-encoded (a space is `%20`, not `+`).
    /// The URL is left untouched when `pairs` is empty.
    #[must_use]
    pub fn query_pairs(mut self, pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        let mut pairs = pairs.into_iter().peekable();
        if pairs.peek().is_none() {
            return self;
        }

        let mut query = self.url.query().unwrap_or_default().to_string();
        for (name, value) in pairs {
            if !query.is_empty() {
                query.push('&');
            }
            query.extend(utf8_percent_encode(&name, QUERY_COMPONENT));
            query.push('=');
            query.extend(utf8_percent_encode(&value, QUERY_COMPONENT));
        }
        self.url.set_query(Some(&query));
        self
    }

    /// Sets the request body.
    #[must_use]
    pub fn body(mut self, body: B) -> Self {
        self.body = Some(body);
        self
    }

    /// Builds the [`Request`].
    #[must_use]
    pub fn build(self) -> Request<B> {
        Request {
            method: self.method,
            url: self.url,
            headers: self.headers,
            body: self.body,
        }
    }
}

impl RequestBuilder<Bytes> {
    /// Set a JSON body.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn json<T: serde::Serialize>(self, value: &T) -> Result<Self, serde_json::Error> {
        let body = serde_json::to_vec(value)?;
        Ok(self
            .header("Content-Type", APPLICATION_JSON)
            .body(Bytes::from(body)))
    }
}
