//! Error types for pilot.
//!
//! Every call terminates in exactly one [`Error`] variant when it fails:
//!
//! - [`Error::Decoding`] - the body matched neither the requested shape nor,
//!   for two-tier calls, the designated error shape
//! - [`Error::Designated`] - the body matched the caller's designated error shape
//! - [`Error::Underlying`] - the transport failed before anything could be decoded

use std::convert::Infallible;
use std::fmt;

use derive_more::{Display, Error};

// ============================================================================
// Transport Error
// ============================================================================

/// Failure raised below the decode layer.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum TransportError {
    /// Network/connection errors.
    #[display("connection error: {_0}")]
    Connection(#[error(not(source))] String),

    /// TLS/SSL errors.
    #[display("TLS error: {_0}")]
    Tls(#[error(not(source))] String),

    /// Request timeout.
    #[display("request timeout")]
    Timeout,

    /// The call was cancelled before the transport produced a response.
    #[display("request cancelled")]
    Cancelled,

    /// The request could not be turned into a transport request.
    #[display("invalid request: {_0}")]
    InvalidRequest(#[error(not(source))] String),

    /// The runtime driving a blocking call could not be started.
    #[display("runtime error: {_0}")]
    Runtime(#[error(not(source))] String),
}

impl TransportError {
    /// Create a connection error.
    #[must_use]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection(message.into())
    }

    /// Create a TLS error.
    #[must_use]
    pub fn tls(message: impl Into<String>) -> Self {
        Self::Tls(message.into())
    }

    /// Create an invalid request error.
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    /// Create a runtime error.
    #[must_use]
    pub fn runtime(message: impl Into<String>) -> Self {
        Self::Runtime(message.into())
    }

    /// Returns `true` if this is a timeout error.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout)
    }

    /// Returns `true` if this is a connection error.
    #[must_use]
    pub const fn is_connection(&self) -> bool {
        matches!(self, Self::Connection(_))
    }
}

// ============================================================================
// Decode Error
// ============================================================================

/// The response body did not match the requested shape.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
#[display("failed to decode object at '{path}': {message}")]
pub struct DecodeError {
    /// JSON path to the failing value (e.g. `error.description`), empty at the root.
    pub path: String,
    /// Decoder message.
    pub message: String,
}

impl DecodeError {
    /// Create a decode error with path context.
    #[must_use]
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

// ============================================================================
// Error Type
// ============================================================================

/// Outcome of a failed call.
///
/// `E` is the caller-supplied designated error shape. Calls that do not
/// declare one use the default [`Infallible`], so `Designated` can never occur.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error<E = Infallible> {
    /// The body did not decode into the requested shape.
    Decoding(DecodeError),
    /// The body decoded into the designated error shape.
    Designated(E),
    /// The transport failed.
    Underlying(TransportError),
}

/// Result type alias using [`crate::Error`].
pub type Result<T, E = Infallible> = std::result::Result<T, Error<E>>;

impl<E> Error<E> {
    /// Returns `true` if this is a decoding failure.
    #[must_use]
    pub const fn is_decoding(&self) -> bool {
        matches!(self, Self::Decoding(_))
    }

    /// Returns `true` if the server answered with the designated error shape.
    #[must_use]
    pub const fn is_designated(&self) -> bool {
        matches!(self, Self::Designated(_))
    }

    /// Returns `true` if the transport failed.
    #[must_use]
    pub const fn is_underlying(&self) -> bool {
        matches!(self, Self::Underlying(_))
    }

    /// The designated error payload, if any.
    #[must_use]
    pub const fn designated(&self) -> Option<&E> {
        match self {
            Self::Designated(payload) => Some(payload),
            _ => None,
        }
    }

    /// Consume into the designated error payload, if any.
    #[must_use]
    pub fn into_designated(self) -> Option<E> {
        match self {
            Self::Designated(payload) => Some(payload),
            _ => None,
        }
    }

    /// Transform the designated payload.
    pub fn map_designated<F, E2>(self, f: F) -> Error<E2>
    where
        F: FnOnce(E) -> E2,
    {
        match self {
            Self::Decoding(err) => Error::Decoding(err),
            Self::Designated(payload) => Error::Designated(f(payload)),
            Self::Underlying(err) => Error::Underlying(err),
        }
    }
}

impl Error<Infallible> {
    /// Widen an error without designated payload into any designated type.
    #[must_use]
    pub fn widen<E>(self) -> Error<E> {
        self.map_designated(|never| match never {})
    }
}

impl<E> From<TransportError> for Error<E> {
    fn from(err: TransportError) -> Self {
        Self::Underlying(err)
    }
}

impl<E> From<DecodeError> for Error<E> {
    fn from(err: DecodeError) -> Self {
        Self::Decoding(err)
    }
}

impl<E: fmt::Debug> fmt::Display for Error<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Decoding(err) => write!(f, "{err}"),
            Self::Designated(payload) => write!(f, "designated error: {payload:?}"),
            Self::Underlying(err) => write!(f, "{err}"),
        }
    }
}

impl<E: fmt::Debug> std::error::Error for Error<E> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Decoding(err) => Some(err),
            Self::Designated(_) => None,
            Self::Underlying(err) => Some(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use assert2::{check, let_assert};

    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct ApiError {
        code: u16,
    }

    #[test]
    fn transport_error_display() {
        let err = TransportError::Timeout;
        assert_eq!(err.to_string(), "request timeout");

        let err = TransportError::connection("failed to connect");
        assert_eq!(err.to_string(), "connection error: failed to connect");

        let err = TransportError::invalid_request("missing mock");
        assert_eq!(err.to_string(), "invalid request: missing mock");
    }

    #[test]
    fn transport_error_kinds() {
        assert!(TransportError::Timeout.is_timeout());
        assert!(!TransportError::Cancelled.is_timeout());
        assert!(TransportError::connection("refused").is_connection());
        assert!(!TransportError::tls("bad certificate").is_connection());
    }

    #[test]
    fn decode_error_display() {
        let err = DecodeError::new("error.description", "missing field `description`");
        insta::assert_snapshot!(
            err.to_string(),
            @"failed to decode object at 'error.description': missing field `description`"
        );
    }

    #[test]
    fn error_display() {
        let err: Error<ApiError> = Error::Designated(ApiError { code: 404 });
        insta::assert_snapshot!(err.to_string(), @"designated error: ApiError { code: 404 }");

        let err: Error = TransportError::Timeout.into();
        assert_eq!(err.to_string(), "request timeout");
    }

    #[test]
    fn error_predicates() {
        let err: Error<ApiError> = Error::Designated(ApiError { code: 404 });
        check!(err.is_designated());
        check!(!err.is_decoding());
        check!(err.designated() == Some(&ApiError { code: 404 }));

        let err: Error<ApiError> = DecodeError::new("", "expected value").into();
        check!(err.is_decoding());
        check!(err.designated().is_none());

        let err: Error<ApiError> = TransportError::Cancelled.into();
        check!(err.is_underlying());
        check!(err.into_designated().is_none());
    }

    #[test]
    fn error_source() {
        let err: Error = TransportError::connection("refused").into();
        let_assert!(Some(source) = err.source());
        check!(source.to_string() == "connection error: refused");

        let err: Error<ApiError> = Error::Designated(ApiError { code: 500 });
        check!(err.source().is_none());
    }

    #[test]
    fn error_widen_keeps_variant() {
        let err: Error = DecodeError::new("code", "invalid type").into();
        let widened: Error<ApiError> = err.widen();
        let_assert!(Error::Decoding(decode) = widened);
        check!(decode.path == "code");
    }
}
