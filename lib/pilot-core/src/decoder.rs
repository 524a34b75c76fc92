//! JSON decoding with configurable key casing and date representation.
//!
//! [`JsonDecoder`] wraps `serde_json` with two knobs:
//!
//! - [`KeyDecoding`] rewrites object keys before deserialization, so a model
//!   written with one casing can read a wire format using another
//! - [`DateDecoding`] selects how [`Timestamp`] fields are read
//!
//! # Example
//!
//! ```
//! use pilot_core::{DateDecoding, JsonDecoder, KeyDecoding, Timestamp};
//! use serde::Deserialize;
//!
//! #[derive(Debug, Deserialize)]
//! #[serde(rename_all = "camelCase")]
//! struct Flight {
//!     code: String,
//!     departure_time: Timestamp,
//! }
//!
//! let decoder = JsonDecoder::new()
//!     .key_decoding(KeyDecoding::ConvertFromSnakeCase)
//!     .date_decoding(DateDecoding::SecondsSinceEpoch);
//!
//! let flight: Flight = decoder
//!     .decode(br#"{"code":"ABC123","departure_time":1597169495}"#)
//!     .expect("decode");
//! assert_eq!(flight.departure_time.timestamp(), 1_597_169_495);
//! ```

use std::cell::Cell;
use std::fmt;

use chrono::{DateTime, TimeZone, Utc};
use serde::de::{self, DeserializeOwned, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::DecodeError;

/// How object keys on the wire map to model field names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum KeyDecoding {
    /// Keys are used as they appear on the wire.
    #[default]
    UseDefaultKeys,
    /// Wire keys are `snake_case`, model keys are `camelCase`.
    ConvertFromSnakeCase,
    /// Wire keys are `camelCase`, model keys are `snake_case`.
    ConvertFromCamelCase,
}

impl KeyDecoding {
    /// Convert a single wire key.
    #[must_use]
    pub fn convert(&self, key: &str) -> String {
        match self {
            Self::UseDefaultKeys => key.to_string(),
            Self::ConvertFromSnakeCase => snake_to_camel(key),
            Self::ConvertFromCamelCase => camel_to_snake(key),
        }
    }
}

/// How [`Timestamp`] values are represented on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DateDecoding {
    /// RFC 3339 / ISO-8601 strings.
    #[default]
    Iso8601,
    /// Seconds since the Unix epoch, integer or fractional.
    SecondsSinceEpoch,
    /// Milliseconds since the Unix epoch.
    MillisecondsSinceEpoch,
}

thread_local! {
    static DATE_DECODING: Cell<DateDecoding> = const { Cell::new(DateDecoding::Iso8601) };
}

/// Restores the previous date strategy when dropped.
struct DateDecodingScope {
    previous: DateDecoding,
}

impl DateDecodingScope {
    fn enter(strategy: DateDecoding) -> Self {
        Self {
            previous: DATE_DECODING.with(|current| current.replace(strategy)),
        }
    }
}

impl Drop for DateDecodingScope {
    fn drop(&mut self) {
        DATE_DECODING.with(|current| current.set(self.previous));
    }
}

/// JSON decoder configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct JsonDecoder {
    key_decoding: KeyDecoding,
    date_decoding: DateDecoding,
}

impl JsonDecoder {
    /// Decoder with default keys and ISO-8601 dates.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            key_decoding: KeyDecoding::UseDefaultKeys,
            date_decoding: DateDecoding::Iso8601,
        }
    }

    /// Set the key decoding strategy.
    #[must_use]
    pub const fn key_decoding(mut self, strategy: KeyDecoding) -> Self {
        self.key_decoding = strategy;
        self
    }

    /// Set the date decoding strategy.
    #[must_use]
    pub const fn date_decoding(mut self, strategy: DateDecoding) -> Self {
        self.date_decoding = strategy;
        self
    }

    /// Configured key strategy.
    #[must_use]
    pub const fn keys(&self) -> KeyDecoding {
        self.key_decoding
    }

    /// Configured date strategy.
    #[must_use]
    pub const fn dates(&self) -> DateDecoding {
        self.date_decoding
    }

    /// Decode JSON bytes into `T` with path-aware error messages.
    ///
    /// # Errors
    ///
    /// Returns a [`DecodeError`] if the bytes are not JSON or do not match `T`.
    pub fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, DecodeError> {
        let _scope = DateDecodingScope::enter(self.date_decoding);

        if self.key_decoding == KeyDecoding::UseDefaultKeys {
            let mut deserializer = serde_json::Deserializer::from_slice(bytes);
            let value = serde_path_to_error::deserialize(&mut deserializer).map_err(path_error)?;
            deserializer
                .end()
                .map_err(|e| DecodeError::new("", e.to_string()))?;
            return Ok(value);
        }

        let value: Value =
            serde_json::from_slice(bytes).map_err(|e| DecodeError::new("", e.to_string()))?;
        let value = rename_keys(value, self.key_decoding);
        serde_path_to_error::deserialize(value).map_err(path_error)
    }
}

fn path_error(err: serde_path_to_error::Error<serde_json::Error>) -> DecodeError {
    DecodeError::new(err.path().to_string(), err.inner().to_string())
}

fn rename_keys(value: Value, strategy: KeyDecoding) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, value)| (strategy.convert(&key), rename_keys(value, strategy)))
                .collect::<Map<_, _>>(),
        ),
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|item| rename_keys(item, strategy))
                .collect(),
        ),
        other => other,
    }
}

// Leading and trailing underscores are kept as-is.
fn snake_to_camel(key: &str) -> String {
    let core = key.trim_matches('_');
    if core.is_empty() || !core.contains('_') {
        return key.to_string();
    }
    let leading = key.len() - key.trim_start_matches('_').len();
    let trailing = key.len() - key.trim_end_matches('_').len();

    let mut out = String::with_capacity(key.len());
    out.push_str(&"_".repeat(leading));
    for (index, part) in core.split('_').filter(|part| !part.is_empty()).enumerate() {
        if index == 0 {
            out.push_str(&part.to_lowercase());
        } else {
            let mut chars = part.chars();
            if let Some(first) = chars.next() {
                out.extend(first.to_uppercase());
                out.push_str(&chars.as_str().to_lowercase());
            }
        }
    }
    out.push_str(&"_".repeat(trailing));
    out
}

fn camel_to_snake(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    let mut previous_lower = false;
    for ch in key.chars() {
        if ch.is_uppercase() {
            if previous_lower {
                out.push('_');
            }
            out.extend(ch.to_lowercase());
            previous_lower = false;
        } else {
            previous_lower = ch.is_lowercase() || ch.is_ascii_digit();
            out.push(ch);
        }
    }
    out
}

// ============================================================================
// Timestamp
// ============================================================================

/// A UTC instant whose wire representation follows the active [`DateDecoding`].
///
/// Outside of [`JsonDecoder::decode`] the ISO-8601 representation is used.
/// Serialization always produces RFC 3339.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(pub DateTime<Utc>);

impl Timestamp {
    /// Instant from whole seconds since the Unix epoch.
    #[must_use]
    pub fn from_seconds(seconds: i64) -> Option<Self> {
        Utc.timestamp_opt(seconds, 0).single().map(Self)
    }

    /// Seconds since the Unix epoch.
    #[must_use]
    pub fn timestamp(&self) -> i64 {
        self.0.timestamp()
    }

    /// The inner `chrono` value.
    #[must_use]
    pub const fn into_inner(self) -> DateTime<Utc> {
        self.0
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(value: DateTime<Utc>) -> Self {
        Self(value)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_rfc3339())
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let strategy = DATE_DECODING.with(Cell::get);
        deserializer.deserialize_any(TimestampVisitor { strategy })
    }
}

struct TimestampVisitor {
    strategy: DateDecoding,
}

impl TimestampVisitor {
    fn from_millis<E: de::Error>(millis: i64) -> Result<Timestamp, E> {
        Utc.timestamp_millis_opt(millis)
            .single()
            .map(Timestamp)
            .ok_or_else(|| E::custom(format!("timestamp out of range: {millis}")))
    }
}

impl Visitor<'_> for TimestampVisitor {
    type Value = Timestamp;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.strategy {
            DateDecoding::Iso8601 => f.write_str("an ISO-8601 date string"),
            DateDecoding::SecondsSinceEpoch => f.write_str("seconds since the Unix epoch"),
            DateDecoding::MillisecondsSinceEpoch => {
                f.write_str("milliseconds since the Unix epoch")
            }
        }
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<Self::Value, E> {
        match self.strategy {
            DateDecoding::SecondsSinceEpoch => Timestamp::from_seconds(value)
                .ok_or_else(|| E::custom(format!("timestamp out of range: {value}"))),
            DateDecoding::MillisecondsSinceEpoch => Self::from_millis(value),
            DateDecoding::Iso8601 => Err(E::invalid_type(de::Unexpected::Signed(value), &self)),
        }
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<Self::Value, E> {
        let signed = i64::try_from(value)
            .map_err(|_| E::custom(format!("timestamp out of range: {value}")))?;
        self.visit_i64(signed)
    }

    #[allow(clippy::cast_possible_truncation)]
    fn visit_f64<E: de::Error>(self, value: f64) -> Result<Self::Value, E> {
        let millis = match self.strategy {
            DateDecoding::SecondsSinceEpoch => (value * 1000.0).round(),
            DateDecoding::MillisecondsSinceEpoch => value.round(),
            DateDecoding::Iso8601 => {
                return Err(E::invalid_type(de::Unexpected::Float(value), &self));
            }
        };
        if !millis.is_finite() || millis.abs() > 9.0e15 {
            return Err(E::custom(format!("timestamp out of range: {value}")));
        }
        Self::from_millis(millis as i64)
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
        match self.strategy {
            DateDecoding::Iso8601 => DateTime::parse_from_rfc3339(value)
                .map(|date| Timestamp(date.with_timezone(&Utc)))
                .map_err(|e| E::custom(format!("invalid ISO-8601 date '{value}': {e}"))),
            _ => Err(E::invalid_type(de::Unexpected::Str(value), &self)),
        }
    }
}
