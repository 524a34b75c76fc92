//! The decode pipeline shared by every calling convention.
//!
//! Each function takes the transport outcome of one call and maps it to the
//! caller-facing result. The HTTP status code is never consulted: success
//! or failure is decided by which shape the body decodes into.
//!
//! | Transport | Success shape | Designated shape | Outcome |
//! |-----------|---------------|------------------|---------|
//! | failed    | -             | -                | [`Error::Underlying`] |
//! | ok        | decodes       | -                | `Ok(T)` |
//! | ok        | fails         | decodes          | [`Error::Designated`] |
//! | ok        | fails         | fails            | [`Error::Decoding`] (primary failure) |

use serde::de::DeserializeOwned;

use crate::{Error, JsonDecoder, Response, Result, TransportError};

/// What the transport produced for one call.
pub type Outcome = std::result::Result<Response, TransportError>;

/// Raw envelope: the response as-is, or the transport failure.
///
/// # Errors
///
/// Returns [`Error::Underlying`] if the transport failed.
pub fn envelope(outcome: Outcome) -> Result<Response> {
    outcome.map_err(Error::Underlying)
}

/// Decode the body as `T`.
///
/// # Errors
///
/// Returns [`Error::Underlying`] if the transport failed, or
/// [`Error::Decoding`] if the body does not match `T`.
pub fn target<T>(outcome: Outcome, decoder: &JsonDecoder) -> Result<T>
where
    T: DeserializeOwned,
{
    let response = outcome?;
    Ok(response.decode(decoder)?)
}

/// Decode the body as `T`, falling back to the designated error shape `E`.
///
/// The fallback only runs when `T` fails. If `E` fails too, the failure of
/// `T` is reported and the failure of `E` is discarded.
///
/// # Errors
///
/// Returns [`Error::Underlying`] if the transport failed,
/// [`Error::Designated`] if the body matches `E` but not `T`, or
/// [`Error::Decoding`] if it matches neither.
pub fn target_or_designated<T, E>(outcome: Outcome, decoder: &JsonDecoder) -> Result<T, E>
where
    T: DeserializeOwned,
    E: DeserializeOwned,
{
    let response = outcome?;
    match response.decode::<T>(decoder) {
        Ok(value) => Ok(value),
        Err(primary) => match response.decode::<E>(decoder) {
            Ok(designated) => Err(Error::Designated(designated)),
            Err(_) => Err(Error::Decoding(primary)),
        },
    }
}
