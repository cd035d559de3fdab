//! Response envelope decoding
//!
//! Contract calls come back wrapped in up to three layers:
//!
//! ```text
//! { "txn_result": "<json>" }        transport envelope, JSON as a string
//!   { "Ok": "<json>" | value }      fallible-result discriminator
//!   { "Err": "message" | value }
//! ```
//!
//! Older collaborators sometimes skip the envelope entirely and return the
//! value (or a bare array) directly. [`decode`] accepts every variant and
//! never panics: anything it cannot place becomes [`DecodedResult::Malformed`].

use serde::de::{DeserializeOwned, IgnoredAny};
use serde::Deserialize;
use serde_json::Value;

use crate::error::{KarmaError, KarmaResult};

/// Transport envelope field carrying the JSON-encoded call result
pub const TXN_RESULT_FIELD: &str = "txn_result";

/// Success discriminator
pub const OK_TAG: &str = "Ok";

/// Failure discriminator
pub const ERR_TAG: &str = "Err";

/// Outcome of decoding one raw response
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedResult<T> {
    Ok(T),
    /// Contract-reported failure, message kept verbatim
    Err(String),
    /// Nothing recognisable; carries the raw input for diagnosis
    Malformed(Value),
}

impl<T> DecodedResult<T> {
    pub fn is_ok(&self) -> bool {
        matches!(self, DecodedResult::Ok(_))
    }

    pub fn ok(self) -> Option<T> {
        match self {
            DecodedResult::Ok(value) => Some(value),
            _ => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> DecodedResult<U> {
        match self {
            DecodedResult::Ok(value) => DecodedResult::Ok(f(value)),
            DecodedResult::Err(message) => DecodedResult::Err(message),
            DecodedResult::Malformed(raw) => DecodedResult::Malformed(raw),
        }
    }

    /// Fold into the client error taxonomy
    pub fn into_result(self) -> KarmaResult<T> {
        match self {
            DecodedResult::Ok(value) => Ok(value),
            DecodedResult::Err(message) => Err(KarmaError::Contract(message)),
            DecodedResult::Malformed(raw) => Err(KarmaError::MalformedResponse(raw.to_string())),
        }
    }
}

/// What a single value looks like to the decoder
enum Layer<'a> {
    Transport(&'a Value),
    Success(&'a Value),
    Failure(&'a Value),
    Bare(&'a Value),
}

fn classify(value: &Value) -> Layer<'_> {
    if let Value::Object(map) = value {
        if let Some(inner) = map.get(TXN_RESULT_FIELD) {
            if inner.is_string() || inner.is_object() {
                return Layer::Transport(inner);
            }
        }
        if let Some(payload) = map.get(OK_TAG) {
            return Layer::Success(payload);
        }
        if let Some(payload) = map.get(ERR_TAG) {
            return Layer::Failure(payload);
        }
    }
    Layer::Bare(value)
}

/// Decode a raw contract response into `T`.
///
/// The transport envelope is unwrapped once, before the `Ok`/`Err`
/// discriminator is looked at, since the discriminator usually lives inside
/// the JSON string. Envelope markers win over a direct-shape match.
pub fn decode<T: DeserializeOwned>(raw: &Value) -> DecodedResult<T> {
    decode_layers(raw, true)
}

/// Decode a response whose success value carries no information.
///
/// Only an explicit `Ok` counts as success here: any shape deserializes
/// into "nothing", so the direct-shape fallback would accept garbage.
pub fn decode_unit(raw: &Value) -> DecodedResult<()> {
    decode_layers::<IgnoredAny>(raw, false).map(|_| ())
}

fn decode_layers<T: DeserializeOwned>(raw: &Value, allow_direct: bool) -> DecodedResult<T> {
    let unwrapped;
    let mut current = raw;

    if let Layer::Transport(inner) = classify(raw) {
        unwrapped = match open_transport(inner) {
            Some(value) => value,
            None => return DecodedResult::Malformed(raw.clone()),
        };
        current = &unwrapped;
    }

    let decoded = match classify(current) {
        Layer::Success(payload) => decode_payload(payload),
        Layer::Failure(payload) => return DecodedResult::Err(error_message(payload)),
        Layer::Bare(value) if allow_direct => decode_direct(value),
        Layer::Bare(_) => None,
        // A second transport layer is not part of the protocol
        Layer::Transport(_) => None,
    };

    match decoded {
        Some(value) => DecodedResult::Ok(value),
        None => DecodedResult::Malformed(raw.clone()),
    }
}

fn open_transport(inner: &Value) -> Option<Value> {
    match inner {
        Value::String(encoded) => serde_json::from_str(encoded).ok(),
        Value::Object(_) => Some(inner.clone()),
        _ => None,
    }
}

/// `Ok` payloads are either the value itself or a JSON string of it
fn decode_payload<T: DeserializeOwned>(payload: &Value) -> Option<T> {
    if let Value::String(encoded) = payload {
        if let Ok(parsed) = serde_json::from_str::<Value>(encoded) {
            if let Ok(value) = T::deserialize(&parsed) {
                return Some(value);
            }
        }
    }
    T::deserialize(payload).ok()
}

/// Bare values are only accepted when they have an array or object shape
fn decode_direct<T: DeserializeOwned>(value: &Value) -> Option<T> {
    if value.is_array() || value.is_object() {
        T::deserialize(value).ok()
    } else {
        None
    }
}

fn error_message(payload: &Value) -> String {
    match payload {
        Value::String(message) => message.clone(),
        other => other.to_string(),
    }
}
