//! The `{code, data}` success envelope.
//!
//! The API wraps every successful body as `{"code": <int>, "data": <any>}`.
//! [`Envelope`] keeps `data` as raw JSON so callers can project it into
//! whatever shape the resource uses, when they need it.

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::value::RawValue;

/// A decoded success envelope.
///
/// # Examples
///
/// ```
/// use envelope_client::Envelope;
/// use serde::Deserialize;
///
/// #[derive(Deserialize)]
/// struct Project {
///     id: u64,
/// }
///
/// let envelope = Envelope::from_body(200, br#"{"code":200,"data":{"id":2}}"#).unwrap();
/// assert_eq!(envelope.code(), 200);
///
/// let project: Project = envelope.data_as().unwrap();
/// assert_eq!(project.id, 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    code: u16,
    data: Vec<u8>,
}

#[derive(Deserialize)]
struct WireEnvelope {
    // Wider than a status so an out-of-range `code` does not fail the decode.
    #[serde(default)]
    code: Option<i64>,
    // An explicit `null` is kept as raw data rather than read as absent.
    #[serde(default, deserialize_with = "present")]
    data: Option<Box<RawValue>>,
}

fn present<'de, D>(deserializer: D) -> std::result::Result<Option<Box<RawValue>>, D::Error>
where
    D: Deserializer<'de>,
{
    Box::<RawValue>::deserialize(deserializer).map(Some)
}

impl Envelope {
    /// Creates an envelope from its parts.
    pub fn new(code: u16, data: impl Into<Vec<u8>>) -> Self {
        Self {
            code,
            data: data.into(),
        }
    }

    /// Decodes a successful response body.
    ///
    /// `code` starts as the transport status and is replaced by a `code`
    /// present in the body, unless that `code` is not a valid `u16`. A body that is empty or only whitespace decodes
    /// to an envelope with empty `data`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DecodeFailed`] if a non-empty body is not an envelope.
    pub fn from_body(status: u16, body: &[u8]) -> Result<Self> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::new(status, Vec::new()));
        }

        let wire: WireEnvelope =
            serde_json::from_slice(body).map_err(|e| Error::decode_failed(status, body, &e))?;

        Ok(Self {
            code: wire
                .code
                .and_then(|code| u16::try_from(code).ok())
                .unwrap_or(status),
            data: wire
                .data
                .map(|raw| raw.get().as_bytes().to_vec())
                .unwrap_or_default(),
        })
    }

    /// The envelope's status code.
    pub fn code(&self) -> u16 {
        self.code
    }

    /// The raw JSON bytes of `data`.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Returns `true` if the envelope carried no `data`.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Decodes `data` into `T`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DecodeFailed`] if `data` is empty or is not valid
    /// JSON for `T`.
    pub fn data_as<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.data)
            .map_err(|e| Error::decode_failed(self.code, &self.data, &e))
    }

    /// Consumes the envelope, returning the raw `data` bytes.
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[derive(Debug, Deserialize, PartialEq)]
    struct Project {
        id: u64,
        name: String,
    }

    #[test]
    fn test_decodes_envelope() {
        let envelope =
            Envelope::from_body(200, br#"{"code":200,"data":{"id":1,"name":"core"}}"#).unwrap();
        assert_eq!(envelope.code(), 200);
        assert_eq!(envelope.data(), br#"{"id":1,"name":"core"}"#);
        assert_eq!(
            envelope.data_as::<Project>().unwrap(),
            Project {
                id: 1,
                name: "core".to_string()
            }
        );
    }

    #[test]
    fn test_empty_body_is_valid() {
        let envelope = Envelope::from_body(204, b"").unwrap();
        assert_eq!(envelope.code(), 204);
        assert!(envelope.is_empty());

        let envelope = Envelope::from_body(200, b"  \n").unwrap();
        assert_eq!(envelope.code(), 200);
        assert!(envelope.is_empty());
    }

    #[test]
    fn test_code_defaults_to_status() {
        let envelope = Envelope::from_body(201, br#"{"data":5}"#).unwrap();
        assert_eq!(envelope.code(), 201);
        assert_eq!(envelope.data_as::<u64>().unwrap(), 5);
    }

    #[test]
    fn test_body_code_overrides_status() {
        let envelope = Envelope::from_body(200, br#"{"code":201,"data":null}"#).unwrap();
        assert_eq!(envelope.code(), 201);
        assert_eq!(envelope.data_as::<Value>().unwrap(), json!(null));
    }

    #[test]
    fn test_out_of_range_code_falls_back_to_status() {
        for body in [
            &br#"{"code":-1,"data":1}"#[..],
            br#"{"code":70000,"data":1}"#,
        ] {
            let envelope = Envelope::from_body(200, body).unwrap();
            assert_eq!(envelope.code(), 200);
            assert_eq!(envelope.data_as::<u32>().unwrap(), 1);
        }
    }

    #[test]
    fn test_invalid_body_is_decode_error() {
        match Envelope::from_body(200, b"invalid json") {
            Err(Error::DecodeFailed {
                raw_response,
                status,
                ..
            }) => {
                assert_eq!(raw_response, "invalid json");
                assert_eq!(status, 200);
            }
            other => panic!("Expected DecodeFailed, got {:?}", other),
        }
    }

    #[test]
    fn test_projection_into_wrong_shape_fails() {
        let envelope = Envelope::from_body(200, br#"{"code":200,"data":[1,2,3]}"#).unwrap();
        match envelope.data_as::<Project>() {
            Err(Error::DecodeFailed { status, .. }) => assert_eq!(status, 200),
            other => panic!("Expected DecodeFailed, got {:?}", other),
        }
        assert_eq!(envelope.data_as::<Vec<u32>>().unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_projection_of_empty_data_fails() {
        let envelope = Envelope::from_body(200, b"").unwrap();
        assert!(envelope.data_as::<Value>().is_err());
    }
}
