//! Request metadata and payload encoding.

use crate::{Error, Result};
use http::Method;
use serde::Serialize;
use serde_json::value::RawValue;

/// A JSON request payload.
///
/// Creation and update calls put different bodies on the wire: a created
/// document is wrapped as `{"data": <doc>}`, an updated one is sent as-is.
/// The document is kept exactly as its `Serialize` impl wrote it.
#[derive(Debug, Clone)]
pub enum Payload {
    /// Sent as `{"data": <doc>}`.
    Create(Box<RawValue>),
    /// Sent as `<doc>`.
    Update(Box<RawValue>),
}

#[derive(Serialize)]
struct DataWrapper<'a> {
    data: &'a RawValue,
}

impl Payload {
    /// Serializes `doc` as a creation payload.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SerializationFailed`] if `doc` cannot be represented as JSON.
    pub fn create<T: Serialize + ?Sized>(doc: &T) -> Result<Self> {
        to_raw(doc).map(Payload::Create)
    }

    /// Serializes `doc` as an update payload.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SerializationFailed`] if `doc` cannot be represented as JSON.
    pub fn update<T: Serialize + ?Sized>(doc: &T) -> Result<Self> {
        to_raw(doc).map(Payload::Update)
    }

    /// Encodes the payload into request body bytes.
    ///
    /// # Examples
    ///
    /// ```
    /// use envelope_client::metadata::Payload;
    /// use serde_json::json;
    ///
    /// let created = Payload::create(&json!({"name": "core"})).unwrap();
    /// assert_eq!(created.encode().unwrap(), br#"{"data":{"name":"core"}}"#);
    ///
    /// let updated = Payload::update(&json!({"name": "core"})).unwrap();
    /// assert_eq!(updated.encode().unwrap(), br#"{"name":"core"}"#);
    /// ```
    pub fn encode(&self) -> Result<Vec<u8>> {
        match self {
            Payload::Create(doc) => serde_json::to_vec(&DataWrapper { data: doc })
                .map_err(|e| Error::SerializationFailed(e.to_string())),
            Payload::Update(doc) => Ok(doc.get().as_bytes().to_vec()),
        }
    }
}

fn to_raw<T: Serialize + ?Sized>(doc: &T) -> Result<Box<RawValue>> {
    serde_json::value::to_raw_value(doc).map_err(|e| Error::SerializationFailed(e.to_string()))
}

/// Everything needed to build one outbound request.
///
/// `path` is relative to the client's base URL; `options` are query options
/// already encoded as `key=value` and appended in order.
#[derive(Debug, Clone)]
pub struct RequestMetadata {
    /// The HTTP method.
    pub method: Method,

    /// The resource path, relative to the base URL.
    pub path: String,

    /// Pre-encoded query options.
    pub options: Vec<String>,

    /// The optional JSON payload.
    pub payload: Option<Payload>,
}

impl RequestMetadata {
    /// Creates a new `RequestMetadata` with the given method and path.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            options: Vec::new(),
            payload: None,
        }
    }

    /// Appends a query option such as `offset=0`.
    pub fn with_option(mut self, option: impl Into<String>) -> Self {
        self.options.push(option.into());
        self
    }

    /// Appends several query options, preserving their order.
    pub fn with_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options.extend(options.into_iter().map(Into::into));
        self
    }

    /// Attaches a JSON payload.
    pub fn with_payload(mut self, payload: Payload) -> Self {
        self.payload = Some(payload);
        self
    }
}

impl Default for RequestMetadata {
    fn default() -> Self {
        Self::new(Method::GET, "")
    }
}
