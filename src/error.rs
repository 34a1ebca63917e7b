//! Error types for API calls.
//!
//! Every failure reaches the caller as a distinct [`Error`] variant. Failures
//! that the API itself reported with a status code and message are carried as
//! an [`ApiError`], which implements the [`HttpError`] capability so callers
//! can branch on "did the API reject this?" without matching on concrete
//! variants.

use serde::Deserialize;

/// Capability implemented by errors that originate from a classified API
/// response.
///
/// Transport, cancellation and decode failures do not implement it.
///
/// # Examples
///
/// ```
/// use envelope_client::{ApiError, HttpError};
///
/// let err = ApiError::new(404, "project not found");
/// assert_eq!(err.code(), 404);
/// assert_eq!(err.to_string(), "project not found");
/// ```
pub trait HttpError: std::error::Error + Send + Sync {
    /// The HTTP status code of the failing response.
    fn code(&self) -> u16;
}

/// A terminal failure reported by the API.
///
/// The error body is `{"code": <int>, "error_message": "<string>"}`; the
/// message is kept verbatim and `http_code` is the transport status.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ApiError {
    /// The HTTP status code of the response.
    pub http_code: u16,
    /// The `error_message` from the response body.
    pub message: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    error_message: String,
}

impl ApiError {
    /// Creates a new `ApiError`.
    pub fn new(http_code: u16, message: impl Into<String>) -> Self {
        Self {
            http_code,
            message: message.into(),
        }
    }

    /// Decodes a failing response body.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DecodeFailed`] if the body is not a JSON object with
    /// a string `error_message`. An empty body is a decode failure too.
    pub fn from_body(status: u16, body: &[u8]) -> Result<Self> {
        match serde_json::from_slice::<ErrorBody>(body) {
            Ok(parsed) => Ok(Self::new(status, parsed.error_message)),
            Err(e) => Err(Error::decode_failed(status, body, &e)),
        }
    }
}

impl HttpError for ApiError {
    fn code(&self) -> u16 {
        self.http_code
    }
}

/// The main error type for API calls.
///
/// # Examples
///
/// ```no_run
/// use envelope_client::{Client, Error};
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example() -> Result<(), Error> {
/// let client = Client::builder()
///     .base_url("https://dev.example.com/api")
///     .credentials("admin", "secret")
///     .build()?;
///
/// let cancel = CancellationToken::new();
/// match client.find_by_id("projects/1", &[] as &[&str], &cancel).await {
///     Ok(envelope) => println!("code {}", envelope.code()),
///     Err(e) => match e.http_code() {
///         Some(code) => eprintln!("API rejected the call with {}: {}", code, e),
///         None => eprintln!("Call failed: {}", e),
///     },
/// }
/// # Ok(())
/// # }
/// ```
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The composed URL could not be parsed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The client or a request was configured incorrectly.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// The request payload could not be encoded as JSON.
    #[error("Failed to serialize request: {0}")]
    SerializationFailed(String),

    /// Sending the request or reading its response failed.
    ///
    /// This covers DNS failures, refused connections and per-request
    /// timeouts. It is never retried.
    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The call's cancellation token fired.
    #[error("Request cancelled")]
    Cancelled,

    /// The API answered with a terminal error status.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// A response body could not be decoded into the expected shape.
    ///
    /// # Fields
    ///
    /// * `raw_response` - The raw body, lossily converted to UTF-8
    /// * `serde_error` - The error message from serde
    /// * `status` - The HTTP status code of the response
    #[error("Failed to decode response (status {status}): {serde_error}")]
    DecodeFailed {
        /// The raw body that failed to decode
        raw_response: String,
        /// The serde error message
        serde_error: String,
        /// The HTTP status code
        status: u16,
    },

    /// The response status fell outside every known status range.
    #[error("unknown error (status {status})")]
    UnknownStatus {
        /// The HTTP status code
        status: u16,
    },
}

impl Error {
    pub(crate) fn decode_failed(status: u16, body: &[u8], error: &serde_json::Error) -> Self {
        let raw_response = String::from_utf8_lossy(body).into_owned();
        tracing::error!(
            status = status,
            error = %error,
            raw_response = %raw_response,
            "Failed to decode response"
        );
        Error::DecodeFailed {
            raw_response,
            serde_error: error.to_string(),
            status,
        }
    }

    /// Returns the [`HttpError`] view of this error, if it has one.
    pub fn as_http_error(&self) -> Option<&dyn HttpError> {
        match self {
            Error::Api(e) => Some(e),
            _ => None,
        }
    }

    /// Returns the status code of a classified API error.
    ///
    /// `None` for transport, cancellation, decode and construction failures.
    ///
    /// # Examples
    ///
    /// ```
    /// use envelope_client::{ApiError, Error};
    ///
    /// assert_eq!(Error::from(ApiError::new(409, "name taken")).http_code(), Some(409));
    /// assert_eq!(Error::Cancelled.http_code(), None);
    /// ```
    pub fn http_code(&self) -> Option<u16> {
        self.as_http_error().map(|e| e.code())
    }

    /// Returns `true` if the request could not be constructed.
    pub fn is_construction(&self) -> bool {
        matches!(
            self,
            Error::InvalidUrl(_) | Error::ConfigurationError(_) | Error::SerializationFailed(_)
        )
    }

    /// Returns `true` if the call was cancelled.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }

    /// Returns `true` if the underlying transport timed out.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Transport(e) if e.is_timeout())
    }

    /// Returns the raw response body if this error has one.
    pub fn raw_response(&self) -> Option<&str> {
        match self {
            Error::DecodeFailed { raw_response, .. } => Some(raw_response),
            _ => None,
        }
    }
}

/// Looks for the [`HttpError`] capability anywhere in an error's source chain.
///
/// Useful for collaborators that box or wrap [`Error`] in their own error
/// types.
///
/// # Examples
///
/// ```
/// use envelope_client::{http_code, ApiError, Error};
///
/// let boxed: Box<dyn std::error::Error> = Box::new(Error::from(ApiError::new(403, "forbidden")));
/// assert_eq!(http_code(boxed.as_ref()), Some(403));
///
/// let io = std::io::Error::new(std::io::ErrorKind::Other, "disk");
/// assert_eq!(http_code(&io), None);
/// ```
pub fn http_code(error: &(dyn std::error::Error + 'static)) -> Option<u16> {
    let mut current = Some(error);
    while let Some(err) = current {
        if let Some(api) = err.downcast_ref::<ApiError>() {
            return Some(api.code());
        }
        if let Some(code) = err.downcast_ref::<Error>().and_then(Error::http_code) {
            return Some(code);
        }
        current = err.source();
    }
    None
}

/// A specialized `Result` type for API calls.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(thiserror::Error, Debug)]
    #[error("project sync failed")]
    struct SyncError(#[source] Error);

    #[test]
    fn test_from_body_uses_transport_status() {
        let err = ApiError::from_body(404, br#"{"code":400,"error_message":"no such project"}"#)
            .unwrap();
        assert_eq!(err.http_code, 404);
        assert_eq!(err.message, "no such project");
    }

    #[test]
    fn test_from_body_rejects_missing_message() {
        let result = ApiError::from_body(400, br#"{"code":400}"#);
        match result {
            Err(Error::DecodeFailed { status, .. }) => assert_eq!(status, 400),
            other => panic!("Expected DecodeFailed, got {:?}", other),
        }
    }

    #[test]
    fn test_from_body_rejects_empty_and_plain_bodies() {
        assert!(matches!(
            ApiError::from_body(404, b""),
            Err(Error::DecodeFailed { .. })
        ));

        match ApiError::from_body(404, b"Not found") {
            Err(e) => assert_eq!(e.raw_response(), Some("Not found")),
            Ok(e) => panic!("Expected DecodeFailed, got {:?}", e),
        }
    }

    #[test]
    fn test_capability_only_on_api_errors() {
        assert_eq!(Error::from(ApiError::new(422, "bad")).http_code(), Some(422));
        assert_eq!(Error::Cancelled.http_code(), None);
        assert_eq!(
            Error::DecodeFailed {
                raw_response: String::new(),
                serde_error: String::new(),
                status: 500,
            }
            .http_code(),
            None
        );
        assert_eq!(Error::UnknownStatus { status: 302 }.http_code(), None);
    }

    #[test]
    fn test_http_code_walks_source_chain() {
        let wrapped = SyncError(Error::from(ApiError::new(401, "unauthorized")));
        assert_eq!(http_code(&wrapped), Some(401));

        let wrapped = SyncError(Error::Cancelled);
        assert_eq!(http_code(&wrapped), None);
    }

    #[test]
    fn test_api_error_displays_message() {
        let err = Error::from(ApiError::new(400, "name must not be empty"));
        assert_eq!(err.to_string(), "name must not be empty");
    }

    #[test]
    fn test_construction_classification() {
        let err = Error::from(url::Url::parse("not a url").unwrap_err());
        assert!(err.is_construction());
        assert!(!Error::Cancelled.is_construction());
        assert!(Error::Cancelled.is_cancelled());
    }
}
