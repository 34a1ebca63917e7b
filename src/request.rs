//! Outbound request construction.

use crate::config::{ClientConfig, Credentials};
use crate::{compose_url, metadata::RequestMetadata, Error, Result};
use base64::{engine::general_purpose::STANDARD, Engine};
use http::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use http::{HeaderMap, HeaderValue, Method};
use url::Url;

const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";
const JSON_ACCEPT: &str = "application/json";

/// A fully built request, ready to be sent.
///
/// The same request is re-sent unchanged on every retry.
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    method: Method,
    url: Url,
    headers: HeaderMap,
    body: Option<Vec<u8>>,
}

impl OutboundRequest {
    /// Builds a request from client settings and per-call metadata.
    ///
    /// Composes the URL, encodes the payload and sets the JSON and
    /// authentication headers.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUrl`] if the composed URL does not parse,
    /// [`Error::SerializationFailed`] if the payload cannot be encoded and
    /// [`Error::ConfigurationError`] if a header value is not valid.
    pub fn build(config: &ClientConfig, metadata: &RequestMetadata) -> Result<Self> {
        let url = Url::parse(&compose_url(
            &config.base_url,
            &metadata.path,
            metadata.options.as_slice(),
        ))?;

        let body = metadata
            .payload
            .as_ref()
            .map(|payload| payload.encode())
            .transpose()?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
        headers.insert(ACCEPT, HeaderValue::from_static(JSON_ACCEPT));
        headers.insert(AUTHORIZATION, basic_auth(&config.credentials)?);
        if let Some(user_agent) = &config.user_agent {
            let value = HeaderValue::try_from(user_agent.as_str())
                .map_err(|e| Error::ConfigurationError(format!("Invalid user agent: {}", e)))?;
            headers.insert(USER_AGENT, value);
        }

        tracing::debug!(
            method = %metadata.method,
            url = %url,
            body_bytes = body.as_ref().map_or(0, Vec::len),
            "Built request"
        );

        Ok(Self {
            method: metadata.method.clone(),
            url,
            headers,
            body,
        })
    }

    /// The HTTP method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The composed URL.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// The request headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// The encoded JSON body, if any.
    pub fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }
}

fn basic_auth(credentials: &Credentials) -> Result<HeaderValue> {
    let encoded = STANDARD.encode(format!("{}:{}", credentials.user, credentials.secret));
    let mut value = HeaderValue::try_from(format!("Basic {}", encoded))
        .map_err(|e| Error::ConfigurationError(format!("Invalid credentials: {}", e)))?;
    value.set_sensitive(true);
    Ok(value)
}
