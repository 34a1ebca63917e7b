//! HTTP client with envelope decoding and automatic retries.
//!
//! The [`Client`] type is the main entry point for talking to the API.
//! Use [`ClientBuilder`] to configure and create clients.

use crate::{
    config::{ClientConfig, Credentials},
    metadata::{Payload, RequestMetadata},
    request::OutboundRequest,
    retry::{Backoff, RetryState, StatusClass},
    ApiError, Envelope, Error, Result,
};
use http::Method;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use url::Url;

/// A client for an API that wraps its responses in `{code, data}` envelopes.
///
/// The client is cheap to clone and safe to share between concurrent calls;
/// its configuration is read-only after construction.
///
/// Every call takes a [`CancellationToken`]. Cancelling it while a request is
/// in flight or while the client is backing off ends the call with
/// [`Error::Cancelled`].
///
/// # Examples
///
/// ```no_run
/// use envelope_client::Client;
/// use serde::{Deserialize, Serialize};
/// use std::time::Duration;
/// use tokio_util::sync::CancellationToken;
///
/// #[derive(Serialize, Deserialize)]
/// struct Project {
///     #[serde(skip_serializing_if = "Option::is_none")]
///     id: Option<u64>,
///     name: String,
/// }
///
/// # async fn example() -> Result<(), envelope_client::Error> {
/// let client = Client::builder()
///     .base_url("https://dev.example.com/api")
///     .credentials("admin", "secret")
///     .timeout(Duration::from_secs(30))
///     .build()?;
///
/// let cancel = CancellationToken::new();
///
/// let created = client
///     .create("projects", &Project { id: None, name: "core".to_string() }, &cancel)
///     .await?;
/// let id: u64 = created.data_as()?;
///
/// let project: Project = client
///     .find_by_id(&format!("projects/{}", id), &[] as &[&str], &cancel)
///     .await?
///     .data_as()?;
/// println!("Fetched {}", project.name);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    http_client: reqwest::Client,
    config: ClientConfig,
    backoff: Backoff,
}

impl Client {
    /// Creates a new `ClientBuilder` for configuring a client.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Creates a client from a base URL, a credential pair and a timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid.
    pub fn new(
        base_url: impl Into<String>,
        user: impl Into<String>,
        secret: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        Self::builder()
            .base_url(base_url)
            .credentials(user, secret)
            .timeout(timeout)
            .build()
    }

    /// The client's configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Builds the outbound request for `metadata` without sending it.
    ///
    /// # Errors
    ///
    /// Returns a construction error ([`Error::InvalidUrl`],
    /// [`Error::SerializationFailed`] or [`Error::ConfigurationError`]).
    pub fn build_request(&self, metadata: &RequestMetadata) -> Result<OutboundRequest> {
        OutboundRequest::build(&self.inner.config, metadata)
    }

    /// Builds and sends a request.
    ///
    /// # Errors
    ///
    /// See [`Client::send`]; construction errors are returned before anything
    /// is sent.
    pub async fn call(
        &self,
        metadata: RequestMetadata,
        cancel: &CancellationToken,
    ) -> Result<Envelope> {
        let request = self.build_request(&metadata)?;
        self.send(request, cancel).await
    }

    /// Sends a built request, retrying transient statuses.
    ///
    /// A 2xx response is decoded as an [`Envelope`]. `500`, `0` and anything
    /// above `501` are re-sent after a quadratic backoff with no attempt cap.
    /// Other 4xx/5xx responses, `501` included, become [`Error::Api`].
    ///
    /// # Errors
    ///
    /// * [`Error::Transport`] if sending fails; this is never retried.
    /// * [`Error::Cancelled`] if `cancel` fires during a send or a backoff
    ///   wait, even if a response was already received.
    /// * [`Error::Api`] for a terminal error status.
    /// * [`Error::DecodeFailed`] if the envelope or error body is malformed.
    /// * [`Error::UnknownStatus`] for statuses outside the known ranges.
    pub async fn send(
        &self,
        request: OutboundRequest,
        cancel: &CancellationToken,
    ) -> Result<Envelope> {
        let start_time = Instant::now();
        let mut state = RetryState::new();

        loop {
            tracing::debug!(
                method = %request.method(),
                url = %request.url(),
                attempt = state.attempt(),
                "Sending request"
            );

            let (status, body) = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::debug!(attempt = state.attempt(), "Request cancelled");
                    return Err(Error::Cancelled);
                }
                result = self.execute(&request) => result?,
            };

            tracing::info!(
                status = status,
                latency_ms = start_time.elapsed().as_millis(),
                attempt = state.attempt(),
                "Received HTTP response"
            );

            match StatusClass::of(status) {
                StatusClass::Success => return Envelope::from_body(status, &body),
                StatusClass::ClientOrServerError => {
                    let error = ApiError::from_body(status, &body)?;
                    tracing::error!(
                        status = status,
                        message = %error.message,
                        "API returned an error"
                    );
                    return Err(error.into());
                }
                StatusClass::Retryable => {
                    let delay = state.delay(&self.inner.backoff);
                    tracing::warn!(
                        status = status,
                        attempt = state.attempt(),
                        delay_ms = delay.as_millis(),
                        "Retrying request after delay"
                    );

                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => {
                            tracing::debug!(
                                attempt = state.attempt(),
                                "Request cancelled during backoff"
                            );
                            return Err(Error::Cancelled);
                        }
                        _ = tokio::time::sleep(delay) => {}
                    }
                    state.record_retry();
                }
                StatusClass::Unknown => {
                    tracing::error!(status = status, "Unexpected response status");
                    return Err(Error::UnknownStatus { status });
                }
            }
        }
    }

    /// Executes a single send and reads the whole response body.
    async fn execute(&self, request: &OutboundRequest) -> Result<(u16, Vec<u8>)> {
        let mut builder = self
            .inner
            .http_client
            .request(request.method().clone(), request.url().clone())
            .headers(request.headers().clone());

        if let Some(body) = request.body() {
            builder = builder.body(body.to_vec());
        }

        if let Some(timeout) = self.inner.config.timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?;

        Ok((status, body.to_vec()))
    }

    /// Fetches a single document with `GET`.
    pub async fn find_by_id<S: AsRef<str>>(
        &self,
        path: &str,
        options: &[S],
        cancel: &CancellationToken,
    ) -> Result<Envelope> {
        self.call(metadata(Method::GET, path, options), cancel).await
    }

    /// Lists documents with `GET`.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # use envelope_client::Client;
    /// # use tokio_util::sync::CancellationToken;
    /// # async fn example(client: Client) -> Result<(), envelope_client::Error> {
    /// let cancel = CancellationToken::new();
    /// let page = client.list("projects", &["offset=0", "count=100"], &cancel).await?;
    /// let projects: Vec<serde_json::Value> = page.data_as()?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn list<S: AsRef<str>>(
        &self,
        path: &str,
        options: &[S],
        cancel: &CancellationToken,
    ) -> Result<Envelope> {
        self.call(metadata(Method::GET, path, options), cancel).await
    }

    /// Deletes a document with `DELETE`.
    pub async fn delete<S: AsRef<str>>(
        &self,
        path: &str,
        options: &[S],
        cancel: &CancellationToken,
    ) -> Result<Envelope> {
        self.call(metadata(Method::DELETE, path, options), cancel).await
    }

    /// Creates a document with `POST`, sending `{"data": doc}`.
    pub async fn create<T: Serialize + ?Sized>(
        &self,
        path: &str,
        doc: &T,
        cancel: &CancellationToken,
    ) -> Result<Envelope> {
        let metadata =
            RequestMetadata::new(Method::POST, path).with_payload(Payload::create(doc)?);
        self.call(metadata, cancel).await
    }

    /// Updates a document with `POST`, sending `doc` unwrapped.
    pub async fn update<T: Serialize + ?Sized>(
        &self,
        path: &str,
        doc: &T,
        cancel: &CancellationToken,
    ) -> Result<Envelope> {
        let metadata =
            RequestMetadata::new(Method::POST, path).with_payload(Payload::update(doc)?);
        self.call(metadata, cancel).await
    }
}

fn metadata<S: AsRef<str>>(method: Method, path: &str, options: &[S]) -> RequestMetadata {
    RequestMetadata::new(method, path)
        .with_options(options.iter().map(|option| option.as_ref().to_string()))
}

/// Builder for configuring and creating a [`Client`].
///
/// # Examples
///
/// ```no_run
/// use envelope_client::ClientBuilder;
/// use std::time::Duration;
///
/// # fn example() -> Result<(), envelope_client::Error> {
/// let client = ClientBuilder::new()
///     .base_url("https://dev.example.com/api")
///     .credentials("admin", "secret")
///     .timeout(Duration::from_secs(30))
///     .user_agent("project-sync/1.0")
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct ClientBuilder {
    base_url: Option<String>,
    credentials: Credentials,
    timeout: Option<Duration>,
    user_agent: Option<String>,
    backoff_unit: Duration,
}

impl ClientBuilder {
    /// Creates a new `ClientBuilder` with default settings.
    pub fn new() -> Self {
        Self {
            base_url: None,
            credentials: Credentials::default(),
            timeout: None,
            user_agent: None,
            backoff_unit: Backoff::DEFAULT_UNIT,
        }
    }

    /// Sets the base endpoint all resource paths are joined onto.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the Basic authentication credentials.
    pub fn credentials(mut self, user: impl Into<String>, secret: impl Into<String>) -> Self {
        self.credentials = Credentials::new(user, secret);
        self
    }

    /// Sets the timeout applied to each individual send.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the `User-Agent` header sent with every request.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Sets the unit of the quadratic retry backoff (50 ms by default).
    pub fn backoff_unit(mut self, unit: Duration) -> Self {
        self.backoff_unit = unit;
        self
    }

    /// Builds the configured `Client`.
    ///
    /// # Errors
    ///
    /// Returns an error if no base URL was provided, if it does not parse or
    /// if the HTTP client cannot be created.
    pub fn build(self) -> Result<Client> {
        let base_url = self
            .base_url
            .ok_or_else(|| Error::ConfigurationError("Base URL is required".to_string()))?;
        Url::parse(&base_url)?;

        let http_client = reqwest::Client::builder().build().map_err(|e| {
            Error::ConfigurationError(format!("Failed to build HTTP client: {}", e))
        })?;

        let config = ClientConfig {
            base_url,
            credentials: self.credentials,
            timeout: self.timeout,
            user_agent: self.user_agent,
            backoff_unit: self.backoff_unit,
        };

        Ok(Client {
            inner: Arc::new(ClientInner {
                http_client,
                backoff: config.backoff(),
                config,
            }),
        })
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
