//! # envelope-client - a retrying client for envelope-wrapped JSON APIs
//!
//! Some HTTP APIs answer every successful call with `{"code": <int>, "data": <any>}`
//! and every failure with `{"code": <int>, "error_message": "<string>"}`. This crate
//! builds authenticated requests for such an API, sends them with automatic retries
//! on transient statuses, decodes the success envelope and turns failures into typed
//! errors.
//!
//! Resource-specific code (projects, issues, ...) only supplies a path and a payload
//! shape; everything else lives here.
//!
//! ## Quick Start
//!
//! ```no_run
//! use envelope_client::Client;
//! use serde::{Deserialize, Serialize};
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//!
//! #[derive(Serialize, Deserialize)]
//! struct Project {
//!     #[serde(skip_serializing_if = "Option::is_none")]
//!     id: Option<u64>,
//!     name: String,
//!     description: String,
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), envelope_client::Error> {
//!     let client = Client::new(
//!         "https://dev.example.com/api/",
//!         "admin",
//!         "access-token",
//!         Duration::from_secs(30),
//!     )?;
//!     let cancel = CancellationToken::new();
//!
//!     let page = client.list("projects", &["offset=0", "count=100"], &cancel).await?;
//!     let projects: Vec<Project> = page.data_as()?;
//!     println!("{} projects", projects.len());
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Retries
//!
//! Status `500` and everything above `501` are retried until a different status
//! arrives or the call is cancelled. The wait before retry `n` is
//! `(n - 1)² × 50 ms`, so the first retry is immediate. `501` and the other
//! 4xx/5xx statuses are terminal.
//!
//! ## Error Handling
//!
//! Failures reported by the API carry their status code through the [`HttpError`]
//! capability; transport, cancellation and decode failures do not:
//!
//! ```no_run
//! use envelope_client::{Client, Error};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example(client: Client) {
//! let cancel = CancellationToken::new();
//! match client.delete("projects/7", &[] as &[&str], &cancel).await {
//!     Ok(_) => println!("Deleted"),
//!     Err(e) if e.http_code() == Some(404) => println!("Already gone"),
//!     Err(Error::Cancelled) => println!("Gave up"),
//!     Err(e) => eprintln!("Delete failed: {}", e),
//! }
//! # }
//! ```

mod client;
pub mod config;
mod error;
pub mod metadata;
mod path;
pub mod request;
mod response;
pub mod retry;

pub use client::{Client, ClientBuilder};
pub use config::{ClientConfig, Credentials};
pub use error::{http_code, ApiError, Error, HttpError, Result};
pub use path::compose_url;
pub use request::OutboundRequest;
pub use response::Envelope;
pub use tokio_util::sync::CancellationToken;
