//! Client configuration.

use crate::retry::Backoff;
use std::fmt;
use std::time::Duration;

/// The user/secret pair sent as HTTP Basic credentials.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    /// The user name.
    pub user: String,
    /// The password or access token.
    pub secret: String,
}

impl Credentials {
    /// Creates a new credential pair.
    pub fn new(user: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            secret: secret.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Settings shared by every call a [`Client`](crate::Client) makes.
///
/// Built by [`ClientBuilder`](crate::ClientBuilder) and read-only afterwards.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// The base endpoint every resource path is joined onto.
    pub base_url: String,

    /// Basic authentication credentials.
    pub credentials: Credentials,

    /// Timeout for each individual send; `None` waits indefinitely.
    pub timeout: Option<Duration>,

    /// Value of the `User-Agent` header, if any.
    pub user_agent: Option<String>,

    /// The unit of the quadratic retry backoff.
    pub backoff_unit: Duration,
}

impl ClientConfig {
    /// The backoff schedule for this configuration.
    pub fn backoff(&self) -> Backoff {
        Backoff::new(self.backoff_unit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_secret() {
        let credentials = Credentials::new("admin", "hunter2");
        let printed = format!("{:?}", credentials);
        assert!(printed.contains("admin"));
        assert!(!printed.contains("hunter2"));
    }

    #[test]
    fn test_backoff_uses_configured_unit() {
        let config = ClientConfig {
            base_url: "http://host".to_string(),
            credentials: Credentials::default(),
            timeout: None,
            user_agent: None,
            backoff_unit: Duration::from_millis(10),
        };
        assert_eq!(config.backoff().delay(2), Duration::from_millis(40));
    }
}
