//! Connection settings

use std::fmt;
use std::time::Duration;

/// Endpoint and credentials for a management server
#[derive(Clone)]
pub struct ClientConfig {
    /// Base URL, e.g. `https://10.4.5.6`
    pub endpoint: String,
    pub username: String,
    pub password: String,
    /// Accept self-signed server certificates
    pub accept_invalid_certs: bool,
    /// Per-request timeout
    pub request_timeout: Duration,
}

impl ClientConfig {
    /// Build a config for a server address
    ///
    /// A bare IP or hostname is turned into an `https://` URL.
    pub fn new(
        address: impl AsRef<str>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        let address = address.as_ref();
        let endpoint = if address.contains("://") {
            address.trim_end_matches('/').to_string()
        } else {
            format!("https://{address}")
        };

        Self {
            endpoint,
            username: username.into(),
            password: password.into(),
            accept_invalid_certs: true,
            request_timeout: Duration::from_secs(60),
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("endpoint", &self.endpoint)
            .field("username", &self.username)
            .field("password", &"******")
            .field("accept_invalid_certs", &self.accept_invalid_certs)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}
