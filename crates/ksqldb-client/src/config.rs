//! Client configuration and builder pattern.

use crate::error::{ClientError, Result};
use std::fmt;
use std::time::Duration;

/// Configuration for the ksqlDB client.
///
/// # Security
///
/// The `Debug` implementation masks the password to prevent accidental exposure
/// in logs. It is shown as `"***REDACTED***"` in debug output.
#[derive(Clone)]
pub struct ClientConfig {
    /// Base URL of the ksqlDB server (e.g., "http://localhost:8088")
    pub base_url: String,
    /// Optional username for HTTP basic auth
    pub username: Option<String>,
    /// Optional password for HTTP basic auth
    pub password: Option<String>,
    /// Request timeout (default: 30 seconds)
    pub timeout: Duration,
    /// Maximum number of retries of transient GET failures (default: 3)
    pub max_retries: u32,
    /// Initial retry delay for exponential backoff (default: 100ms)
    pub retry_initial_delay: Duration,
    /// Maximum retry delay (default: 10 seconds)
    pub retry_max_delay: Duration,
    /// Whether to verify TLS certificates (default: true)
    pub tls_verify: bool,
    /// User-Agent header value
    pub user_agent: String,
    /// Check SQL syntax locally before sending pull queries (default: false)
    pub parse_sql: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8088".to_string(),
            username: None,
            password: None,
            timeout: Duration::from_secs(30),
            max_retries: 3,
            retry_initial_delay: Duration::from_millis(100),
            retry_max_delay: Duration::from_secs(10),
            tls_verify: true,
            user_agent: format!("ksqldb-client/{}", env!("CARGO_PKG_VERSION")),
            parse_sql: false,
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***REDACTED***"))
            .field("timeout", &self.timeout)
            .field("max_retries", &self.max_retries)
            .field("retry_initial_delay", &self.retry_initial_delay)
            .field("retry_max_delay", &self.retry_max_delay)
            .field("tls_verify", &self.tls_verify)
            .field("user_agent", &self.user_agent)
            .field("parse_sql", &self.parse_sql)
            .finish()
    }
}

impl ClientConfig {
    /// Create a new configuration builder.
    pub fn builder(base_url: impl Into<String>) -> ClientConfigBuilder {
        ClientConfigBuilder::new(base_url)
    }

    /// Minimum allowed timeout value.
    pub const MIN_TIMEOUT: Duration = Duration::from_millis(100);

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.base_url.is_empty() {
            return Err(ClientError::Config("base_url cannot be empty".to_string()));
        }

        let url = url::Url::parse(&self.base_url)
            .map_err(|e| ClientError::Config(format!("Invalid base_url: {}", e)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ClientError::Config(format!(
                "base_url must use http or https, got {}",
                url.scheme()
            )));
        }

        if self.password.is_some() && self.username.is_none() {
            return Err(ClientError::Config(
                "password is set but username is missing".to_string(),
            ));
        }

        if self.retry_initial_delay > self.retry_max_delay {
            return Err(ClientError::Config(format!(
                "retry_initial_delay ({:?}) must be <= retry_max_delay ({:?})",
                self.retry_initial_delay, self.retry_max_delay
            )));
        }

        if self.timeout < Self::MIN_TIMEOUT {
            return Err(ClientError::Config(format!(
                "timeout ({:?}) must be >= {:?}",
                self.timeout,
                Self::MIN_TIMEOUT
            )));
        }

        Ok(())
    }
}

/// Builder for client configuration.
#[derive(Debug)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    /// Create a new builder with the given base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            config: ClientConfig {
                base_url: base_url.into(),
                ..Default::default()
            },
        }
    }

    /// Set basic-auth credentials.
    pub fn basic_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.config.username = Some(username.into());
        self.config.password = Some(password.into());
        self
    }

    /// Set the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set the maximum number of retries.
    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.config.max_retries = max_retries;
        self
    }

    /// Set the initial retry delay for exponential backoff.
    pub fn retry_initial_delay(mut self, delay: Duration) -> Self {
        self.config.retry_initial_delay = delay;
        self
    }

    /// Set the maximum retry delay.
    pub fn retry_max_delay(mut self, delay: Duration) -> Self {
        self.config.retry_max_delay = delay;
        self
    }

    /// Set whether to verify TLS certificates.
    pub fn tls_verify(mut self, verify: bool) -> Self {
        self.config.tls_verify = verify;
        self
    }

    /// Set a custom User-Agent header.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    /// Enable the local SQL syntax check for pull queries.
    pub fn parse_sql(mut self, enabled: bool) -> Self {
        self.config.parse_sql = enabled;
        self
    }

    /// Build the configuration, validating all settings.
    pub fn build(self) -> Result<ClientConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, "http://localhost:8088");
        assert!(config.username.is_none());
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.max_retries, 3);
        assert!(!config.parse_sql);
    }

    #[test]
    fn test_builder() {
        let config = ClientConfig::builder("https://ksqldb.example.com:8088")
            .basic_auth("alice", "secret")
            .timeout(Duration::from_secs(60))
            .max_retries(5)
            .parse_sql(true)
            .build()
            .unwrap();

        assert_eq!(config.base_url, "https://ksqldb.example.com:8088");
        assert_eq!(config.username.as_deref(), Some("alice"));
        assert_eq!(config.password.as_deref(), Some("secret"));
        assert_eq!(config.timeout, Duration::from_secs(60));
        assert_eq!(config.max_retries, 5);
        assert!(config.parse_sql);
    }

    #[test]
    fn test_invalid_url() {
        let result = ClientConfig::builder("not a valid url").build();
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_url() {
        let result = ClientConfig::builder("").build();
        assert!(result.is_err());
    }

    #[test]
    fn test_non_http_scheme() {
        let err = ClientConfig::builder("ftp://localhost:8088")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("http or https"));
    }

    #[test]
    fn test_password_masked_in_debug() {
        let config = ClientConfig::builder("http://localhost:8088")
            .basic_auth("alice", "super_secret_password_12345")
            .build()
            .unwrap();

        let debug_output = format!("{:?}", config);

        assert!(
            !debug_output.contains("super_secret"),
            "Password fragments should not appear in debug output"
        );
        assert!(
            debug_output.contains("REDACTED"),
            "Debug output should show REDACTED marker"
        );
        assert!(debug_output.contains("alice"));
    }

    #[test]
    fn test_retry_delay_validation_invalid() {
        let result = ClientConfig::builder("http://localhost:8088")
            .retry_initial_delay(Duration::from_secs(10))
            .retry_max_delay(Duration::from_secs(1))
            .build();

        let err = result.unwrap_err();
        assert!(
            err.to_string().contains("retry_initial_delay"),
            "Error should mention retry_initial_delay"
        );
    }

    #[test]
    fn test_timeout_too_small() {
        let result = ClientConfig::builder("http://localhost:8088")
            .timeout(Duration::from_millis(50))
            .build();

        let err = result.unwrap_err();
        assert!(err.to_string().contains("timeout"));
    }

    #[test]
    fn test_timeout_at_minimum() {
        let result = ClientConfig::builder("http://localhost:8088")
            .timeout(ClientConfig::MIN_TIMEOUT)
            .build();

        assert!(result.is_ok());
    }
}
