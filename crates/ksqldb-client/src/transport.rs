//! HTTP transport capability.
//!
//! The client never talks to `reqwest` directly; it goes through [`HttpTransport`],
//! which resolves endpoints, performs GETs and arbitrary requests, supplies the
//! basic-auth value and releases its resources on [`HttpTransport::close`].
//! [`ReqwestTransport`] is the production implementation.

use crate::config::ClientConfig;
use crate::constants::Endpoint;
use crate::error::{BoxError, ClientError, Result};
use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, USER_AGENT};
use reqwest::StatusCode;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{
    policies::ExponentialBackoff, RetryTransientMiddleware, Retryable, RetryableStrategy,
};
use std::sync::atomic::{AtomicBool, Ordering};

/// Minimal HTTP capability the client is built on.
///
/// Implementations must be safe to share between concurrent calls.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Full URL of `endpoint`.
    fn get_url(&self, endpoint: Endpoint) -> String;

    /// Perform a GET on `url`.
    async fn get(&self, url: &str) -> std::result::Result<reqwest::Response, BoxError>;

    /// Send a prepared request.
    async fn execute(
        &self,
        request: reqwest::Request,
    ) -> std::result::Result<reqwest::Response, BoxError>;

    /// Base64 `user:password`, or `None` when no credentials are configured.
    fn basic_auth(&self) -> Option<String>;

    /// Release underlying resources.
    fn close(&self);
}

/// [`HttpTransport`] backed by `reqwest`.
///
/// GETs are retried with exponential backoff on connect/timeout failures, 5xx and
/// 429. Requests sent through [`HttpTransport::execute`] (statements and queries)
/// are sent once.
pub struct ReqwestTransport {
    base_url: String,
    http: reqwest::Client,
    retrying: ClientWithMiddleware,
    basic_auth: Option<String>,
    closed: AtomicBool,
}

impl ReqwestTransport {
    /// Create a transport for the given configuration.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        config.validate()?;

        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .unwrap_or_else(|_| HeaderValue::from_static("ksqldb-client")),
        );

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .danger_accept_invalid_certs(!config.tls_verify)
            .build()
            .map_err(|e| ClientError::Config(e.to_string()))?;

        let retry_policy = ExponentialBackoff::builder()
            .retry_bounds(config.retry_initial_delay, config.retry_max_delay)
            .build_with_max_retries(config.max_retries);

        let retrying = ClientBuilder::new(http.clone())
            .with(RetryTransientMiddleware::new_with_policy_and_strategy(
                retry_policy,
                KsqlRetryStrategy,
            ))
            .build();

        let basic_auth = config.username.as_ref().map(|username| {
            let password = config.password.as_deref().unwrap_or_default();
            encode_basic_auth(username, password)
        });

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http,
            retrying,
            basic_auth,
            closed: AtomicBool::new(false),
        })
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn ensure_open(&self) -> std::result::Result<(), BoxError> {
        if self.is_closed() {
            return Err("transport is closed".into());
        }
        Ok(())
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    fn get_url(&self, endpoint: Endpoint) -> String {
        format!("{}{}", self.base_url, endpoint.path())
    }

    async fn get(&self, url: &str) -> std::result::Result<reqwest::Response, BoxError> {
        self.ensure_open()?;

        let mut request = self.retrying.get(url);
        if let Some(ref credentials) = self.basic_auth {
            request = request.header(AUTHORIZATION, format!("Basic {}", credentials));
        }
        Ok(request.send().await?)
    }

    async fn execute(
        &self,
        request: reqwest::Request,
    ) -> std::result::Result<reqwest::Response, BoxError> {
        self.ensure_open()?;
        Ok(self.http.execute(request).await?)
    }

    fn basic_auth(&self) -> Option<String> {
        self.basic_auth.clone()
    }

    fn close(&self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            tracing::debug!(base_url = %self.base_url, "Transport closed");
        }
    }
}

/// Base64 of `username:password` (RFC 7617).
pub fn encode_basic_auth(username: &str, password: &str) -> String {
    let credentials = format!("{}:{}", username, password);
    general_purpose::STANDARD.encode(credentials.as_bytes())
}

/// Retry strategy for ksqlDB GETs.
///
/// Retries on:
/// - Transient network errors (connect, timeout)
/// - 5xx server errors
/// - 429 rate limiting (pull query rate limits)
///
/// Does NOT retry other 4xx client errors.
struct KsqlRetryStrategy;

impl RetryableStrategy for KsqlRetryStrategy {
    fn handle(&self, res: &reqwest_middleware::Result<reqwest::Response>) -> Option<Retryable> {
        match res {
            Ok(response) => classify_status(response.status()),
            Err(error) => {
                if error.is_timeout() || error.is_connect() {
                    Some(Retryable::Transient)
                } else {
                    Some(Retryable::Fatal)
                }
            }
        }
    }
}

fn classify_status(status: StatusCode) -> Option<Retryable> {
    if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
        Some(Retryable::Transient)
    } else if status.is_success() {
        None
    } else {
        Some(Retryable::Fatal)
    }
}
