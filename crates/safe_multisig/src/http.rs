use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::time::sleep;
use tracing::{instrument, trace, warn};

use crate::{
    consts::{RATE_LIMITED_STATUS, RATE_LIMIT_RETRY_DELAY},
    error::{Result, SafeApiError, TransportError},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Delete,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub body: Option<Value>,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Get,
            url: url.into(),
            body: None,
        }
    }

    pub fn delete(url: impl Into<String>, body: Value) -> Self {
        Self {
            method: HttpMethod::Delete,
            url: url.into(),
            body: Some(body),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends a single HTTP request and reports the raw status and body.
///
/// Implementations must not retry; [HttpClient] owns the retry policy.
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> std::result::Result<HttpResponse, TransportError>;
}

/// [HttpTransport] backed by a shared [reqwest::Client].
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> std::result::Result<HttpResponse, TransportError> {
        let builder = match request.method {
            HttpMethod::Get => self.client.get(&request.url),
            HttpMethod::Delete => self.client.delete(&request.url),
        };
        let builder = match &request.body {
            Some(body) => builder.json(body),
            None => builder,
        };

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        Ok(HttpResponse { status, body })
    }
}

/// When and how often a failed read is reissued.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Fixed wait between attempts. No backoff growth.
    pub delay: Duration,
    /// Statuses that trigger another attempt.
    pub retry_on: fn(u16) -> bool,
    /// Total attempts allowed, `None` for unbounded.
    pub max_attempts: Option<u32>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::rate_limit()
    }
}

impl RetryPolicy {
    /// Retry 429s every 3s until the service lets the request through.
    pub fn rate_limit() -> Self {
        Self {
            delay: RATE_LIMIT_RETRY_DELAY,
            retry_on: is_rate_limited,
            max_attempts: None,
        }
    }

    /// Same predicate as [RetryPolicy::rate_limit] without waiting.
    pub fn immediate() -> Self {
        Self {
            delay: Duration::ZERO,
            ..Self::rate_limit()
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    /// Whether `status` returned by attempt number `attempt` (1-based) is worth another try.
    pub fn should_retry(&self, status: u16, attempt: u32) -> bool {
        (self.retry_on)(status) && self.max_attempts.map_or(true, |max| attempt < max)
    }
}

pub fn is_rate_limited(status: u16) -> bool {
    status == RATE_LIMITED_STATUS
}

/// JSON client over an [HttpTransport] with a built-in rate limit retry loop.
#[derive(Debug, Clone)]
pub struct HttpClient<T> {
    transport: T,
    policy: RetryPolicy,
}

impl<T: HttpTransport> HttpClient<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            policy: RetryPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Sends `request` and decodes a 2xx body as `R`.
    ///
    /// With `retry_on_rate_limit` set, retryable statuses are reissued according to
    /// the [RetryPolicy]. Any other non-2xx status fails with [SafeApiError::Api].
    pub async fn request_json<R: DeserializeOwned>(
        &self,
        request: HttpRequest,
        retry_on_rate_limit: bool,
    ) -> Result<R> {
        let response = self.dispatch(request, retry_on_rate_limit, "Request failed").await?;
        Ok(serde_json::from_str(&response.body)?)
    }

    /// Sends `request` once and ignores any 2xx body.
    pub async fn request_empty(&self, request: HttpRequest, failure_label: &str) -> Result<()> {
        self.dispatch(request, false, failure_label).await.map(|_| ())
    }

    #[instrument(skip_all, fields(method = ?request.method, url = %request.url))]
    async fn dispatch(
        &self,
        request: HttpRequest,
        retry: bool,
        failure_label: &str,
    ) -> Result<HttpResponse> {
        let mut attempt = 1;
        loop {
            trace!(attempt, "Dispatching request");
            let response = self.transport.send(request.clone()).await?;

            if response.is_success() {
                return Ok(response);
            }

            if retry && self.policy.should_retry(response.status, attempt) {
                warn!(
                    attempt,
                    status = response.status,
                    delay_ms = self.policy.delay.as_millis() as u64,
                    "Rate limited, retrying"
                );
                sleep(self.policy.delay).await;
                attempt += 1;
                continue;
            }

            let message = match response.body.trim() {
                "" => format!("{}: {}", failure_label, response.status),
                body => body.to_string(),
            };
            return Err(SafeApiError::Api {
                status: response.status,
                message,
            });
        }
    }
}
