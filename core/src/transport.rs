//! Blocking `ureq` transport with retry and exponential backoff.

use std::thread;
use std::time::Duration;

use tracing::{debug, warn};
use ureq::typestate::WithBody;
use ureq::{Agent, RequestBuilder};

use crate::error::{ApiError, Result};
use crate::http::{HttpMethod, HttpRequest, HttpResponse, Transport};

/// How often and how patiently transient failures are retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt; zero disables retrying.
    pub max_retries: u32,
    pub wait_min: Duration,
    pub wait_max: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 4,
            wait_min: Duration::from_secs(1),
            wait_max: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Delay before retry number `attempt` (zero based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
        self.wait_min
            .checked_mul(factor)
            .unwrap_or(self.wait_max)
            .min(self.wait_max)
    }

    /// Delay before retrying `response`, honouring `Retry-After` on 429/503.
    fn delay_for(&self, attempt: u32, response: &HttpResponse) -> Duration {
        let retry_after = match response.status {
            429 | 503 => response
                .header("Retry-After")
                .and_then(|value| value.trim().parse::<u64>().ok())
                .map(Duration::from_secs),
            _ => None,
        };
        retry_after
            .map(|delay| delay.min(self.wait_max))
            .unwrap_or_else(|| self.backoff(attempt))
    }
}

/// Statuses worth another attempt: rate limiting and server errors other than
/// "not implemented".
pub fn is_retryable_status(status: u16) -> bool {
    status == 429 || (status >= 500 && status != 501)
}

fn is_retryable_error(err: &ureq::Error) -> bool {
    matches!(
        err,
        ureq::Error::Io(_)
            | ureq::Error::Timeout(_)
            | ureq::Error::ConnectionFailed
            | ureq::Error::HostNotFound
    )
}

/// Default `Transport` backed by a shared `ureq::Agent`.
#[derive(Debug, Clone)]
pub struct UreqTransport {
    agent: Agent,
    retry: RetryPolicy,
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new(RetryPolicy::default(), None)
    }
}

impl UreqTransport {
    pub fn new(retry: RetryPolicy, timeout: Option<Duration>) -> Self {
        // Error statuses are classified by the client, not by ureq.
        let agent = Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(timeout)
            .build()
            .new_agent();
        Self { agent, retry }
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    fn send_once(&self, request: &HttpRequest) -> std::result::Result<HttpResponse, ureq::Error> {
        let url = request.url.as_str();
        let body = request.body.as_deref();
        let mut response = match request.method {
            HttpMethod::Get => with_headers(self.agent.get(url), &request.headers).call(),
            HttpMethod::Delete => {
                let builder = with_headers(self.agent.delete(url), &request.headers);
                match body {
                    Some(body) => builder.force_send_body().send(body),
                    None => builder.call(),
                }
            }
            HttpMethod::Post => send_body(with_headers(self.agent.post(url), &request.headers), body),
            HttpMethod::Put => send_body(with_headers(self.agent.put(url), &request.headers), body),
        }?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect();
        let body = response.body_mut().read_to_vec()?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

impl Transport for UreqTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse> {
        let mut attempt = 0;
        loop {
            let retries_left = attempt < self.retry.max_retries;
            match self.send_once(request) {
                Ok(response) if retries_left && is_retryable_status(response.status) => {
                    let delay = self.retry.delay_for(attempt, &response);
                    warn!(
                        method = %request.method,
                        url = %request.url,
                        status = response.status,
                        attempt = attempt + 1,
                        delay_ms = millis(delay),
                        "retrying after retryable status"
                    );
                    thread::sleep(delay);
                }
                Ok(response) => return Ok(response),
                Err(err) if retries_left && is_retryable_error(&err) => {
                    let delay = self.retry.backoff(attempt);
                    warn!(
                        method = %request.method,
                        url = %request.url,
                        error = %err,
                        attempt = attempt + 1,
                        delay_ms = millis(delay),
                        "retrying after transport error"
                    );
                    thread::sleep(delay);
                }
                Err(err) => {
                    debug!(method = %request.method, url = %request.url, error = %err, "giving up");
                    return Err(ApiError::Transport(err.to_string()));
                }
            }
            attempt += 1;
        }
    }
}

fn millis(delay: Duration) -> u64 {
    u64::try_from(delay.as_millis()).unwrap_or(u64::MAX)
}

fn with_headers<B>(mut builder: RequestBuilder<B>, headers: &[(String, String)]) -> RequestBuilder<B> {
    for (name, value) in headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
}

fn send_body(
    builder: RequestBuilder<WithBody>,
    body: Option<&[u8]>,
) -> std::result::Result<ureq::http::Response<ureq::Body>, ureq::Error> {
    match body {
        Some(body) => builder.send(body),
        None => builder.send_empty(),
    }
}
