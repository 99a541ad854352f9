//! Retrying HTTP client for the content backend.
//!
//! All page data comes from the backend API over HTTP. Calls go through
//! [`Upstream::get`], which enforces a timeout, retries transient failures
//! (network errors and 5xx responses) with a linearly growing delay, and
//! reports unrecoverable failures to Rollbar. Responses below 500 are
//! returned as-is so callers can distinguish "upstream is down" (an error
//! after retries are exhausted) from "upstream said no" (a returned 4xx).

use std::time::{Duration, Instant};

use reqwest::StatusCode;
use reqwest::redirect::Policy;

use crate::config::Config;

/// Maximum redirect hops when following redirects.
const MAX_REDIRECTS: usize = 10;

/// Default per-request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_millis(1000);

/// Options for a single upstream GET.
#[derive(Debug, Clone)]
pub struct GetOptions {
    /// Total request timeout.
    pub timeout: Duration,
    /// Follow redirects (up to 10 hops) instead of returning them.
    pub follow_redirect: bool,
    /// Report unrecoverable failures to the error collector.
    pub report_errors: bool,
}

impl Default for GetOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            follow_redirect: true,
            report_errors: true,
        }
    }
}

/// Upstream call failure, surfaced only after retries are exhausted.
#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    /// The path did not start with `/`. Raised before any network call.
    #[error("path must start with '/' (not: {0:?})")]
    BadPath(String),

    /// Network-level failure (connect, timeout, protocol).
    #[error("GET {path} failed after {attempts} attempt(s): {source}")]
    Network {
        path: String,
        attempts: u32,
        #[source]
        source: reqwest::Error,
    },

    /// The backend kept answering 5xx.
    #[error("GET {path} responded {status} after {attempts} attempt(s)")]
    Status {
        path: String,
        attempts: u32,
        status: StatusCode,
    },
}

/// HTTP client for the content backend.
#[derive(Clone)]
pub struct Upstream {
    base: String,
    client: reqwest::Client,
    client_no_redirect: reqwest::Client,
    max_attempts: u32,
    reporter: Option<Reporter>,
}

impl Upstream {
    /// Build the upstream client from configuration.
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .redirect(Policy::limited(MAX_REDIRECTS))
            .build()?;
        let client_no_redirect = reqwest::Client::builder()
            .redirect(Policy::none())
            .build()?;

        Ok(Self {
            base: config.api_base.clone(),
            client,
            client_no_redirect,
            max_attempts: config.upstream_retries,
            reporter: config
                .rollbar_access_token
                .as_deref()
                .map(Reporter::new)
                .transpose()?,
        })
    }

    /// GET `{api_base}{path}`.
    ///
    /// Retries network errors and 5xx responses up to the configured attempt
    /// count, sleeping `attempt * 1000ms` between attempts. Responses with a
    /// status below 500 (including 4xx) are returned without retrying.
    pub async fn get(
        &self,
        path: &str,
        options: GetOptions,
    ) -> Result<reqwest::Response, UpstreamError> {
        if !path.starts_with('/') {
            return Err(UpstreamError::BadPath(path.to_string()));
        }

        let url = format!("{}{}", self.base, path);
        let client = if options.follow_redirect {
            &self.client
        } else {
            &self.client_no_redirect
        };

        let started = Instant::now();
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            match client.get(url.as_str()).timeout(options.timeout).send().await {
                Ok(response) if response.status().is_server_error() => {
                    if attempt < self.max_attempts {
                        let delay = retry_delay(attempt);
                        tracing::warn!(
                            path = %path,
                            status = %response.status(),
                            attempt = attempt,
                            delay_ms = delay.as_millis() as u64,
                            "upstream 5xx, retrying"
                        );
                        tokio::time::sleep(delay).await;
                        continue;
                    }
                    let error = UpstreamError::Status {
                        path: path.to_string(),
                        attempts: attempt,
                        status: response.status(),
                    };
                    self.maybe_report(&error, path, &options);
                    return Err(error);
                }
                Ok(response) => {
                    tracing::info!(
                        path = %path,
                        status = %response.status(),
                        attempts = attempt,
                        duration_ms = started.elapsed().as_millis() as u64,
                        "upstream fetch"
                    );
                    return Ok(response);
                }
                Err(source) => {
                    if attempt < self.max_attempts {
                        let delay = retry_delay(attempt);
                        tracing::warn!(
                            path = %path,
                            error = %source,
                            attempt = attempt,
                            delay_ms = delay.as_millis() as u64,
                            "upstream network error, retrying"
                        );
                        tokio::time::sleep(delay).await;
                        continue;
                    }
                    let error = UpstreamError::Network {
                        path: path.to_string(),
                        attempts: attempt,
                        source,
                    };
                    self.maybe_report(&error, path, &options);
                    return Err(error);
                }
            }
        }
    }

    fn maybe_report(&self, error: &UpstreamError, path: &str, options: &GetOptions) {
        if !options.report_errors {
            return;
        }
        if let Some(reporter) = &self.reporter {
            reporter.report(
                error.to_string(),
                serde_json::json!({
                    "path": path,
                    "timeout_ms": options.timeout.as_millis() as u64,
                    "follow_redirect": options.follow_redirect,
                }),
            );
        }
    }
}

/// Linear retry delay: 1s after the first attempt, 2s after the second, ...
fn retry_delay(attempt: u32) -> Duration {
    Duration::from_millis(u64::from(attempt) * 1000)
}

/// Fire-and-forget error reporting to Rollbar.
///
/// Reporting happens on a spawned task so it can never delay or mask the
/// failure being reported. Failures to deliver are logged and dropped.
#[derive(Clone)]
pub struct Reporter {
    token: String,
    client: reqwest::Client,
}

const ROLLBAR_ITEM_URL: &str = "https://api.rollbar.com/api/1/item/";

impl Reporter {
    pub fn new(token: &str) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()?;
        Ok(Self {
            token: token.to_string(),
            client,
        })
    }

    /// Send one error item with request context attached.
    pub fn report(&self, message: String, context: serde_json::Value) {
        let client = self.client.clone();
        let token = self.token.clone();
        tokio::spawn(async move {
            let payload = serde_json::json!({
                "data": {
                    "environment": "production",
                    "level": "error",
                    "body": {
                        "message": {
                            "body": message,
                            "context": context,
                        }
                    }
                }
            });
            let result = client
                .post(ROLLBAR_ITEM_URL)
                .header("X-Rollbar-Access-Token", token)
                .json(&payload)
                .send()
                .await;
            match result {
                Ok(response) if !response.status().is_success() => {
                    tracing::warn!(status = %response.status(), "error report rejected");
                }
                Ok(_) => {}
                Err(err) => {
                    tracing::warn!(error = %err, "failed to deliver error report");
                }
            }
        });
    }
}
