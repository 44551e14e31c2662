//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building one HTTP client per egress route
//! - Leasing a route from the proxy pool for every attempt
//! - Retrying transient failures with backoff on a fresh route
//! - Classifying failures and reporting route health
//! - Capping response bodies and sniffing their content kind

use crate::config::FetchConfig;
use crate::extract::ContentKind;
use crate::proxy::{ProxyPool, RouteLease, RouteOutcome};
use crate::url::{normalize_url, Scope};
use crate::FetchError;
use rand::seq::SliceRandom;
use reqwest::header::{CONTENT_TYPE, USER_AGENT};
use reqwest::{redirect::Policy, Client, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use super::retry::{RetryDecision, RetryPolicy};

const MAX_REDIRECTS: usize = 10;

/// A resource waiting to be fetched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTask {
    /// URL as linked, minus the fragment; this is what gets requested
    pub url: Url,
    /// Normalized form of `url`, used only as the visited-set key
    pub key: String,
    /// Link distance from the nearest seed
    pub depth: u32,
    /// Kind guessed from the link that led here
    pub hint: ContentKind,
}

impl FetchTask {
    pub fn new(mut url: Url, depth: u32, hint: ContentKind) -> Self {
        url.set_fragment(None);
        let key = normalize_url(url.as_str())
            .map(String::from)
            .unwrap_or_else(|_| url.to_string());
        Self {
            url,
            key,
            depth,
            hint,
        }
    }
}

/// Final status of a fetch after all retries
#[derive(Debug, Clone)]
pub enum FetchStatus {
    /// A 2xx response was received
    Fetched { status_code: u16 },
    Failed(FetchError),
}

/// Result of a fetch operation
#[derive(Debug, Clone)]
pub struct FetchResult {
    /// The URL that was requested
    pub url: Url,
    /// URL after redirects
    pub final_url: Url,
    pub status: FetchStatus,
    /// Response body, empty on failure
    pub body: Vec<u8>,
    /// Sniffed kind of the body
    pub content: ContentKind,
    /// Content-Type header value
    pub content_type: Option<String>,
    /// Attempts made, including the first
    pub attempts: u32,
    /// Whether the body was cut at the size cap
    pub truncated: bool,
}

impl FetchResult {
    fn failed(task: &FetchTask, error: FetchError, attempts: u32) -> Self {
        Self {
            url: task.url.clone(),
            final_url: task.url.clone(),
            status: FetchStatus::Failed(error),
            body: Vec::new(),
            content: ContentKind::Unknown,
            content_type: None,
            attempts,
            truncated: false,
        }
    }
}

/// Builds an HTTP client, optionally tunnelled through a SOCKS5 endpoint
///
/// Host names are resolved by the proxy (`socks5h`) so DNS lookups do not
/// leak from the local machine. The User-Agent is set per request.
pub fn build_http_client(
    proxy_address: Option<&str>,
    fetch: &FetchConfig,
    scope: Option<&Scope>,
) -> Result<Client, reqwest::Error> {
    let timeout = Duration::from_millis(fetch.timeout_ms);

    let mut builder = Client::builder()
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .redirect(redirect_policy(scope.cloned()))
        .gzip(true)
        .brotli(true);

    if let Some(address) = proxy_address {
        builder = builder.proxy(reqwest::Proxy::all(format!("socks5h://{}", address))?);
    }

    builder.build()
}

/// A successful single attempt
struct Page {
    final_url: Url,
    status_code: u16,
    content_type: Option<String>,
    body: Vec<u8>,
    truncated: bool,
}

/// A failed single attempt and what it says about the route
struct AttemptFailure {
    error: FetchError,
    route: RouteOutcome,
}

/// Fetches resources through the proxy pool
///
/// # Retry Logic
///
/// | Condition | Action | Route outcome |
/// |-----------|--------|---------------|
/// | 2xx | Done | Success |
/// | 401, 403, 429 | Permanent, no retry | Blocked |
/// | Other 3xx/4xx | Permanent, no retry | Success |
/// | 5xx | Transient, retry | Success |
/// | Timeout, connect or proxy error | Transient, retry | Failure |
///
/// Every retry leases a fresh route after the backoff delay.
#[derive(Debug)]
pub struct Fetcher {
    pool: Arc<ProxyPool>,
    retry: RetryPolicy,
    user_agents: Vec<String>,
    max_body_bytes: usize,
}

impl Fetcher {
    pub fn new(pool: Arc<ProxyPool>, fetch: &FetchConfig) -> Self {
        Self {
            pool,
            retry: RetryPolicy::from(fetch),
            user_agents: fetch.user_agents.clone(),
            max_body_bytes: fetch.max_body_bytes,
        }
    }

    /// The User-Agent used when matching robots.txt groups
    pub fn primary_user_agent(&self) -> &str {
        self.user_agents.first().map(String::as_str).unwrap_or("*")
    }

    /// Fetches a resource, retrying transient failures
    ///
    /// Never returns an error directly; failures are carried in
    /// [`FetchResult::status`]. `ProxyExhausted` means the run must abort.
    pub async fn fetch(&self, task: &FetchTask) -> FetchResult {
        let mut retry = self.retry.start();

        loop {
            let lease = match self.pool.wait_for_route().await {
                Ok(lease) => lease,
                Err(e) => return FetchResult::failed(task, e, retry.attempts()),
            };

            tracing::debug!(
                "GET {} via {} (attempt {})",
                task.url,
                lease.id,
                retry.attempts()
            );

            let failure = match self.attempt(&lease, &task.url).await {
                Ok(page) => {
                    self.pool.report(&lease, RouteOutcome::Success);
                    return self.finish(task, page, retry.attempts());
                }
                Err(failure) => failure,
            };

            self.pool.report(&lease, failure.route);

            if !failure.error.is_transient() {
                tracing::debug!("{}", failure.error);
                return FetchResult::failed(task, failure.error, retry.attempts());
            }

            match retry.next() {
                RetryDecision::RetryAfter(delay) => {
                    tracing::debug!("{}; retrying in {:?}", failure.error, delay);
                    tokio::time::sleep(delay).await;
                }
                RetryDecision::GiveUp => {
                    tracing::warn!(
                        "Giving up on {} after {} attempts: {}",
                        task.url,
                        retry.attempts(),
                        failure.error
                    );
                    return FetchResult::failed(task, failure.error, retry.attempts());
                }
            }
        }
    }

    fn finish(&self, task: &FetchTask, page: Page, attempts: u32) -> FetchResult {
        let content = ContentKind::sniff(&page.body, page.content_type.as_deref(), task.hint);
        if page.truncated {
            tracing::warn!(
                "Body of {} truncated at {} bytes",
                task.url,
                self.max_body_bytes
            );
        }

        FetchResult {
            url: task.url.clone(),
            final_url: page.final_url,
            status: FetchStatus::Fetched {
                status_code: page.status_code,
            },
            body: page.body,
            content,
            content_type: page.content_type,
            attempts,
            truncated: page.truncated,
        }
    }

    fn pick_user_agent(&self) -> Option<String> {
        self.user_agents.choose(&mut rand::thread_rng()).cloned()
    }

    async fn attempt(&self, lease: &RouteLease, url: &Url) -> Result<Page, AttemptFailure> {
        let mut request = lease.client.get(url.clone());
        if let Some(agent) = self.pick_user_agent() {
            request = request.header(USER_AGENT, agent);
        }

        let mut response = request
            .send()
            .await
            .map_err(|e| network_failure(url, &e))?;

        let status = response.status();
        if let Some(failure) = classify_status(url, status) {
            return Err(failure);
        }

        let final_url = response.url().clone();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let mut body = Vec::new();
        let mut truncated = false;
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| network_failure(url, &e))?
        {
            let room = self.max_body_bytes - body.len();
            if chunk.len() > room {
                body.extend_from_slice(&chunk[..room]);
                truncated = true;
                break;
            }
            body.extend_from_slice(&chunk);
        }

        Ok(Page {
            final_url,
            status_code: status.as_u16(),
            content_type,
            body,
            truncated,
        })
    }
}

/// Follows redirects only while they stay inside `scope`
///
/// A redirect leaving the scope is not followed; the 3xx response itself is
/// returned and fails the fetch as a permanent error.
fn redirect_policy(scope: Option<Scope>) -> Policy {
    let Some(scope) = scope else {
        return Policy::limited(MAX_REDIRECTS);
    };

    Policy::custom(move |attempt| {
        if attempt.previous().len() >= MAX_REDIRECTS {
            attempt.error("too many redirects")
        } else if scope.contains(attempt.url()) {
            attempt.follow()
        } else {
            tracing::debug!("Not following redirect out of scope to {}", attempt.url());
            attempt.stop()
        }
    })
}

/// Maps a non-2xx status to a failure; `None` for success
fn classify_status(url: &Url, status: StatusCode) -> Option<AttemptFailure> {
    if status.is_success() {
        return None;
    }

    let failure = match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS => {
            AttemptFailure {
                error: FetchError::Permanent {
                    url: url.to_string(),
                    status_code: status.as_u16(),
                },
                route: RouteOutcome::Blocked,
            }
        }
        s if s.is_server_error() => AttemptFailure {
            error: FetchError::Transient {
                url: url.to_string(),
                reason: format!("HTTP {}", s.as_u16()),
            },
            route: RouteOutcome::Success,
        },
        s => AttemptFailure {
            error: FetchError::Permanent {
                url: url.to_string(),
                status_code: s.as_u16(),
            },
            route: RouteOutcome::Success,
        },
    };

    Some(failure)
}

fn network_failure(url: &Url, error: &reqwest::Error) -> AttemptFailure {
    let reason = if error.is_timeout() {
        "request timeout".to_string()
    } else if error.is_connect() {
        format!("connection failed: {}", error)
    } else {
        error.to_string()
    };

    AttemptFailure {
        error: FetchError::Transient {
            url: url.to_string(),
            reason,
        },
        route: RouteOutcome::Failure,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url() -> Url {
        Url::parse("https://example.com/page").unwrap()
    }

    #[test]
    fn test_build_http_client() {
        let scope = Scope::for_target(&url(), false).unwrap();
        assert!(build_http_client(None, &FetchConfig::default(), None).is_ok());
        assert!(build_http_client(Some("127.0.0.1:9050"), &FetchConfig::default(), Some(&scope)).is_ok());
    }

    #[test]
    fn test_success_is_not_classified() {
        assert!(classify_status(&url(), StatusCode::OK).is_none());
        assert!(classify_status(&url(), StatusCode::NO_CONTENT).is_none());
    }

    #[test]
    fn test_not_found_is_permanent() {
        let failure = classify_status(&url(), StatusCode::NOT_FOUND).unwrap();
        assert!(matches!(
            failure.error,
            FetchError::Permanent {
                status_code: 404,
                ..
            }
        ));
        assert_eq!(failure.route, RouteOutcome::Success);
    }

    #[test]
    fn test_blocks_penalize_the_route() {
        for status in [
            StatusCode::FORBIDDEN,
            StatusCode::TOO_MANY_REQUESTS,
            StatusCode::UNAUTHORIZED,
        ] {
            let failure = classify_status(&url(), status).unwrap();
            assert!(!failure.error.is_transient());
            assert_eq!(failure.route, RouteOutcome::Blocked);
        }
    }

    #[test]
    fn test_server_errors_are_transient() {
        let failure = classify_status(&url(), StatusCode::SERVICE_UNAVAILABLE).unwrap();
        assert!(failure.error.is_transient());
        assert_eq!(failure.route, RouteOutcome::Success);
    }

    #[test]
    fn test_failed_result_shape() {
        let task = FetchTask::new(url(), 2, ContentKind::Pdf);
        let result = FetchResult::failed(&task, FetchError::ProxyExhausted { waited_secs: 3 }, 1);
        assert!(result.body.is_empty());
        assert_eq!(result.content, ContentKind::Unknown);
        assert!(matches!(
            result.status,
            FetchStatus::Failed(FetchError::ProxyExhausted { waited_secs: 3 })
        ));
    }

    #[test]
    fn test_task_requests_the_linked_url() {
        let linked = Url::parse("https://Example.com/team/?source=staff&utm_medium=x#people").unwrap();
        let task = FetchTask::new(linked, 1, ContentKind::Html);
        assert_eq!(task.url.as_str(), "https://example.com/team/?source=staff&utm_medium=x");
        assert_eq!(task.key, "https://example.com/team?source=staff");
    }
}
