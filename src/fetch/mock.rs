/*!
 * Mock fetcher for testing.
 *
 * Routes are registered per URL with one of these behaviors:
 * - `MockResponse::Body` - succeeds with the given text
 * - `MockResponse::Status` - fails with an HTTP status
 * - `MockResponse::Truncated` - connection drops after part of the body
 * - `MockResponse::Unreachable` - connection fails before any byte
 * - `MockResponse::Redirect` - serves another route under its final URL
 *
 * Unregistered URLs answer 404. Every request is recorded so tests can
 * assert which stages touched the network.
 */

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use url::Url;

use crate::errors::FetchError;
use crate::fetch::{FetchedText, Fetcher};

const MAX_REDIRECTS: usize = 5;

/// Canned behavior for one URL
#[derive(Debug, Clone, PartialEq)]
pub enum MockResponse {
    /// 200 with this body
    Body(String),
    /// Non-success status
    Status(u16),
    /// Transport failure after this much of the body arrived
    Truncated(String),
    /// Transport failure before any byte arrived
    Unreachable,
    /// Redirect to another registered URL
    Redirect(String),
}

/// In-memory `Fetcher` with canned responses
#[derive(Debug, Clone, Default)]
pub struct MockFetcher {
    /// Responses keyed by normalized URL
    routes: HashMap<String, MockResponse>,
    /// Every URL requested, in order
    requests: Arc<Mutex<Vec<Url>>>,
}

impl MockFetcher {
    /// Create an empty mock fetcher
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a response for a URL
    pub fn route(mut self, url: &str, response: MockResponse) -> Self {
        self.routes.insert(normalize(url), response);
        self
    }

    /// Register a successful body for a URL
    pub fn with_body(self, url: &str, body: impl Into<String>) -> Self {
        self.route(url, MockResponse::Body(body.into()))
    }

    /// Register a non-success status for a URL
    pub fn with_status(self, url: &str, status: u16) -> Self {
        self.route(url, MockResponse::Status(status))
    }

    /// Register a body that is cut off by a transport error
    pub fn with_truncated(self, url: &str, partial: impl Into<String>) -> Self {
        self.route(url, MockResponse::Truncated(partial.into()))
    }

    /// Register a redirect from one URL to another
    pub fn with_redirect(self, from: &str, to: &str) -> Self {
        self.route(from, MockResponse::Redirect(normalize(to)))
    }

    /// All URLs requested so far, in request order
    pub fn requests(&self) -> Vec<Url> {
        self.requests.lock().clone()
    }

    /// Number of times a URL was requested
    pub fn request_count(&self, url: &str) -> usize {
        let key = normalize(url);
        self.requests.lock().iter().filter(|u| u.as_str() == key).count()
    }
}

fn normalize(url: &str) -> String {
    Url::parse(url).map(|u| u.to_string()).unwrap_or_else(|_| url.to_string())
}

#[async_trait]
impl Fetcher for MockFetcher {
    async fn fetch_text(&self, url: &Url) -> Result<FetchedText, FetchError> {
        self.requests.lock().push(url.clone());

        let mut current = url.clone();
        for _ in 0..=MAX_REDIRECTS {
            let response = self
                .routes
                .get(current.as_str())
                .cloned()
                .unwrap_or(MockResponse::Status(404));

            match response {
                MockResponse::Body(body) => {
                    return Ok(FetchedText { url: current, body });
                }
                MockResponse::Status(status) => {
                    return Err(FetchError::Status { url: url.clone(), status });
                }
                MockResponse::Truncated(partial) => {
                    return Err(FetchError::Transport {
                        url: url.clone(),
                        message: "connection closed before message completed".to_string(),
                        partial: Some(partial),
                    });
                }
                MockResponse::Unreachable => {
                    return Err(FetchError::Transport {
                        url: url.clone(),
                        message: "connection refused".to_string(),
                        partial: None,
                    });
                }
                MockResponse::Redirect(target) => {
                    current = Url::parse(&target).map_err(|e| FetchError::Transport {
                        url: url.clone(),
                        message: format!("bad redirect target {}: {}", target, e),
                        partial: None,
                    })?;
                }
            }
        }

        Err(FetchError::Transport {
            url: url.clone(),
            message: "too many redirects".to_string(),
            partial: None,
        })
    }
}
