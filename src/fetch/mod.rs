/*!
 * Network access for the resolution pipeline.
 *
 * - `http`: reqwest-backed fetcher used by the CLI
 * - `mock`: in-memory fetcher with canned responses, used by tests
 */

use async_trait::async_trait;
use std::fmt::Debug;
use url::Url;

use crate::errors::FetchError;

/// Text body retrieved from a URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedText {
    /// Final URL after redirects, used as base for relative references
    pub url: Url,
    /// Decoded body
    pub body: String,
}

/// Common trait for everything able to GET a text resource
///
/// One call is one attempt: implementations must not retry. A non-success
/// HTTP status is reported as `FetchError::Status`; a failure after part of
/// the body arrived is reported as `FetchError::Transport` carrying that
/// partial text.
#[async_trait]
pub trait Fetcher: Send + Sync + Debug {
    /// Fetch `url` and return its body as text
    async fn fetch_text(&self, url: &Url) -> Result<FetchedText, FetchError>;
}

#[async_trait]
impl<T: Fetcher + ?Sized> Fetcher for std::sync::Arc<T> {
    async fn fetch_text(&self, url: &Url) -> Result<FetchedText, FetchError> {
        (**self).fetch_text(url).await
    }
}

pub mod http;
pub mod mock;

pub use http::HttpFetcher;
pub use mock::{MockFetcher, MockResponse};
