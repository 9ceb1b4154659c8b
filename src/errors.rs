/*!
 * Error types for the subweave library.
 *
 * Transport failures are reported as `FetchError`, pipeline failures as
 * `ResolveError`. Both use the thiserror crate; the binary works with
 * `AppError` or plain `anyhow`.
 */

use std::fmt;

use serde::Serialize;
use thiserror::Error;
use url::Url;

/// Pipeline stage in which a resolution failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Fetching and classifying the entry URL
    Manifest,
    /// Looking for a subtitle track inside a master manifest
    Locate,
    /// Fetching the subtitle media manifest and listing its segments
    Enumerate,
    /// Fetching segments and stitching them together
    Combine,
    /// Whole-pipeline deadline
    Pipeline,
}

impl Stage {
    /// Short lowercase name used in logs and serialized failures
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Manifest => "manifest",
            Self::Locate => "locate",
            Self::Enumerate => "enumerate",
            Self::Combine => "combine",
            Self::Pipeline => "pipeline",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised by a single HTTP fetch
#[derive(Error, Debug)]
pub enum FetchError {
    /// Server answered with a non-success status
    #[error("HTTP {status} for {url}")]
    Status {
        /// Requested URL
        url: Url,
        /// HTTP status code
        status: u16,
    },

    /// Connection, TLS, timeout or body-read failure
    #[error("transport error for {url}: {message}")]
    Transport {
        /// Requested URL
        url: Url,
        /// Underlying error message
        message: String,
        /// Body text received before the failure, if any
        partial: Option<String>,
    },
}

impl FetchError {
    /// URL of the failed request
    pub fn url(&self) -> &Url {
        match self {
            Self::Status { url, .. } | Self::Transport { url, .. } => url,
        }
    }

    /// Partial body captured before a transport failure
    pub fn partial_content(&self) -> Option<&str> {
        match self {
            Self::Transport { partial: Some(text), .. } if !text.is_empty() => Some(text),
            _ => None,
        }
    }
}

/// Terminal failures of one resolution request
#[derive(Error, Debug)]
pub enum ResolveError {
    /// Entry URL is empty or not an absolute URL
    #[error("invalid entry URL '{input}': {message}")]
    InvalidUrl {
        /// Raw input as received
        input: String,
        /// Parser message
        message: String,
    },

    /// Network or HTTP-status failure with no usable partial content
    #[error("{stage} fetch failed for {url}: {source}")]
    FetchFailed {
        /// Stage that issued the request
        stage: Stage,
        /// Requested URL
        url: Url,
        /// Transport error
        #[source]
        source: FetchError,
    },

    /// Entry URL returned neither a caption document nor a playlist
    #[error("unrecognized content at {url}")]
    UnrecognizedContent {
        /// Entry URL
        url: Url,
    },

    /// Subtitle media manifest returned neither a caption document nor a playlist
    #[error("unrecognized subtitle manifest at {url}")]
    UnrecognizedSubManifest {
        /// Media manifest URL
        url: Url,
    },

    /// Master manifest has no usable subtitle reference
    #[error("no subtitle track found in {url}")]
    NoSubtitleTrackFound {
        /// Master manifest URL
        url: Url,
    },

    /// Media manifest listed no segment candidates
    #[error("no subtitle segments found in {url}")]
    NoSegmentsFound {
        /// Media manifest URL
        url: Url,
    },

    /// Every segment fetch failed
    #[error("all {attempted} subtitle segments failed for {url}")]
    AllSegmentsFailed {
        /// Manifest the segments came from
        url: Url,
        /// Number of segments tried
        attempted: usize,
    },

    /// Whole-pipeline deadline expired
    #[error("resolution of {url} timed out after {secs}s")]
    TimedOut {
        /// Entry URL
        url: Url,
        /// Deadline in seconds
        secs: u64,
    },
}

impl ResolveError {
    /// Stage in which the failure happened
    pub fn stage(&self) -> Stage {
        match self {
            Self::InvalidUrl { .. } | Self::UnrecognizedContent { .. } => Stage::Manifest,
            Self::FetchFailed { stage, .. } => *stage,
            Self::NoSubtitleTrackFound { .. } => Stage::Locate,
            Self::UnrecognizedSubManifest { .. } | Self::NoSegmentsFound { .. } => Stage::Enumerate,
            Self::AllSegmentsFailed { .. } => Stage::Combine,
            Self::TimedOut { .. } => Stage::Pipeline,
        }
    }

    /// Offending URL, when one could be parsed
    pub fn url(&self) -> Option<&Url> {
        match self {
            Self::InvalidUrl { .. } => None,
            Self::FetchFailed { url, .. }
            | Self::UnrecognizedContent { url }
            | Self::UnrecognizedSubManifest { url }
            | Self::NoSubtitleTrackFound { url }
            | Self::NoSegmentsFound { url }
            | Self::AllSegmentsFailed { url, .. }
            | Self::TimedOut { url, .. } => Some(url),
        }
    }
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from configuration handling
    #[error("Config error: {0}")]
    Config(String),

    /// Error from a fetch outside of a resolution
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Error from a resolution
    #[error("Resolve error: {0}")]
    Resolve(#[from] ResolveError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
