/*!
 * End-to-end subtitle resolution.
 *
 * `Start -> FetchedTop -> {Terminal | ClassifyingMaster} -> LocatingTrack ->
 * {FetchingSubManifest | UsingInlineFallback} -> EnumeratingSegments ->
 * FetchingAndCombining -> {Done | Failed}`
 *
 * Every request is independent: the resolver holds no per-request state, so
 * one instance may serve many concurrent resolutions.
 */

use futures::future::join_all;
use log::{debug, info, warn};
use serde::{Serialize, Serializer};
use serde::ser::SerializeStruct;
use std::time::Duration;
use thiserror::Error;
use url::Url;

use crate::app_config::FetchConfig;
use crate::combiner::{combine_segments, SegmentStats};
use crate::errors::{ResolveError, Stage};
use crate::fetch::Fetcher;
use crate::manifest::{classify, enumerate_segments, locate, Located, ManifestDocument, ManifestKind};

/// Inbound request: entry URL plus an opaque correlation id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveRequest {
    /// Caller bookkeeping id, returned unchanged
    pub video_id: String,
    /// Entry manifest URL
    pub url: String,
}

impl ResolveRequest {
    pub fn new(video_id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            video_id: video_id.into(),
            url: url.into(),
        }
    }
}

/// How the final document was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionPath {
    /// Entry URL already served a caption document
    Direct,
    /// Subtitle media manifest URL served a caption document
    SubManifestDirect,
    /// Segments of the subtitle media manifest were stitched
    Segments,
    /// Segments listed in the master manifest were stitched
    InlineSegments,
}

/// Caption document produced by the pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub document: String,
    pub path: ResolutionPath,
    /// Present whenever segments were combined
    pub stats: Option<SegmentStats>,
}

/// Successful outbound result
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedCaptions {
    pub video_id: String,
    pub url: Url,
    pub path: ResolutionPath,
    pub stats: Option<SegmentStats>,
    pub document: String,
}

/// Failed outbound result, never carrying a partial document
#[derive(Error, Debug)]
#[error("[{video_id}] {error}")]
pub struct ResolutionFailure {
    pub video_id: String,
    /// Entry URL as received
    pub url: String,
    #[source]
    pub error: ResolveError,
}

impl ResolutionFailure {
    pub fn stage(&self) -> Stage {
        self.error.stage()
    }
}

impl Serialize for ResolutionFailure {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ResolutionFailure", 4)?;
        state.serialize_field("video_id", &self.video_id)?;
        state.serialize_field("url", &self.url)?;
        state.serialize_field("stage", &self.error.stage())?;
        state.serialize_field("message", &self.error.to_string())?;
        state.end()
    }
}

/// Tuning knobs of a resolver
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverOptions {
    /// Segment fetches in flight at once
    pub max_parallel_segments: usize,
    /// Deadline applied by `resolve`
    pub pipeline_timeout: Option<Duration>,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            max_parallel_segments: 1,
            pipeline_timeout: None,
        }
    }
}

impl From<&FetchConfig> for ResolverOptions {
    fn from(config: &FetchConfig) -> Self {
        Self {
            max_parallel_segments: config.max_parallel_segments.max(1),
            pipeline_timeout: config.pipeline_timeout(),
        }
    }
}

/// Subtitle playlist resolver over any `Fetcher`
#[derive(Debug)]
pub struct SubtitleResolver<F: Fetcher> {
    fetcher: F,
    options: ResolverOptions,
}

impl<F: Fetcher> SubtitleResolver<F> {
    /// Create a resolver with default options
    pub fn new(fetcher: F) -> Self {
        Self::with_options(fetcher, ResolverOptions::default())
    }

    pub fn with_options(fetcher: F, options: ResolverOptions) -> Self {
        Self { fetcher, options }
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub fn options(&self) -> &ResolverOptions {
        &self.options
    }

    /// Resolve one request, applying the configured deadline
    pub async fn resolve(&self, request: ResolveRequest) -> Result<ResolvedCaptions, ResolutionFailure> {
        let ResolveRequest { video_id, url: raw_url } = request;

        let outcome = match parse_entry_url(&raw_url) {
            Ok(url) => self.resolve_with_deadline(&url).await.map(|resolution| (url, resolution)),
            Err(e) => Err(e),
        };

        match outcome {
            Ok((url, resolution)) => {
                info!(
                    "[{}] Resolved captions via {:?} ({} bytes)",
                    video_id,
                    resolution.path,
                    resolution.document.len()
                );
                Ok(ResolvedCaptions {
                    video_id,
                    url,
                    path: resolution.path,
                    stats: resolution.stats,
                    document: resolution.document,
                })
            }
            Err(error) => {
                warn!("[{}] Resolution failed at {} stage: {}", video_id, error.stage(), error);
                Err(ResolutionFailure {
                    video_id,
                    url: raw_url,
                    error,
                })
            }
        }
    }

    /// Resolve several independent requests concurrently; results keep input order
    pub async fn resolve_all(
        &self,
        requests: Vec<ResolveRequest>,
    ) -> Vec<Result<ResolvedCaptions, ResolutionFailure>> {
        join_all(requests.into_iter().map(|request| self.resolve(request))).await
    }

    async fn resolve_with_deadline(&self, url: &Url) -> Result<Resolution, ResolveError> {
        match self.options.pipeline_timeout {
            Some(deadline) => tokio::time::timeout(deadline, self.resolve_url(url))
                .await
                .unwrap_or_else(|_| {
                    Err(ResolveError::TimedOut {
                        url: url.clone(),
                        secs: deadline.as_secs(),
                    })
                }),
            None => self.resolve_url(url).await,
        }
    }

    /// Run the pipeline for an entry URL, without any deadline
    pub async fn resolve_url(&self, url: &Url) -> Result<Resolution, ResolveError> {
        debug!("Start: {}", url);
        let top = self.fetch_document(url, Stage::Manifest).await?;
        debug!("FetchedTop: {} ({} bytes)", top.url, top.text.len());

        match top.kind() {
            ManifestKind::CaptionDocument => {
                debug!("Terminal: {} is already a caption document", url);
                return Ok(Resolution {
                    document: top.text,
                    path: ResolutionPath::Direct,
                    stats: None,
                });
            }
            ManifestKind::MasterManifest | ManifestKind::MediaManifest => {
                debug!("ClassifyingMaster: {} is a {}", top.url, top.kind());
            }
            ManifestKind::Unrecognized => {
                return Err(ResolveError::UnrecognizedContent { url: url.clone() });
            }
        }

        debug!("LocatingTrack: {}", top.url);
        match locate(&top) {
            Located::DirectMedia(track) | Located::GroupIndirection(track) => {
                debug!("FetchingSubManifest: {}", track.url);
                self.resolve_media_manifest(&track.url).await
            }
            Located::InlineSegments(segments) => {
                debug!("UsingInlineFallback: {} segment(s) listed in {}", segments.len(), top.url);
                self.combine(&segments, &top.url, ResolutionPath::InlineSegments).await
            }
            Located::NotFound => Err(ResolveError::NoSubtitleTrackFound { url: top.url }),
        }
    }

    async fn resolve_media_manifest(&self, url: &Url) -> Result<Resolution, ResolveError> {
        let media = self.fetch_document(url, Stage::Enumerate).await?;

        match media.kind() {
            ManifestKind::CaptionDocument => {
                debug!("Terminal: sub-manifest {} is already a caption document", url);
                Ok(Resolution {
                    document: media.text,
                    path: ResolutionPath::SubManifestDirect,
                    stats: None,
                })
            }
            ManifestKind::MasterManifest | ManifestKind::MediaManifest => {
                debug!("EnumeratingSegments: {}", media.url);
                let segments = enumerate_segments(&media);
                if segments.is_empty() {
                    return Err(ResolveError::NoSegmentsFound { url: media.url });
                }
                self.combine(&segments, &media.url, ResolutionPath::Segments).await
            }
            ManifestKind::Unrecognized => Err(ResolveError::UnrecognizedSubManifest { url: url.clone() }),
        }
    }

    async fn combine(&self, segments: &[Url], source: &Url, path: ResolutionPath) -> Result<Resolution, ResolveError> {
        debug!("FetchingAndCombining: {} segment(s)", segments.len());
        let combined = combine_segments(&self.fetcher, segments, self.options.max_parallel_segments, source).await?;
        debug!("Done: {}/{} segments", combined.stats.succeeded, combined.stats.attempted);
        Ok(Resolution {
            document: combined.document,
            path,
            stats: Some(combined.stats),
        })
    }

    /// Fetch a manifest-level document.
    ///
    /// When the connection drops after part of the body arrived and that part
    /// already is a caption document, the partial content is used as-is.
    async fn fetch_document(&self, url: &Url, stage: Stage) -> Result<ManifestDocument, ResolveError> {
        match self.fetcher.fetch_text(url).await {
            Ok(fetched) => Ok(ManifestDocument::from(fetched)),
            Err(error) => {
                if let Some(partial) = error.partial_content() {
                    if classify(partial) == ManifestKind::CaptionDocument {
                        warn!("Using {} bytes of caption content received from {} before: {}", partial.len(), url, error);
                        return Ok(ManifestDocument::new(url.clone(), partial));
                    }
                }
                Err(ResolveError::FetchFailed {
                    stage,
                    url: url.clone(),
                    source: error,
                })
            }
        }
    }

    /// Fetch a URL once and report how its content classifies
    pub async fn classify_url(&self, url: &Url) -> Result<ManifestKind, ResolveError> {
        let document = self.fetch_document(url, Stage::Manifest).await?;
        Ok(document.kind())
    }
}

/// Parse an entry URL, which must be non-empty and absolute
pub fn parse_entry_url(input: &str) -> Result<Url, ResolveError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ResolveError::InvalidUrl {
            input: input.to_string(),
            message: "empty URL".to_string(),
        });
    }
    Url::parse(trimmed).map_err(|e| ResolveError::InvalidUrl {
        input: input.to_string(),
        message: e.to_string(),
    })
}
