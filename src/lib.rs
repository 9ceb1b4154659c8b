/*!
 * # subweave - subtitle playlist resolution for streaming players
 *
 * Turns one captured media-manifest URL into a single WebVTT caption
 * document, ready to be shown next to (or translated alongside) the
 * player's own captions.
 *
 * ## Features
 *
 * - Content sniffing instead of URL-extension guessing
 * - Subtitle track discovery across several HLS master manifest layouts:
 *   - direct `#EXT-X-MEDIA:TYPE=SUBTITLES` entries
 *   - variant `SUBTITLES="group"` indirection
 *   - caption segments listed inline in the master manifest
 * - Segment stitching that tolerates individual segment failures
 * - Recovery of caption payloads from connections closed mid-body
 * - Bounded parallel segment fetching with stable output order
 *
 * ## Architecture
 *
 * - `app_config`: Configuration management
 * - `fetch`: The `Fetcher` trait with HTTP and mock implementations
 * - `manifest`: Classification, tag parsing, track location, segment listing
 * - `combiner`: Segment fetching and document reassembly
 * - `resolver`: The end-to-end pipeline and its inbound/outbound types
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod combiner;
pub mod errors;
pub mod fetch;
pub mod manifest;
pub mod resolver;

// Re-export main types for easier usage
pub use app_config::Config;
pub use combiner::{CombinedCaptions, SegmentStats};
pub use errors::{AppError, FetchError, ResolveError, Stage};
pub use fetch::{Fetcher, HttpFetcher, MockFetcher};
pub use manifest::{classify, ManifestDocument, ManifestKind};
pub use resolver::{ResolutionFailure, ResolutionPath, ResolveRequest, ResolvedCaptions, SubtitleResolver};
