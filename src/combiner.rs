/*!
 * Segment fetching and caption reassembly.
 *
 * Segments may be fetched concurrently, but the results are folded into the
 * output strictly in playlist order. A failed segment is logged and skipped;
 * only a list where every segment fails is an error.
 */

use futures::stream::{self, StreamExt};
use log::{debug, warn};
use serde::Serialize;
use url::Url;

use crate::errors::{FetchError, ResolveError};
use crate::fetch::{FetchedText, Fetcher};
use crate::manifest::{starts_with_ignore_case, CAPTION_HEADER};

/// Success/attempt counters of one combine run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SegmentStats {
    /// Segments fetched successfully
    pub succeeded: usize,
    /// Segments tried
    pub attempted: usize,
}

/// Stitched caption document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CombinedCaptions {
    pub document: String,
    pub stats: SegmentStats,
}

/// Fold state: output so far plus counters
#[derive(Debug)]
struct Accumulator {
    document: String,
    has_content: bool,
    stats: SegmentStats,
}

impl Accumulator {
    fn new() -> Self {
        Self {
            document: synthesized_header(),
            has_content: false,
            stats: SegmentStats { succeeded: 0, attempted: 0 },
        }
    }

    fn push(mut self, url: &Url, result: Result<FetchedText, FetchError>) -> Self {
        self.stats.attempted += 1;
        match result {
            Ok(fetched) => {
                self.stats.succeeded += 1;
                if append_segment(&mut self.document, &fetched.body) {
                    self.has_content = true;
                } else {
                    debug!("Segment {} has no cues", url);
                }
            }
            Err(e) => warn!("Skipping subtitle segment {}: {}", url, e),
        }
        self
    }
}

/// Header every combined document starts with
pub fn synthesized_header() -> String {
    format!("{}\n\n", CAPTION_HEADER)
}

/// Remove a single leading `WEBVTT` header line from a segment body.
///
/// Only the first line is ever removed, and only when it starts with the
/// header token; everything after it is returned untouched.
pub fn strip_caption_header(body: &str) -> &str {
    let trimmed = body.trim_start_matches(|c: char| c.is_whitespace() || c == '\u{feff}');
    if !starts_with_ignore_case(trimmed, CAPTION_HEADER) {
        return body;
    }
    match trimmed.find('\n') {
        Some(end) => &trimmed[end + 1..],
        None => "",
    }
}

/// Append a segment body (header stripped) plus a blank-line separator.
/// Returns false when the body had no content left to append.
pub fn append_segment(document: &mut String, body: &str) -> bool {
    let content = strip_caption_header(body)
        .trim_start_matches(['\r', '\n'])
        .trim_end();
    if content.is_empty() {
        return false;
    }
    document.push_str(content);
    document.push_str("\n\n");
    true
}

/// Fetch every segment and stitch them into one caption document.
///
/// `parallelism` bounds how many fetches are in flight; concatenation order
/// always matches `segments`. `source` names the manifest the segments came
/// from, for error reporting.
pub async fn combine_segments<F>(
    fetcher: &F,
    segments: &[Url],
    parallelism: usize,
    source: &Url,
) -> Result<CombinedCaptions, ResolveError>
where
    F: Fetcher + ?Sized,
{
    let accumulator = stream::iter(segments)
        .map(|url| async move { (url, fetcher.fetch_text(url).await) })
        .buffered(parallelism.max(1))
        .boxed()
        .fold(Accumulator::new(), |acc, (url, result)| async move { acc.push(url, result) })
        .await;

    let stats = accumulator.stats;
    debug!(
        "Combined {}/{} segments from {} (content: {})",
        stats.succeeded, stats.attempted, source, accumulator.has_content
    );

    if stats.succeeded == 0 && !segments.is_empty() {
        return Err(ResolveError::AllSegmentsFailed {
            url: source.clone(),
            attempted: stats.attempted,
        });
    }

    Ok(CombinedCaptions {
        document: accumulator.document,
        stats,
    })
}
