/*!
 * Tests for segment fetching and reassembly
 */

use url::Url;

use subweave::combiner::{combine_segments, SegmentStats};
use subweave::errors::ResolveError;
use subweave::fetch::{MockFetcher, MockResponse};
use crate::common;

fn segment_urls(count: usize) -> Vec<Url> {
    (1..=count)
        .map(|i| Url::parse(&common::cdn(&format!("subs/seg{}.vtt", i))).unwrap())
        .collect()
}

fn source() -> Url {
    Url::parse(&common::cdn("subs/en.m3u8")).unwrap()
}

/// Fetcher where segment i (1-based) fails when `failing(i)` is true
fn fetcher_with_failures(count: usize, failing: impl Fn(usize) -> bool) -> MockFetcher {
    (1..=count).fold(MockFetcher::new(), |fetcher, i| {
        let url = common::cdn(&format!("subs/seg{}.vtt", i));
        if failing(i) {
            fetcher.route(&url, if i % 2 == 0 { MockResponse::Status(404) } else { MockResponse::Unreachable })
        } else {
            fetcher.with_body(&url, common::vtt_segment(&format!("Cue{}", i)))
        }
    })
}

#[tokio::test]
async fn test_combine_withKFailures_shouldKeepSurvivorsInOrder() {
    common::init_logging();
    let n = 6;
    let patterns: Vec<Box<dyn Fn(usize) -> bool>> = vec![
        Box::new(|_| false),
        Box::new(|i| i == 1),
        Box::new(|i| i == 6),
        Box::new(|i| i % 2 == 0),
        Box::new(|i| i != 3),
    ];

    for failing in patterns {
        let expected: Vec<usize> = (1..=n).filter(|i| !failing(*i)).collect();
        let fetcher = fetcher_with_failures(n, &failing);
        let combined = combine_segments(&fetcher, &segment_urls(n), 1, &source()).await.unwrap();

        assert_eq!(combined.stats, SegmentStats { succeeded: expected.len(), attempted: n });
        let mut document = String::from("WEBVTT\n\n");
        for i in &expected {
            document.push_str(&format!("Cue{}\n\n", i));
        }
        assert_eq!(combined.document, document);
        assert_eq!(combined.document.matches("WEBVTT").count(), 1);
    }
}

#[tokio::test]
async fn test_combine_allFail_shouldReturnAllSegmentsFailed() {
    let n = 4;
    let fetcher = fetcher_with_failures(n, |_| true);
    let result = combine_segments(&fetcher, &segment_urls(n), 2, &source()).await;
    match result {
        Err(ResolveError::AllSegmentsFailed { url, attempted }) => {
            assert_eq!(attempted, 4);
            assert_eq!(url, source());
        }
        other => panic!("expected AllSegmentsFailed, got {:?}", other),
    }
}

#[tokio::test]
async fn test_combine_parallelFetches_shouldPreserveOrder() {
    let n = 12;
    let fetcher = fetcher_with_failures(n, |i| i == 5);
    for parallel in [1, 3, 12, 64] {
        let combined = combine_segments(&fetcher, &segment_urls(n), parallel, &source()).await.unwrap();
        let positions: Vec<usize> = (1..=n)
            .filter(|i| *i != 5)
            .map(|i| combined.document.find(&format!("Cue{}\n", i)).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]), "order broken with parallelism {}", parallel);
        assert_eq!(combined.stats, SegmentStats { succeeded: 11, attempted: 12 });
    }
}

#[tokio::test]
async fn test_combine_emptyList_shouldReturnHeaderOnly() {
    let fetcher = MockFetcher::new();
    let combined = combine_segments(&fetcher, &[], 1, &source()).await.unwrap();
    assert_eq!(combined.document, "WEBVTT\n\n");
    assert_eq!(combined.stats, SegmentStats { succeeded: 0, attempted: 0 });
}

#[tokio::test]
async fn test_combine_segmentsWithoutHeader_shouldBeAppendedVerbatim() {
    let urls = segment_urls(2);
    let fetcher = MockFetcher::new()
        .with_body(urls[0].as_str(), "00:00:01.000 --> 00:00:02.000\nHello\n")
        .with_body(urls[1].as_str(), "WEBVTT\nX-TIMESTAMP-MAP=MPEGTS:900000,LOCAL:00:00:00.000\n\n00:00:03.000 --> 00:00:04.000\nWorld");
    let combined = combine_segments(&fetcher, &urls, 1, &source()).await.unwrap();
    assert_eq!(
        combined.document,
        "WEBVTT\n\n00:00:01.000 --> 00:00:02.000\nHello\n\nX-TIMESTAMP-MAP=MPEGTS:900000,LOCAL:00:00:00.000\n\n00:00:03.000 --> 00:00:04.000\nWorld\n\n"
    );
}

#[tokio::test]
async fn test_combine_shouldFetchEachSegmentOnce() {
    let n = 3;
    let fetcher = fetcher_with_failures(n, |_| false);
    combine_segments(&fetcher, &segment_urls(n), 2, &source()).await.unwrap();
    for url in segment_urls(n) {
        assert_eq!(fetcher.request_count(url.as_str()), 1);
    }
}
