use log::debug;
use url::Url;

use super::{has_caption_extension, ManifestDocument};

/// Whether a playlist content line should be fetched as a caption segment.
///
/// Some providers list bare relative file names without a recognizable
/// extension, so any line without a path separator also counts.
pub fn is_segment_candidate(line: &str) -> bool {
    has_caption_extension(line) || !line.contains('/')
}

/// Ordered absolute segment URLs of a subtitle media manifest
pub fn enumerate_segments(media: &ManifestDocument) -> Vec<Url> {
    let segments: Vec<Url> = media
        .content_lines()
        .filter(|line| is_segment_candidate(line))
        .filter_map(|line| media.resolve(line))
        .collect();
    debug!("Found {} segment(s) in {}", segments.len(), media.url);
    segments
}
