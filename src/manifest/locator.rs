/*!
 * Subtitle track discovery inside a master manifest.
 *
 * Strategies run in a fixed priority order and the first one that yields
 * something wins:
 *
 * 1. direct media: an `#EXT-X-MEDIA` entry with `TYPE=SUBTITLES` and a URI
 * 2. group indirection: a variant's `SUBTITLES="group"` pointing at the
 *    subtitle media entry of that group
 * 3. inline segments: caption segment lines listed in the manifest itself
 */

use log::debug;
use serde::Serialize;
use url::Url;

use super::attributes::{media_entries, variant_subtitle_groups, MediaEntry};
use super::{has_caption_extension, ManifestDocument};

/// Absolute URL of a subtitle media manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrackReference {
    /// Media manifest URL, resolved against the declaring manifest
    pub url: Url,
    /// `GROUP-ID` of the declaring media entry
    pub group_id: Option<String>,
}

/// Outcome of the locator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Located {
    /// Subtitle media entry found directly
    DirectMedia(TrackReference),
    /// Subtitle media entry found through a variant's subtitle group
    GroupIndirection(TrackReference),
    /// Caption segments listed inline in the master manifest
    InlineSegments(Vec<Url>),
    /// Nothing usable
    NotFound,
}

impl Located {
    /// Short name of the strategy that produced this result
    pub fn strategy_name(&self) -> &'static str {
        match self {
            Self::DirectMedia(_) => "direct media",
            Self::GroupIndirection(_) => "group indirection",
            Self::InlineSegments(_) => "inline segments",
            Self::NotFound => "not found",
        }
    }
}

type Strategy = fn(&ManifestDocument) -> Option<Located>;

const STRATEGIES: [Strategy; 3] = [direct_media, group_indirection, inline_segments];

/// Find the subtitle track of a master manifest
pub fn locate(master: &ManifestDocument) -> Located {
    let located = STRATEGIES
        .iter()
        .find_map(|strategy| strategy(master))
        .unwrap_or(Located::NotFound);
    debug!("Locator result for {}: {}", master.url, located.strategy_name());
    located
}

fn track_for(master: &ManifestDocument, entry: &MediaEntry) -> Option<TrackReference> {
    let uri = entry.uri()?;
    let url = master.resolve(uri)?;
    Some(TrackReference {
        url,
        group_id: entry.group_id().map(str::to_string),
    })
}

/// First subtitle media entry with a resolvable URI
pub fn direct_media(master: &ManifestDocument) -> Option<Located> {
    media_entries(&master.text)
        .iter()
        .filter(|entry| entry.is_subtitles())
        .find_map(|entry| track_for(master, entry))
        .map(Located::DirectMedia)
}

/// Subtitle media entry of the first variant-referenced group that has one
pub fn group_indirection(master: &ManifestDocument) -> Option<Located> {
    let entries = media_entries(&master.text);
    variant_subtitle_groups(&master.text)
        .iter()
        .find_map(|group| {
            entries
                .iter()
                .filter(|entry| entry.is_subtitles() && entry.group_id() == Some(group.as_str()))
                .find_map(|entry| track_for(master, entry))
        })
        .map(Located::GroupIndirection)
}

/// Caption segment lines of the master manifest itself
pub fn inline_segments(master: &ManifestDocument) -> Option<Located> {
    let urls: Vec<Url> = master
        .content_lines()
        .filter(|line| has_caption_extension(line))
        .filter_map(|line| master.resolve(line))
        .collect();

    if urls.is_empty() {
        None
    } else {
        Some(Located::InlineSegments(urls))
    }
}
