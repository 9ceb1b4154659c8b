/*!
 * HLS manifest handling.
 *
 * - `attributes`: `#EXT-X-...:KEY=VALUE,...` tag parsing
 * - `locator`: finding the subtitle track inside a master manifest
 * - `enumerator`: listing segment URLs of a subtitle media manifest
 *
 * Content is classified by sniffing its first bytes, never by URL
 * extension: manifest URLs routinely carry query strings, have no extension
 * at all, or get redirected by a CDN.
 */

use log::warn;
use serde::Serialize;
use std::fmt;
use url::Url;

use crate::fetch::FetchedText;

pub mod attributes;
pub mod enumerator;
pub mod locator;

pub use enumerator::enumerate_segments;
pub use locator::{locate, Located, TrackReference};

/// Magic first token of a WebVTT caption document
pub const CAPTION_HEADER: &str = "WEBVTT";

/// Magic first line of every HLS playlist
pub const PLAYLIST_HEADER: &str = "#EXTM3U";

/// Marker contained in caption segment references
pub const CAPTION_EXTENSION: &str = ".vtt";

const BOM: char = '\u{feff}';

/// Kind of a fetched document, decided from its content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ManifestKind {
    /// Already a terminal caption document
    CaptionDocument,
    /// Top-level playlist referencing renditions
    MasterManifest,
    /// Playlist referencing segment files
    MediaManifest,
    /// Anything else
    Unrecognized,
}

impl ManifestKind {
    /// Whether this is an HLS playlist of either level
    pub fn is_playlist(&self) -> bool {
        matches!(self, Self::MasterManifest | Self::MediaManifest)
    }
}

impl fmt::Display for ManifestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::CaptionDocument => "caption document",
            Self::MasterManifest => "master manifest",
            Self::MediaManifest => "media manifest",
            Self::Unrecognized => "unrecognized",
        };
        f.write_str(name)
    }
}

/// Fetched text together with the URL its relative references resolve against
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestDocument {
    /// Final URL of the document
    pub url: Url,
    /// Raw content, exactly as received
    pub text: String,
}

impl ManifestDocument {
    pub fn new(url: Url, text: impl Into<String>) -> Self {
        Self { url, text: text.into() }
    }

    /// Classify the content of this document
    pub fn kind(&self) -> ManifestKind {
        classify(&self.text)
    }

    /// Non-empty lines that are not tags or comments, trimmed
    pub fn content_lines(&self) -> impl Iterator<Item = &str> {
        content_lines(&self.text)
    }

    /// Resolve a possibly relative reference against this document's URL
    pub fn resolve(&self, reference: &str) -> Option<Url> {
        resolve_reference(&self.url, reference)
    }
}

impl From<FetchedText> for ManifestDocument {
    fn from(fetched: FetchedText) -> Self {
        Self::new(fetched.url, fetched.body)
    }
}

/// Classify text by its leading bytes.
///
/// Leading whitespace and a UTF-8 byte-order mark are ignored and the
/// comparison is case-insensitive. Playlists are split into master and
/// media by the tags they carry; a playlist with neither kind of tag counts
/// as a master manifest.
pub fn classify(text: &str) -> ManifestKind {
    let head = leading_content(text);

    if starts_with_ignore_case(head, CAPTION_HEADER) {
        return ManifestKind::CaptionDocument;
    }

    if !starts_with_ignore_case(head, PLAYLIST_HEADER) {
        return ManifestKind::Unrecognized;
    }

    let mut has_segments = false;
    for line in head.lines().map(str::trim) {
        if starts_with_ignore_case(line, "#EXT-X-STREAM-INF") || starts_with_ignore_case(line, "#EXT-X-MEDIA:") {
            return ManifestKind::MasterManifest;
        }
        if starts_with_ignore_case(line, "#EXTINF") || starts_with_ignore_case(line, "#EXT-X-TARGETDURATION") {
            has_segments = true;
        }
    }

    if has_segments {
        ManifestKind::MediaManifest
    } else {
        ManifestKind::MasterManifest
    }
}

/// Whether text already is a caption document
pub fn is_caption_document(text: &str) -> bool {
    classify(text) == ManifestKind::CaptionDocument
}

/// Non-empty, non-`#` lines of a playlist, trimmed
pub fn content_lines(text: &str) -> impl Iterator<Item = &str> {
    text.lines()
        .map(|line| line.trim_matches(|c: char| c.is_whitespace() || c == BOM))
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
}

/// Resolve `reference` against `base`, logging and skipping failures
pub fn resolve_reference(base: &Url, reference: &str) -> Option<Url> {
    match base.join(reference.trim()) {
        Ok(url) => Some(url),
        Err(e) => {
            warn!("Skipping unresolvable reference '{}' in {}: {}", reference, base, e);
            None
        }
    }
}

/// Whether a reference looks like a caption segment
pub fn has_caption_extension(reference: &str) -> bool {
    reference.to_ascii_lowercase().contains(CAPTION_EXTENSION)
}

fn leading_content(text: &str) -> &str {
    text.trim_start_matches(|c: char| c.is_whitespace() || c == BOM)
}

pub(crate) fn starts_with_ignore_case(text: &str, prefix: &str) -> bool {
    text.len() >= prefix.len()
        && text.is_char_boundary(prefix.len())
        && text[..prefix.len()].eq_ignore_ascii_case(prefix)
}
