use once_cell::sync::Lazy;
use regex::Regex;

use super::starts_with_ignore_case;

// @const: One KEY=VALUE pair of an attribute list, VALUE optionally quoted
static ATTRIBUTE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"([A-Za-z0-9_-]+)\s*=\s*("[^"]*"|[^,]*)"#).unwrap()
});

/// Media-entry tag (`#EXT-X-MEDIA:`)
pub const MEDIA_TAG: &str = "#EXT-X-MEDIA:";

/// Variant-stream tag (`#EXT-X-STREAM-INF:`)
pub const STREAM_INF_TAG: &str = "#EXT-X-STREAM-INF:";

/// Parsed attribute list of a playlist tag
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeList {
    pairs: Vec<(String, String)>,
}

impl AttributeList {
    /// Parse a comma-separated `KEY=VALUE` list; quotes around values are removed
    pub fn parse(input: &str) -> Self {
        let pairs = ATTRIBUTE_REGEX
            .captures_iter(input)
            .map(|caps| {
                let key = caps[1].to_ascii_uppercase();
                let raw = caps[2].trim();
                let value = raw
                    .strip_prefix('"')
                    .and_then(|v| v.strip_suffix('"'))
                    .unwrap_or(raw);
                (key, value.to_string())
            })
            .collect();
        Self { pairs }
    }

    /// First value for a key, keys compared case-insensitively
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    /// Whether a key holds the given enumerated value (case-insensitive)
    pub fn value_is(&self, key: &str, expected: &str) -> bool {
        self.get(key).is_some_and(|v| v.eq_ignore_ascii_case(expected))
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// Attribute list of a line if it carries `tag`, e.g. `#EXT-X-MEDIA:`
pub fn tag_attributes(line: &str, tag: &str) -> Option<AttributeList> {
    let line = line.trim();
    if starts_with_ignore_case(line, tag) {
        Some(AttributeList::parse(&line[tag.len()..]))
    } else {
        None
    }
}

/// One `#EXT-X-MEDIA` entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaEntry {
    /// 0-based line number in the manifest
    pub line: usize,
    pub attributes: AttributeList,
}

impl MediaEntry {
    pub fn is_subtitles(&self) -> bool {
        self.attributes.value_is("TYPE", "SUBTITLES")
    }

    pub fn group_id(&self) -> Option<&str> {
        self.attributes.get("GROUP-ID")
    }

    pub fn uri(&self) -> Option<&str> {
        self.attributes.get("URI").filter(|uri| !uri.trim().is_empty())
    }
}

/// All `#EXT-X-MEDIA` entries of a manifest, in order
pub fn media_entries(text: &str) -> Vec<MediaEntry> {
    text.lines()
        .enumerate()
        .filter_map(|(line, content)| {
            tag_attributes(content, MEDIA_TAG).map(|attributes| MediaEntry { line, attributes })
        })
        .collect()
}

/// Subtitle group names referenced by `#EXT-X-STREAM-INF` entries, in order
pub fn variant_subtitle_groups(text: &str) -> Vec<String> {
    text.lines()
        .filter_map(|line| tag_attributes(line, STREAM_INF_TAG))
        .filter_map(|attributes| attributes.get("SUBTITLES").map(str::to_string))
        .filter(|group| !group.is_empty())
        .collect()
}
