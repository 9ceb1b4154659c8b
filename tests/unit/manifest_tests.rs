/*!
 * Tests for manifest classification, track location and segment listing
 */

use url::Url;

use subweave::manifest::locator::{direct_media, group_indirection, inline_segments};
use subweave::manifest::{classify, enumerate_segments, locate, Located, ManifestDocument, ManifestKind};
use crate::common;

fn doc(path: &str, text: &str) -> ManifestDocument {
    ManifestDocument::new(Url::parse(&common::cdn(path)).unwrap(), text)
}

#[test]
fn test_classify_captionVariants_shouldAllBeCaptionDocuments() {
    for text in ["WEBVTT", "webvtt\n\n1\n00:00.000 --> 00:01.000\nHi", "\n\t WebVtt - title\n", "\u{feff}WEBVTT\n"] {
        assert_eq!(classify(text), ManifestKind::CaptionDocument, "input {:?}", text);
    }
}

#[test]
fn test_classify_isContentBasedNotUrlBased() {
    // Same content classifies the same regardless of the URL it came from
    let a = doc("subs.vtt", "#EXTM3U\n#EXTINF:4,\nx.vtt\n");
    let b = doc("playlist?format=m3u8", "#EXTM3U\n#EXTINF:4,\nx.vtt\n");
    assert_eq!(a.kind(), ManifestKind::MediaManifest);
    assert_eq!(b.kind(), ManifestKind::MediaManifest);

    let html = doc("master.m3u8", "<!DOCTYPE html><title>403</title>");
    assert_eq!(html.kind(), ManifestKind::Unrecognized);
}

#[test]
fn test_locate_directMedia_shouldResolveAgainstMasterRegardlessOfOtherMedia() {
    let other_media = [
        "",
        "#EXT-X-MEDIA:TYPE=AUDIO,GROUP-ID=\"a\",URI=\"audio/a.m3u8\"\n",
        "#EXT-X-MEDIA:TYPE=VIDEO,GROUP-ID=\"v\",URI=\"video/alt.m3u8\"\n",
        "#EXT-X-MEDIA:TYPE=CLOSED-CAPTIONS,GROUP-ID=\"cc\",INSTREAM-ID=\"CC1\"\n",
    ];
    for prefix in other_media {
        for suffix in other_media {
            let text = format!(
                "#EXTM3U\n{}#EXT-X-MEDIA:TYPE=SUBTITLES,GROUP-ID=\"s\",URI=\"subs/en.m3u8\"\n{}",
                prefix, suffix
            );
            let master = doc("hls/master.m3u8", &text);
            match locate(&master) {
                Located::DirectMedia(track) => {
                    assert_eq!(track.url.as_str(), "https://cdn.example.com/title/hls/subs/en.m3u8")
                }
                other => panic!("expected direct media for {:?}, got {:?}", text, other),
            }
        }
    }
}

#[test]
fn test_locate_directMedia_firstMatchWins() {
    let master = doc(
        "master.m3u8",
        "#EXTM3U\n\
         #EXT-X-MEDIA:TYPE=SUBTITLES,LANGUAGE=\"de\",URI=\"de.m3u8\"\n\
         #EXT-X-MEDIA:TYPE=SUBTITLES,LANGUAGE=\"en\",URI=\"en.m3u8\"\n",
    );
    match direct_media(&master) {
        Some(Located::DirectMedia(track)) => assert!(track.url.as_str().ends_with("/de.m3u8")),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_groupIndirection_shouldReturnOnlyMatchingGroup() {
    let groups = ["g1", "g2", "g3"];
    for wanted in groups {
        let mut text = String::from("#EXTM3U\n");
        for group in groups {
            text.push_str(&format!(
                "#EXT-X-MEDIA:TYPE=SUBTITLES,GROUP-ID=\"{}\",URI=\"{}/subs.m3u8\"\n",
                group, group
            ));
        }
        text.push_str(&format!("#EXT-X-STREAM-INF:BANDWIDTH=1000,SUBTITLES=\"{}\"\nvideo.m3u8\n", wanted));

        let master = doc("master.m3u8", &text);
        match group_indirection(&master) {
            Some(Located::GroupIndirection(track)) => {
                assert_eq!(track.url.as_str(), format!("{}{}/subs.m3u8", common::CDN, wanted));
                assert_eq!(track.group_id.as_deref(), Some(wanted));
            }
            other => panic!("expected group {} to be chosen, got {:?}", wanted, other),
        }
    }
}

#[test]
fn test_groupIndirection_mediaOfWrongTypeInGroup_shouldBeIgnored() {
    let master = doc(
        "master.m3u8",
        "#EXTM3U\n\
         #EXT-X-MEDIA:TYPE=AUDIO,GROUP-ID=\"s\",URI=\"audio.m3u8\"\n\
         #EXT-X-MEDIA:TYPE=SUBTITLES,GROUP-ID=\"s\",URI=\"subs.m3u8\"\n\
         #EXT-X-STREAM-INF:BANDWIDTH=1,SUBTITLES=\"s\"\n\
         v.m3u8\n",
    );
    match group_indirection(&master) {
        Some(Located::GroupIndirection(track)) => assert!(track.url.as_str().ends_with("/subs.m3u8")),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_inlineSegments_masterWithVttLines_shouldListThem() {
    let master = doc(
        "live/master.m3u8",
        "#EXTM3U\n#EXT-X-TARGETDURATION:6\n#EXTINF:6,\nchunk_001.vtt\n#EXTINF:6,\nchunk_002.vtt\n",
    );
    assert!(direct_media(&master).is_none());
    assert!(group_indirection(&master).is_none());
    match inline_segments(&master) {
        Some(Located::InlineSegments(urls)) => {
            assert_eq!(urls.len(), 2);
            assert_eq!(urls[0].as_str(), "https://cdn.example.com/title/live/chunk_001.vtt");
            assert_eq!(urls[1].as_str(), "https://cdn.example.com/title/live/chunk_002.vtt");
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_enumerateSegments_shouldChainResolutionThroughMediaUrl() {
    let media = doc(
        "hls/subs/en/index.m3u8",
        &common::media_playlist(&["seg1.vtt", "../shared/seg2.vtt", "https://edge.example.com/seg3.vtt"]),
    );
    let urls: Vec<String> = enumerate_segments(&media).iter().map(|u| u.to_string()).collect();
    assert_eq!(
        urls,
        vec![
            "https://cdn.example.com/title/hls/subs/en/seg1.vtt".to_string(),
            "https://cdn.example.com/title/hls/subs/shared/seg2.vtt".to_string(),
            "https://edge.example.com/seg3.vtt".to_string(),
        ]
    );
}

#[test]
fn test_manifestDocument_isNeverMutatedByScans() {
    let text = common::master_with_subtitles("subs/en.m3u8");
    let master = doc("master.m3u8", &text);
    let before = master.clone();
    let _ = locate(&master);
    let _ = enumerate_segments(&master);
    assert_eq!(master, before);
}
