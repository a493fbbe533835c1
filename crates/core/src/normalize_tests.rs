// SPDX-License-Identifier: MIT

use super::*;
use proptest::prelude::*;

#[test]
fn collapses_trims_and_lowercases() {
    assert_eq!(normalize("  Song   Name  "), "song name");
    assert_eq!(normalize("The\tArtist"), "the artist");
    assert_eq!(normalize("Album\n\nTitle"), "album title");
    assert_eq!(normalize(""), "");
    assert_eq!(normalize("   "), "");
}

#[test]
fn metadata_key_requires_title_and_artist() {
    assert!(MetadataKey::new("Song", "Artist", "Album").is_some());
    assert!(MetadataKey::new("", "Artist", "Album").is_none());
    assert!(MetadataKey::new("Song", "", "Album").is_none());
    assert!(MetadataKey::new("Song", "   ", "Album").is_none());
    // Album may be empty.
    assert!(MetadataKey::new("Song", "Artist", "").is_some());
}

#[test]
fn equivalent_metadata_produces_equal_keys() {
    let a = MetadataKey::new("  Song  Name ", "THE ARTIST", "The  Album").unwrap();
    let b = MetadataKey::new("song name", "the artist", "the album").unwrap();
    assert_eq!(a, b);
}

proptest! {
    #[test]
    fn normalize_is_idempotent(s in ".{0,64}") {
        let once = normalize(&s);
        prop_assert_eq!(normalize(&once), once.clone());
    }

    #[test]
    fn normalize_has_no_double_spaces(s in ".{0,64}") {
        let n = normalize(&s);
        prop_assert!(!n.contains("  "));
        prop_assert_eq!(n.trim(), n.as_str());
    }
}
