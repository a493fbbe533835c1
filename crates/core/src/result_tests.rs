// SPDX-License-Identifier: MIT

use super::*;

#[test]
fn skip_counts_per_bucket() {
    let mut result = ImportResult::default();
    result.skip("media_download_failed");
    result.skip("media_download_failed");
    result.skip("playlist_items_no_media");

    assert_eq!(result.skipped["media_download_failed"], 2);
    assert_eq!(result.skipped["playlist_items_no_media"], 1);
    assert_eq!(result.total_skipped(), 3);
}

#[test]
fn skipped_preserves_insertion_order() {
    let mut result = ImportResult::default();
    result.skip("zeta");
    result.skip("alpha");
    result.skip("zeta");

    let keys: Vec<&str> = result.skipped.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["zeta", "alpha"]);
}

#[test]
fn imported_items_empty_and_total() {
    let mut items = ImportedItems::default();
    assert!(items.is_empty());
    assert_eq!(items.total(), 0);

    items.media_ids.push("m1".to_string());
    items.show_ids.push("s1".to_string());
    items.clock_hour_ids.push("c1".to_string());
    assert!(!items.is_empty());
    assert_eq!(items.total(), 3);
}

#[test]
fn result_serde_round_trip() {
    let mut result = ImportResult {
        media_imported: 5,
        schedules_created: 2,
        ..ImportResult::default()
    };
    result.skip("media_duration_zero");
    result.warn("2 media items have zero duration");
    result.mappings.push(Mapping {
        old_id: "src-1".to_string(),
        new_id: "new-1".to_string(),
        kind: "media".to_string(),
        name: "Track".to_string(),
    });

    let json = serde_json::to_string(&result).unwrap();
    let restored: ImportResult = serde_json::from_str(&json).unwrap();
    assert_eq!(restored, result);
}
