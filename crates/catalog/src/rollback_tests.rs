// SPDX-License-Identifier: MIT

use super::*;
use crate::entities::{ClockHour, Playlist, PlaylistItem, Show, SmartBlock, Webstream};
use crate::media::{MediaItem, Provenance};
use chrono::Utc;

async fn seed_job(catalog: &Catalog, job_id: &str) -> ImportedItems {
    let prov = |source_id: &str| Provenance::new(job_id, "bundle", source_id);
    let now = Utc::now();

    let media = MediaItem {
        id: format!("{job_id}-m1"),
        station_id: "s1".to_string(),
        title: "Track".to_string(),
        genre: "jazz".to_string(),
        import_job_id: job_id.to_string(),
        import_source: "bundle".to_string(),
        import_source_id: "src-m1".to_string(),
        created_at: now,
        ..MediaItem::default()
    };
    catalog.insert_media(&media).await.unwrap();
    catalog
        .insert_media_tag(&format!("{job_id}-t1"), &media.id, "genre", "jazz")
        .await
        .unwrap();

    let playlist = Playlist {
        id: format!("{job_id}-p1"),
        station_id: "s1".to_string(),
        name: "Morning".to_string(),
        provenance: prov("src-p1"),
        created_at: now,
        ..Playlist::default()
    };
    catalog.insert_playlist(&playlist).await.unwrap();
    catalog
        .insert_playlist_item(&PlaylistItem {
            id: format!("{job_id}-pi1"),
            playlist_id: playlist.id.clone(),
            media_id: media.id.clone(),
            position: 0,
            fade_in_ms: 0,
            fade_out_ms: 0,
        })
        .await
        .unwrap();

    let block = SmartBlock {
        id: format!("{job_id}-b1"),
        station_id: "s1".to_string(),
        name: "Random Jazz".to_string(),
        criteria: serde_json::json!({"genre": "jazz"}),
        track_order: "random".to_string(),
        track_limit: 10,
        provenance: prov("src-b1"),
        created_at: now,
        ..SmartBlock::default()
    };
    catalog.insert_smart_block(&block).await.unwrap();

    let show = Show {
        id: format!("{job_id}-sh1"),
        station_id: "s1".to_string(),
        name: "Breakfast".to_string(),
        rrule: "FREQ=WEEKLY;BYDAY=MO;BYHOUR=8;BYMINUTE=0".to_string(),
        timezone: "UTC".to_string(),
        duration_minutes: 60,
        provenance: prov("src-sh1"),
        created_at: now,
        ..Show::default()
    };
    catalog.insert_show(&show).await.unwrap();
    sqlx::query("INSERT INTO show_instances (id, show_id, starts_at, ends_at) VALUES (?, ?, ?, ?)")
        .bind(format!("{job_id}-si1"))
        .bind(&show.id)
        .bind(now)
        .bind(now)
        .execute(catalog.pool())
        .await
        .unwrap();

    let clock = ClockHour {
        id: format!("{job_id}-c1"),
        station_id: "s1".to_string(),
        name: "Late Night".to_string(),
        provenance: prov("src-c1"),
        created_at: now,
        ..ClockHour::default()
    };
    catalog.insert_clock_hour(&clock).await.unwrap();

    let stream = Webstream {
        id: format!("{job_id}-w1"),
        station_id: "s1".to_string(),
        name: "Relay".to_string(),
        urls: vec!["http://stream.example/live".to_string()],
        active: true,
        provenance: prov("src-w1"),
        created_at: now,
        ..Webstream::default()
    };
    catalog.insert_webstream(&stream).await.unwrap();

    ImportedItems {
        media_ids: vec![media.id],
        playlist_ids: vec![playlist.id],
        smart_block_ids: vec![block.id],
        show_ids: vec![show.id],
        clock_hour_ids: vec![clock.id],
        webstream_ids: vec![stream.id],
    }
}

#[tokio::test]
async fn rollback_deletes_all_job_rows() {
    let catalog = Catalog::open_in_memory().await.unwrap();
    let items = seed_job(&catalog, "job-1").await;

    // media + tag link + playlist + item + block + show + instance +
    // clock + webstream
    let deleted = catalog.rollback_items(&items).await.unwrap();
    assert_eq!(deleted, 9);

    for table in [
        "media_items",
        "playlists",
        "smart_blocks",
        "shows",
        "clock_hours",
        "webstreams",
    ] {
        assert_eq!(
            catalog.count_rows_for_job(table, "job-1").await.unwrap(),
            0,
            "{table} should have no rows for job-1"
        );
    }
    // Child tables are empty too.
    for table in ["media_tag_links", "playlist_items", "show_instances"] {
        let sql = format!("SELECT COUNT(*) FROM {table}");
        let (count,): (i64,) = sqlx::query_as(&sql)
            .fetch_one(catalog.pool())
            .await
            .unwrap();
        assert_eq!(count, 0, "{table} should be empty");
    }
}

#[tokio::test]
async fn rollback_leaves_other_jobs_untouched() {
    let catalog = Catalog::open_in_memory().await.unwrap();
    let items_one = seed_job(&catalog, "job-1").await;
    seed_job(&catalog, "job-2").await;

    catalog.rollback_items(&items_one).await.unwrap();

    assert_eq!(
        catalog
            .count_rows_for_job("media_items", "job-2")
            .await
            .unwrap(),
        1
    );
    assert_eq!(
        catalog.count_rows_for_job("shows", "job-2").await.unwrap(),
        1
    );
}

#[tokio::test]
async fn rollback_empty_items_deletes_nothing() {
    let catalog = Catalog::open_in_memory().await.unwrap();
    seed_job(&catalog, "job-1").await;

    let deleted = catalog.rollback_items(&ImportedItems::default()).await.unwrap();
    assert_eq!(deleted, 0);
}

#[tokio::test]
async fn reconstruct_imported_items_from_provenance() {
    let catalog = Catalog::open_in_memory().await.unwrap();
    let seeded = seed_job(&catalog, "job-1").await;
    seed_job(&catalog, "job-2").await;

    let rebuilt = catalog.imported_items_for_job("job-1").await.unwrap();
    assert_eq!(rebuilt, seeded);
}

#[tokio::test]
async fn reset_truncates_catalog_tables() {
    let catalog = Catalog::open_in_memory().await.unwrap();
    seed_job(&catalog, "job-1").await;
    seed_job(&catalog, "job-2").await;

    let deleted = catalog.reset_imported_data().await.unwrap();
    assert_eq!(deleted, 18);

    let rebuilt = catalog.imported_items_for_job("job-1").await.unwrap();
    assert!(rebuilt.is_empty());
}
