// SPDX-License-Identifier: MIT

//! Catalog schema bootstrap.
//!
//! Applied idempotently when a [`Catalog`](crate::Catalog) opens. Every
//! entity table a commit writes carries the provenance triple
//! `(import_job_id, import_source, import_source_id)` so rows stay
//! attributable to the job that created them.

/// DDL statements, executed in order.
pub(crate) const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS stations (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        short_code TEXT NOT NULL DEFAULT '',
        description TEXT NOT NULL DEFAULT '',
        owner_user_id TEXT,
        created_at TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS mounts (
        id TEXT PRIMARY KEY,
        station_id TEXT NOT NULL REFERENCES stations(id),
        name TEXT NOT NULL,
        url TEXT NOT NULL,
        format TEXT NOT NULL,
        bitrate INTEGER NOT NULL,
        channels INTEGER NOT NULL,
        sample_rate INTEGER NOT NULL,
        created_at TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS media_items (
        id TEXT PRIMARY KEY,
        station_id TEXT NOT NULL,
        title TEXT NOT NULL DEFAULT '',
        artist TEXT NOT NULL DEFAULT '',
        album TEXT NOT NULL DEFAULT '',
        genre TEXT NOT NULL DEFAULT '',
        duration_ms INTEGER NOT NULL DEFAULT 0,
        file_size INTEGER NOT NULL DEFAULT 0,
        content_hash TEXT NOT NULL DEFAULT '',
        storage_key TEXT NOT NULL DEFAULT '',
        url TEXT NOT NULL DEFAULT '',
        import_job_id TEXT NOT NULL DEFAULT '',
        import_source TEXT NOT NULL DEFAULT '',
        import_source_id TEXT NOT NULL DEFAULT '',
        created_at TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_media_content_hash
        ON media_items(content_hash)",
    "CREATE INDEX IF NOT EXISTS idx_media_import_job
        ON media_items(import_job_id)",
    "CREATE TABLE IF NOT EXISTS media_tag_links (
        id TEXT PRIMARY KEY,
        media_id TEXT NOT NULL REFERENCES media_items(id),
        kind TEXT NOT NULL,
        value TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS playlists (
        id TEXT PRIMARY KEY,
        station_id TEXT NOT NULL,
        name TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        import_job_id TEXT NOT NULL DEFAULT '',
        import_source TEXT NOT NULL DEFAULT '',
        import_source_id TEXT NOT NULL DEFAULT '',
        created_at TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS playlist_items (
        id TEXT PRIMARY KEY,
        playlist_id TEXT NOT NULL REFERENCES playlists(id),
        media_id TEXT NOT NULL,
        position INTEGER NOT NULL,
        fade_in_ms INTEGER NOT NULL DEFAULT 0,
        fade_out_ms INTEGER NOT NULL DEFAULT 0
    )",
    "CREATE TABLE IF NOT EXISTS smart_blocks (
        id TEXT PRIMARY KEY,
        station_id TEXT NOT NULL,
        name TEXT NOT NULL,
        criteria TEXT NOT NULL DEFAULT '{}',
        track_order TEXT NOT NULL DEFAULT 'random',
        track_limit INTEGER NOT NULL DEFAULT 10,
        repeat_tracks INTEGER NOT NULL DEFAULT 0,
        import_job_id TEXT NOT NULL DEFAULT '',
        import_source TEXT NOT NULL DEFAULT '',
        import_source_id TEXT NOT NULL DEFAULT '',
        created_at TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS shows (
        id TEXT PRIMARY KEY,
        station_id TEXT NOT NULL,
        name TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        rrule TEXT NOT NULL,
        dtstart TEXT,
        timezone TEXT NOT NULL DEFAULT 'UTC',
        duration_minutes INTEGER NOT NULL DEFAULT 0,
        import_job_id TEXT NOT NULL DEFAULT '',
        import_source TEXT NOT NULL DEFAULT '',
        import_source_id TEXT NOT NULL DEFAULT '',
        created_at TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS show_instances (
        id TEXT PRIMARY KEY,
        show_id TEXT NOT NULL REFERENCES shows(id),
        starts_at TEXT NOT NULL,
        ends_at TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS clock_hours (
        id TEXT PRIMARY KEY,
        station_id TEXT NOT NULL,
        name TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        import_job_id TEXT NOT NULL DEFAULT '',
        import_source TEXT NOT NULL DEFAULT '',
        import_source_id TEXT NOT NULL DEFAULT '',
        created_at TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS webstreams (
        id TEXT PRIMARY KEY,
        station_id TEXT NOT NULL,
        name TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        urls TEXT NOT NULL DEFAULT '[]',
        active INTEGER NOT NULL DEFAULT 1,
        import_job_id TEXT NOT NULL DEFAULT '',
        import_source TEXT NOT NULL DEFAULT '',
        import_source_id TEXT NOT NULL DEFAULT '',
        created_at TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS jobs (
        id TEXT PRIMARY KEY,
        source_type TEXT NOT NULL,
        status TEXT NOT NULL,
        data TEXT NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS staged_imports (
        id TEXT PRIMARY KEY,
        job_id TEXT NOT NULL,
        status TEXT NOT NULL,
        data TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )",
];

/// Entity tables in FK-safe deletion order (children before parents).
/// Used by full reset; rollback walks the same order.
pub(crate) const RESET_ORDER: &[&str] = &[
    "webstreams",
    "clock_hours",
    "show_instances",
    "shows",
    "playlist_items",
    "playlists",
    "smart_blocks",
    "media_tag_links",
    "media_items",
    "mounts",
    "stations",
];
