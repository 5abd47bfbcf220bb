//! SQL schema for the Murmur SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- Timestamps are INTEGER milliseconds since the Unix epoch; ids are 24-char
-- lowercase hex, so TEXT comparison matches id ordering.

CREATE TABLE IF NOT EXISTS posts (
    post_id       TEXT PRIMARY KEY,
    author_id     TEXT NOT NULL,
    body          TEXT NOT NULL,
    created_at_ms INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS comments (
    comment_id    TEXT PRIMARY KEY,
    post_id       TEXT NOT NULL REFERENCES posts(post_id),
    author_id     TEXT NOT NULL,
    body          TEXT NOT NULL,
    created_at_ms INTEGER NOT NULL
);

-- One row per (kind, actor, target, sub-target, role).
-- sub_target_id and role use '' for absent: NULLs never collide inside a
-- UNIQUE constraint, which would let duplicates through.
CREATE TABLE IF NOT EXISTS interactions (
    interaction_id TEXT PRIMARY KEY,
    kind           TEXT NOT NULL,              -- 'like' | 'participation'
    actor_id       TEXT NOT NULL,
    target_id      TEXT NOT NULL,
    sub_target_id  TEXT NOT NULL DEFAULT '',
    role           TEXT NOT NULL DEFAULT '',   -- participant role or ''
    created_at_ms  INTEGER NOT NULL,
    UNIQUE (kind, actor_id, target_id, sub_target_id, role)
);

CREATE INDEX IF NOT EXISTS posts_feed_idx
    ON posts(created_at_ms, post_id);
CREATE INDEX IF NOT EXISTS comments_post_idx
    ON comments(post_id, created_at_ms, comment_id);
CREATE INDEX IF NOT EXISTS interactions_target_idx
    ON interactions(target_id, kind, created_at_ms, interaction_id);
CREATE INDEX IF NOT EXISTS interactions_sub_target_idx
    ON interactions(sub_target_id);

PRAGMA user_version = 1;
";
