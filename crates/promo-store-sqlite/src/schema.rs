//! SQL schema for the promotions SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS rewards (
    reward_id    TEXT PRIMARY KEY,
    reward_type  TEXT NOT NULL,    -- 'item' | 'meso' | 'point'
    quantity     INTEGER NOT NULL CHECK (quantity >= 1),
    item_id      TEXT,
    description  TEXT,
    created_at   TEXT NOT NULL,
    updated_at   TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS conditions (
    condition_id  TEXT PRIMARY KEY,
    category      TEXT NOT NULL,    -- 'attendance' | 'invite' | 'quest'
    sub_type      TEXT NOT NULL,
    target        TEXT,
    description   TEXT,
    created_at    TEXT NOT NULL,
    updated_at    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS events (
    event_id       TEXT PRIMARY KEY,
    title          TEXT NOT NULL,
    category       TEXT NOT NULL,
    trigger_type   TEXT NOT NULL,  -- 'manual' | 'auto'
    delivery_type  TEXT NOT NULL,  -- 'immediate' | 'manual_claim' | 'scheduled'
    start_at       TEXT NOT NULL,
    end_at         TEXT NOT NULL,
    is_active      INTEGER NOT NULL DEFAULT 0,
    condition_ids  TEXT NOT NULL DEFAULT '[]',  -- JSON array of UUIDs
    reward_ids     TEXT NOT NULL DEFAULT '[]',  -- ordered JSON array of UUIDs
    created_at     TEXT NOT NULL,
    updated_at     TEXT NOT NULL
);

-- One request per user per event, ever. The UNIQUE constraint is the only
-- thing standing between two concurrent claims for the same pair.
CREATE TABLE IF NOT EXISTS reward_requests (
    request_id       TEXT PRIMARY KEY,
    user_id          TEXT NOT NULL,
    event_id         TEXT NOT NULL,
    trigger_type     TEXT NOT NULL,
    delivery_type    TEXT NOT NULL,
    reward_snapshot  TEXT NOT NULL,   -- JSON; written once, never updated
    status           TEXT NOT NULL DEFAULT 'pending',
    requested_at     TEXT NOT NULL,
    reason           TEXT,
    processed_at     TEXT,
    created_at       TEXT NOT NULL,
    updated_at       TEXT NOT NULL,
    UNIQUE (user_id, event_id)
);

-- Strictly append-only. No UPDATE or DELETE is ever issued against this
-- table.
CREATE TABLE IF NOT EXISTS delivery_history (
    delivery_id   TEXT PRIMARY KEY,
    user_id       TEXT NOT NULL,
    event_id      TEXT NOT NULL,
    reward_id     TEXT NOT NULL,   -- originating request_id
    quantity      INTEGER NOT NULL,
    item_id       TEXT,
    requested_at  TEXT NOT NULL,
    delivered_at  TEXT NOT NULL,
    created_at    TEXT NOT NULL,
    updated_at    TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS requests_status_idx    ON reward_requests(status);
CREATE INDEX IF NOT EXISTS requests_created_idx   ON reward_requests(created_at);
CREATE INDEX IF NOT EXISTS requests_event_idx     ON reward_requests(event_id);
CREATE INDEX IF NOT EXISTS history_user_event_idx ON delivery_history(user_id, event_id);
CREATE INDEX IF NOT EXISTS history_delivered_idx  ON delivery_history(delivered_at);
CREATE INDEX IF NOT EXISTS history_reward_idx     ON delivery_history(reward_id);

PRAGMA user_version = 1;
";
