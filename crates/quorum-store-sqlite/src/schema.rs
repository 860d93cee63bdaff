//! SQL schema for the Quorum SQLite store.
//!
//! Executed once at connection startup. Idempotent thanks to
//! `CREATE TABLE IF NOT EXISTS`; future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- One membership document per principal, keyed by the identity provider's id.
-- role is the UI-tier copy of the admin fact; the session claim is the
-- authoritative copy and lives with the identity provider.
CREATE TABLE IF NOT EXISTS profiles (
    principal_id  TEXT PRIMARY KEY,
    role          TEXT NOT NULL DEFAULT 'member',   -- 'member' | 'admin'
    status        TEXT NOT NULL DEFAULT 'pending',  -- 'pending' | 'approved' | 'rejected'
    suspended     INTEGER NOT NULL DEFAULT 0,
    name          TEXT NOT NULL,
    email         TEXT NOT NULL,
    phone         TEXT,
    bio           TEXT,
    posts         INTEGER NOT NULL DEFAULT 0,
    likes         INTEGER NOT NULL DEFAULT 0,
    events        INTEGER NOT NULL DEFAULT 0,
    connections   INTEGER NOT NULL DEFAULT 0,
    requested_at  TEXT NOT NULL,                    -- ISO 8601 UTC; store-assigned
    last_login_at TEXT
);

-- One-shot suspension messages, consumed on first read.
CREATE TABLE IF NOT EXISTS suspension_notices (
    principal_id TEXT PRIMARY KEY,
    message      TEXT NOT NULL,
    created_at   TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS events (
    event_id           TEXT PRIMARY KEY,
    title              TEXT NOT NULL,
    starts_at          TEXT NOT NULL,
    location           TEXT NOT NULL,
    description        TEXT NOT NULL,
    max_participants   INTEGER NOT NULL DEFAULT 0,  -- 0 = unlimited
    registration_count INTEGER NOT NULL DEFAULT 0,
    status             TEXT NOT NULL DEFAULT 'upcoming',
    created_by         TEXT NOT NULL,
    created_at         TEXT NOT NULL
);

-- No foreign key to events: RSVP cleanup on event deletion is best-effort,
-- and a leftover row must never block deleting the event itself.
CREATE TABLE IF NOT EXISTS rsvps (
    event_id     TEXT NOT NULL,
    principal_id TEXT NOT NULL,
    status       TEXT NOT NULL,  -- 'going' | 'interested'
    updated_at   TEXT NOT NULL,
    PRIMARY KEY (event_id, principal_id)
);

CREATE TABLE IF NOT EXISTS posts (
    post_id       TEXT PRIMARY KEY,
    author_id     TEXT NOT NULL,
    body          TEXT NOT NULL,
    likes_count   INTEGER NOT NULL DEFAULT 0,
    comment_count INTEGER NOT NULL DEFAULT 0,
    created_at    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS likes (
    post_id      TEXT NOT NULL,
    principal_id TEXT NOT NULL,
    created_at   TEXT NOT NULL,
    PRIMARY KEY (post_id, principal_id)
);

-- Comments are top-level; parent_comment_id marks a reply but deleting the
-- parent leaves replies in place.
CREATE TABLE IF NOT EXISTS comments (
    comment_id        TEXT PRIMARY KEY,
    post_id           TEXT NOT NULL,
    author_id         TEXT NOT NULL,
    parent_comment_id TEXT,
    body              TEXT NOT NULL,
    created_at        TEXT NOT NULL
);

-- Strictly append-only. No UPDATE or DELETE is ever issued against this
-- table.
CREATE TABLE IF NOT EXISTS audit_log (
    audit_id     TEXT PRIMARY KEY,
    action       TEXT NOT NULL,
    performed_by TEXT NOT NULL,
    target_id    TEXT,
    changes      TEXT NOT NULL DEFAULT '{}',  -- JSON payload
    created_at   TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS income_transactions (
    tx_id        TEXT PRIMARY KEY,
    amount_cents INTEGER NOT NULL CHECK (amount_cents > 0),
    method       TEXT NOT NULL,
    purpose      TEXT NOT NULL,
    category     TEXT NOT NULL,
    description  TEXT,
    recorded_by  TEXT NOT NULL,
    created_at   TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS rsvps_principal_idx   ON rsvps(principal_id);
CREATE INDEX IF NOT EXISTS comments_post_idx     ON comments(post_id);
CREATE INDEX IF NOT EXISTS audit_created_idx     ON audit_log(created_at);
CREATE INDEX IF NOT EXISTS events_starts_idx     ON events(starts_at);

PRAGMA user_version = 1;
";
