//! SQL schema for the WalkBuddy SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS identities (
    identity_id   TEXT PRIMARY KEY,
    email         TEXT NOT NULL UNIQUE COLLATE NOCASE,
    password_hash TEXT NOT NULL,   -- argon2 PHC string
    created_at    TEXT NOT NULL    -- ISO 8601 UTC
);

-- At most one signed-in identity per database.
CREATE TABLE IF NOT EXISTS current_session (
    slot         INTEGER PRIMARY KEY CHECK (slot = 0),
    identity_id  TEXT NOT NULL REFERENCES identities(identity_id),
    signed_in_at TEXT NOT NULL
);

-- Profile documents keyed by identity id. The body is the JSON document
-- exactly as the client wrote it.
CREATE TABLE IF NOT EXISTS profiles (
    profile_key TEXT PRIMARY KEY,
    document    TEXT NOT NULL,
    updated_at  TEXT NOT NULL
);

PRAGMA user_version = 1;
";
