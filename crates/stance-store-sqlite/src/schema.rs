//! SQL schema for the Stance SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- One row per identity. The primary key is the uniqueness authority for
-- concurrent creates.
CREATE TABLE IF NOT EXISTS profiles (
    id                    TEXT PRIMARY KEY,
    email                 TEXT NOT NULL CHECK (email <> ''),
    political_affiliation TEXT NOT NULL CHECK (political_affiliation <> ''),
    survey                TEXT NOT NULL DEFAULT '{}'  -- JSON object: key -> {\"wouldCite\": bool|null}
);

PRAGMA user_version = 1;
";
