//! SQL schema for the Showcase SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    user_id       TEXT PRIMARY KEY,
    username      TEXT NOT NULL UNIQUE,
    display_name  TEXT NOT NULL,
    bio           TEXT,
    role          TEXT NOT NULL DEFAULT 'user',  -- 'user' | 'admin' | 'super_admin'
    password_hash TEXT NOT NULL,
    created_at    TEXT NOT NULL
);

-- Only the SHA-256 of a bearer token is stored.
CREATE TABLE IF NOT EXISTS sessions (
    token_hash TEXT PRIMARY KEY,
    user_id    TEXT NOT NULL REFERENCES users(user_id),
    created_at TEXT NOT NULL,
    expires_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS follows (
    follower_id TEXT NOT NULL REFERENCES users(user_id),
    followee_id TEXT NOT NULL REFERENCES users(user_id),
    created_at  TEXT NOT NULL,
    PRIMARY KEY (follower_id, followee_id),
    CHECK (follower_id != followee_id)
);

-- The four soft-delete columns move together; the CHECK keeps them honest.
CREATE TABLE IF NOT EXISTS projects (
    project_id              TEXT PRIMARY KEY,
    owner_id                TEXT NOT NULL REFERENCES users(user_id),
    title                   TEXT NOT NULL,
    description             TEXT NOT NULL DEFAULT '',
    repo_url                TEXT,
    tags                    TEXT NOT NULL DEFAULT '[]',
    created_at              TEXT NOT NULL,
    is_deleted              INTEGER NOT NULL DEFAULT 0,
    deleted_at              TEXT,
    deleted_by              TEXT,
    restore_available_until TEXT,
    CHECK (
      (is_deleted = 0 AND deleted_at IS NULL AND deleted_by IS NULL
        AND restore_available_until IS NULL)
      OR
      (is_deleted = 1 AND deleted_at IS NOT NULL AND deleted_by IS NOT NULL
        AND restore_available_until IS NOT NULL)
    )
);

CREATE TABLE IF NOT EXISTS likes (
    project_id TEXT NOT NULL REFERENCES projects(project_id),
    user_id    TEXT NOT NULL REFERENCES users(user_id),
    created_at TEXT NOT NULL,
    PRIMARY KEY (project_id, user_id)
);

CREATE TABLE IF NOT EXISTS shares (
    share_id   TEXT PRIMARY KEY,
    project_id TEXT NOT NULL REFERENCES projects(project_id),
    user_id    TEXT NOT NULL REFERENCES users(user_id),
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS comments (
    comment_id TEXT PRIMARY KEY,
    project_id TEXT NOT NULL REFERENCES projects(project_id),
    author_id  TEXT NOT NULL REFERENCES users(user_id),
    body       TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS chats (
    chat_id    TEXT PRIMARY KEY,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS chat_participants (
    chat_id TEXT NOT NULL REFERENCES chats(chat_id),
    user_id TEXT NOT NULL REFERENCES users(user_id),
    PRIMARY KEY (chat_id, user_id)
);

-- Messages are soft-deleted in place; restoration_token is set only while
-- a message is deleted.
CREATE TABLE IF NOT EXISTS messages (
    message_id              TEXT PRIMARY KEY,
    chat_id                 TEXT NOT NULL REFERENCES chats(chat_id),
    sender_id               TEXT NOT NULL REFERENCES users(user_id),
    body                    TEXT NOT NULL,
    sent_at                 TEXT NOT NULL,
    seq                     INTEGER NOT NULL,
    is_deleted              INTEGER NOT NULL DEFAULT 0,
    deleted_at              TEXT,
    deleted_by              TEXT,
    restore_available_until TEXT,
    restoration_token       TEXT UNIQUE,
    UNIQUE (chat_id, seq),
    CHECK (
      (is_deleted = 0 AND deleted_at IS NULL AND deleted_by IS NULL
        AND restore_available_until IS NULL AND restoration_token IS NULL)
      OR
      (is_deleted = 1 AND deleted_at IS NOT NULL AND deleted_by IS NOT NULL
        AND restore_available_until IS NOT NULL)
    )
);

CREATE TABLE IF NOT EXISTS reports (
    report_id       TEXT PRIMARY KEY,
    reporter_id     TEXT NOT NULL REFERENCES users(user_id),
    target_kind     TEXT NOT NULL,   -- 'project' | 'user' | 'message'
    target_id       TEXT NOT NULL,
    reason          TEXT NOT NULL,
    status          TEXT NOT NULL DEFAULT 'open',
    resolved_by     TEXT,
    resolution_note TEXT,
    created_at      TEXT NOT NULL,
    resolved_at     TEXT
);

-- Append-only audit log.
CREATE TABLE IF NOT EXISTS activity (
    activity_id TEXT PRIMARY KEY,
    actor_id    TEXT NOT NULL,
    action      TEXT NOT NULL,
    target_id   TEXT NOT NULL,
    detail      TEXT,
    recorded_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS projects_owner_idx    ON projects(owner_id);
CREATE INDEX IF NOT EXISTS projects_deleted_idx  ON projects(is_deleted, deleted_by);
CREATE INDEX IF NOT EXISTS comments_project_idx  ON comments(project_id);
CREATE INDEX IF NOT EXISTS messages_chat_idx     ON messages(chat_id, seq);
CREATE INDEX IF NOT EXISTS messages_deleted_idx  ON messages(is_deleted, deleted_by);
CREATE INDEX IF NOT EXISTS reports_status_idx    ON reports(status);
CREATE INDEX IF NOT EXISTS activity_recorded_idx ON activity(recorded_at);

PRAGMA user_version = 1;
";
