// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Submission audit trail: an append-only SQLite log, one row per submission
// that reached a terminal state.
//
// Schema:
//   submission_log(
//     id             INTEGER PRIMARY KEY AUTOINCREMENT,
//     timestamp      TEXT    NOT NULL,   -- RFC 3339
//     submission_id  TEXT    NOT NULL,
//     group_id       TEXT    NOT NULL,
//     destination_id TEXT    NOT NULL,
//     document_hash  TEXT    NOT NULL,   -- SHA-256 hex digest
//     success        INTEGER NOT NULL,   -- 0 = failure, 1 = success
//     job_id         INTEGER,            -- print service job id on success
//     reason         TEXT,               -- failure kind on failure
//     details        TEXT                -- internal diagnostic detail
//   )

use std::path::Path;

use chrono::Utc;
use printdesk_core::error::PrintdeskError;
use rusqlite::{Connection, params};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

const CREATE_TABLE_SQL: &str = "
    CREATE TABLE IF NOT EXISTS submission_log (
        id             INTEGER PRIMARY KEY AUTOINCREMENT,
        timestamp      TEXT    NOT NULL,
        submission_id  TEXT    NOT NULL,
        group_id       TEXT    NOT NULL,
        destination_id TEXT    NOT NULL,
        document_hash  TEXT    NOT NULL,
        success        INTEGER NOT NULL,
        job_id         INTEGER,
        reason         TEXT,
        details        TEXT
    );
    CREATE INDEX IF NOT EXISTS submission_log_group ON submission_log (group_id);
";

const SELECT_COLUMNS: &str = "SELECT id, timestamp, submission_id, group_id, destination_id,
            document_hash, success, job_id, reason, details
     FROM submission_log";

/// Convert a `rusqlite::Error` into a `PrintdeskError::Database`.
fn db_err(e: rusqlite::Error) -> PrintdeskError {
    PrintdeskError::Database(e.to_string())
}

/// Fields recorded for one finished submission.
#[derive(Debug, Clone)]
pub struct AuditRecord<'a> {
    pub submission_id: &'a str,
    pub group_id: &'a str,
    pub destination_id: &'a str,
    pub document_hash: &'a str,
    pub success: bool,
    pub job_id: Option<i32>,
    pub reason: Option<&'a str>,
    pub details: Option<&'a str>,
}

/// A stored audit row, used for queries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: i64,
    pub timestamp: String,
    pub submission_id: String,
    pub group_id: String,
    pub destination_id: String,
    pub document_hash: String,
    pub success: bool,
    pub job_id: Option<i32>,
    pub reason: Option<String>,
    pub details: Option<String>,
}

/// Append-only submission log backed by a SQLite database.
///
/// All methods are synchronous; the connection is `Send` but not `Sync`, so
/// shared owners wrap it in a mutex.
pub struct AuditLog {
    conn: Connection,
}

impl AuditLog {
    /// Open (or create) the audit database at `path`.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self, PrintdeskError> {
        let conn = Connection::open(path).map_err(db_err)?;

        // Enable WAL for concurrent readers.
        conn.execute_batch("PRAGMA journal_mode = WAL;")
            .map_err(db_err)?;
        conn.execute_batch(CREATE_TABLE_SQL).map_err(db_err)?;

        debug!("audit log opened");
        Ok(Self { conn })
    }

    /// Open an in-memory audit database (useful for tests).
    pub fn open_in_memory() -> Result<Self, PrintdeskError> {
        let conn = Connection::open_in_memory().map_err(db_err)?;
        conn.execute_batch(CREATE_TABLE_SQL).map_err(db_err)?;

        debug!("in-memory audit log opened");
        Ok(Self { conn })
    }

    /// Append one entry.
    #[instrument(skip(self, record), fields(submission_id = %record.submission_id, success = record.success))]
    pub fn record(&self, record: &AuditRecord<'_>) -> Result<(), PrintdeskError> {
        let timestamp = Utc::now().to_rfc3339();
        let success_int: i32 = if record.success { 1 } else { 0 };

        self.conn
            .execute(
                "INSERT INTO submission_log (timestamp, submission_id, group_id, destination_id,
                     document_hash, success, job_id, reason, details)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    timestamp,
                    record.submission_id,
                    record.group_id,
                    record.destination_id,
                    record.document_hash,
                    success_int,
                    record.job_id,
                    record.reason,
                    record.details,
                ],
            )
            .map_err(db_err)?;

        debug!("audit entry recorded");
        Ok(())
    }

    /// All entries for one group, oldest first.
    pub fn entries_for_group(&self, group_id: &str) -> Result<Vec<AuditEntry>, PrintdeskError> {
        self.query(
            &format!("{SELECT_COLUMNS} WHERE group_id = ?1 ORDER BY id ASC"),
            params![group_id],
        )
    }

    /// The most recent `limit` entries, newest first.
    pub fn recent_entries(&self, limit: u32) -> Result<Vec<AuditEntry>, PrintdeskError> {
        self.query(
            &format!("{SELECT_COLUMNS} ORDER BY id DESC LIMIT ?1"),
            params![limit],
        )
    }

    /// Return the total number of entries in the audit log.
    pub fn count(&self) -> Result<u64, PrintdeskError> {
        self.conn
            .query_row("SELECT COUNT(*) FROM submission_log", [], |row| row.get(0))
            .map_err(db_err)
    }

    fn query(
        &self,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> Result<Vec<AuditEntry>, PrintdeskError> {
        let mut stmt = self.conn.prepare(sql).map_err(db_err)?;
        let rows = stmt
            .query_map(params, |row| {
                Ok(AuditEntry {
                    id: row.get(0)?,
                    timestamp: row.get(1)?,
                    submission_id: row.get(2)?,
                    group_id: row.get(3)?,
                    destination_id: row.get(4)?,
                    document_hash: row.get(5)?,
                    success: row.get::<_, i32>(6)? != 0,
                    job_id: row.get(7)?,
                    reason: row.get(8)?,
                    details: row.get(9)?,
                })
            })
            .map_err(db_err)?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(row.map_err(db_err)?);
        }
        Ok(entries)
    }
}
