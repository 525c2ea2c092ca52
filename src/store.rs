//! Embedded message store with idempotent, full-row upsert semantics

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use tokio::sync::Mutex;
use tracing::{error, info};

use crate::error::Result;
use crate::models::{Message, MessageDate, MessageSummary};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS emails (
    id              TEXT PRIMARY KEY,
    thread_id       TEXT NOT NULL,
    date            TEXT NOT NULL,
    sender          TEXT NOT NULL,
    recipients_to   TEXT NOT NULL DEFAULT '[]',
    recipients_cc   TEXT NOT NULL DEFAULT '[]',
    recipients_bcc  TEXT NOT NULL DEFAULT '[]',
    subject         TEXT NOT NULL DEFAULT '',
    body_text       TEXT NOT NULL DEFAULT '',
    body_html       TEXT NOT NULL DEFAULT '',
    attachments     TEXT NOT NULL DEFAULT '[]',
    snippet         TEXT NOT NULL DEFAULT '',
    is_job_related  INTEGER,
    last_synced     TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_emails_thread_id ON emails(thread_id);
";

const MESSAGE_COLUMNS: &str = "id, thread_id, date, sender, \
    recipients_to, recipients_cc, recipients_bcc, subject, \
    body_text, body_html, attachments, snippet, is_job_related, last_synced";

/// SQLite-backed message store.
///
/// Writes are serialized through a single connection behind a mutex; the
/// store exclusively owns the on-disk representation.
pub struct Store {
    conn: Mutex<Connection>,
}

impl Store {
    /// Open (creating if missing) the store at `path` and apply the schema.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::initialize(conn)
    }

    /// In-memory store, used by tests and throwaway runs.
    pub fn open_in_memory() -> Result<Self> {
        Self::initialize(Connection::open_in_memory()?)
    }

    fn initialize(conn: Connection) -> Result<Self> {
        // WAL keeps readers (the HTTP surface) unblocked during a sync run
        let _mode: String = conn.query_row("PRAGMA journal_mode=WAL", [], |row| row.get(0))?;
        conn.execute_batch(SCHEMA)?;
        info!("message store ready");
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Insert or fully replace the row for `message.id`.
    ///
    /// Never raises: failures are logged and reported as `false`. Collection
    /// fields always serialize to a well-formed JSON array, `[]` when empty.
    pub async fn upsert(&self, message: &Message) -> bool {
        match self.try_upsert(message).await {
            Ok(()) => true,
            Err(e) => {
                error!("failed to store message {}: {}", message.id, e);
                false
            }
        }
    }

    async fn try_upsert(&self, message: &Message) -> Result<()> {
        let recipients_to = serde_json::to_string(&message.recipients_to)?;
        let recipients_cc = serde_json::to_string(&message.recipients_cc)?;
        let recipients_bcc = serde_json::to_string(&message.recipients_bcc)?;
        let attachments = serde_json::to_string(&message.attachments)?;
        let last_synced = Utc::now().to_rfc3339();

        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT OR REPLACE INTO emails (
                id, thread_id, date, sender,
                recipients_to, recipients_cc, recipients_bcc, subject,
                body_text, body_html, attachments, snippet,
                is_job_related, last_synced
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
            params![
                message.id,
                message.thread_id,
                message.date.as_stored(),
                message.sender,
                recipients_to,
                recipients_cc,
                recipients_bcc,
                message.subject,
                message.body_text,
                message.body_html,
                attachments,
                message.snippet,
                message.is_job_related,
                last_synced,
            ],
        )?;
        Ok(())
    }

    pub async fn count(&self) -> Result<u64> {
        let conn = self.conn.lock().await;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM emails", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    pub async fn get_by_id(&self, id: &str) -> Result<Option<Message>> {
        let conn = self.conn.lock().await;
        let raw = conn
            .query_row(
                &format!("SELECT {} FROM emails WHERE id = ?1", MESSAGE_COLUMNS),
                params![id],
                RawMessageRow::from_row,
            )
            .optional()?;
        raw.map(RawMessageRow::into_message).transpose()
    }

    /// All messages of a thread ordered by stored date ascending, so a
    /// coherent conversation order falls out directly.
    pub async fn get_thread(&self, thread_id: &str) -> Result<Vec<Message>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM emails WHERE thread_id = ?1 ORDER BY date ASC",
            MESSAGE_COLUMNS
        ))?;
        let rows = stmt.query_map(params![thread_id], RawMessageRow::from_row)?;

        let mut messages = Vec::new();
        for row in rows {
            messages.push(row?.into_message()?);
        }
        Ok(messages)
    }

    /// Newest-first listing page, optionally filtered by the classification
    /// flag.
    pub async fn list(
        &self,
        limit: i64,
        offset: i64,
        is_job: Option<bool>,
    ) -> Result<Vec<Message>> {
        let conn = self.conn.lock().await;
        let mut messages = Vec::new();

        match is_job {
            Some(flag) => {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {} FROM emails WHERE is_job_related = ?1 \
                     ORDER BY date DESC LIMIT ?2 OFFSET ?3",
                    MESSAGE_COLUMNS
                ))?;
                let rows = stmt.query_map(params![flag, limit, offset], RawMessageRow::from_row)?;
                for row in rows {
                    messages.push(row?.into_message()?);
                }
            }
            None => {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {} FROM emails ORDER BY date DESC LIMIT ?1 OFFSET ?2",
                    MESSAGE_COLUMNS
                ))?;
                let rows = stmt.query_map(params![limit, offset], RawMessageRow::from_row)?;
                for row in rows {
                    messages.push(row?.into_message()?);
                }
            }
        }
        Ok(messages)
    }

    /// Compact newest-first rows feeding the free-text filter prompt.
    pub async fn summaries(&self, limit: i64) -> Result<Vec<MessageSummary>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(
            "SELECT id, sender, subject, date FROM emails ORDER BY date DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit], |row| {
            Ok(MessageSummary {
                id: row.get(0)?,
                sender: row.get(1)?,
                subject: row.get(2)?,
                date: row.get(3)?,
            })
        })?;

        let mut summaries = Vec::new();
        for row in rows {
            summaries.push(row?);
        }
        Ok(summaries)
    }
}

/// Column values as stored, before JSON fields are rehydrated. Keeps the
/// rusqlite row closure free of serde error plumbing.
struct RawMessageRow {
    id: String,
    thread_id: String,
    date: String,
    sender: String,
    recipients_to: String,
    recipients_cc: String,
    recipients_bcc: String,
    subject: String,
    body_text: String,
    body_html: String,
    attachments: String,
    snippet: String,
    is_job_related: Option<bool>,
    last_synced: String,
}

impl RawMessageRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            thread_id: row.get(1)?,
            date: row.get(2)?,
            sender: row.get(3)?,
            recipients_to: row.get(4)?,
            recipients_cc: row.get(5)?,
            recipients_bcc: row.get(6)?,
            subject: row.get(7)?,
            body_text: row.get(8)?,
            body_html: row.get(9)?,
            attachments: row.get(10)?,
            snippet: row.get(11)?,
            is_job_related: row.get(12)?,
            last_synced: row.get(13)?,
        })
    }

    fn into_message(self) -> Result<Message> {
        Ok(Message {
            date: MessageDate::from_stored(&self.date),
            recipients_to: serde_json::from_str(&self.recipients_to)?,
            recipients_cc: serde_json::from_str(&self.recipients_cc)?,
            recipients_bcc: serde_json::from_str(&self.recipients_bcc)?,
            attachments: serde_json::from_str(&self.attachments)?,
            last_synced: DateTime::parse_from_rfc3339(&self.last_synced)
                .ok()
                .map(|dt| dt.with_timezone(&Utc)),
            id: self.id,
            thread_id: self.thread_id,
            sender: self.sender,
            subject: self.subject,
            body_text: self.body_text,
            body_html: self.body_html,
            snippet: self.snippet,
            is_job_related: self.is_job_related,
        })
    }
}
