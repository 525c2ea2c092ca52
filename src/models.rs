use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One ingested sent-mail message, the unit the store persists.
///
/// All collection-valued fields serialize to an empty collection when absent,
/// never to null. `is_job_related` stays `None` until a classification pass
/// has run for this message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub thread_id: String,
    pub date: MessageDate,
    pub sender: String,
    pub recipients_to: Vec<String>,
    pub recipients_cc: Vec<String>,
    pub recipients_bcc: Vec<String>,
    pub subject: String,
    pub body_text: String,
    pub body_html: String,
    pub attachments: Vec<Attachment>,
    pub snippet: String,
    pub is_job_related: Option<bool>,
    /// Set by the store on every write
    pub last_synced: Option<DateTime<Utc>>,
}

/// A message date: either a parsed timestamp or, when the Date header did
/// not parse, the verbatim header text. Downstream consumers must tolerate
/// both forms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageDate {
    Parsed(DateTime<Utc>),
    Raw(String),
}

impl MessageDate {
    /// Parse an RFC 2822 (or RFC 3339) Date header, keeping the raw text
    /// when neither format matches.
    pub fn parse(header: &str) -> Self {
        if let Ok(dt) = DateTime::parse_from_rfc2822(header) {
            return MessageDate::Parsed(dt.with_timezone(&Utc));
        }
        if let Ok(dt) = DateTime::parse_from_rfc3339(header) {
            return MessageDate::Parsed(dt.with_timezone(&Utc));
        }
        MessageDate::Raw(header.to_string())
    }

    /// Text form used as the stored column value. Parsed dates render as
    /// RFC 3339 in UTC so lexicographic ordering matches chronological
    /// ordering; raw dates are stored verbatim.
    pub fn as_stored(&self) -> String {
        match self {
            MessageDate::Parsed(dt) => dt.to_rfc3339(),
            MessageDate::Raw(raw) => raw.clone(),
        }
    }

    /// Rebuild from a stored column value.
    pub fn from_stored(value: &str) -> Self {
        match DateTime::parse_from_rfc3339(value) {
            Ok(dt) => MessageDate::Parsed(dt.with_timezone(&Utc)),
            Err(_) => MessageDate::Raw(value.to_string()),
        }
    }

    /// True when the original Date header could not be parsed.
    pub fn is_degraded(&self) -> bool {
        matches!(self, MessageDate::Raw(_))
    }
}

impl std::fmt::Display for MessageDate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.as_stored())
    }
}

/// An attachment reference embedded in a message. Bytes are fetched lazily
/// through the provider using `attachment_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub filename: String,
    pub mime_type: String,
    pub attachment_id: String,
    /// Best-effort size in bytes, 0 when the provider omits it
    #[serde(default)]
    pub size: u64,
}

/// Compact listing row used by the free-text filter prompt and the HTTP
/// surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageSummary {
    pub id: String,
    pub sender: String,
    pub subject: String,
    pub date: String,
}
