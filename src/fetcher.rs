//! Full-message retrieval and conversion of raw provider payloads into typed
//! [`Message`] values

use google_gmail1::api;
use std::sync::Arc;

use crate::body;
use crate::client::MailClient;
use crate::error::{MailError, Result};
use crate::models::{Message, MessageDate};

/// Fetches a message by id and validates it into the typed contract the rest
/// of the pipeline operates on.
pub struct MessageFetcher {
    client: Arc<dyn MailClient>,
}

impl MessageFetcher {
    pub fn new(client: Arc<dyn MailClient>) -> Self {
        Self { client }
    }

    pub async fn fetch(&self, id: &str) -> Result<Message> {
        let raw = self.client.get_message(id).await?;
        message_from_payload(raw)
    }
}

/// Convert a raw provider payload into a [`Message`], the single validation
/// boundary between the provider's shape and the typed pipeline.
pub fn message_from_payload(raw: api::Message) -> Result<Message> {
    let id = raw
        .id
        .ok_or_else(|| MailError::InvalidMessageFormat("Missing message ID".to_string()))?;
    let thread_id = raw
        .thread_id
        .ok_or_else(|| MailError::InvalidMessageFormat("Missing thread ID".to_string()))?;

    let snippet = raw.snippet.unwrap_or_default();
    let payload = raw.payload.unwrap_or_default();
    let headers = payload.headers.clone().unwrap_or_default();

    let subject = header_value(&headers, "Subject");
    let sender = header_value(&headers, "From");
    let recipients_to = parse_recipients(&header_value(&headers, "To"));
    let recipients_cc = parse_recipients(&header_value(&headers, "Cc"));
    let recipients_bcc = parse_recipients(&header_value(&headers, "Bcc"));
    let date = MessageDate::parse(&header_value(&headers, "Date"));

    let (body_text, body_html) = body::reconstruct(&payload);
    let attachments = body::collect_attachments(&payload);

    Ok(Message {
        id,
        thread_id,
        date,
        sender,
        recipients_to,
        recipients_cc,
        recipients_bcc,
        subject,
        body_text,
        body_html,
        attachments,
        snippet,
        is_job_related: None,
        last_synced: None,
    })
}

/// Case-insensitive header lookup; first match wins, absent headers yield an
/// empty string.
pub fn header_value(headers: &[api::MessagePartHeader], name: &str) -> String {
    headers
        .iter()
        .find(|h| {
            h.name
                .as_deref()
                .is_some_and(|n| n.eq_ignore_ascii_case(name))
        })
        .and_then(|h| h.value.clone())
        .unwrap_or_default()
}

/// Split a recipient header on commas, trimming whitespace and dropping empty
/// tokens. Display names are kept attached to their addresses; this is a
/// deliberate simplification, not RFC 5322 address parsing.
pub fn parse_recipients(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}
