//! Common test utilities and fixtures

use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use google_gmail1::api;
use jobmail::client::{MailClient, MessagePage};
use jobmail::engine::CompletionBackend;
use jobmail::error::Result;
use jobmail::models::{Message, MessageDate};
use mockall::mock;

// Mock implementation of MailClient for testing
mock! {
    pub MailClient {}

    #[async_trait]
    impl MailClient for MailClient {
        async fn list_messages(
            &self,
            label: &str,
            page_token: Option<String>,
            page_size: u32,
        ) -> Result<MessagePage>;
        async fn get_message(&self, id: &str) -> Result<api::Message>;
        async fn get_attachment(
            &self,
            message_id: &str,
            attachment_id: &str,
        ) -> Result<Option<Vec<u8>>>;
    }
}

// Mock implementation of the completion backend for testing
mock! {
    pub Backend {}

    #[async_trait]
    impl CompletionBackend for Backend {
        async fn complete(&self, prompt: &str) -> Result<String>;
    }
}

/// Base64url-encode a body the way the provider delivers part data
pub fn encoded_body(data: &str) -> Vec<u8> {
    general_purpose::URL_SAFE_NO_PAD.encode(data).into_bytes()
}

/// Create a raw provider payload with headers and a single text/plain part
pub fn raw_payload_message(id: &str, thread_id: &str, subject: &str, body: &str) -> api::Message {
    api::Message {
        id: Some(id.to_string()),
        thread_id: Some(thread_id.to_string()),
        snippet: Some(body.chars().take(40).collect()),
        payload: Some(api::MessagePart {
            mime_type: Some("text/plain".to_string()),
            headers: Some(vec![
                header("From", "me@example.com"),
                header("To", "recruiter@corp.example"),
                header("Subject", subject),
                header("Date", "Mon, 24 Nov 2025 10:30:00 +0000"),
            ]),
            body: Some(api::MessagePartBody {
                data: Some(encoded_body(body)),
                ..Default::default()
            }),
            ..Default::default()
        }),
        ..Default::default()
    }
}

pub fn header(name: &str, value: &str) -> api::MessagePartHeader {
    api::MessagePartHeader {
        name: Some(name.to_string()),
        value: Some(value.to_string()),
    }
}

/// Create a typed message fixture for store tests
pub fn stored_message(id: &str, thread_id: &str, date_header: &str) -> Message {
    Message {
        id: id.to_string(),
        thread_id: thread_id.to_string(),
        date: MessageDate::parse(date_header),
        sender: "me@example.com".to_string(),
        recipients_to: vec!["recruiter@corp.example".to_string()],
        recipients_cc: vec![],
        recipients_bcc: vec![],
        subject: "Application follow-up".to_string(),
        body_text: "Just checking in.".to_string(),
        body_html: String::new(),
        attachments: vec![],
        snippet: "Just checking in.".to_string(),
        is_job_related: Some(true),
        last_synced: None,
    }
}
