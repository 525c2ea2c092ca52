//! Follow-up draft generation over the completion backend

use std::sync::Arc;

use crate::engine::CompletionBackend;
use crate::error::Result;
use crate::models::Message;

/// Thread content passed to the model is truncated to keep prompts bounded.
const THREAD_CONTENT_MAX_CHARS: usize = 2000;

/// Generates free-text email drafts from stored messages.
pub struct DraftGenerator {
    backend: Arc<dyn CompletionBackend>,
}

impl DraftGenerator {
    pub fn new(backend: Arc<dyn CompletionBackend>) -> Self {
        Self { backend }
    }

    /// Draft a follow-up to a previously sent message. `context` is the
    /// user's steering instruction (e.g. "I haven't heard back yet. Keep it
    /// short.").
    pub async fn generate_follow_up(&self, message: &Message, context: &str) -> Result<String> {
        let body: String = message
            .body_text
            .chars()
            .take(THREAD_CONTENT_MAX_CHARS)
            .collect();

        let prompt = format!(
            "You are an expert assistant helping me write professional emails.\n\
             I sent an email to {recipient} about \"{subject}\" on {date}.\n\
             Here is the email thread content:\n\
             Subject: {subject}\n\
             From: {sender}\n\
             Body:\n{body}\n\n\
             Your goal: write a polite, professional, and concise follow-up email.\n\
             Context: {context}\n\
             Draft:",
            recipient = message.recipients_to.join(", "),
            subject = message.subject,
            date = message.date,
            sender = message.sender,
            body = body,
            context = context,
        );

        self.backend.complete(&prompt).await
    }
}
