//! Mail provider client: trait boundary plus the Gmail implementation with
//! per-call deadlines and bounded retry

use async_trait::async_trait;
use backoff::ExponentialBackoffBuilder;
use google_gmail1::api;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::warn;

use crate::auth::{GmailHub, SCOPE_READONLY};
use crate::body;
use crate::error::{MailError, Result};

/// Deadline applied to every remote call; a hung provider call fails the
/// attempt instead of blocking the run.
pub const REMOTE_CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// Progress callback type for batch operations
pub type ProgressCallback = Arc<dyn Fn() + Send + Sync>;

/// One page of a message listing: ids plus the continuation token for the
/// next page, absent when the listing is exhausted.
#[derive(Debug, Clone, Default)]
pub struct MessagePage {
    pub ids: Vec<String>,
    pub next_page_token: Option<String>,
}

/// Trait defining mail provider operations for easier testing
#[async_trait]
pub trait MailClient: Send + Sync {
    /// List one page of message ids under a label
    async fn list_messages(
        &self,
        label: &str,
        page_token: Option<String>,
        page_size: u32,
    ) -> Result<MessagePage>;

    /// Get the full raw payload of a single message
    async fn get_message(&self, id: &str) -> Result<api::Message>;

    /// Fetch attachment bytes, `None` when the provider has no data for it
    async fn get_attachment(
        &self,
        message_id: &str,
        attachment_id: &str,
    ) -> Result<Option<Vec<u8>>>;
}

/// Production Gmail client.
///
/// Every call runs under [`REMOTE_CALL_TIMEOUT`] and transient failures are
/// retried with exponential backoff; rate-limit responses honor the
/// provider's Retry-After delay.
pub struct GmailMailClient {
    hub: GmailHub,
}

impl GmailMailClient {
    pub fn new(hub: GmailHub) -> Self {
        Self { hub }
    }

    /// Execute an operation with bounded exponential backoff on transient
    /// errors. Permanent errors return immediately.
    async fn with_retry<T, F, Fut>(op: &str, mut operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        let policy = ExponentialBackoffBuilder::new()
            .with_initial_interval(Duration::from_millis(500))
            .with_max_interval(Duration::from_secs(30))
            .with_max_elapsed_time(Some(Duration::from_secs(120)))
            .build();

        backoff::future::retry_notify(
            policy,
            || {
                let attempt = operation();
                async move {
                    attempt.await.map_err(|e| match e {
                        MailError::RateLimitExceeded { retry_after } => backoff::Error::retry_after(
                            MailError::RateLimitExceeded { retry_after },
                            Duration::from_secs(retry_after),
                        ),
                        e if e.is_transient() => backoff::Error::transient(e),
                        e => backoff::Error::permanent(e),
                    })
                }
            },
            |err, delay| warn!("{} failed: {}. Retrying in {:?}", op, err, delay),
        )
        .await
    }

    async fn bounded<T>(
        op: &str,
        call: impl std::future::Future<Output = std::result::Result<T, google_gmail1::Error>>,
    ) -> Result<T> {
        match timeout(REMOTE_CALL_TIMEOUT, call).await {
            Ok(result) => Ok(result?),
            Err(_) => {
                warn!("{} timed out after {:?}", op, REMOTE_CALL_TIMEOUT);
                Err(MailError::NetworkError(format!(
                    "{} timed out after {:?}",
                    op, REMOTE_CALL_TIMEOUT
                )))
            }
        }
    }
}

#[async_trait]
impl MailClient for GmailMailClient {
    async fn list_messages(
        &self,
        label: &str,
        page_token: Option<String>,
        page_size: u32,
    ) -> Result<MessagePage> {
        Self::with_retry("list_messages", || async {
            let mut call = self
                .hub
                .users()
                .messages_list("me")
                .add_label_ids(label)
                .max_results(page_size);

            if let Some(token) = page_token.as_deref() {
                call = call.page_token(token);
            }

            let (_, response) =
                Self::bounded("list_messages", call.add_scope(SCOPE_READONLY).doit()).await?;

            let ids = response
                .messages
                .unwrap_or_default()
                .into_iter()
                .filter_map(|m| m.id)
                .collect();

            Ok(MessagePage {
                ids,
                next_page_token: response.next_page_token,
            })
        })
        .await
    }

    async fn get_message(&self, id: &str) -> Result<api::Message> {
        Self::with_retry("get_message", || async {
            let call = self
                .hub
                .users()
                .messages_get("me", id)
                .format("full")
                .add_scope(SCOPE_READONLY);

            let (_, message) = Self::bounded("get_message", call.doit()).await?;
            Ok(message)
        })
        .await
    }

    async fn get_attachment(
        &self,
        message_id: &str,
        attachment_id: &str,
    ) -> Result<Option<Vec<u8>>> {
        Self::with_retry("get_attachment", || async {
            let call = self
                .hub
                .users()
                .messages_attachments_get("me", message_id, attachment_id)
                .add_scope(SCOPE_READONLY);

            let (_, attachment) = Self::bounded("get_attachment", call.doit()).await?;
            Ok(attachment
                .data
                .map(|data| body::decode_attachment_bytes(&data)))
        })
        .await
    }
}

// Implement MailClient for Arc<GmailMailClient> to allow shared ownership
#[async_trait]
impl MailClient for Arc<GmailMailClient> {
    async fn list_messages(
        &self,
        label: &str,
        page_token: Option<String>,
        page_size: u32,
    ) -> Result<MessagePage> {
        self.as_ref().list_messages(label, page_token, page_size).await
    }

    async fn get_message(&self, id: &str) -> Result<api::Message> {
        self.as_ref().get_message(id).await
    }

    async fn get_attachment(
        &self,
        message_id: &str,
        attachment_id: &str,
    ) -> Result<Option<Vec<u8>>> {
        self.as_ref().get_attachment(message_id, attachment_id).await
    }
}
