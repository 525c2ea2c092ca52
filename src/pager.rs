//! Paginated message-id listing bounded by a caller-supplied maximum

use std::sync::Arc;
use tracing::{debug, warn};

use crate::client::MailClient;
use crate::error::Result;

/// Drives paginated listing against the mail provider and yields a flat,
/// ordered sequence of message ids.
pub struct MessagePager {
    client: Arc<dyn MailClient>,
    label: String,
    page_size: u32,
}

impl MessagePager {
    pub fn new(client: Arc<dyn MailClient>, label: impl Into<String>, page_size: u32) -> Self {
        Self {
            client,
            label: label.into(),
            page_size,
        }
    }

    /// List up to `max_results` message ids, following continuation tokens
    /// until the listing is exhausted or the cap is reached (the final page
    /// is truncated on overshoot).
    ///
    /// A failure on the first page means no identifiers are obtainable at
    /// all and is returned as an error; a failure on a later page aborts
    /// further paging and the ids accumulated so far are kept.
    pub async fn list(&self, max_results: usize) -> Result<Vec<String>> {
        let mut ids: Vec<String> = Vec::new();
        let mut page_token: Option<String> = None;

        while ids.len() < max_results {
            let want = (max_results - ids.len()).min(self.page_size as usize) as u32;
            let page = match self
                .client
                .list_messages(&self.label, page_token.clone(), want)
                .await
            {
                Ok(page) => page,
                Err(e) if ids.is_empty() => return Err(e),
                Err(e) => {
                    warn!(
                        accumulated = ids.len(),
                        "page listing failed, keeping partial result: {}", e
                    );
                    break;
                }
            };

            if page.ids.is_empty() {
                break;
            }
            ids.extend(page.ids);

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        ids.truncate(max_results);
        debug!(label = %self.label, count = ids.len(), "listing complete");
        Ok(ids)
    }
}
