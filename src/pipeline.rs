//! Ingestion pipeline: pager -> fetcher -> reconstructor -> classifier -> store

use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::classifier::RelevanceClassifier;
use crate::client::{MailClient, ProgressCallback};
use crate::engine::CompletionBackend;
use crate::error::{MailError, Result};
use crate::fetcher::MessageFetcher;
use crate::pager::MessagePager;
use crate::store::Store;

/// Outcome of one ingestion run. `attempted` vs `succeeded` makes partial
/// failure observable instead of silent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub attempted: usize,
    pub succeeded: usize,
    pub total_in_store: u64,
}

/// Orchestrates one bounded ingestion batch.
///
/// Messages are processed sequentially and independently: a failure at any
/// stage is logged and counted against that message only, and the batch
/// carries on. The run aborts only when no identifiers are obtainable at all
/// or the store is unreachable at the outset.
pub struct IngestionPipeline {
    pager: MessagePager,
    fetcher: MessageFetcher,
    classifier: RelevanceClassifier,
    store: Arc<Store>,
}

impl IngestionPipeline {
    pub fn new(
        client: Arc<dyn MailClient>,
        backend: Arc<dyn CompletionBackend>,
        store: Arc<Store>,
        label: impl Into<String>,
        page_size: u32,
    ) -> Self {
        Self {
            pager: MessagePager::new(Arc::clone(&client), label, page_size),
            fetcher: MessageFetcher::new(client),
            classifier: RelevanceClassifier::new(backend),
            store,
        }
    }

    pub async fn run(&self, max_results: usize) -> Result<RunSummary> {
        self.run_with_progress(max_results, None).await
    }

    pub async fn run_with_progress(
        &self,
        max_results: usize,
        on_progress: Option<ProgressCallback>,
    ) -> Result<RunSummary> {
        let run_id = Uuid::new_v4();
        info!(%run_id, max_results, "starting ingestion run");

        // Store reachability probe; also logs where the run starts from
        let starting_count = self.store.count().await?;
        debug!(%run_id, starting_count, "store reachable");

        let ids = self.pager.list(max_results).await?;
        let attempted = ids.len();
        let mut succeeded = 0usize;

        for id in &ids {
            match self.ingest_one(id).await {
                Ok(()) => succeeded += 1,
                Err(e) => warn!(%run_id, message_id = %id, "skipping message: {}", e),
            }
            if let Some(callback) = &on_progress {
                callback();
            }
        }

        let total_in_store = self.store.count().await?;
        info!(%run_id, attempted, succeeded, total_in_store, "ingestion run complete");

        Ok(RunSummary {
            attempted,
            succeeded,
            total_in_store,
        })
    }

    /// One full fetch -> reconstruct -> classify -> upsert cycle. A row is
    /// written only when every stage completed.
    async fn ingest_one(&self, id: &str) -> Result<()> {
        let mut message = self.fetcher.fetch(id).await?;

        let verdict = self
            .classifier
            .classify(&message.subject, &message.snippet)
            .await?;
        message.is_job_related = Some(verdict);

        if self.store.upsert(&message).await {
            Ok(())
        } else {
            Err(MailError::StoreError(format!("upsert failed for {}", id)))
        }
    }
}
