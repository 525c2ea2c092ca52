//! Integration tests for the pager and the ingestion pipeline

mod common;

use common::{raw_payload_message, MockBackend, MockMailClient};
use jobmail::client::{MailClient, MessagePage};
use jobmail::engine::CompletionBackend;
use jobmail::error::MailError;
use jobmail::pager::MessagePager;
use jobmail::pipeline::IngestionPipeline;
use jobmail::store::Store;
use std::sync::Arc;

fn page(ids: &[&str], next: Option<&str>) -> MessagePage {
    MessagePage {
        ids: ids.iter().map(|s| s.to_string()).collect(),
        next_page_token: next.map(|s| s.to_string()),
    }
}

#[tokio::test]
async fn pager_follows_tokens_and_truncates_overshoot() {
    let mut client = MockMailClient::new();
    client
        .expect_list_messages()
        .withf(|label, token, _| label == "SENT" && token.is_none())
        .times(1)
        .returning(|_, _, _| Ok(page(&["m1", "m2", "m3"], Some("t2"))));
    client
        .expect_list_messages()
        .withf(|_, token, _| token.as_deref() == Some("t2"))
        .times(1)
        .returning(|_, _, _| Ok(page(&["m4", "m5", "m6"], Some("t3"))));

    let pager = MessagePager::new(Arc::new(client), "SENT", 3);
    let ids = pager.list(4).await.unwrap();
    assert_eq!(ids, vec!["m1", "m2", "m3", "m4"]);
}

#[tokio::test]
async fn pager_stops_when_listing_is_exhausted() {
    let mut client = MockMailClient::new();
    client
        .expect_list_messages()
        .times(1)
        .returning(|_, _, _| Ok(page(&["m1", "m2"], None)));

    let pager = MessagePager::new(Arc::new(client), "SENT", 100);
    let ids = pager.list(50).await.unwrap();
    assert_eq!(ids, vec!["m1", "m2"]);
}

#[tokio::test]
async fn pager_keeps_partial_result_on_later_page_failure() {
    let mut client = MockMailClient::new();
    client
        .expect_list_messages()
        .withf(|_, token, _| token.is_none())
        .times(1)
        .returning(|_, _, _| Ok(page(&["m1", "m2"], Some("t2"))));
    client
        .expect_list_messages()
        .withf(|_, token, _| token.is_some())
        .times(1)
        .returning(|_, _, _| Err(MailError::NetworkError("connection reset".to_string())));

    let pager = MessagePager::new(Arc::new(client), "SENT", 2);
    let ids = pager.list(10).await.unwrap();
    assert_eq!(ids, vec!["m1", "m2"]);
}

#[tokio::test]
async fn pager_errors_when_no_identifiers_are_obtainable() {
    let mut client = MockMailClient::new();
    client
        .expect_list_messages()
        .times(1)
        .returning(|_, _, _| Err(MailError::AuthError("expired token".to_string())));

    let pager = MessagePager::new(Arc::new(client), "SENT", 100);
    assert!(pager.list(10).await.is_err());
}

#[tokio::test]
async fn pipeline_isolates_per_message_failures() {
    let mut client = MockMailClient::new();
    client
        .expect_list_messages()
        .times(1)
        .returning(|_, _, _| Ok(page(&["m1", "m2", "m3", "m4", "m5"], None)));
    client.expect_get_message().times(5).returning(|id| {
        if id == "m3" {
            Err(MailError::NetworkError("fetch failed".to_string()))
        } else {
            Ok(raw_payload_message(
                id,
                &format!("thread_{}", id),
                "Job application for Backend Engineer position",
                "Please find my resume attached.",
            ))
        }
    });

    // High-confidence keyword verdicts: the backend must never be touched
    let mut backend = MockBackend::new();
    backend.expect_complete().times(0);

    let store = Arc::new(Store::open_in_memory().unwrap());
    let pipeline = pipeline(client, backend, Arc::clone(&store));

    let summary = pipeline.run(10).await.unwrap();
    assert_eq!(summary.attempted, 5);
    assert_eq!(summary.succeeded, 4);
    assert_eq!(summary.total_in_store, 4);
    assert!(store.get_by_id("m3").await.unwrap().is_none());
    assert!(store.get_by_id("m2").await.unwrap().is_some());
}

#[tokio::test]
async fn pipeline_classifies_ambiguous_mail_through_backend() {
    let mut client = MockMailClient::new();
    client
        .expect_list_messages()
        .times(1)
        .returning(|_, _, _| Ok(page(&["m1"], None)));
    client.expect_get_message().times(1).returning(|id| {
        // One positive and one negative keyword: ambiguous for the gate
        Ok(raw_payload_message(
            id,
            "t1",
            "Your application receipt",
            "Thanks for writing in.",
        ))
    });

    let mut backend = MockBackend::new();
    backend
        .expect_complete()
        .times(1)
        .returning(|_| Ok("Yes, job-related.".to_string()));

    let store = Arc::new(Store::open_in_memory().unwrap());
    let pipeline = pipeline(client, backend, Arc::clone(&store));

    let summary = pipeline.run(10).await.unwrap();
    assert_eq!(summary.succeeded, 1);

    let stored = store.get_by_id("m1").await.unwrap().unwrap();
    assert_eq!(stored.is_job_related, Some(true));
}

#[tokio::test]
async fn pipeline_counts_classification_failure_against_that_message() {
    let mut client = MockMailClient::new();
    client
        .expect_list_messages()
        .times(1)
        .returning(|_, _, _| Ok(page(&["m1", "m2"], None)));
    client.expect_get_message().times(2).returning(|id| {
        let subject = if id == "m1" {
            // Ambiguous: forces a backend call
            "Your application receipt"
        } else {
            "Job application for Backend Engineer position"
        };
        Ok(raw_payload_message(id, "t1", subject, "body"))
    });

    let mut backend = MockBackend::new();
    backend
        .expect_complete()
        .times(1)
        .returning(|_| Err(MailError::CompletionError("backend down".to_string())));

    let store = Arc::new(Store::open_in_memory().unwrap());
    let pipeline = pipeline(client, backend, Arc::clone(&store));

    let summary = pipeline.run(10).await.unwrap();
    assert_eq!(summary.attempted, 2);
    assert_eq!(summary.succeeded, 1);
    // The failed message was never written
    assert!(store.get_by_id("m1").await.unwrap().is_none());
}

#[tokio::test]
async fn pipeline_reports_empty_run_when_nothing_listed() {
    let mut client = MockMailClient::new();
    client
        .expect_list_messages()
        .times(1)
        .returning(|_, _, _| Ok(page(&[], None)));

    let backend = MockBackend::new();
    let store = Arc::new(Store::open_in_memory().unwrap());
    let pipeline = pipeline(client, backend, store);

    let summary = pipeline.run(10).await.unwrap();
    assert_eq!(summary.attempted, 0);
    assert_eq!(summary.succeeded, 0);
}

fn pipeline(
    client: MockMailClient,
    backend: MockBackend,
    store: Arc<Store>,
) -> IngestionPipeline {
    let client: Arc<dyn MailClient> = Arc::new(client);
    let backend: Arc<dyn CompletionBackend> = Arc::new(backend);
    IngestionPipeline::new(client, backend, store, "SENT", 100)
}
