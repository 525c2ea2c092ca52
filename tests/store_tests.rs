//! Integration tests for the message store

mod common;

use common::stored_message;
use jobmail::models::Attachment;
use jobmail::store::Store;

#[tokio::test]
async fn upsert_is_idempotent_and_last_write_wins() {
    let store = Store::open_in_memory().unwrap();

    let mut message = stored_message("m1", "t1", "Mon, 24 Nov 2025 10:30:00 +0000");
    assert!(store.upsert(&message).await);
    assert_eq!(store.count().await.unwrap(), 1);

    message.subject = "Updated subject".to_string();
    message.is_job_related = Some(false);
    assert!(store.upsert(&message).await);

    assert_eq!(store.count().await.unwrap(), 1);
    let stored = store.get_by_id("m1").await.unwrap().unwrap();
    assert_eq!(stored.subject, "Updated subject");
    assert_eq!(stored.is_job_related, Some(false));
}

#[tokio::test]
async fn empty_collections_round_trip_as_empty_not_null() {
    let store = Store::open_in_memory().unwrap();

    let mut message = stored_message("m1", "t1", "Mon, 24 Nov 2025 10:30:00 +0000");
    message.recipients_to = vec![];
    message.recipients_cc = vec![];
    message.recipients_bcc = vec![];
    message.attachments = vec![];
    assert!(store.upsert(&message).await);

    let stored = store.get_by_id("m1").await.unwrap().unwrap();
    assert_eq!(stored.recipients_to, Vec::<String>::new());
    assert_eq!(stored.recipients_cc, Vec::<String>::new());
    assert_eq!(stored.recipients_bcc, Vec::<String>::new());
    assert!(stored.attachments.is_empty());
}

#[tokio::test]
async fn attachments_round_trip() {
    let store = Store::open_in_memory().unwrap();

    let mut message = stored_message("m1", "t1", "Mon, 24 Nov 2025 10:30:00 +0000");
    message.attachments = vec![Attachment {
        filename: "resume.pdf".to_string(),
        mime_type: "application/pdf".to_string(),
        attachment_id: "att-1".to_string(),
        size: 2048,
    }];
    assert!(store.upsert(&message).await);

    let stored = store.get_by_id("m1").await.unwrap().unwrap();
    assert_eq!(stored.attachments, message.attachments);
}

#[tokio::test]
async fn thread_is_ordered_by_date_regardless_of_insert_order() {
    let store = Store::open_in_memory().unwrap();

    // Inserted T3, T1, T2
    for (id, date) in [
        ("m3", "Wed, 26 Nov 2025 09:00:00 +0000"),
        ("m1", "Mon, 24 Nov 2025 09:00:00 +0000"),
        ("m2", "Tue, 25 Nov 2025 09:00:00 +0000"),
    ] {
        assert!(store.upsert(&stored_message(id, "t1", date)).await);
    }
    // A message in another thread stays out of the result
    assert!(
        store
            .upsert(&stored_message("other", "t2", "Mon, 24 Nov 2025 09:00:00 +0000"))
            .await
    );

    let thread = store.get_thread("t1").await.unwrap();
    let ids: Vec<&str> = thread.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(ids, vec!["m1", "m2", "m3"]);
}

#[tokio::test]
async fn unclassified_messages_keep_tri_state_none() {
    let store = Store::open_in_memory().unwrap();

    let mut message = stored_message("m1", "t1", "Mon, 24 Nov 2025 10:30:00 +0000");
    message.is_job_related = None;
    assert!(store.upsert(&message).await);

    let stored = store.get_by_id("m1").await.unwrap().unwrap();
    assert_eq!(stored.is_job_related, None);
}

#[tokio::test]
async fn store_stamps_last_synced_on_write() {
    let store = Store::open_in_memory().unwrap();

    let message = stored_message("m1", "t1", "Mon, 24 Nov 2025 10:30:00 +0000");
    assert!(message.last_synced.is_none());
    assert!(store.upsert(&message).await);

    let stored = store.get_by_id("m1").await.unwrap().unwrap();
    assert!(stored.last_synced.is_some());
}

#[tokio::test]
async fn degraded_date_is_stored_verbatim() {
    let store = Store::open_in_memory().unwrap();

    let message = stored_message("m1", "t1", "sometime last Tuesday");
    assert!(store.upsert(&message).await);

    let stored = store.get_by_id("m1").await.unwrap().unwrap();
    assert!(stored.date.is_degraded());
    assert_eq!(stored.date.as_stored(), "sometime last Tuesday");
}

#[tokio::test]
async fn list_filters_on_classification_flag() {
    let store = Store::open_in_memory().unwrap();

    let mut job = stored_message("m1", "t1", "Mon, 24 Nov 2025 10:30:00 +0000");
    job.is_job_related = Some(true);
    let mut noise = stored_message("m2", "t2", "Tue, 25 Nov 2025 10:30:00 +0000");
    noise.is_job_related = Some(false);
    assert!(store.upsert(&job).await);
    assert!(store.upsert(&noise).await);

    let jobs = store.list(50, 0, Some(true)).await.unwrap();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].id, "m1");

    let all = store.list(50, 0, None).await.unwrap();
    assert_eq!(all.len(), 2);
    // Newest first
    assert_eq!(all[0].id, "m2");
}

#[tokio::test]
async fn summaries_are_newest_first_and_bounded() {
    let store = Store::open_in_memory().unwrap();

    for (id, date) in [
        ("m1", "Mon, 24 Nov 2025 09:00:00 +0000"),
        ("m2", "Tue, 25 Nov 2025 09:00:00 +0000"),
        ("m3", "Wed, 26 Nov 2025 09:00:00 +0000"),
    ] {
        assert!(store.upsert(&stored_message(id, "t1", date)).await);
    }

    let summaries = store.summaries(2).await.unwrap();
    assert_eq!(summaries.len(), 2);
    assert_eq!(summaries[0].id, "m3");
    assert_eq!(summaries[1].id, "m2");
}

#[tokio::test]
async fn store_persists_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("emails.db");

    {
        let store = Store::open(&path).unwrap();
        assert!(
            store
                .upsert(&stored_message("m1", "t1", "Mon, 24 Nov 2025 10:30:00 +0000"))
                .await
        );
    }

    let reopened = Store::open(&path).unwrap();
    assert_eq!(reopened.count().await.unwrap(), 1);
    assert!(reopened.get_by_id("m1").await.unwrap().is_some());
}
