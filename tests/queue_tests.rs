mod test_harness;

use std::sync::Arc;
use std::time::Duration;

use reelpost::scheduler::{JobId, JobQueue, JobStatus};
use test_harness::ScriptedJob;

#[tokio::test]
async fn test_enqueue_records_queued_status() {
    let queue = JobQueue::new();

    queue
        .enqueue(ScriptedJob::succeeding("job-1"))
        .await
        .unwrap();

    let statuses = queue.statuses();
    assert_eq!(statuses.len(), 1);
    assert_eq!(statuses[&JobId::new("job-1")], JobStatus::Queued);
}

#[tokio::test]
async fn test_every_enqueued_job_is_queued_before_workers_run() {
    let queue = JobQueue::new();
    let ids: Vec<String> = (0..20).map(|i| format!("item-{i}")).collect();

    for id in &ids {
        queue.enqueue(ScriptedJob::succeeding(id)).await.unwrap();
    }

    let statuses = queue.statuses();
    assert_eq!(statuses.len(), ids.len());
    for id in &ids {
        assert_eq!(statuses[&JobId::new(id.as_str())], JobStatus::Queued);
    }
    assert_eq!(queue.pending(), ids.len());
}

#[tokio::test]
async fn test_enqueue_same_id_keeps_one_entry() {
    let queue = JobQueue::new();
    queue.enqueue(ScriptedJob::succeeding("dup")).await.unwrap();
    queue.update_status(JobId::new("dup"), JobStatus::Done);
    queue.enqueue(ScriptedJob::succeeding("dup")).await.unwrap();

    let statuses = queue.statuses();
    assert_eq!(statuses.len(), 1);
    assert_eq!(statuses[&JobId::new("dup")], JobStatus::Queued);
}

#[test]
fn test_update_status_inserts_unseen_id() {
    let queue = JobQueue::new();

    queue.update_status(JobId::new("job-2"), JobStatus::Processing);

    let statuses = queue.statuses();
    assert_eq!(statuses.len(), 1);
    assert_eq!(statuses[&JobId::new("job-2")], JobStatus::Processing);
}

#[test]
fn test_statuses_returns_a_copy() {
    let queue = JobQueue::new();
    queue.update_status(JobId::new("a"), JobStatus::Queued);

    let mut snapshot = queue.statuses();
    snapshot.clear();

    assert_eq!(queue.statuses().len(), 1);
}

#[test]
fn test_clear_on_empty_queue() {
    let queue = JobQueue::new();
    assert!(queue.statuses().is_empty());

    assert_eq!(queue.clear(), 0);

    assert!(queue.statuses().is_empty());
    assert_eq!(queue.pending(), 0);
}

#[tokio::test]
async fn test_clear_drains_pending_jobs() {
    let queue = JobQueue::with_capacity(5);
    for i in 0..5 {
        queue
            .enqueue(ScriptedJob::succeeding(&format!("cjob-{i}")))
            .await
            .unwrap();
    }
    assert_eq!(queue.statuses().len(), 5);
    assert_eq!(queue.pending(), 5);

    let drained = queue.clear();

    assert_eq!(drained, 5);
    assert!(queue.statuses().is_empty());
    assert_eq!(queue.pending(), 0);

    // The channel was full before clear; a push must not block now.
    let pushed = tokio::time::timeout(
        Duration::from_millis(100),
        queue.enqueue(ScriptedJob::succeeding("X")),
    )
    .await;
    assert!(pushed.is_ok(), "enqueue blocked after clear");
    assert!(pushed.unwrap().is_ok());
    assert_eq!(queue.statuses()[&JobId::new("X")], JobStatus::Queued);
}

#[tokio::test]
async fn test_clear_keeps_queue_usable() {
    let queue = JobQueue::with_capacity(2);
    queue.enqueue(ScriptedJob::succeeding("old")).await.unwrap();
    queue.clear();

    queue.enqueue(ScriptedJob::succeeding("new-1")).await.unwrap();
    queue.enqueue(ScriptedJob::succeeding("new-2")).await.unwrap();

    assert!(!queue.is_closed());
    assert_eq!(queue.pending(), 2);
    let statuses = queue.statuses();
    assert_eq!(statuses.len(), 2);
    assert!(!statuses.contains_key(&JobId::new("old")));
}

#[tokio::test]
async fn test_full_queue_applies_backpressure() {
    let queue = Arc::new(JobQueue::with_capacity(1));
    queue.enqueue(ScriptedJob::succeeding("first")).await.unwrap();

    let blocked = tokio::time::timeout(
        Duration::from_millis(50),
        queue.enqueue(ScriptedJob::succeeding("second")),
    )
    .await;
    assert!(blocked.is_err(), "enqueue on a full queue should wait");

    // Freeing the slot lets a waiting enqueue through.
    let waiter = {
        let queue = queue.clone();
        tokio::spawn(async move { queue.enqueue(ScriptedJob::succeeding("third")).await })
    };
    tokio::task::yield_now().await;
    queue.clear();

    let result = tokio::time::timeout(Duration::from_secs(1), waiter)
        .await
        .expect("waiting enqueue never completed")
        .unwrap();
    assert!(result.is_ok());
    assert_eq!(queue.pending(), 1);
    // The waiter pushed after the reset, so its entry survives the clear.
    let statuses = queue.statuses();
    assert_eq!(statuses.len(), 1);
    assert_eq!(statuses[&JobId::new("third")], JobStatus::Queued);
}

#[tokio::test]
async fn test_abandoned_enqueue_leaves_no_ledger_entry() {
    let queue = JobQueue::with_capacity(1);
    queue.enqueue(ScriptedJob::succeeding("first")).await.unwrap();

    let abandoned = tokio::time::timeout(
        Duration::from_millis(50),
        queue.enqueue(ScriptedJob::succeeding("ghost")),
    )
    .await;
    assert!(abandoned.is_err());

    let statuses = queue.statuses();
    assert_eq!(statuses.len(), 1);
    assert!(!statuses.contains_key(&JobId::new("ghost")));
    assert_eq!(queue.pending(), 1);
}

#[tokio::test]
async fn test_clear_races_with_concurrent_enqueues() {
    let queue = Arc::new(JobQueue::with_capacity(8));

    let producer = {
        let queue = queue.clone();
        tokio::spawn(async move {
            for i in 0..200 {
                queue
                    .enqueue(ScriptedJob::succeeding(&format!("p-{i}")))
                    .await
                    .unwrap();
            }
        })
    };

    let clearer = {
        let queue = queue.clone();
        tokio::spawn(async move {
            for _ in 0..100 {
                queue.clear();
                tokio::task::yield_now().await;
            }
        })
    };

    clearer.await.unwrap();
    // Nothing consumes the queue, so keep clearing until the producer is done.
    while !producer.is_finished() {
        queue.clear();
        tokio::task::yield_now().await;
    }
    producer.await.unwrap();

    queue.clear();
    assert!(queue.statuses().is_empty());
    assert_eq!(queue.pending(), 0);
}

#[tokio::test]
async fn test_buffered_jobs_always_have_ledger_entries() {
    let queue = Arc::new(JobQueue::with_capacity(4));

    let producer = {
        let queue = queue.clone();
        tokio::spawn(async move {
            for i in 0..100 {
                queue
                    .enqueue(ScriptedJob::succeeding(&format!("p-{i}")))
                    .await
                    .unwrap();
            }
        })
    };

    while !producer.is_finished() {
        queue.clear();
        tokio::task::yield_now().await;
        // Whatever survived the last clear is both buffered and recorded.
        assert!(queue.statuses().len() >= queue.pending());
    }
    producer.await.unwrap();

    assert_eq!(queue.statuses().len(), queue.pending());
}
