//! Concurrent submission of a batch of jobs, one blocking task per job.
use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::debug;

use crate::engine::QueueEngine;
use crate::error::QueueError;
use crate::types::job::JobId;

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Submission {
    pub owner: String,
    pub label: String,
    pub priority: Option<u32>,
}

pub type SubmitOutcome = Result<JobId, QueueError>;

/// Submits every job in `batch` from its own blocking-pool thread and waits
/// for all of them.
///
/// Submitters run in parallel whatever the runtime flavour, racing for the
/// engine lock, so which submissions win the free slots is unspecified.
/// Every submission gets exactly one outcome, reported in batch order.
pub async fn submit_concurrently(
    engine: Arc<QueueEngine>,
    batch: Vec<Submission>,
) -> Vec<SubmitOutcome> {
    fan_out(batch, move |submission| {
        engine.submit(
            &submission.owner,
            &submission.label,
            submission.priority,
        )
    })
    .await
}

async fn fan_out<F>(batch: Vec<Submission>, submit: F) -> Vec<SubmitOutcome>
where
    F: Fn(Submission) -> SubmitOutcome + Send + Sync + 'static,
{
    let submit = Arc::new(submit);
    let mut tasks = JoinSet::new();
    let n = batch.len();

    for (idx, submission) in batch.into_iter().enumerate() {
        let submit = Arc::clone(&submit);
        tasks.spawn_blocking(move || (idx, submit(submission)));
    }

    let mut outcomes: Vec<Option<SubmitOutcome>> = vec![None; n];
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((idx, outcome)) => outcomes[idx] = Some(outcome),
            // A submit task can only fail by panicking, which means the
            // engine broke an invariant.
            Err(error) => std::panic::resume_unwind(error.into_panic()),
        }
    }

    let accepted = outcomes.iter().flatten().filter(|o| o.is_ok()).count();
    debug!(submitted = n, accepted, "concurrent batch finished");

    outcomes.into_iter().flatten().collect()
}

#[cfg(test)]
mod tests {
    use std::sync::Barrier;
    use std::time::Duration;

    use tokio::time::timeout;

    use super::*;
    use crate::config::QueueConfig;

    fn batch(n: usize) -> Vec<Submission> {
        (0..n)
            .map(|i| Submission {
                owner: format!("user{i}"),
                label: format!("doc{i}"),
                priority: Some((i % 5) as u32 + 1),
            })
            .collect()
    }

    fn engine(capacity: usize) -> Arc<QueueEngine> {
        Arc::new(
            QueueEngine::new(QueueConfig {
                capacity,
                ..QueueConfig::default()
            })
            .unwrap(),
        )
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_fan_out_never_exceeds_capacity() {
        let q = engine(4);
        q.submit("early", "early", None).unwrap();

        let outcomes = submit_concurrently(Arc::clone(&q), batch(10)).await;

        assert_eq!(outcomes.len(), 10);
        assert_eq!(outcomes.iter().filter(|o| o.is_ok()).count(), 3);
        assert_eq!(
            outcomes
                .iter()
                .filter(|o| **o == Err(QueueError::QueueFull))
                .count(),
            7
        );
        assert_eq!(q.size(), 4);

        // Every accepted id is distinct and present in the queue.
        let mut ids: Vec<_> =
            outcomes.iter().filter_map(|o| o.clone().ok()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 3);
        let queued: Vec<_> = q.snapshot().iter().map(|v| v.id).collect();
        assert!(ids.iter().all(|id| queued.contains(id)));
    }

    // Every submitter waits until all of them are running, which only
    // completes if they really run side by side, even on a single-threaded
    // runtime.
    #[tokio::test(flavor = "current_thread")]
    async fn test_submitters_run_in_parallel() {
        let n = 4;
        let q = engine(2);
        let barrier = Arc::new(Barrier::new(n));

        let submit = {
            let q = Arc::clone(&q);
            move |s: Submission| {
                barrier.wait();
                q.submit(&s.owner, &s.label, s.priority)
            }
        };
        let outcomes =
            timeout(Duration::from_secs(10), fan_out(batch(n), submit))
                .await
                .expect("submitters did not run concurrently");

        assert_eq!(outcomes.len(), n);
        assert_eq!(outcomes.iter().filter(|o| o.is_ok()).count(), 2);
        assert_eq!(q.size(), 2);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_current_thread_runtime_bounded_by_capacity() {
        let q = engine(2);
        let outcomes = submit_concurrently(Arc::clone(&q), batch(6)).await;

        assert_eq!(outcomes.len(), 6);
        assert_eq!(outcomes.iter().filter(|o| o.is_ok()).count(), 2);
        assert_eq!(q.stats().total_rejected, 4);
    }

    #[tokio::test]
    async fn test_fan_out_with_room_accepts_all() {
        let q = engine(5);
        let outcomes = submit_concurrently(Arc::clone(&q), batch(3)).await;

        assert!(outcomes.iter().all(|o| o.is_ok()));
        assert_eq!(q.size(), 3);
    }

    #[tokio::test]
    async fn test_fan_out_empty_batch() {
        let q = engine(1);
        assert!(submit_concurrently(q, Vec::new()).await.is_empty());
    }
}
