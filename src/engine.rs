//! The queue engine: one lock around the store, the clock and the counters.
//!
//! Every public operation takes the lock once and finishes its whole
//! sequence (capacity check and insert; wait update, aging and expiry;
//! expiry re-check, selection and removal) before releasing it. No operation
//! blocks waiting for space or for a job: full and empty are returned as
//! values.
use std::cmp::Reverse;

use itertools::Itertools;
use parking_lot::Mutex;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::config::QueueConfig;
use crate::error::QueueError;
use crate::policy::{AgingPolicy, ExpiryPolicy};
use crate::store::BoundedJobStore;
use crate::types::job::{Job, JobId};
use crate::types::protocol::{JobView, QueueStats};
use crate::types::states::JobStatus;

/// Notifications buffered per subscriber before the oldest are dropped.
const EVENT_BUFFER: usize = 1024;

/// Notifications emitted from inside the critical section, in the order the
/// engine made the changes.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum QueueEvent {
    /// A waiting job was evicted. Carries the job in its final state.
    Expired(Job),
    /// A job was selected and completed.
    Completed(Job),
}

/// What a call to [`QueueEngine::advance_time`] changed.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct TickReport {
    /// Simulated time after the advance.
    pub now: u64,
    /// Jobs whose priority improved, with their new priority.
    pub promoted: Vec<(JobId, u32)>,
    /// Jobs evicted by the sweep, in insertion order.
    pub expired: Vec<Job>,
}

#[derive(Debug)]
struct EngineState {
    store: BoundedJobStore,
    clock: Clock,
    next_id: JobId,
    stats: Counters,
}

#[derive(Debug, Default)]
struct Counters {
    submitted: u64,
    rejected: u64,
    completed: u64,
    expired: u64,
}

/// Ordering key for selection: most urgent priority first, then longest wait.
/// Equal keys fall back to insertion order.
fn urgency(job: &Job) -> (u32, Reverse<u64>) {
    (job.priority(), Reverse(job.waited()))
}

pub struct QueueEngine {
    config: QueueConfig,
    aging: AgingPolicy,
    expiry: ExpiryPolicy,
    state: Mutex<EngineState>,
    events: broadcast::Sender<QueueEvent>,
}

impl QueueEngine {
    /// Builds an engine, failing if `config` is not usable.
    pub fn new(config: QueueConfig) -> Result<Self, QueueError> {
        config.validate()?;

        let (events, _) = broadcast::channel(EVENT_BUFFER);

        Ok(Self {
            aging: AgingPolicy::new(
                config.aging_interval,
                config.priority_floor,
            ),
            expiry: ExpiryPolicy::new(config.expiry_threshold),
            state: Mutex::new(EngineState {
                store: BoundedJobStore::new(config.capacity),
                clock: Clock::new(),
                next_id: 1,
                stats: Counters::default(),
            }),
            events,
            config,
        })
    }

    pub fn config(&self) -> &QueueConfig {
        &self.config
    }

    /// Receives every expiry and completion from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<QueueEvent> {
        self.events.subscribe()
    }

    /// Adds a job with the given priority, or the configured default. A
    /// priority more urgent than the floor is raised to the floor.
    pub fn submit(
        &self,
        owner: &str,
        label: &str,
        priority: Option<u32>,
    ) -> Result<JobId, QueueError> {
        let priority = priority
            .unwrap_or(self.config.default_priority)
            .max(self.config.priority_floor);

        let mut state = self.state.lock();
        let id = state.next_id;
        let job = Job::new(id, owner, label, priority, state.clock.now());

        match state.store.try_insert(job) {
            Ok(()) => {
                state.next_id += 1;
                state.stats.submitted += 1;
                debug!(
                    id,
                    owner,
                    label,
                    priority,
                    size = state.store.len(),
                    "job submitted"
                );
                Ok(id)
            },
            Err(_) => {
                state.stats.rejected += 1;
                warn!(
                    owner,
                    label,
                    capacity = self.config.capacity,
                    "queue full, job rejected"
                );
                Err(QueueError::QueueFull)
            },
        }
    }

    /// Moves simulated time forward by `units`: every waiting job accrues the
    /// wait, then ages, then the expiry sweep evicts anything overdue.
    pub fn advance_time(&self, units: u64) -> TickReport {
        let mut state = self.state.lock();
        let now = state.clock.advance(units);

        if units == 0 {
            return TickReport {
                now,
                ..TickReport::default()
            };
        }

        let mut promoted = Vec::new();
        for job in state.store.active_jobs_mut() {
            job.accrue_wait(units);
        }
        for job in state.store.active_jobs_mut() {
            if self.aging.apply(job) > 0 {
                info!(
                    id = job.id(),
                    label = job.label(),
                    priority = job.priority(),
                    now,
                    "job priority aged"
                );
                promoted.push((job.id(), job.priority()));
            }
        }

        let expired = self.sweep_expired(&mut state);

        TickReport {
            now,
            promoted,
            expired,
        }
    }

    /// Removes and completes the most urgent waiting job. Overdue jobs are
    /// evicted first so they can never be chosen.
    pub fn select_highest_priority(&self) -> Result<Job, QueueError> {
        let mut state = self.state.lock();

        if state.store.is_empty() {
            debug!("no jobs to select");
            return Err(QueueError::EmptyQueue);
        }

        self.sweep_expired(&mut state);

        let chosen = state
            .store
            .active_jobs()
            .min_by_key(|job| urgency(job))
            .map(Job::id)
            .ok_or(QueueError::EmptyQueue)?;

        let mut removed = state.store.remove_where(|job| job.id() == chosen);
        assert_eq!(removed.len(), 1, "job ids must be unique in the store");
        let mut job = removed.remove(0);

        job.transition(JobStatus::Selected);
        job.transition(JobStatus::Completed);
        debug_assert!(job.status().is_terminal());
        state.stats.completed += 1;

        debug!(
            id = job.id(),
            owner = job.owner(),
            label = job.label(),
            priority = job.priority(),
            waited = job.waited(),
            now = state.clock.now(),
            "job completed"
        );
        let _ = self.events.send(QueueEvent::Completed(job.clone()));

        Ok(job)
    }

    /// Waiting jobs, most urgent first. Reads only: nothing ages or expires.
    pub fn snapshot(&self) -> Vec<JobView> {
        self.snapshot_at().1
    }

    /// Like [`snapshot`](Self::snapshot), paired with the simulated time it
    /// was taken at. Both come from the same critical section.
    pub fn snapshot_at(&self) -> (u64, Vec<JobView>) {
        let state = self.state.lock();

        let jobs = state
            .store
            .active_jobs()
            .filter(|job| job.is_waiting())
            .sorted_by_key(|job| urgency(job))
            .map(|job| JobView {
                id: job.id(),
                owner: job.owner().to_owned(),
                label: job.label().to_owned(),
                priority: job.priority(),
                waited: job.waited(),
                time_to_expiry: self.expiry.time_to_expiry(job),
                status: job.status(),
                created_at: job.created_at(),
            })
            .collect();

        (state.clock.now(), jobs)
    }

    pub fn stats(&self) -> QueueStats {
        let state = self.state.lock();

        QueueStats {
            capacity: state.store.capacity(),
            current_jobs_waiting: state.store.len(),
            now: state.clock.now(),
            total_submitted: state.stats.submitted,
            total_rejected: state.stats.rejected,
            total_completed: state.stats.completed,
            total_expired: state.stats.expired,
        }
    }

    pub fn now(&self) -> u64 {
        self.state.lock().clock.now()
    }

    pub fn size(&self) -> usize {
        self.state.lock().store.len()
    }

    pub fn capacity(&self) -> usize {
        self.config.capacity
    }

    pub fn is_full(&self) -> bool {
        self.state.lock().store.is_full()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().store.is_empty()
    }

    /// Evicts every overdue job. Must be called with the lock held.
    fn sweep_expired(&self, state: &mut EngineState) -> Vec<Job> {
        let mut expired =
            state.store.remove_where(|job| self.expiry.is_expired(job));
        let now = state.clock.now();

        for job in expired.iter_mut() {
            job.transition(JobStatus::Expired);
            state.stats.expired += 1;

            info!(
                id = job.id(),
                owner = job.owner(),
                label = job.label(),
                waited = job.waited(),
                now,
                "job expired"
            );
            let _ = self.events.send(QueueEvent::Expired(job.clone()));
        }

        assert!(state.store.len() <= state.store.capacity());
        expired
    }
}
