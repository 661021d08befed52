//! Pure decisions about waiting jobs: when they become more urgent, and when
//! they have waited too long. The engine performs the resulting changes.
use crate::types::job::Job;

/// Raises a waiting job's urgency by one level for every `interval` units of
/// wait it accumulates, never past `floor`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct AgingPolicy {
    interval: u64,
    floor: u32,
}

impl AgingPolicy {
    pub fn new(interval: u64, floor: u32) -> Self {
        assert!(interval > 0, "aging interval must be positive");

        Self { interval, floor }
    }

    /// Ages `job` for every interval boundary its wait has crossed since the
    /// last call, returning how many levels its priority actually dropped.
    ///
    /// Each boundary is applied exactly once, whatever the step size between
    /// calls: calling this twice at the same wait time changes nothing.
    pub fn apply(&self, job: &mut Job) -> u32 {
        if !job.is_waiting() {
            return 0;
        }

        let reached = job.waited / self.interval;
        if reached <= job.aged_boundaries {
            return 0;
        }

        let crossings = reached - job.aged_boundaries;
        job.aged_boundaries = reached;

        let before = job.priority;
        let steps = u32::try_from(crossings).unwrap_or(u32::MAX);
        job.priority = before.saturating_sub(steps).max(self.floor);

        before.saturating_sub(job.priority)
    }
}

/// Decides whether a waiting job has waited long enough to be evicted.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ExpiryPolicy {
    threshold: u64,
}

impl ExpiryPolicy {
    pub fn new(threshold: u64) -> Self {
        assert!(threshold > 0, "expiry threshold must be positive");

        Self { threshold }
    }

    pub fn is_expired(&self, job: &Job) -> bool {
        job.is_waiting() && job.waited >= self.threshold
    }

    /// Units of wait left before `job` is evicted, zero once it is due.
    pub fn time_to_expiry(&self, job: &Job) -> u64 {
        self.threshold.saturating_sub(job.waited)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::states::JobStatus;

    fn waiting(priority: u32, waited: u64) -> Job {
        let mut job = Job::new(1, "owner", "label", priority, 0);
        job.accrue_wait(waited);
        job
    }

    #[test]
    fn test_ages_once_per_boundary() {
        let aging = AgingPolicy::new(10, 1);
        let mut job = waiting(5, 0);

        // No wait yet: nothing happens.
        assert_eq!(aging.apply(&mut job), 0);

        for _ in 0..9 {
            job.accrue_wait(1);
            assert_eq!(aging.apply(&mut job), 0);
        }
        job.accrue_wait(1);
        assert_eq!(aging.apply(&mut job), 1);
        assert_eq!(job.priority(), 4);

        // Re-applying on the same boundary does not double-age.
        assert_eq!(aging.apply(&mut job), 0);
        assert_eq!(job.priority(), 4);
    }

    #[test]
    fn test_large_step_counts_every_boundary() {
        let aging = AgingPolicy::new(10, 1);
        let mut job = waiting(5, 25);

        assert_eq!(aging.apply(&mut job), 2);
        assert_eq!(job.priority(), 3);

        job.accrue_wait(5);
        assert_eq!(aging.apply(&mut job), 1);
        assert_eq!(job.priority(), 2);
    }

    #[test]
    fn test_floor() {
        let aging = AgingPolicy::new(10, 1);
        let mut job = waiting(2, 50);

        assert_eq!(aging.apply(&mut job), 1);
        assert_eq!(job.priority(), 1);

        job.accrue_wait(10);
        assert_eq!(aging.apply(&mut job), 0);
        assert_eq!(job.priority(), 1);
    }

    #[test]
    fn test_only_waiting_jobs_age() {
        let aging = AgingPolicy::new(10, 1);
        let mut job = waiting(5, 10);
        job.transition(JobStatus::Expired);

        assert_eq!(aging.apply(&mut job), 0);
        assert_eq!(job.priority(), 5);
    }

    #[test]
    fn test_expiry() {
        let expiry = ExpiryPolicy::new(60);

        let job = waiting(5, 59);
        assert!(!expiry.is_expired(&job));
        assert_eq!(expiry.time_to_expiry(&job), 1);

        let job = waiting(5, 60);
        assert!(expiry.is_expired(&job));
        assert_eq!(expiry.time_to_expiry(&job), 0);

        let mut job = waiting(5, 90);
        assert_eq!(expiry.time_to_expiry(&job), 0);
        job.transition(JobStatus::Selected);
        assert!(!expiry.is_expired(&job));
    }
}
