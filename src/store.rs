//! Fixed-capacity, insertion-ordered job storage.
use std::collections::VecDeque;

use crate::types::job::Job;

/// Holds at most `capacity` jobs in insertion order (oldest first).
///
/// Appending is O(1). Removal from an arbitrary position is done as a single
/// compaction pass over every stored job, which keeps the relative order of
/// the survivors and costs O(n).
#[derive(Debug)]
pub struct BoundedJobStore {
    capacity: usize,
    jobs: VecDeque<Job>,
}

impl BoundedJobStore {
    /// Creates an empty store. `capacity` must be positive.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "store capacity must be positive");

        Self {
            capacity,
            jobs: VecDeque::new(),
        }
    }

    /// Appends `job` at the tail. When full, the job is handed back untouched.
    pub fn try_insert(&mut self, job: Job) -> Result<(), Job> {
        if self.is_full() {
            return Err(job);
        }

        self.jobs.push_back(job);
        debug_assert!(self.jobs.len() <= self.capacity);

        Ok(())
    }

    /// All stored jobs, oldest-inserted first.
    pub fn active_jobs(&self) -> impl ExactSizeIterator<Item = &Job> + '_ {
        self.jobs.iter()
    }

    pub(crate) fn active_jobs_mut(
        &mut self,
    ) -> impl Iterator<Item = &mut Job> + '_ {
        self.jobs.iter_mut()
    }

    /// Removes every job matching `predicate` in one compaction pass, keeping
    /// the survivors in their original relative order. Removed jobs are
    /// returned in insertion order.
    pub fn remove_where<F>(&mut self, mut predicate: F) -> Vec<Job>
    where
        F: FnMut(&Job) -> bool,
    {
        let mut kept = VecDeque::with_capacity(self.jobs.len());
        let mut removed = Vec::new();

        for job in self.jobs.drain(..) {
            if predicate(&job) {
                removed.push(job);
            } else {
                kept.push_back(job);
            }
        }

        self.jobs = kept;
        removed
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_full(&self) -> bool {
        self.jobs.len() == self.capacity
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(id: u64) -> Job {
        Job::new(id, "owner", format!("job-{id}"), 5, 0)
    }

    fn ids(store: &BoundedJobStore) -> Vec<u64> {
        store.active_jobs().map(Job::id).collect()
    }

    #[test]
    fn test_insert_until_full() {
        let mut store = BoundedJobStore::new(2);
        assert!(store.is_empty());

        assert!(store.try_insert(job(1)).is_ok());
        assert!(store.try_insert(job(2)).is_ok());
        assert!(store.is_full());

        // Rejected job comes back unchanged and the store is untouched.
        let rejected = store.try_insert(job(3)).unwrap_err();
        assert_eq!(rejected.id(), 3);
        assert_eq!(ids(&store), vec![1, 2]);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_remove_where_compacts_in_order() {
        let mut store = BoundedJobStore::new(5);
        for id in 1..=5 {
            store.try_insert(job(id)).unwrap();
        }

        let removed = store.remove_where(|j| j.id() % 2 == 0);
        assert_eq!(removed.iter().map(Job::id).collect::<Vec<_>>(), vec![2, 4]);
        assert_eq!(ids(&store), vec![1, 3, 5]);

        // Freed slots are reusable and new jobs land at the tail.
        store.try_insert(job(6)).unwrap();
        store.try_insert(job(7)).unwrap();
        assert!(store.is_full());
        assert_eq!(ids(&store), vec![1, 3, 5, 6, 7]);
    }

    #[test]
    fn test_remove_where_nothing_matches() {
        let mut store = BoundedJobStore::new(3);
        store.try_insert(job(1)).unwrap();

        assert!(store.remove_where(|_| false).is_empty());
        assert_eq!(ids(&store), vec![1]);
    }

    #[test]
    fn test_huge_capacity_allocates_on_demand() {
        let mut store = BoundedJobStore::new(usize::MAX);

        store.try_insert(job(1)).unwrap();
        assert!(!store.is_full());
        assert_eq!(store.len(), 1);
        assert_eq!(store.capacity(), usize::MAX);
    }

    #[test]
    #[should_panic]
    fn test_zero_capacity() {
        BoundedJobStore::new(0);
    }
}
