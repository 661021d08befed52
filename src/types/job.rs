use super::states::JobStatus;

/// Identifier handed out by the engine, unique for its lifetime.
pub type JobId = u64;

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Job {
    id: JobId,
    owner: String,
    label: String,
    created_at: u64,
    /// Lower is more urgent.
    pub(crate) priority: u32,
    /// Simulated time units spent waiting. Frozen once the job stops waiting.
    pub(crate) waited: u64,
    pub(crate) status: JobStatus,
    /// Number of aging boundaries already applied to `priority`.
    pub(crate) aged_boundaries: u64,
}

impl Job {
    pub fn new(
        id: JobId,
        owner: impl Into<String>,
        label: impl Into<String>,
        priority: u32,
        created_at: u64,
    ) -> Self {
        Self {
            id,
            owner: owner.into(),
            label: label.into(),
            created_at,
            priority,
            waited: 0,
            status: JobStatus::Waiting,
            aged_boundaries: 0,
        }
    }

    pub fn id(&self) -> JobId {
        self.id
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Logical time of submission. Diagnostic only, never used for ordering.
    pub fn created_at(&self) -> u64 {
        self.created_at
    }

    pub fn priority(&self) -> u32 {
        self.priority
    }

    pub fn waited(&self) -> u64 {
        self.waited
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    pub fn is_waiting(&self) -> bool {
        self.status == JobStatus::Waiting
    }

    /// Moves the job to `next`. Backward transitions are engine defects.
    pub(crate) fn transition(&mut self, next: JobStatus) {
        assert!(
            self.status.can_become(next),
            "job {} cannot move from {} to {}",
            self.id,
            self.status,
            next
        );
        self.status = next;
    }

    /// Adds `units` of wait time if the job is still waiting.
    pub(crate) fn accrue_wait(&mut self, units: u64) {
        if self.is_waiting() {
            self.waited = self.waited.saturating_add(units);
        }
    }
}
