use std::fmt;

use serde::Serialize;

/// Lifecycle of a job. Transitions only move forward:
/// `Waiting -> Selected -> Completed`, or `Waiting -> Expired`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum JobStatus {
    Waiting,
    Selected,
    Completed,
    Expired,
}

impl JobStatus {
    fn rank(self) -> u8 {
        use JobStatus::*;

        match self {
            Waiting => 0,
            Selected => 1,
            Completed => 2,
            Expired => 2,
        }
    }

    /// Whether moving from `self` to `next` is a legal forward transition.
    pub fn can_become(self, next: JobStatus) -> bool {
        use JobStatus::*;

        match (self, next) {
            (Waiting, Selected) | (Waiting, Expired) => true,
            (Selected, Completed) => true,
            _ => false,
        }
    }

    /// Whether the job has left the queue for good.
    pub fn is_terminal(self) -> bool {
        self.rank() == 2
    }

    pub fn as_str(self) -> &'static str {
        use JobStatus::*;

        match self {
            Waiting => "waiting",
            Selected => "selected",
            Completed => "completed",
            Expired => "expired",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Allows job views and stats to be written out as YAML.
impl Serialize for JobStatus {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}
