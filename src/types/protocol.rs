use serde::Serialize;

use super::job::{Job, JobId};
use super::serialisable::SpoolSerialisable;
use super::states::JobStatus;
use crate::fan_out::Submission;

/// A command read from the driving script.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SpoolCommand {
    /// Adds a job to the queue, failing with `QUEUE_FULL` at capacity. Jobs
    /// submitted without a priority get the configured default.
    ///
    /// In the script: `submit <owner> <label> [<pri>]`
    Submit {
        owner: String,
        label: String,
        priority: Option<u32>,
    },
    /// Moves simulated time forward, ageing and expiring waiting jobs.
    ///
    /// In the script: `tick [<units>]`, one unit when omitted.
    Tick { units: u64 },
    /// Removes and completes the most urgent waiting job.
    ///
    /// In the script: `select`
    Select,
    /// Renders the waiting jobs as a human-readable table.
    ///
    /// In the script: `status`
    Status,
    /// Returns the waiting jobs, most urgent first, as a YAML list.
    ///
    /// In the script: `snapshot`
    Snapshot,
    /// Returns queue counters as a YAML dictionary.
    ///
    /// In the script: `stats`
    Stats,
    /// Submits every job in the batch concurrently. Which submissions win the
    /// remaining slots is unspecified.
    ///
    /// In the script: `burst <owner> <label> <pri> [<owner> <label> <pri> ...]`
    Burst { jobs: Vec<Submission> },
    /// Stops reading the script.
    ///
    /// In the script: `quit`
    Quit,
}

/// All possible replies to a `SpoolCommand`.
#[derive(Debug)]
pub enum SpoolResponse {
    /// The command line could not be parsed.
    ///
    /// In the reply: `BAD_FORMAT`
    BadFormat,
    /// The command name was not recognised.
    ///
    /// In the reply: `UNKNOWN_COMMAND`
    UnknownCommand,
    /// A reply body could not be encoded.
    ///
    /// In the reply: `INTERNAL_ERROR`
    InternalError,
    /// In response to a `submit` or `burst`, the job was accepted.
    ///
    /// In the reply: `INSERTED <id>`
    Inserted { id: JobId },
    /// In response to a `submit` or `burst`, the queue had no free slot.
    ///
    /// In the reply: `QUEUE_FULL`
    QueueFull,
    /// In response to a `select`, the job that was chosen and completed.
    ///
    /// In the reply: `SELECTED <id> <owner> <label> <pri> <waited>`
    Selected { job: Job },
    /// In response to a `select`, nothing was waiting.
    ///
    /// In the reply: `EMPTY`
    Empty,
    /// In response to a `tick`, the new simulated time and how many jobs the
    /// sweep evicted.
    ///
    /// In the reply: `TICKED <now> <expired>`
    Ticked { now: u64, expired: usize },
    /// One per job evicted while handling the command.
    ///
    /// In the reply: `EXPIRED <id> <owner> <label> <waited>`
    Expired { job: Job },
    /// In response to a `status`.
    ///
    /// In the reply: `OK <n_bytes>` plus the rendered table.
    OkStatus { text: String },
    /// In response to a `snapshot`.
    ///
    /// In the reply: `OK <n_bytes>` plus data in YAML list format.
    OkSnapshot { jobs: Vec<JobView> },
    /// In response to a `stats`.
    ///
    /// In the reply: `OK <n_bytes>` plus data in YAML dictionary format.
    OkStats { data: QueueStats },
}

fn ok_body(body: &str) -> Vec<u8> {
    format!("OK {}\n{body}\n", body.len()).into()
}

fn ok_yaml<T: Serialize>(value: &T) -> Vec<u8> {
    match serde_yaml::to_string(value) {
        Ok(body) => ok_body(&body),
        Err(_) => SpoolResponse::InternalError.serialise_spool(),
    }
}

impl SpoolSerialisable for SpoolResponse {
    fn serialise_spool(&self) -> Vec<u8> {
        use SpoolResponse::*;

        match self {
            BadFormat => b"BAD_FORMAT\n".to_vec(),
            UnknownCommand => b"UNKNOWN_COMMAND\n".to_vec(),
            InternalError => b"INTERNAL_ERROR\n".to_vec(),
            Inserted { id } => format!("INSERTED {id}\n").into(),
            QueueFull => b"QUEUE_FULL\n".to_vec(),
            Selected { job } => format!(
                "SELECTED {} {} {} {} {}\n",
                job.id(),
                job.owner(),
                job.label(),
                job.priority(),
                job.waited(),
            )
            .into(),
            Empty => b"EMPTY\n".to_vec(),
            Ticked { now, expired } => format!("TICKED {now} {expired}\n").into(),
            Expired { job } => format!(
                "EXPIRED {} {} {} {}\n",
                job.id(),
                job.owner(),
                job.label(),
                job.waited(),
            )
            .into(),
            OkStatus { text } => ok_body(text),
            OkSnapshot { jobs } => ok_yaml(jobs),
            OkStats { data } => ok_yaml(data),
        }
    }
}

/// Read-only view of one waiting job, as handed to presentation layers.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct JobView {
    /// job ID
    pub id: JobId,
    /// who submitted the job
    pub owner: String,
    /// description given at submission
    pub label: String,
    /// current priority, lower is more urgent
    pub priority: u32,
    /// time units spent waiting so far
    pub waited: u64,
    /// time units left before eviction
    pub time_to_expiry: u64,
    /// job state
    pub status: JobStatus,
    /// logical time of submission
    pub created_at: u64,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct QueueStats {
    /// maximum number of waiting jobs
    pub capacity: usize,
    /// number of jobs currently waiting
    pub current_jobs_waiting: usize,
    /// current simulated time
    pub now: u64,
    /// cumulative count of accepted submissions
    pub total_submitted: u64,
    /// cumulative count of submissions refused for lack of space
    pub total_rejected: u64,
    /// cumulative count of jobs selected and completed
    pub total_completed: u64,
    /// cumulative count of jobs evicted for waiting too long
    pub total_expired: u64,
}
