//! Executes parsed script commands against one engine.
use std::sync::Arc;

use tokio::sync::broadcast::{self, error::TryRecvError};
use tracing::warn;

use crate::engine::{QueueEngine, QueueEvent};
use crate::error::QueueError;
use crate::fan_out::submit_concurrently;
use crate::render::render_status;
use crate::types::job::JobId;
use crate::types::protocol::{SpoolCommand, SpoolResponse};

/// Runs commands and turns their outcomes into replies, including one
/// `EXPIRED` reply for every job the engine evicted along the way.
pub struct Dispatcher {
    engine: Arc<QueueEngine>,
    events: broadcast::Receiver<QueueEvent>,
}

impl Dispatcher {
    pub fn new(engine: Arc<QueueEngine>) -> Self {
        let events = engine.subscribe();
        Self { engine, events }
    }

    pub fn engine(&self) -> &Arc<QueueEngine> {
        &self.engine
    }

    /// Executes `cmd`. `Quit` yields no replies; stopping is up to the caller.
    pub async fn execute(&mut self, cmd: SpoolCommand) -> Vec<SpoolResponse> {
        use SpoolCommand::*;

        let mut replies = match cmd {
            Submit {
                owner,
                label,
                priority,
            } => {
                let outcome = self.engine.submit(&owner, &label, priority);
                vec![submit_reply(outcome)]
            },
            Burst { jobs } => {
                submit_concurrently(Arc::clone(&self.engine), jobs)
                    .await
                    .into_iter()
                    .map(submit_reply)
                    .collect()
            },
            Tick { units } => {
                let report = self.engine.advance_time(units);
                vec![SpoolResponse::Ticked {
                    now: report.now,
                    expired: report.expired.len(),
                }]
            },
            Select => match self.engine.select_highest_priority() {
                Ok(job) => vec![SpoolResponse::Selected { job }],
                Err(_) => vec![SpoolResponse::Empty],
            },
            Status => {
                let (now, jobs) = self.engine.snapshot_at();
                vec![SpoolResponse::OkStatus {
                    text: render_status(&jobs, now, self.engine.capacity()),
                }]
            },
            Snapshot => vec![SpoolResponse::OkSnapshot {
                jobs: self.engine.snapshot(),
            }],
            Stats => vec![SpoolResponse::OkStats {
                data: self.engine.stats(),
            }],
            Quit => Vec::new(),
        };

        replies.extend(self.drain_expiries());
        replies
    }

    fn drain_expiries(&mut self) -> Vec<SpoolResponse> {
        let mut expired = Vec::new();

        loop {
            match self.events.try_recv() {
                Ok(QueueEvent::Expired(job)) => {
                    expired.push(SpoolResponse::Expired { job })
                },
                Ok(QueueEvent::Completed(_)) => {},
                Err(TryRecvError::Lagged(missed)) => {
                    warn!(missed, "dropped queue notifications");
                },
                Err(TryRecvError::Empty | TryRecvError::Closed) => break,
            }
        }

        expired
    }
}

fn submit_reply(outcome: Result<JobId, QueueError>) -> SpoolResponse {
    match outcome {
        Ok(id) => SpoolResponse::Inserted { id },
        Err(_) => SpoolResponse::QueueFull,
    }
}
