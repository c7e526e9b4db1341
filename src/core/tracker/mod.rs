//! Batch job tracker
//!
//! Polls every tracked remote job on a fixed interval until none is active.
//! A job is active while it has an identifier and a non-terminal status;
//! `failing` is non-terminal because the platform can self-heal a degraded
//! job. By default the loop has no timeout (an unresponsive remote job
//! polls forever), but callers may set a deadline, and a cancellation
//! signal is honored at each cycle boundary.

use crate::adapters::platform::PlatformGateway;
use crate::console::Reporter;
use crate::domain::{FerryError, JobStatus, Result, TransferJob, MATCH_ALL_FILTER};
use chrono::Utc;
use std::time::{Duration, Instant};
use tokio::sync::watch;

/// Polling cadence and bounds for one tracking session.
#[derive(Debug, Clone)]
pub struct PollSettings {
    /// Fixed sleep between poll cycles
    pub interval: Duration,
    /// Optional wall-clock bound on the whole session; `None` polls forever
    pub deadline: Option<Duration>,
}

impl PollSettings {
    pub fn new(interval: Duration, deadline: Option<Duration>) -> Self {
        Self { interval, deadline }
    }
}

/// State machine driver for a set of concurrently-submitted remote jobs.
pub struct JobTracker {
    jobs: Vec<TransferJob>,
    settings: PollSettings,
}

impl JobTracker {
    pub fn new(settings: PollSettings) -> Self {
        Self {
            jobs: Vec::new(),
            settings,
        }
    }

    /// Register a submitted job for tracking.
    pub fn track(&mut self, job: TransferJob) {
        self.jobs.push(job);
    }

    pub fn jobs(&self) -> &[TransferJob] {
        &self.jobs
    }

    pub fn jobs_mut(&mut self) -> &mut [TransferJob] {
        &mut self.jobs
    }

    pub fn into_jobs(self) -> Vec<TransferJob> {
        self.jobs
    }

    pub fn has_active_jobs(&self) -> bool {
        self.jobs.iter().any(TransferJob::is_active)
    }

    /// Fetch the current status of every active job once.
    ///
    /// Import jobs additionally refresh their live record count; that count
    /// is the only progress signal the platform offers. Export and removal
    /// jobs never touch `current_fetch_count` here.
    pub async fn poll_cycle(&mut self, gateway: &dyn PlatformGateway) -> Result<()> {
        for job in self.jobs.iter_mut().filter(|job| job.is_active()) {
            let id = job.id.clone().unwrap_or_default();
            let prefix = format!(
                "Unsuccessful grabbing status of {} job for type {}",
                job.kind.tracker_type(),
                job.entity_type
            );
            let payload = serde_json::json!({
                "this": { "id": id },
                "include": "run",
            });
            let doc = gateway
                .call(job.kind.tracker_type(), "get", payload, &prefix)
                .await?;

            if let Some(raw) = doc.run_status() {
                job.advance(JobStatus::from_remote(&raw));
            }

            if job.kind.polls_record_count() {
                job.current_fetch_count = Some(
                    gateway
                        .fetch_count(&job.entity_type, MATCH_ALL_FILTER)
                        .await?,
                );
            }
        }
        Ok(())
    }

    /// Drive all tracked jobs to a terminal state.
    ///
    /// Sleeps the fixed interval between cycles and prints one status line
    /// per job after each cycle. Exceeding the configured deadline fails
    /// with [`FerryError::PollTimeout`]; a raised cancellation signal fails
    /// with [`FerryError::Aborted`] at the next cycle boundary.
    pub async fn wait_for_completion(
        &mut self,
        gateway: &dyn PlatformGateway,
        reporter: &Reporter,
        cancel: &watch::Receiver<bool>,
    ) -> Result<()> {
        let started = Instant::now();
        while self.has_active_jobs() {
            if *cancel.borrow() {
                return Err(FerryError::Aborted(
                    "cancellation requested while polling batch jobs".to_string(),
                ));
            }
            if let Some(deadline) = self.settings.deadline {
                if started.elapsed() >= deadline {
                    return Err(FerryError::PollTimeout {
                        waited_seconds: started.elapsed().as_secs(),
                    });
                }
            }

            tokio::time::sleep(self.settings.interval).await;
            self.poll_cycle(gateway).await?;

            let now = Utc::now();
            for job in &self.jobs {
                reporter.status(&job.progress_prefix(), &job.progress_suffix(now));
            }
        }
        Ok(())
    }
}
