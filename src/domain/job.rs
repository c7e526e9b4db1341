//! Batch transfer job model
//!
//! A [`TransferJob`] tracks one asynchronous remote job (export, import or
//! removal) from submission through polling to a terminal state. Status only
//! moves forward: terminal states are frozen and nothing ever transitions
//! back to `submitted`. The completion timestamp is stamped exactly once, on
//! the transition into `completed`.

use crate::adapters::platform::wire::WireDocument;
use crate::console;
use chrono::{DateTime, Utc};

/// Kind of remote job being tracked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobKind {
    /// Export job producing chunk files on the platform
    Export,
    /// Import job consuming uploaded chunk files
    Import,
    /// Remove-all job deleting a type's records
    Remove,
}

impl JobKind {
    /// Remote type name the job's status is polled on.
    pub fn tracker_type(&self) -> &'static str {
        match self {
            JobKind::Export => "Export",
            JobKind::Import => "Import",
            JobKind::Remove => "AsyncAction",
        }
    }

    /// Whether the poll loop should refresh the live record count each cycle.
    /// Only import jobs derive progress from the count; there is no direct
    /// progress API.
    pub fn polls_record_count(&self) -> bool {
        matches!(self, JobKind::Import)
    }
}

/// Remote job status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Submitted,
    Running,
    Completed,
    Failing,
    Failed,
}

impl JobStatus {
    /// Parse a status string reported by the platform.
    ///
    /// Unknown intermediate statuses (`queued`, `completing`, ...) map to
    /// `Running`: they are non-terminal and must keep being polled.
    pub fn from_remote(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "submitted" => JobStatus::Submitted,
            "running" => JobStatus::Running,
            "completed" => JobStatus::Completed,
            "failing" => JobStatus::Failing,
            "failed" => JobStatus::Failed,
            _ => JobStatus::Running,
        }
    }

    /// Terminal states never transition again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    /// Failing or failed jobs produce queue-error artifacts.
    pub fn is_failure(&self) -> bool {
        matches!(self, JobStatus::Failing | JobStatus::Failed)
    }

    fn allows(&self, next: JobStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        match (self, next) {
            // nothing regresses to submitted
            (JobStatus::Submitted, JobStatus::Submitted) => true,
            (_, JobStatus::Submitted) => false,
            // a failing job may settle or self-heal to completed, not "run"
            (JobStatus::Failing, JobStatus::Running) => false,
            _ => true,
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            JobStatus::Submitted => "submitted",
            JobStatus::Running => "running",
            JobStatus::Completed => "completed",
            JobStatus::Failing => "failing",
            JobStatus::Failed => "failed",
        };
        write!(f, "{s}")
    }
}

/// One tracked remote job for one entity type.
#[derive(Debug, Clone)]
pub struct TransferJob {
    /// Entity type the job operates on
    pub entity_type: String,

    /// Job kind (drives polling and progress-line shape)
    pub kind: JobKind,

    /// Remote job identifier; `None` when submission returned no id
    pub id: Option<String>,

    status: JobStatus,

    /// When the job was submitted
    pub launch_time: DateTime<Utc>,

    /// Set exactly once, on the transition into `completed`
    pub completion_time: Option<DateTime<Utc>>,

    /// Record count captured at submission time
    pub initial_fetch_count: Option<u64>,

    /// Live record count, refreshed each poll cycle for import jobs only
    pub current_fetch_count: Option<u64>,

    /// Result file locations (export jobs, populated after completion)
    pub file_urls: Vec<String>,

    /// Filter predicate the job was scoped by (export jobs only)
    pub filter: Option<String>,
}

impl TransferJob {
    /// Create a job entry from a submission response.
    ///
    /// The job id is extracted from either an XML or a JSON response body.
    /// A missing id leaves the job inert: the tracker never polls it.
    pub fn from_submission(
        entity_type: impl Into<String>,
        kind: JobKind,
        response: &WireDocument,
        filter: Option<String>,
    ) -> Self {
        Self {
            entity_type: entity_type.into(),
            kind,
            id: response.job_id(),
            status: JobStatus::Submitted,
            launch_time: Utc::now(),
            completion_time: None,
            initial_fetch_count: None,
            current_fetch_count: None,
            file_urls: Vec::new(),
            filter,
        }
    }

    /// Current status.
    pub fn status(&self) -> JobStatus {
        self.status
    }

    /// Apply a polled status, enforcing forward-only transitions.
    ///
    /// Disallowed transitions are ignored rather than failing the run; the
    /// remote platform remains the source of truth for everything else.
    pub fn advance(&mut self, next: JobStatus) {
        if !self.status.allows(next) {
            return;
        }
        if next == JobStatus::Completed && self.completion_time.is_none() {
            self.completion_time = Some(Utc::now());
        }
        self.status = next;
    }

    /// A job is active while it has an id and a non-terminal status.
    pub fn is_active(&self) -> bool {
        self.id.is_some() && !self.status.is_terminal()
    }

    /// `Elapsed:HHh:MMm:SSs` since launch, or launch->completion once
    /// terminal. `N/A` when the job never got an id.
    pub fn elapsed_label(&self, now: DateTime<Utc>) -> String {
        if self.id.is_none() {
            return "N/A".to_string();
        }
        let end = self.completion_time.unwrap_or(now);
        let elapsed = (end - self.launch_time).max(chrono::Duration::zero());
        let total_seconds = elapsed.num_seconds();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;
        format!("Elapsed:{hours:02}h:{minutes:02}m:{seconds:02}s")
    }

    /// Human prefix for this job's progress line.
    pub fn progress_prefix(&self) -> String {
        match self.kind {
            JobKind::Remove => format!("Removing {}", self.entity_type),
            JobKind::Import => format!("Adding {}", self.entity_type),
            JobKind::Export => format!("Checking {}", self.entity_type),
        }
    }

    /// Human suffix for this job's progress line; shape depends on kind.
    pub fn progress_suffix(&self, now: DateTime<Utc>) -> String {
        let elapsed = self.elapsed_label(now);
        let initial = self.initial_fetch_count.unwrap_or(0);
        let current = self.current_fetch_count.unwrap_or(0);
        match self.kind {
            JobKind::Remove => {
                let removed = initial.saturating_sub(current);
                format!(
                    "{elapsed}: {}/{}: {}",
                    console::group_digits(removed),
                    console::group_digits(initial),
                    self.status
                )
            }
            JobKind::Import => format!(
                "{elapsed}: {}/{}: {}",
                console::group_digits(current),
                console::group_digits(initial),
                self.status
            ),
            JobKind::Export => format!("{elapsed}: {}", self.status),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::platform::wire::WireDocument;

    fn job_with_id(kind: JobKind) -> TransferJob {
        let doc = WireDocument::parse(r#"{"id": "job-1"}"#);
        TransferJob::from_submission("Order", kind, &doc, None)
    }

    #[test]
    fn test_id_extracted_from_json_submission() {
        let job = job_with_id(JobKind::Export);
        assert_eq!(job.id.as_deref(), Some("job-1"));
        assert_eq!(job.status(), JobStatus::Submitted);
    }

    #[test]
    fn test_id_extracted_from_xml_submission() {
        let doc = WireDocument::parse("<job><id>batch-9</id></job>");
        let job = TransferJob::from_submission("Order", JobKind::Import, &doc, None);
        assert_eq!(job.id.as_deref(), Some("batch-9"));
    }

    #[test]
    fn test_terminal_states_are_frozen() {
        let mut job = job_with_id(JobKind::Export);
        job.advance(JobStatus::Completed);
        let stamped = job.completion_time;
        assert!(stamped.is_some());

        job.advance(JobStatus::Running);
        assert_eq!(job.status(), JobStatus::Completed);
        job.advance(JobStatus::Failed);
        assert_eq!(job.status(), JobStatus::Completed);
        assert_eq!(job.completion_time, stamped);
    }

    #[test]
    fn test_no_regression_to_submitted() {
        let mut job = job_with_id(JobKind::Export);
        job.advance(JobStatus::Running);
        job.advance(JobStatus::Submitted);
        assert_eq!(job.status(), JobStatus::Running);
    }

    #[test]
    fn test_failing_may_self_heal_to_completed() {
        let mut job = job_with_id(JobKind::Import);
        job.advance(JobStatus::Failing);
        assert!(job.is_active());
        job.advance(JobStatus::Completed);
        assert_eq!(job.status(), JobStatus::Completed);
    }

    #[test]
    fn test_failing_does_not_return_to_running() {
        let mut job = job_with_id(JobKind::Import);
        job.advance(JobStatus::Failing);
        job.advance(JobStatus::Running);
        assert_eq!(job.status(), JobStatus::Failing);
    }

    #[test]
    fn test_unknown_remote_status_keeps_polling() {
        assert_eq!(JobStatus::from_remote("queued"), JobStatus::Running);
        assert_eq!(JobStatus::from_remote("completing"), JobStatus::Running);
        assert_eq!(JobStatus::from_remote("Completed"), JobStatus::Completed);
    }

    #[test]
    fn test_job_without_id_is_inert() {
        let doc = WireDocument::parse("{}");
        let job = TransferJob::from_submission("Order", JobKind::Export, &doc, None);
        assert!(job.id.is_none());
        assert!(!job.is_active());
        assert_eq!(job.elapsed_label(Utc::now()), "N/A");
    }

    #[test]
    fn test_progress_line_shapes() {
        let now = Utc::now();

        let mut import = job_with_id(JobKind::Import);
        import.initial_fetch_count = Some(12000);
        import.current_fetch_count = Some(3500);
        assert_eq!(import.progress_prefix(), "Adding Order");
        assert!(import.progress_suffix(now).contains("3,500/12,000"));

        let mut remove = job_with_id(JobKind::Remove);
        remove.initial_fetch_count = Some(10);
        remove.current_fetch_count = Some(10);
        assert_eq!(remove.progress_prefix(), "Removing Order");
        assert!(remove.progress_suffix(now).contains("0/10"));

        let export = job_with_id(JobKind::Export);
        assert_eq!(export.progress_prefix(), "Checking Order");
        assert!(export.progress_suffix(now).contains("submitted"));
    }
}
