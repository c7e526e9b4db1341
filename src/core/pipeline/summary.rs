//! Per-type outcome accounting for a transfer run

use crate::domain::Direction;
use std::time::Duration;

/// Outcome of one entity type within a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeOutcome {
    /// The type was not processed (flag disabled, nothing to transfer, ...)
    Skipped { reason: String },
    /// The type transferred end to end
    Completed { records: usize },
    /// The type's remote job failed; the run continued
    Failed { reason: String },
}

/// Summary of one direction's run.
#[derive(Debug, Clone)]
pub struct TransferSummary {
    pub direction: Direction,
    outcomes: Vec<(String, TypeOutcome)>,
    pub duration: Duration,
}

impl TransferSummary {
    pub fn new(direction: Direction) -> Self {
        Self {
            direction,
            outcomes: Vec::new(),
            duration: Duration::ZERO,
        }
    }

    pub fn record_skip(&mut self, entity_type: &str, reason: impl Into<String>) {
        self.outcomes.push((
            entity_type.to_string(),
            TypeOutcome::Skipped {
                reason: reason.into(),
            },
        ));
    }

    pub fn record_success(&mut self, entity_type: &str, records: usize) {
        self.outcomes
            .push((entity_type.to_string(), TypeOutcome::Completed { records }));
    }

    pub fn record_failure(&mut self, entity_type: &str, reason: impl Into<String>) {
        self.outcomes.push((
            entity_type.to_string(),
            TypeOutcome::Failed {
                reason: reason.into(),
            },
        ));
    }

    pub fn outcomes(&self) -> &[(String, TypeOutcome)] {
        &self.outcomes
    }

    pub fn outcome_for(&self, entity_type: &str) -> Option<&TypeOutcome> {
        self.outcomes
            .iter()
            .find(|(name, _)| name == entity_type)
            .map(|(_, outcome)| outcome)
    }

    pub fn has_failures(&self) -> bool {
        self.outcomes
            .iter()
            .any(|(_, outcome)| matches!(outcome, TypeOutcome::Failed { .. }))
    }

    pub fn total_records(&self) -> usize {
        self.outcomes
            .iter()
            .map(|(_, outcome)| match outcome {
                TypeOutcome::Completed { records } => *records,
                _ => 0,
            })
            .sum()
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Log the run outcome at info level, one line per type.
    pub fn log_summary(&self) {
        tracing::info!(
            direction = ?self.direction,
            types = self.outcomes.len(),
            total_records = self.total_records(),
            duration_ms = self.duration.as_millis() as u64,
            "Transfer run finished"
        );
        for (name, outcome) in &self.outcomes {
            match outcome {
                TypeOutcome::Skipped { reason } => {
                    tracing::info!(entity_type = %name, reason = %reason, "Type skipped");
                }
                TypeOutcome::Completed { records } => {
                    tracing::info!(entity_type = %name, records, "Type completed");
                }
                TypeOutcome::Failed { reason } => {
                    tracing::warn!(entity_type = %name, reason = %reason, "Type failed");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_accounting() {
        let mut summary = TransferSummary::new(Direction::Export);
        summary.record_skip("Order", "DOWNLOAD FLAG IS FALSE");
        summary.record_success("Shipment", 1200);
        summary.record_failure("Invoice", "EXPORT JOB FAILED");

        assert_eq!(summary.outcomes().len(), 3);
        assert!(summary.has_failures());
        assert_eq!(summary.total_records(), 1200);
        assert!(matches!(
            summary.outcome_for("Order"),
            Some(TypeOutcome::Skipped { .. })
        ));
    }

    #[test]
    fn test_no_failures() {
        let mut summary = TransferSummary::new(Direction::Import);
        summary.record_success("Order", 10);
        assert!(!summary.has_failures());
    }
}
