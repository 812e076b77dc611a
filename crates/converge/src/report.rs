//! Run report - per-resource outcomes and counts
//!
//! A report with failures is a valid, fully-formed report. The caller
//! decides exit status; the report never panics or raises.

use crate::resource::Kind;
use crate::types::{ActionKind, Outcome};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One resource's result, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportEntry {
    pub kind: Kind,
    pub identity: String,
    pub action: ActionKind,
    pub rationale: String,
    pub outcome: Outcome,
}

/// Counts by action and outcome.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub failed: usize,
    pub blocked: usize,
}

impl RunSummary {
    pub fn total(&self) -> usize {
        self.created + self.updated + self.unchanged + self.failed + self.blocked
    }

    pub fn changes(&self) -> usize {
        self.created + self.updated
    }
}

/// Outcome of one full provisioning run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub entries: Vec<ReportEntry>,
}

impl RunReport {
    pub fn new(started_at: DateTime<Utc>, entries: Vec<ReportEntry>) -> Self {
        Self {
            started_at,
            finished_at: Utc::now(),
            entries,
        }
    }

    pub fn summary(&self) -> RunSummary {
        let mut summary = RunSummary::default();
        for entry in &self.entries {
            match &entry.outcome {
                Outcome::Failed { .. } => summary.failed += 1,
                Outcome::Blocked { .. } => summary.blocked += 1,
                Outcome::Success => match entry.action {
                    ActionKind::Create => summary.created += 1,
                    ActionKind::Update | ActionKind::Delete => summary.updated += 1,
                    ActionKind::NoOp => summary.unchanged += 1,
                },
            }
        }
        summary
    }

    /// True iff every resource converged with no action needed.
    pub fn converged(&self) -> bool {
        self.entries
            .iter()
            .all(|e| e.outcome.is_success() && e.action == ActionKind::NoOp)
    }

    /// Drives the process exit code: non-zero iff any `Failed`.
    pub fn has_failures(&self) -> bool {
        self.entries.iter().any(|e| e.outcome.is_failed())
    }

    /// Entries that did not succeed, for itemized error output.
    pub fn problems(&self) -> impl Iterator<Item = &ReportEntry> {
        self.entries.iter().filter(|e| !e.outcome.is_success())
    }

    pub fn duration_secs(&self) -> f64 {
        (self.finished_at - self.started_at)
            .num_milliseconds()
            .max(0) as f64
            / 1000.0
    }

    /// Full report as pretty JSON for machine consumption.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
