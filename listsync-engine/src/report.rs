//! Per-list outcomes and run reports.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Action taken for one list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncAction {
    Created,
    Updated,
    Skipped,
    Failed,
}

impl fmt::Display for SyncAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Skipped => "skipped",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Outcome of reconciling one list definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListOutcome {
    /// Code of the list.
    pub code: String,
    pub action: SyncAction,
    /// Summary of the value changes, or the error for a failed list.
    pub message: Option<String>,
}

impl ListOutcome {
    pub fn new(code: impl Into<String>, action: SyncAction, message: Option<String>) -> Self {
        Self {
            code: code.into(),
            action,
            message,
        }
    }

    pub fn skipped(code: impl Into<String>) -> Self {
        Self::new(code, SyncAction::Skipped, Some("unchanged".to_string()))
    }

    pub fn failed(code: impl Into<String>, error: impl Into<String>) -> Self {
        Self::new(code, SyncAction::Failed, Some(error.into()))
    }

    /// Returns true if the list could not be reconciled.
    pub fn is_failure(&self) -> bool {
        self.action == SyncAction::Failed
    }
}

/// Aggregate result of one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
    pub failed: usize,
    pub total: usize,
    /// Wall-clock time of the run.
    pub duration: Duration,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub results: Vec<ListOutcome>,
}

impl SyncReport {
    /// A report for a run that did nothing.
    pub fn empty() -> Self {
        Self::begin(Utc::now())
    }

    pub(crate) fn begin(started_at: DateTime<Utc>) -> Self {
        Self {
            created: 0,
            updated: 0,
            skipped: 0,
            failed: 0,
            total: 0,
            duration: Duration::ZERO,
            started_at,
            finished_at: started_at,
            results: Vec::new(),
        }
    }

    /// Adds one outcome to the counts and the result list.
    pub fn record(&mut self, outcome: ListOutcome) {
        match outcome.action {
            SyncAction::Created => self.created += 1,
            SyncAction::Updated => self.updated += 1,
            SyncAction::Skipped => self.skipped += 1,
            SyncAction::Failed => self.failed += 1,
        }
        self.total += 1;
        self.results.push(outcome);
    }

    pub(crate) fn finish(&mut self, duration: Duration) {
        self.duration = duration;
        self.finished_at = Utc::now();
    }

    /// Returns true if any list failed.
    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }

    /// Returns the outcome recorded for a list code.
    pub fn result(&self, code: &str) -> Option<&ListOutcome> {
        self.results.iter().find(|r| r.code == code)
    }
}

/// Dry-run classification of a set of definitions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncPlan {
    /// Codes with no stored list.
    pub create: Vec<String>,
    /// Codes whose stored content is stale.
    pub update: Vec<String>,
    /// Codes already in sync.
    pub unchanged: Vec<String>,
}

impl SyncPlan {
    /// Number of lists a run would reconcile.
    pub fn pending(&self) -> usize {
        self.create.len() + self.update.len()
    }

    /// Returns true if a run would write nothing.
    pub fn is_up_to_date(&self) -> bool {
        self.pending() == 0
    }
}
