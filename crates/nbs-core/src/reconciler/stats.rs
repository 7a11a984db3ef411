//! Per-sync outcome counters

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of a single host-level or record-level decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    /// Record already matched the desired state, or is not ours to touch
    Unchanged,
    /// Record was created
    Created,
    /// Record description was updated
    Updated,
    /// Stale record was garbage-collected
    Deleted,
    /// The operation failed
    #[serde(rename = "errors")]
    Error,
}

impl Outcome {
    /// All outcomes, in summary order
    pub const ALL: [Outcome; 5] = [
        Outcome::Unchanged,
        Outcome::Created,
        Outcome::Updated,
        Outcome::Deleted,
        Outcome::Error,
    ];

    /// Label used in log lines and reports
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Unchanged => "unchanged",
            Outcome::Created => "created",
            Outcome::Updated => "updated",
            Outcome::Deleted => "deleted",
            Outcome::Error => "errors",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Counters for one sync pass
///
/// Built at zero for every [`Reconciler::sync`](super::Reconciler::sync) call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncStats {
    pub unchanged: usize,
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
    pub errors: usize,
}

impl SyncStats {
    /// Zeroed counters
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one outcome
    pub fn record(&mut self, outcome: Outcome) {
        *self.counter_mut(outcome) += 1;
    }

    /// Read the counter for an outcome
    pub fn get(&self, outcome: Outcome) -> usize {
        match outcome {
            Outcome::Unchanged => self.unchanged,
            Outcome::Created => self.created,
            Outcome::Updated => self.updated,
            Outcome::Deleted => self.deleted,
            Outcome::Error => self.errors,
        }
    }

    /// Sum of all counters
    pub fn total(&self) -> usize {
        Outcome::ALL.iter().map(|o| self.get(*o)).sum()
    }

    /// Number of remote mutations the pass performed (or would have, in dry-run)
    pub fn changes(&self) -> usize {
        self.created + self.updated + self.deleted
    }

    /// Whether any operation failed
    pub fn has_errors(&self) -> bool {
        self.errors > 0
    }

    fn counter_mut(&mut self, outcome: Outcome) -> &mut usize {
        match outcome {
            Outcome::Unchanged => &mut self.unchanged,
            Outcome::Created => &mut self.created,
            Outcome::Updated => &mut self.updated,
            Outcome::Deleted => &mut self.deleted,
            Outcome::Error => &mut self.errors,
        }
    }
}

impl std::ops::AddAssign for SyncStats {
    fn add_assign(&mut self, other: Self) {
        self.unchanged += other.unchanged;
        self.created += other.created;
        self.updated += other.updated;
        self.deleted += other.deleted;
        self.errors += other.errors;
    }
}

/// Compact summary: `.unchanged +created ~updated -deleted !errors`
impl fmt::Display for SyncStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            ".{} +{} ~{} -{} !{}",
            self.unchanged, self.created, self.updated, self.deleted, self.errors
        )
    }
}

/// Result of a completed sync pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    /// Outcome counters
    pub stats: SyncStats,
    /// Number of hosts in the desired list
    pub hosts: usize,
    /// Whether mutations were skipped
    pub dry_run: bool,
    /// When the pass started
    pub started_at: DateTime<Utc>,
    /// When the pass finished
    pub finished_at: DateTime<Utc>,
}

impl SyncReport {
    /// Wall-clock duration of the pass
    pub fn elapsed(&self) -> chrono::Duration {
        self.finished_at.signed_duration_since(self.started_at)
    }
}
