//! Migration task and result types

use serde::{Deserialize, Serialize};

/// Per-run behavior switches, immutable for the duration of a run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationOptions {
    /// Re-apply the source object's access grants on the target
    pub preserve_acl: bool,
    /// Replace the target object's metadata with the captured snapshot
    pub preserve_metadata: bool,
    /// Simulate the run without any mutating call against the target
    pub dry_run: bool,
    /// Number of objects copied concurrently within one bucket
    pub concurrency: usize,
    /// Retry cap for throttled copy/ACL calls
    pub max_retries: u32,
}

impl Default for MigrationOptions {
    fn default() -> Self {
        Self {
            preserve_acl: true,
            preserve_metadata: true,
            dry_run: false,
            concurrency: 4,
            max_retries: 3,
        }
    }
}

/// One bucket-to-bucket migration request
#[derive(Debug, Clone)]
pub struct MigrationTask {
    pub source_bucket: String,
    pub target_bucket: String,
    pub options: MigrationOptions,
}

/// Final state of a single object within a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ObjectOutcome {
    /// The object was copied to the target
    Copied,
    /// Dry run: the object would have been copied
    WouldCopy,
    /// The copy itself failed; the reason is carried for retry lists
    Failed(String),
}

impl ObjectOutcome {
    pub fn is_success(&self) -> bool {
        !matches!(self, ObjectOutcome::Failed(_))
    }
}

/// One recorded (key, outcome) pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectRecord {
    pub key: String,
    pub outcome: ObjectOutcome,
}

/// Tally of a completed bucket migration.
///
/// Exactly one record exists per enumerated key; recording order may differ
/// from enumeration order when objects are copied concurrently.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MigrationResult {
    outcomes: Vec<ObjectRecord>,
}

impl MigrationResult {
    pub fn record(&mut self, key: String, outcome: ObjectOutcome) {
        self.outcomes.push(ObjectRecord { key, outcome });
    }

    pub fn success_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|r| r.outcome.is_success())
            .count()
    }

    pub fn failure_count(&self) -> usize {
        self.outcomes.len() - self.success_count()
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn outcomes(&self) -> &[ObjectRecord] {
        &self.outcomes
    }
}
