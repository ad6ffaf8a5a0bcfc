//! Bucket-level migration orchestration

use std::collections::BTreeMap;
use std::sync::Arc;

use futures::stream::{FuturesUnordered, StreamExt};
use tokio_util::sync::CancellationToken;

use crate::migrate::enumerate::ObjectEnumerator;
use crate::migrate::error::MigrateError;
use crate::migrate::metadata::fetch_object_state;
use crate::migrate::replicate::replicate;
use crate::migrate::task::{MigrationOptions, MigrationResult, MigrationTask, ObjectOutcome};
use crate::s3::{ObjectDescriptor, ObjectStore};

/// Naming rule for account-wide migration targets
const TARGET_BUCKET_SUFFIX: &str = "-migrated";

/// Derive the target bucket name for a source bucket in `migrate_all`
pub fn target_bucket_name(source_bucket: &str) -> String {
    format!("{source_bucket}{TARGET_BUCKET_SUFFIX}")
}

/// Drives bucket migrations against a source and a target account.
///
/// Clients are passed in explicitly per account; the coordinator holds no
/// process-wide state, so multiple coordinators can run side by side.
pub struct MigrationCoordinator {
    source: Arc<dyn ObjectStore>,
    target: Arc<dyn ObjectStore>,
    cancel: CancellationToken,
}

impl MigrationCoordinator {
    pub fn new(source: Arc<dyn ObjectStore>, target: Arc<dyn ObjectStore>) -> Self {
        Self {
            source,
            target,
            cancel: CancellationToken::new(),
        }
    }

    /// Token that stops new objects being pulled when cancelled; in-flight
    /// copies are left to finish.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Migrate one bucket, recording exactly one outcome per enumerated key.
    ///
    /// A single object failure never stops the loop; only a precondition or
    /// enumeration failure aborts the bucket, in which case no tally is
    /// produced.
    pub async fn migrate_bucket(
        &self,
        task: &MigrationTask,
    ) -> Result<MigrationResult, MigrateError> {
        tracing::info!(
            "Starting migration: {} -> {}",
            task.source_bucket,
            task.target_bucket
        );

        self.ensure_target_bucket(task).await?;

        let mut enumerator = ObjectEnumerator::new(Arc::clone(&self.source), &task.source_bucket, "");
        let mut result = MigrationResult::default();
        let mut in_flight = FuturesUnordered::new();
        let concurrency = task.options.concurrency.max(1);

        loop {
            while in_flight.len() >= concurrency {
                if let Some((key, outcome)) = in_flight.next().await {
                    result.record(key, outcome);
                }
            }

            if self.cancel.is_cancelled() {
                tracing::info!(
                    "Cancellation requested, stopping enumeration of {}",
                    task.source_bucket
                );
                break;
            }

            let descriptor = match enumerator.next().await {
                Ok(Some(descriptor)) => descriptor,
                Ok(None) => break,
                Err(e) => {
                    // Let in-flight copies finish, then abort the bucket.
                    while let Some((key, outcome)) = in_flight.next().await {
                        result.record(key, outcome);
                    }
                    tracing::error!("Aborting migration of {}: {}", task.source_bucket, e);
                    return Err(e);
                }
            };

            tracing::debug!("Queueing {} ({} bytes)", descriptor.key, descriptor.size);
            in_flight.push(self.process_object(descriptor, task));
        }

        while let Some((key, outcome)) = in_flight.next().await {
            result.record(key, outcome);
        }

        tracing::info!(
            "Migration of {} completed: {} successful, {} failed",
            task.source_bucket,
            result.success_count(),
            result.failure_count()
        );

        Ok(result)
    }

    /// Migrate every bucket in the source account, deriving one target name
    /// per source bucket. Buckets are independent: one bucket aborting does
    /// not prevent attempting the next.
    pub async fn migrate_all(
        &self,
        options: &MigrationOptions,
    ) -> Result<BTreeMap<String, Result<MigrationResult, MigrateError>>, MigrateError> {
        let buckets = self
            .source
            .list_buckets()
            .await
            .map_err(MigrateError::ListBuckets)?;

        tracing::info!("Found {} buckets in source account", buckets.len());

        let mut results = BTreeMap::new();
        for bucket in buckets {
            if self.cancel.is_cancelled() {
                break;
            }

            let task = MigrationTask {
                source_bucket: bucket.clone(),
                target_bucket: target_bucket_name(&bucket),
                options: options.clone(),
            };

            let outcome = self.migrate_bucket(&task).await;
            if let Err(e) = &outcome {
                tracing::error!("Migration of bucket {} aborted: {}", bucket, e);
            }
            results.insert(bucket, outcome);
        }

        Ok(results)
    }

    /// Precondition: the target bucket must exist. Missing buckets are
    /// created, except in dry-run where the intent is only logged. Creation
    /// failure aborts this bucket's migration.
    async fn ensure_target_bucket(&self, task: &MigrationTask) -> Result<(), MigrateError> {
        let exists = self
            .target
            .bucket_exists(&task.target_bucket)
            .await
            .map_err(|source| MigrateError::Precondition {
                bucket: task.target_bucket.clone(),
                source,
            })?;

        if exists {
            tracing::info!("Target bucket {} already exists", task.target_bucket);
            return Ok(());
        }

        if task.options.dry_run {
            tracing::info!("[DRY RUN] Would create bucket: {}", task.target_bucket);
            return Ok(());
        }

        self.target
            .create_bucket(&task.target_bucket)
            .await
            .map_err(|source| MigrateError::Precondition {
                bucket: task.target_bucket.clone(),
                source,
            })?;

        tracing::info!("Created target bucket: {}", task.target_bucket);
        Ok(())
    }

    async fn process_object(
        &self,
        descriptor: ObjectDescriptor,
        task: &MigrationTask,
    ) -> (String, ObjectOutcome) {
        let (metadata, acl) = fetch_object_state(
            self.source.as_ref(),
            &task.source_bucket,
            &descriptor.key,
            task.options.preserve_acl,
        )
        .await;

        let outcome = replicate(
            self.target.as_ref(),
            &task.source_bucket,
            &task.target_bucket,
            &descriptor.key,
            &metadata,
            acl.as_ref(),
            &task.options,
        )
        .await;

        (descriptor.key, outcome)
    }
}
