//! Per-object replication
//!
//! Copies one object into the target bucket under the same key, forwarding
//! the captured metadata snapshot and re-applying the captured grants. The
//! copy itself is the only fatal step for an object; ACL application is
//! best-effort.

use std::future::Future;
use std::time::Duration;

use crate::migrate::task::{MigrationOptions, ObjectOutcome};
use crate::s3::{ObjectAcl, ObjectMetadata, ObjectStore, StoreError};

const RETRY_BASE_DELAY: Duration = Duration::from_millis(200);

/// Build the metadata override for a copy.
///
/// `None` means the copy runs with the store's default semantics, which is
/// the right call when preservation is disabled or when the snapshot is
/// empty (a degraded head lookup must not wipe the target's defaults).
/// A non-empty snapshot replaces the target metadata wholesale, so the
/// target object carries exactly the captured set.
pub(crate) fn copy_override(
    metadata: &ObjectMetadata,
    preserve_metadata: bool,
) -> Option<ObjectMetadata> {
    if preserve_metadata && !metadata.is_empty() {
        Some(metadata.clone())
    } else {
        None
    }
}

/// Copy one object and apply its ACL, producing the object's outcome.
///
/// The copy runs against the target account's client, which must be able to
/// read the source location.
pub async fn replicate(
    target: &dyn ObjectStore,
    source_bucket: &str,
    target_bucket: &str,
    key: &str,
    metadata: &ObjectMetadata,
    acl: Option<&ObjectAcl>,
    options: &MigrationOptions,
) -> ObjectOutcome {
    if options.dry_run {
        tracing::info!(
            "[DRY RUN] Would copy: {}/{} -> {}/{}",
            source_bucket,
            key,
            target_bucket,
            key
        );
        return ObjectOutcome::WouldCopy;
    }

    let metadata_override = copy_override(metadata, options.preserve_metadata);
    let override_ref = metadata_override.as_ref();

    let copied = with_retry(options.max_retries, move || {
        target.copy_object(source_bucket, key, target_bucket, key, override_ref)
    })
    .await;

    if let Err(e) = copied {
        tracing::error!("Error copying {}/{}: {}", source_bucket, key, e);
        return ObjectOutcome::Failed(e.to_string());
    }

    if options.preserve_acl {
        if let Some(acl) = acl.filter(|a| !a.grants.is_empty()) {
            let applied = with_retry(options.max_retries, move || {
                target.put_object_acl(target_bucket, key, acl)
            })
            .await;

            if let Err(e) = applied {
                tracing::warn!("Could not apply ACL for {}/{}: {}", target_bucket, key, e);
            }
        }
    }

    tracing::info!(
        "Copied: {}/{} -> {}/{}",
        source_bucket,
        key,
        target_bucket,
        key
    );

    ObjectOutcome::Copied
}

/// Retry a store call on throttling, with exponential backoff, up to
/// `max_retries` extra attempts. Any other error returns immediately.
async fn with_retry<F, Fut>(max_retries: u32, call: F) -> Result<(), StoreError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<(), StoreError>>,
{
    let mut attempt: u32 = 0;
    loop {
        match call().await {
            Ok(()) => return Ok(()),
            Err(e) if e.is_throttled() && attempt < max_retries => {
                attempt += 1;
                let delay = RETRY_BASE_DELAY * 2u32.saturating_pow(attempt - 1);
                tracing::warn!(
                    "Throttled ({}), retrying in {:?} (attempt {}/{})",
                    e,
                    delay,
                    attempt,
                    max_retries
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}
