//! Per-object metadata and ACL capture
//!
//! Both lookups degrade gracefully: one unreadable object must not stop the
//! whole migration. A failed head lookup yields an empty snapshot and the
//! object is still copied; a failed ACL lookup just means no ACL is
//! preserved for that object. The two failures are independent.

use crate::s3::{ObjectAcl, ObjectMetadata, ObjectStore};

/// Capture the metadata snapshot and (optionally) the ACL of one object
pub async fn fetch_object_state(
    store: &dyn ObjectStore,
    bucket: &str,
    key: &str,
    preserve_acl: bool,
) -> (ObjectMetadata, Option<ObjectAcl>) {
    let metadata = match store.head_object(bucket, key).await {
        Ok(metadata) => metadata,
        Err(e) => {
            tracing::warn!(
                "Could not read metadata for {}/{}: {}; copying without it",
                bucket,
                key,
                e
            );
            ObjectMetadata::default()
        }
    };

    let acl = if preserve_acl {
        match store.get_object_acl(bucket, key).await {
            Ok(acl) => Some(acl),
            Err(e) => {
                tracing::warn!("Could not read ACL for {}/{}: {}", bucket, key, e);
                None
            }
        }
    } else {
        None
    };

    (metadata, acl)
}
