//! Bucket-level migration errors
//!
//! Only failures that abort a whole bucket's migration live here. Per-object
//! failures are recorded as outcomes, and metadata/ACL fetch failures degrade
//! with a warning instead of erroring.

use thiserror::Error;

use crate::s3::StoreError;

#[derive(Debug, Error)]
pub enum MigrateError {
    /// The object listing failed on some page; enumeration cannot continue
    #[error("failed to list objects in bucket {bucket}: {source}")]
    List {
        bucket: String,
        #[source]
        source: StoreError,
    },

    /// The source account's bucket listing failed; nothing can be migrated
    #[error("failed to list source buckets: {0}")]
    ListBuckets(#[source] StoreError),

    /// The target bucket is missing and could not be checked or created
    #[error("could not prepare target bucket {bucket}: {source}")]
    Precondition {
        bucket: String,
        #[source]
        source: StoreError,
    },
}
