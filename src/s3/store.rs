//! Object store capability surface
//!
//! The migration engine talks to one account's object store through the
//! [`ObjectStore`] trait. Production code uses the AWS-backed
//! [`crate::s3::S3Client`]; tests substitute an in-memory implementation.

use async_trait::async_trait;
use thiserror::Error;

use crate::s3::types::{ObjectAcl, ObjectDescriptor, ObjectMetadata};

/// Error returned by object store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{operation} {location}: not found")]
    NotFound {
        operation: &'static str,
        location: String,
    },

    #[error("{operation} {location}: throttled ({message})")]
    Throttled {
        operation: &'static str,
        location: String,
        message: String,
    },

    #[error("{operation} {location}: {message}")]
    Api {
        operation: &'static str,
        location: String,
        message: String,
    },
}

impl StoreError {
    /// Throttling-class errors are worth retrying with backoff
    pub fn is_throttled(&self) -> bool {
        matches!(self, StoreError::Throttled { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}

/// One page of an object listing plus the cursor for the next page, if any
pub type ObjectPage = (Vec<ObjectDescriptor>, Option<String>);

/// Operations the migration engine needs against one account's object store
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Fetch one page of the object listing for `bucket` under `prefix`.
    /// A `None` cursor in the result signals exhaustion.
    async fn list_objects_page(
        &self,
        bucket: &str,
        prefix: &str,
        cursor: Option<&str>,
    ) -> Result<ObjectPage, StoreError>;

    /// Head-style metadata lookup for a single object
    async fn head_object(&self, bucket: &str, key: &str) -> Result<ObjectMetadata, StoreError>;

    /// Fetch the access-control policy of a single object
    async fn get_object_acl(&self, bucket: &str, key: &str) -> Result<ObjectAcl, StoreError>;

    /// Copy an object into the target location under the same credentials as
    /// this store. When `metadata_override` is set, the target object's
    /// metadata is replaced with exactly the supplied snapshot; otherwise the
    /// store's default copy semantics apply.
    async fn copy_object(
        &self,
        source_bucket: &str,
        source_key: &str,
        target_bucket: &str,
        target_key: &str,
        metadata_override: Option<&ObjectMetadata>,
    ) -> Result<(), StoreError>;

    /// Replace the access-control policy of an object
    async fn put_object_acl(
        &self,
        bucket: &str,
        key: &str,
        acl: &ObjectAcl,
    ) -> Result<(), StoreError>;

    async fn bucket_exists(&self, bucket: &str) -> Result<bool, StoreError>;

    async fn create_bucket(&self, bucket: &str) -> Result<(), StoreError>;

    /// List all bucket names in the account
    async fn list_buckets(&self) -> Result<Vec<String>, StoreError>;
}
