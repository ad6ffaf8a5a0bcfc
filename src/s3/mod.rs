//! S3 client wrapper module
//!
//! This module provides the storage access layer of the migration engine:
//! - [`store::ObjectStore`] - Capability surface consumed by the engine
//! - [`client::S3Client`] - AWS-backed implementation
//! - [`types`] - Storage data types (ObjectDescriptor, ObjectMetadata, ObjectAcl)

pub mod client;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use client::{S3Client, S3ClientConfig};
pub use store::{ObjectPage, ObjectStore, StoreError};
pub use types::{AccessGrant, AclOwner, ObjectAcl, ObjectDescriptor, ObjectMetadata};
