//! Bucket migration engine
//!
//! This module orchestrates the migration of objects between buckets:
//! - [`coordinator::MigrationCoordinator`] - Bucket-level orchestration
//! - [`enumerate::ObjectEnumerator`] - Paginated object enumeration
//! - [`metadata`] - Metadata/ACL capture with graceful degradation
//! - [`replicate`] - Per-object copy and ACL application
//! - [`task`] - Task, options and result types

pub mod coordinator;
pub mod enumerate;
pub mod error;
pub mod metadata;
pub mod replicate;
pub mod task;

// Re-export commonly used types
pub use coordinator::{target_bucket_name, MigrationCoordinator};
pub use enumerate::ObjectEnumerator;
pub use error::MigrateError;
pub use task::{MigrationOptions, MigrationResult, MigrationTask, ObjectOutcome, ObjectRecord};
