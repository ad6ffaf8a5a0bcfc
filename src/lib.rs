//! S3 Bucket Migration Library
//!
//! This crate provides the core functionality for migrating S3 buckets
//! between AWS accounts while preserving object metadata and ACLs.
//! The public modules can be used for testing and extension.

pub mod config;
pub mod migrate;
pub mod s3;
