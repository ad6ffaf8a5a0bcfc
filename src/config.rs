//! Run configuration from environment variables
//!
//! The migration tool is driven entirely by environment variables, matching
//! its CI-oriented usage:
//! - SOURCE_BUCKET / TARGET_BUCKET: bucket names for a single migration
//! - SOURCE_PROFILE / TARGET_PROFILE: AWS profiles for each account
//! - MIGRATE_ALL: migrate every source bucket to `<name>-migrated`
//! - PRESERVE_ACL (default true), PRESERVE_METADATA (default true)
//! - DRY_RUN (default false)
//! - STRICT (default false): treat per-object failures as a run failure
//! - CONCURRENCY (default 4): objects copied in parallel per bucket

use anyhow::{bail, Result};

use crate::migrate::MigrationOptions;

/// Everything the binary needs to know about one invocation
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub source_bucket: Option<String>,
    pub target_bucket: Option<String>,
    pub source_profile: Option<String>,
    pub target_profile: Option<String>,
    pub migrate_all: bool,
    /// When set, per-object failures make the process exit non-zero
    pub strict: bool,
    pub options: MigrationOptions,
}

impl RunConfig {
    /// Load configuration from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an injected lookup (testable seam)
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = MigrationOptions::default();

        let options = MigrationOptions {
            preserve_acl: parse_bool(get("PRESERVE_ACL"), defaults.preserve_acl),
            preserve_metadata: parse_bool(get("PRESERVE_METADATA"), defaults.preserve_metadata),
            dry_run: parse_bool(get("DRY_RUN"), defaults.dry_run),
            concurrency: get("CONCURRENCY")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.concurrency),
            max_retries: defaults.max_retries,
        };

        Self {
            source_bucket: get("SOURCE_BUCKET").filter(|v| !v.is_empty()),
            target_bucket: get("TARGET_BUCKET").filter(|v| !v.is_empty()),
            source_profile: get("SOURCE_PROFILE").filter(|v| !v.is_empty()),
            target_profile: get("TARGET_PROFILE").filter(|v| !v.is_empty()),
            migrate_all: parse_bool(get("MIGRATE_ALL"), false),
            strict: parse_bool(get("STRICT"), false),
            options,
        }
    }

    /// A single-bucket run needs both bucket names
    pub fn validate(&self) -> Result<()> {
        if !self.migrate_all && (self.source_bucket.is_none() || self.target_bucket.is_none()) {
            bail!("SOURCE_BUCKET and TARGET_BUCKET are required unless MIGRATE_ALL is set");
        }
        Ok(())
    }
}

fn parse_bool(value: Option<String>, default: bool) -> bool {
    match value {
        Some(v) => matches!(v.to_ascii_lowercase().as_str(), "true" | "1" | "yes"),
        None => default,
    }
}
