//! S3 Bucket Migration Tool
//!
//! Migrates S3 buckets between AWS accounts while preserving object
//! metadata and ACLs. Driven entirely by environment variables; see
//! [`s3_migrate::config`] for the recognized options.

use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use s3_migrate::config::RunConfig;
use s3_migrate::migrate::{
    MigrateError, MigrationCoordinator, MigrationResult, MigrationTask, ObjectRecord,
};
use s3_migrate::s3::S3Client;

/// Machine-readable run summary printed on stdout
#[derive(Debug, Serialize)]
struct RunSummary {
    buckets: Vec<BucketSummary>,
}

#[derive(Debug, Serialize)]
struct BucketSummary {
    source_bucket: String,
    target_bucket: String,
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    successful: usize,
    failed: usize,
    objects: Vec<ObjectRecord>,
}

impl BucketSummary {
    fn from_outcome(
        source_bucket: String,
        target_bucket: String,
        outcome: &Result<MigrationResult, MigrateError>,
    ) -> Self {
        match outcome {
            Ok(result) => Self {
                source_bucket,
                target_bucket,
                status: "completed",
                error: None,
                successful: result.success_count(),
                failed: result.failure_count(),
                objects: result.outcomes().to_vec(),
            },
            Err(e) => Self {
                source_bucket,
                target_bucket,
                status: "aborted",
                error: Some(e.to_string()),
                successful: 0,
                failed: 0,
                objects: Vec::new(),
            },
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    tracing::info!("Starting S3 migration v{}", env!("CARGO_PKG_VERSION"));

    let config = RunConfig::from_env();
    config.validate()?;

    tracing::info!("Dry run: {}", config.options.dry_run);
    tracing::info!("Preserve ACL: {}", config.options.preserve_acl);
    tracing::info!("Preserve metadata: {}", config.options.preserve_metadata);

    let source = S3Client::new(config.source_profile.as_deref())
        .await
        .context("could not create source account client")?;
    let target = S3Client::new(config.target_profile.as_deref())
        .await
        .context("could not create target account client")?;

    let coordinator = MigrationCoordinator::new(Arc::new(source), Arc::new(target));

    // Stop pulling new objects on Ctrl-C; in-flight copies finish
    let cancel = coordinator.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, finishing in-flight copies");
            cancel.cancel();
        }
    });

    let mut summaries = Vec::new();

    if config.migrate_all {
        let results = coordinator.migrate_all(&config.options).await?;
        for (bucket, outcome) in &results {
            summaries.push(BucketSummary::from_outcome(
                bucket.clone(),
                s3_migrate::migrate::target_bucket_name(bucket),
                outcome,
            ));
        }
    } else {
        let source_bucket = config
            .source_bucket
            .clone()
            .context("SOURCE_BUCKET is required")?;
        let target_bucket = config
            .target_bucket
            .clone()
            .context("TARGET_BUCKET is required")?;

        let task = MigrationTask {
            source_bucket: source_bucket.clone(),
            target_bucket: target_bucket.clone(),
            options: config.options.clone(),
        };

        let outcome = coordinator.migrate_bucket(&task).await;
        summaries.push(BucketSummary::from_outcome(
            source_bucket,
            target_bucket,
            &outcome,
        ));
    }

    let any_aborted = summaries.iter().any(|s| s.status == "aborted");
    let object_failures: usize = summaries.iter().map(|s| s.failed).sum();

    println!(
        "{}",
        serde_json::to_string_pretty(&RunSummary { buckets: summaries })?
    );

    tracing::info!("S3 migration process completed");

    if any_aborted || (config.strict && object_failures > 0) {
        std::process::exit(1);
    }

    Ok(())
}
