//! AWS S3 client wrapper

use anyhow::{Context, Result};
use async_trait::async_trait;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::error::ProvideErrorMetadata;
use aws_sdk_s3::primitives::DateTime as AwsDateTime;
use aws_sdk_s3::types::{
    AccessControlPolicy, BucketLocationConstraint, CreateBucketConfiguration, Grant, Grantee,
    MetadataDirective, Owner, Permission, Type,
};
use aws_sdk_s3::Client;

use crate::s3::store::{ObjectPage, ObjectStore, StoreError};
use crate::s3::types::{AccessGrant, AclOwner, ObjectAcl, ObjectDescriptor, ObjectMetadata};

/// Error codes that warrant a retry with backoff
const THROTTLING_CODES: &[&str] = &[
    "SlowDown",
    "Throttling",
    "ThrottlingException",
    "RequestLimitExceeded",
    "TooManyRequests",
];

const LIST_PAGE_SIZE: i32 = 1000;

/// Explicit client configuration, used for S3-compatible endpoints in tests
#[derive(Debug, Clone, Default)]
pub struct S3ClientConfig {
    pub endpoint_url: Option<String>,
    pub force_path_style: bool,
    pub region: Option<String>,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
}

/// S3 client wrapper bound to one account's credentials
pub struct S3Client {
    client: Client,
    current_region: String,
}

impl S3Client {
    /// Create a new S3 client for the given profile and verify that its
    /// credentials resolve. A failure here aborts the run before any
    /// migration work starts.
    pub async fn new(profile_name: Option<&str>) -> Result<Self> {
        let config = if let Some(profile) = profile_name {
            aws_config::defaults(aws_config::BehaviorVersion::latest())
                .profile_name(profile)
                .load()
                .await
        } else {
            aws_config::defaults(aws_config::BehaviorVersion::latest())
                .load()
                .await
        };

        let sts = aws_sdk_sts::Client::new(&config);
        let identity = sts.get_caller_identity().send().await.with_context(|| {
            format!(
                "could not verify credentials for profile '{}'",
                profile_name.unwrap_or("default")
            )
        })?;
        tracing::info!(
            "Authenticated as {} (account {})",
            identity.arn().unwrap_or("unknown"),
            identity.account().unwrap_or("unknown")
        );

        let client = Client::new(&config);
        let current_region = config
            .region()
            .map(|r| r.to_string())
            .unwrap_or_else(|| "us-east-1".to_string());

        Ok(Self {
            client,
            current_region,
        })
    }

    /// Create a client from explicit configuration, bypassing profile and
    /// credential-chain resolution. Used against MinIO in integration tests.
    pub async fn with_config(config: S3ClientConfig) -> Result<Self> {
        let region = config
            .region
            .clone()
            .unwrap_or_else(|| "us-east-1".to_string());

        let mut builder = aws_sdk_s3::config::Builder::new()
            .behavior_version(aws_sdk_s3::config::BehaviorVersion::latest())
            .region(Region::new(region.clone()))
            .force_path_style(config.force_path_style);

        if let Some(endpoint) = &config.endpoint_url {
            builder = builder.endpoint_url(endpoint);
        }

        if let (Some(key), Some(secret)) = (&config.access_key_id, &config.secret_access_key) {
            builder = builder.credentials_provider(Credentials::new(key, secret, None, None, "static"));
        }

        Ok(Self {
            client: Client::from_conf(builder.build()),
            current_region: region,
        })
    }

    /// Upload bytes as an object, optionally with metadata (test seeding)
    pub async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        data: Vec<u8>,
        metadata: Option<&ObjectMetadata>,
    ) -> Result<()> {
        let mut request = self
            .client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(data.into());

        if let Some(m) = metadata {
            request = request
                .set_content_type(m.content_type.clone())
                .set_content_encoding(m.content_encoding.clone())
                .set_content_language(m.content_language.clone())
                .set_cache_control(m.cache_control.clone())
                .set_content_disposition(m.content_disposition.clone());
            if !m.user_metadata.is_empty() {
                request = request.set_metadata(Some(m.user_metadata.clone()));
            }
        }

        request.send().await?;
        Ok(())
    }

    /// Download an object to bytes
    pub async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await?;

        let data = response.body.collect().await?;
        Ok(data.into_bytes().to_vec())
    }

    /// Get the current region
    pub fn region(&self) -> &str {
        &self.current_region
    }
}

#[async_trait]
impl ObjectStore for S3Client {
    async fn list_objects_page(
        &self,
        bucket: &str,
        prefix: &str,
        cursor: Option<&str>,
    ) -> Result<ObjectPage, StoreError> {
        let mut request = self
            .client
            .list_objects_v2()
            .bucket(bucket)
            .max_keys(LIST_PAGE_SIZE);

        if !prefix.is_empty() {
            request = request.prefix(prefix);
        }

        if let Some(token) = cursor {
            request = request.continuation_token(token);
        }

        let response = request
            .send()
            .await
            .map_err(|err| map_sdk_error("list_objects", bucket.to_string(), err))?;

        let descriptors = response
            .contents()
            .iter()
            .map(|obj| ObjectDescriptor {
                key: obj.key().unwrap_or_default().to_string(),
                size: obj.size().unwrap_or(0) as u64,
                last_modified: obj.last_modified().map(|d| {
                    chrono::DateTime::from_timestamp(d.secs(), d.subsec_nanos())
                        .unwrap_or_default()
                }),
                etag: obj.e_tag().map(|s| s.to_string()),
            })
            .collect();

        let next_cursor = response.next_continuation_token().map(|s| s.to_string());

        Ok((descriptors, next_cursor))
    }

    async fn head_object(&self, bucket: &str, key: &str) -> Result<ObjectMetadata, StoreError> {
        match self.client.head_object().bucket(bucket).key(key).send().await {
            Ok(response) => Ok(metadata_from_head(&response)),
            Err(err) if err.as_service_error().map(|e| e.is_not_found()).unwrap_or(false) => {
                Err(StoreError::NotFound {
                    operation: "head_object",
                    location: format!("{bucket}/{key}"),
                })
            }
            Err(err) => Err(map_sdk_error("head_object", format!("{bucket}/{key}"), err)),
        }
    }

    async fn get_object_acl(&self, bucket: &str, key: &str) -> Result<ObjectAcl, StoreError> {
        let response = self
            .client
            .get_object_acl()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|err| map_sdk_error("get_object_acl", format!("{bucket}/{key}"), err))?;

        let owner = response.owner().map(|o| AclOwner {
            id: o.id().map(|s| s.to_string()),
            display_name: o.display_name().map(|s| s.to_string()),
        });

        let grants = response.grants().iter().filter_map(grant_from_sdk).collect();

        Ok(ObjectAcl { owner, grants })
    }

    async fn copy_object(
        &self,
        source_bucket: &str,
        source_key: &str,
        target_bucket: &str,
        target_key: &str,
        metadata_override: Option<&ObjectMetadata>,
    ) -> Result<(), StoreError> {
        let copy_source = format!("{}/{}", source_bucket, source_key);

        let mut request = self
            .client
            .copy_object()
            .bucket(target_bucket)
            .key(target_key)
            .copy_source(copy_source);

        if let Some(metadata) = metadata_override {
            request = request
                .metadata_directive(MetadataDirective::Replace)
                .set_content_type(metadata.content_type.clone())
                .set_content_encoding(metadata.content_encoding.clone())
                .set_content_language(metadata.content_language.clone())
                .set_cache_control(metadata.cache_control.clone())
                .set_content_disposition(metadata.content_disposition.clone())
                .set_expires(
                    metadata
                        .expires
                        .map(|e| AwsDateTime::from_secs(e.timestamp())),
                );
            if !metadata.user_metadata.is_empty() {
                request = request.set_metadata(Some(metadata.user_metadata.clone()));
            }
        }

        request
            .send()
            .await
            .map(|_| ())
            .map_err(|err| map_sdk_error("copy_object", format!("{target_bucket}/{target_key}"), err))
    }

    async fn put_object_acl(
        &self,
        bucket: &str,
        key: &str,
        acl: &ObjectAcl,
    ) -> Result<(), StoreError> {
        let mut grants = Vec::with_capacity(acl.grants.len());
        for grant in &acl.grants {
            grants.push(grant_to_sdk(grant).map_err(|message| StoreError::Api {
                operation: "put_object_acl",
                location: format!("{bucket}/{key}"),
                message,
            })?);
        }

        let mut policy = AccessControlPolicy::builder().set_grants(Some(grants));
        if let Some(owner) = &acl.owner {
            policy = policy.owner(
                Owner::builder()
                    .set_id(owner.id.clone())
                    .set_display_name(owner.display_name.clone())
                    .build(),
            );
        }

        self.client
            .put_object_acl()
            .bucket(bucket)
            .key(key)
            .access_control_policy(policy.build())
            .send()
            .await
            .map(|_| ())
            .map_err(|err| map_sdk_error("put_object_acl", format!("{bucket}/{key}"), err))
    }

    async fn bucket_exists(&self, bucket: &str) -> Result<bool, StoreError> {
        match self.client.head_bucket().bucket(bucket).send().await {
            Ok(_) => Ok(true),
            Err(err) if err.as_service_error().map(|e| e.is_not_found()).unwrap_or(false) => {
                Ok(false)
            }
            Err(err) => Err(map_sdk_error("head_bucket", bucket.to_string(), err)),
        }
    }

    async fn create_bucket(&self, bucket: &str) -> Result<(), StoreError> {
        let mut request = self.client.create_bucket().bucket(bucket);

        // us-east-1 rejects an explicit location constraint
        if self.current_region != "us-east-1" {
            request = request.create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(BucketLocationConstraint::from(
                        self.current_region.as_str(),
                    ))
                    .build(),
            );
        }

        request
            .send()
            .await
            .map(|_| ())
            .map_err(|err| map_sdk_error("create_bucket", bucket.to_string(), err))
    }

    async fn list_buckets(&self) -> Result<Vec<String>, StoreError> {
        let response = self
            .client
            .list_buckets()
            .send()
            .await
            .map_err(|err| map_sdk_error("list_buckets", "account".to_string(), err))?;

        Ok(response
            .buckets()
            .iter()
            .filter_map(|b| b.name().map(|s| s.to_string()))
            .collect())
    }
}

/// The SDK deprecated the parsed Expires accessor, but CopyObject only
/// accepts the parsed form, so the snapshot keeps using it.
#[allow(deprecated)]
fn metadata_from_head(
    response: &aws_sdk_s3::operation::head_object::HeadObjectOutput,
) -> ObjectMetadata {
    ObjectMetadata {
        content_type: response.content_type().map(|s| s.to_string()),
        content_encoding: response.content_encoding().map(|s| s.to_string()),
        content_language: response.content_language().map(|s| s.to_string()),
        cache_control: response.cache_control().map(|s| s.to_string()),
        content_disposition: response.content_disposition().map(|s| s.to_string()),
        expires: response.expires().and_then(|d| {
            chrono::DateTime::from_timestamp(d.secs(), d.subsec_nanos())
        }),
        user_metadata: response.metadata().cloned().unwrap_or_default(),
    }
}

fn grant_from_sdk(grant: &Grant) -> Option<AccessGrant> {
    let grantee = grant.grantee()?;
    let permission = grant.permission()?.as_str().to_string();

    Some(AccessGrant {
        grantee_type: grantee.r#type().as_str().to_string(),
        grantee_id: grantee.id().map(|s| s.to_string()),
        grantee_uri: grantee.uri().map(|s| s.to_string()),
        grantee_email: grantee.email_address().map(|s| s.to_string()),
        display_name: grantee.display_name().map(|s| s.to_string()),
        permission,
    })
}

fn grant_to_sdk(grant: &AccessGrant) -> std::result::Result<Grant, String> {
    let grantee = Grantee::builder()
        .r#type(Type::from(grant.grantee_type.as_str()))
        .set_id(grant.grantee_id.clone())
        .set_uri(grant.grantee_uri.clone())
        .set_email_address(grant.grantee_email.clone())
        .set_display_name(grant.display_name.clone())
        .build()
        .map_err(|e| e.to_string())?;

    Ok(Grant::builder()
        .grantee(grantee)
        .permission(Permission::from(grant.permission.as_str()))
        .build())
}

fn map_sdk_error<E>(operation: &'static str, location: String, err: E) -> StoreError
where
    E: ProvideErrorMetadata + std::fmt::Display,
{
    let code = err.code().unwrap_or("unknown").to_string();
    let message = match err.message() {
        Some(m) => format!("{m} ({code})"),
        None => format!("{err} ({code})"),
    };

    if THROTTLING_CODES.contains(&code.as_str()) {
        StoreError::Throttled {
            operation,
            location,
            message,
        }
    } else if matches!(code.as_str(), "NoSuchKey" | "NoSuchBucket" | "NotFound") {
        StoreError::NotFound {
            operation,
            location,
        }
    } else {
        StoreError::Api {
            operation,
            location,
            message,
        }
    }
}
