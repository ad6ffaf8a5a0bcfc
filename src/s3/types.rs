//! S3 data types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A single entry from an object listing.
///
/// Size and modification time are informational only; the migration engine
/// keys everything off `key`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectDescriptor {
    pub key: String,
    pub size: u64,
    pub last_modified: Option<DateTime<Utc>>,
    pub etag: Option<String>,
}

impl ObjectDescriptor {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            size: 0,
            last_modified: None,
            etag: None,
        }
    }
}

/// Snapshot of an object's descriptive metadata, captured once per run.
///
/// Header fields are `None` when the source object does not carry them, so
/// absent values are never forwarded as empty strings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectMetadata {
    pub content_type: Option<String>,
    pub content_encoding: Option<String>,
    pub content_language: Option<String>,
    pub cache_control: Option<String>,
    pub content_disposition: Option<String>,
    pub expires: Option<DateTime<Utc>>,
    pub user_metadata: HashMap<String, String>,
}

impl ObjectMetadata {
    /// True when the snapshot carries nothing worth forwarding
    pub fn is_empty(&self) -> bool {
        self.content_type.is_none()
            && self.content_encoding.is_none()
            && self.content_language.is_none()
            && self.cache_control.is_none()
            && self.content_disposition.is_none()
            && self.expires.is_none()
            && self.user_metadata.is_empty()
    }
}

/// One access-control entry on an object
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccessGrant {
    /// Grantee type as S3 reports it: CanonicalUser, Group, AmazonCustomerByEmail
    pub grantee_type: String,
    pub grantee_id: Option<String>,
    pub grantee_uri: Option<String>,
    pub grantee_email: Option<String>,
    pub display_name: Option<String>,
    /// Permission level: FULL_CONTROL, READ, WRITE, READ_ACP, WRITE_ACP
    pub permission: String,
}

/// Owner of an object's access-control policy
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AclOwner {
    pub id: Option<String>,
    pub display_name: Option<String>,
}

/// Full access-control snapshot for an object.
///
/// The owner is carried alongside the grants because applying an ACL
/// requires the complete access-control policy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectAcl {
    pub owner: Option<AclOwner>,
    pub grants: Vec<AccessGrant>,
}
