//! In-memory object store used by the engine tests
//!
//! Implements [`ObjectStore`] over plain maps, records every mutating call,
//! and supports failure injection per operation so tests can exercise the
//! engine's degradation and abort paths without a real store.

use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use s3_migrate::s3::{
    ObjectAcl, ObjectDescriptor, ObjectMetadata, ObjectPage, ObjectStore, StoreError,
};

#[derive(Debug, Clone, Default)]
pub struct StoredObject {
    pub metadata: ObjectMetadata,
    pub acl: Option<ObjectAcl>,
}

#[derive(Default)]
struct State {
    buckets: BTreeMap<String, BTreeMap<String, StoredObject>>,
    /// Every mutating call, in order, e.g. "copy_object target/key directive=REPLACE"
    mutations: Vec<String>,
    list_calls: usize,
    copy_attempts: usize,
    /// 0 means everything in one page
    page_size: usize,
    fail_head: HashSet<String>,
    fail_acl_read: HashSet<String>,
    fail_copy: HashSet<String>,
    /// Remaining throttled responses per key before copies succeed
    throttle_copy: BTreeMap<String, u32>,
    fail_put_acl: bool,
    fail_list: HashSet<String>,
    fail_create_bucket: bool,
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_bucket(&self, bucket: &str) {
        self.state
            .lock()
            .unwrap()
            .buckets
            .entry(bucket.to_string())
            .or_default();
    }

    pub fn add_object(&self, bucket: &str, key: &str, object: StoredObject) {
        self.state
            .lock()
            .unwrap()
            .buckets
            .entry(bucket.to_string())
            .or_default()
            .insert(key.to_string(), object);
    }

    pub fn set_page_size(&self, page_size: usize) {
        self.state.lock().unwrap().page_size = page_size;
    }

    pub fn fail_head_for(&self, key: &str) {
        self.state.lock().unwrap().fail_head.insert(key.to_string());
    }

    pub fn fail_acl_read_for(&self, key: &str) {
        self.state
            .lock()
            .unwrap()
            .fail_acl_read
            .insert(key.to_string());
    }

    pub fn fail_copy_for(&self, key: &str) {
        self.state.lock().unwrap().fail_copy.insert(key.to_string());
    }

    pub fn throttle_copy_for(&self, key: &str, times: u32) {
        self.state
            .lock()
            .unwrap()
            .throttle_copy
            .insert(key.to_string(), times);
    }

    pub fn fail_put_acl(&self) {
        self.state.lock().unwrap().fail_put_acl = true;
    }

    pub fn fail_list_for(&self, bucket: &str) {
        self.state
            .lock()
            .unwrap()
            .fail_list
            .insert(bucket.to_string());
    }

    pub fn fail_create_bucket(&self) {
        self.state.lock().unwrap().fail_create_bucket = true;
    }

    pub fn mutations(&self) -> Vec<String> {
        self.state.lock().unwrap().mutations.clone()
    }

    pub fn list_calls(&self) -> usize {
        self.state.lock().unwrap().list_calls
    }

    pub fn copy_attempts(&self) -> usize {
        self.state.lock().unwrap().copy_attempts
    }

    pub fn has_bucket(&self, bucket: &str) -> bool {
        self.state.lock().unwrap().buckets.contains_key(bucket)
    }

    pub fn object(&self, bucket: &str, key: &str) -> Option<StoredObject> {
        self.state
            .lock()
            .unwrap()
            .buckets
            .get(bucket)
            .and_then(|objects| objects.get(key))
            .cloned()
    }
}

fn api_error(operation: &'static str, location: String) -> StoreError {
    StoreError::Api {
        operation,
        location,
        message: "injected failure".to_string(),
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn list_objects_page(
        &self,
        bucket: &str,
        prefix: &str,
        cursor: Option<&str>,
    ) -> Result<ObjectPage, StoreError> {
        let mut state = self.state.lock().unwrap();
        state.list_calls += 1;

        if state.fail_list.contains(bucket) {
            return Err(api_error("list_objects", bucket.to_string()));
        }

        let objects = state.buckets.get(bucket).ok_or(StoreError::NotFound {
            operation: "list_objects",
            location: bucket.to_string(),
        })?;

        let keys: Vec<&String> = objects
            .keys()
            .filter(|k| k.starts_with(prefix))
            .collect();

        let start: usize = cursor.map(|c| c.parse().unwrap_or(0)).unwrap_or(0);
        let page_size = if state.page_size == 0 {
            keys.len().max(1)
        } else {
            state.page_size
        };

        let page: Vec<ObjectDescriptor> = keys
            .iter()
            .skip(start)
            .take(page_size)
            .map(|key| ObjectDescriptor::new(key.as_str()))
            .collect();

        let next = if start + page.len() < keys.len() {
            Some((start + page.len()).to_string())
        } else {
            None
        };

        Ok((page, next))
    }

    async fn head_object(&self, bucket: &str, key: &str) -> Result<ObjectMetadata, StoreError> {
        let state = self.state.lock().unwrap();

        if state.fail_head.contains(key) {
            return Err(api_error("head_object", format!("{bucket}/{key}")));
        }

        state
            .buckets
            .get(bucket)
            .and_then(|objects| objects.get(key))
            .map(|object| object.metadata.clone())
            .ok_or(StoreError::NotFound {
                operation: "head_object",
                location: format!("{bucket}/{key}"),
            })
    }

    async fn get_object_acl(&self, bucket: &str, key: &str) -> Result<ObjectAcl, StoreError> {
        let state = self.state.lock().unwrap();

        if state.fail_acl_read.contains(key) {
            return Err(api_error("get_object_acl", format!("{bucket}/{key}")));
        }

        state
            .buckets
            .get(bucket)
            .and_then(|objects| objects.get(key))
            .map(|object| object.acl.clone().unwrap_or_default())
            .ok_or(StoreError::NotFound {
                operation: "get_object_acl",
                location: format!("{bucket}/{key}"),
            })
    }

    async fn copy_object(
        &self,
        source_bucket: &str,
        source_key: &str,
        target_bucket: &str,
        target_key: &str,
        metadata_override: Option<&ObjectMetadata>,
    ) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        state.copy_attempts += 1;

        if let Some(remaining) = state.throttle_copy.get_mut(source_key) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(StoreError::Throttled {
                    operation: "copy_object",
                    location: format!("{target_bucket}/{target_key}"),
                    message: "SlowDown".to_string(),
                });
            }
        }

        if state.fail_copy.contains(source_key) {
            return Err(api_error(
                "copy_object",
                format!("{target_bucket}/{target_key}"),
            ));
        }

        let source = state
            .buckets
            .get(source_bucket)
            .and_then(|objects| objects.get(source_key))
            .cloned()
            .ok_or(StoreError::NotFound {
                operation: "copy_object",
                location: format!("{source_bucket}/{source_key}"),
            })?;

        let directive = if metadata_override.is_some() {
            "REPLACE"
        } else {
            "COPY"
        };
        state.mutations.push(format!(
            "copy_object {target_bucket}/{target_key} directive={directive}"
        ));

        let metadata = metadata_override.cloned().unwrap_or(source.metadata);
        state
            .buckets
            .entry(target_bucket.to_string())
            .or_default()
            .insert(
                target_key.to_string(),
                StoredObject {
                    metadata,
                    // copies never carry the source ACL
                    acl: None,
                },
            );

        Ok(())
    }

    async fn put_object_acl(
        &self,
        bucket: &str,
        key: &str,
        acl: &ObjectAcl,
    ) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();

        if state.fail_put_acl {
            return Err(api_error("put_object_acl", format!("{bucket}/{key}")));
        }

        state
            .mutations
            .push(format!("put_object_acl {bucket}/{key}"));

        if let Some(object) = state
            .buckets
            .get_mut(bucket)
            .and_then(|objects| objects.get_mut(key))
        {
            object.acl = Some(acl.clone());
            Ok(())
        } else {
            Err(StoreError::NotFound {
                operation: "put_object_acl",
                location: format!("{bucket}/{key}"),
            })
        }
    }

    async fn bucket_exists(&self, bucket: &str) -> Result<bool, StoreError> {
        Ok(self.state.lock().unwrap().buckets.contains_key(bucket))
    }

    async fn create_bucket(&self, bucket: &str) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();

        if state.fail_create_bucket {
            return Err(api_error("create_bucket", bucket.to_string()));
        }

        state.mutations.push(format!("create_bucket {bucket}"));
        state.buckets.entry(bucket.to_string()).or_default();
        Ok(())
    }

    async fn list_buckets(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.state.lock().unwrap().buckets.keys().cloned().collect())
    }
}
