//! Lazy enumeration of a bucket's objects
//!
//! Buckets can hold an unbounded number of objects, so the enumerator pulls
//! one listing page at a time and never materializes the whole listing.

use std::collections::VecDeque;
use std::sync::Arc;

use crate::migrate::error::MigrateError;
use crate::s3::{ObjectDescriptor, ObjectStore};

/// One-pass, non-restartable sequence over a paginated object listing
pub struct ObjectEnumerator {
    store: Arc<dyn ObjectStore>,
    bucket: String,
    prefix: String,
    buffer: VecDeque<ObjectDescriptor>,
    cursor: Option<String>,
    exhausted: bool,
}

impl ObjectEnumerator {
    pub fn new(store: Arc<dyn ObjectStore>, bucket: &str, prefix: &str) -> Self {
        Self {
            store,
            bucket: bucket.to_string(),
            prefix: prefix.to_string(),
            buffer: VecDeque::new(),
            cursor: None,
            exhausted: false,
        }
    }

    /// Produce the next descriptor, fetching the following page when the
    /// current one drains. Returns `Ok(None)` once the listing is exhausted.
    /// A page failure is fatal for this bucket's enumeration.
    pub async fn next(&mut self) -> Result<Option<ObjectDescriptor>, MigrateError> {
        loop {
            if let Some(descriptor) = self.buffer.pop_front() {
                return Ok(Some(descriptor));
            }

            if self.exhausted {
                return Ok(None);
            }

            let (page, next_cursor) = self
                .store
                .list_objects_page(&self.bucket, &self.prefix, self.cursor.as_deref())
                .await
                .map_err(|source| MigrateError::List {
                    bucket: self.bucket.clone(),
                    source,
                })?;

            tracing::debug!(
                "Fetched page of {} objects from {} (more: {})",
                page.len(),
                self.bucket,
                next_cursor.is_some()
            );

            self.exhausted = next_cursor.is_none();
            self.cursor = next_cursor;
            self.buffer.extend(page);
        }
    }
}
