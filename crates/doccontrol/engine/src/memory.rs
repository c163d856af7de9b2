//! In-memory content store, for development and single-process hosts

use crate::collaborators::{CollaboratorError, ContentStore};
use dashmap::DashMap;
use doccontrol_types::ContentRef;

/// Content store backed by a concurrent map
pub struct InMemoryContentStore {
    blobs: DashMap<ContentRef, Vec<u8>>,
}

impl InMemoryContentStore {
    pub fn new() -> Self {
        Self {
            blobs: DashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }
}

impl Default for InMemoryContentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentStore for InMemoryContentStore {
    fn put(&self, bytes: Vec<u8>) -> Result<ContentRef, CollaboratorError> {
        let content_ref = ContentRef::new(format!("mem:{}", uuid::Uuid::new_v4()));
        self.blobs.insert(content_ref.clone(), bytes);
        Ok(content_ref)
    }

    fn get(&self, content_ref: &ContentRef) -> Result<Vec<u8>, CollaboratorError> {
        self.blobs
            .get(content_ref)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| CollaboratorError::NotFound(content_ref.to_string()))
    }
}
