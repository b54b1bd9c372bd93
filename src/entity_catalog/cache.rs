//! Read-through metadata cache
//!
//! The cache is an explicit object handed to whoever needs metadata; there is
//! no process-wide instance. An entry never changes once inserted. Two threads
//! resolving the same type at the same time both compute the metadata and the
//! first insert wins, which is fine because resolution is deterministic.

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use super::entity::{Entity, EntityType};
use super::metadata::EntityMetadata;

#[derive(Debug, Default)]
pub struct MetadataCache {
    entries: RwLock<HashMap<TypeId, Arc<EntityMetadata>>>,
}

impl MetadataCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resolve<T: Entity>(&self) -> Arc<EntityMetadata> {
        self.resolve_type(EntityType::of::<T>())
    }

    pub fn resolve_type(&self, entity: EntityType) -> Arc<EntityMetadata> {
        if let Some(found) = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&entity.id())
        {
            return Arc::clone(found);
        }

        // Computed outside the lock; a concurrent resolver may beat us to the insert.
        let computed = Arc::new(EntityMetadata::resolve(&entity.descriptor()));

        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(entries.entry(entity.id()).or_insert(computed))
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
