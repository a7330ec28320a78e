use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::BTreeMap;

use super::{CrudService, ServiceError};
use crate::core::{CrudIdentifiable, EntityId};
use crate::filtering::FilterSet;

struct Store<T> {
    entities: BTreeMap<EntityId, T>,
    current_id: EntityId,
}

/// A [`CrudService`] that keeps entities in an ordered map.
///
/// Ids are assigned from a counter starting at 1. The id sequence and the map
/// write of one `save` happen under a single lock, so parallel requests never
/// receive the same id. Filtered reads and deletes are not supported; an empty
/// filter set is accepted and behaves like its unfiltered counterpart.
pub struct InMemoryService<T> {
    store: Mutex<Store<T>>,
}

impl<T> InMemoryService<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            store: Mutex::new(Store {
                entities: BTreeMap::new(),
                current_id: 0,
            }),
        }
    }
}

impl<T> Default for InMemoryService<T> {
    fn default() -> Self {
        Self::new()
    }
}

fn unsupported(filters: &FilterSet) -> Result<(), ServiceError> {
    if filters.is_empty() {
        Ok(())
    } else {
        Err(ServiceError::UnsupportedFilter)
    }
}

#[async_trait]
impl<T: CrudIdentifiable> CrudService<T> for InMemoryService<T> {
    async fn find_by_id(&self, id: EntityId) -> Result<Option<T>, ServiceError> {
        Ok(self.store.lock().entities.get(&id).cloned())
    }

    async fn find_all(&self) -> Result<Vec<T>, ServiceError> {
        Ok(self.store.lock().entities.values().cloned().collect())
    }

    async fn find_by(&self, filters: &FilterSet) -> Result<Vec<T>, ServiceError> {
        unsupported(filters)?;
        self.find_all().await
    }

    async fn count_all(&self) -> Result<u64, ServiceError> {
        let len = self.store.lock().entities.len();
        Ok(u64::try_from(len).unwrap_or(u64::MAX))
    }

    async fn count_by(&self, filters: &FilterSet) -> Result<u64, ServiceError> {
        unsupported(filters)?;
        self.count_all().await
    }

    async fn save(&self, mut entity: T) -> Result<T, ServiceError> {
        entity.validate()?;

        let mut store = self.store.lock();
        let id = if let Some(id) = entity.id() {
            // keep the sequence ahead of ids chosen through updates
            store.current_id = store.current_id.max(id);
            id
        } else {
            let Some(id) = store.current_id.checked_add(1) else {
                return Err(ServiceError::Internal("id sequence exhausted".to_string()));
            };
            store.current_id = id;
            entity.set_id(Some(id));
            id
        };
        store.entities.insert(id, entity.clone());
        drop(store);

        tracing::debug!(id, "Saved entity in memory");
        Ok(entity)
    }

    async fn delete(&self, id: EntityId) -> Result<(), ServiceError> {
        self.store.lock().entities.remove(&id);
        Ok(())
    }

    async fn delete_all(&self) -> Result<(), ServiceError> {
        self.store.lock().entities.clear();
        Ok(())
    }

    async fn delete_by(&self, filters: &FilterSet) -> Result<(), ServiceError> {
        unsupported(filters)?;
        self.delete_all().await
    }
}
