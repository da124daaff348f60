//! In-memory dataset store

use std::sync::{Arc, RwLock};

use super::errors::{DatasetError, DatasetResult};
use super::store::DatasetStore;
use super::types::{validate_id, Dataset, DatasetInfo};

/// Thread-safe in-memory store, keeping datasets in insertion order
#[derive(Debug, Default)]
pub struct MemoryStore {
    datasets: RwLock<Vec<Arc<Dataset>>>,
}

impl MemoryStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a dataset, returning the ids of all stored datasets.
    ///
    /// Rejects invalid ids and ids already present.
    pub fn add(&self, dataset: Dataset) -> DatasetResult<Vec<String>> {
        validate_id(&dataset.id)?;

        let mut datasets = self.datasets.write().map_err(|_| DatasetError::Poisoned)?;
        if datasets.iter().any(|d| d.id == dataset.id) {
            return Err(DatasetError::AlreadyExists(dataset.id));
        }
        datasets.push(Arc::new(dataset));

        Ok(datasets.iter().map(|d| d.id.clone()).collect())
    }

    /// Removes a dataset, returning its id
    pub fn remove(&self, id: &str) -> DatasetResult<String> {
        validate_id(id)?;

        let mut datasets = self.datasets.write().map_err(|_| DatasetError::Poisoned)?;
        let position = datasets
            .iter()
            .position(|d| d.id == id)
            .ok_or_else(|| DatasetError::NotFound(id.to_string()))?;
        datasets.remove(position);

        Ok(id.to_string())
    }

    /// Number of stored datasets
    pub fn len(&self) -> DatasetResult<usize> {
        let datasets = self.datasets.read().map_err(|_| DatasetError::Poisoned)?;
        Ok(datasets.len())
    }

    /// Returns true if nothing is stored
    pub fn is_empty(&self) -> DatasetResult<bool> {
        Ok(self.len()? == 0)
    }
}

impl DatasetStore for MemoryStore {
    fn load(&self, id: &str) -> DatasetResult<Arc<Dataset>> {
        let datasets = self.datasets.read().map_err(|_| DatasetError::Poisoned)?;
        datasets
            .iter()
            .find(|d| d.id == id)
            .cloned()
            .ok_or_else(|| DatasetError::NotFound(id.to_string()))
    }

    fn list(&self) -> DatasetResult<Vec<DatasetInfo>> {
        let datasets = self.datasets.read().map_err(|_| DatasetError::Poisoned)?;
        Ok(datasets.iter().map(|d| d.info()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Kind;

    fn empty(id: &str, kind: Kind) -> Dataset {
        Dataset::new(id, kind, Vec::new())
    }

    #[test]
    fn test_add_returns_all_ids_in_order() {
        let store = MemoryStore::new();
        assert_eq!(store.add(empty("sections", Kind::Courses)).unwrap(), vec!["sections"]);
        assert_eq!(
            store.add(empty("rooms", Kind::Rooms)).unwrap(),
            vec!["sections", "rooms"]
        );
    }

    #[test]
    fn test_add_rejects_duplicate() {
        let store = MemoryStore::new();
        store.add(empty("sections", Kind::Courses)).unwrap();
        let err = store.add(empty("sections", Kind::Rooms)).unwrap_err();
        assert!(matches!(err, DatasetError::AlreadyExists(_)));
    }

    #[test]
    fn test_add_rejects_invalid_id() {
        let store = MemoryStore::new();
        let err = store.add(empty("bad_id", Kind::Courses)).unwrap_err();
        assert!(matches!(err, DatasetError::InvalidId(_)));
        assert!(store.is_empty().unwrap());
    }

    #[test]
    fn test_remove() {
        let store = MemoryStore::new();
        store.add(empty("sections", Kind::Courses)).unwrap();
        assert_eq!(store.remove("sections").unwrap(), "sections");
        assert!(store.load("sections").unwrap_err().is_not_found());
        assert!(store.remove("sections").unwrap_err().is_not_found());
    }

    #[test]
    fn test_list() {
        let store = MemoryStore::new();
        store.add(empty("rooms", Kind::Rooms)).unwrap();
        let list = store.list().unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].id, "rooms");
        assert_eq!(list[0].num_rows, 0);
    }

    #[test]
    fn test_poisoned_lock_is_reported() {
        let store = MemoryStore::new();
        store.add(empty("rooms", Kind::Rooms)).unwrap();

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = store.datasets.write().unwrap();
            panic!("poison the lock");
        }));
        assert!(result.is_err());

        assert!(matches!(store.len(), Err(DatasetError::Poisoned)));
        assert!(matches!(store.is_empty(), Err(DatasetError::Poisoned)));
        assert!(matches!(store.load("rooms"), Err(DatasetError::Poisoned)));
    }
}
