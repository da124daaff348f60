//! The dataset store boundary consumed by the query engine

use std::sync::Arc;

use super::errors::DatasetResult;
use super::types::{Dataset, DatasetInfo};

/// Read access to stored datasets.
///
/// A load hands out a shared, immutable snapshot. The engine never
/// mutates it, so concurrent queries may share one dataset freely.
pub trait DatasetStore {
    /// Load a dataset by id. Fails with `DatasetError::NotFound` if unknown.
    fn load(&self, id: &str) -> DatasetResult<Arc<Dataset>>;

    /// List every stored dataset
    fn list(&self) -> DatasetResult<Vec<DatasetInfo>>;
}

impl<S: DatasetStore + ?Sized> DatasetStore for Arc<S> {
    fn load(&self, id: &str) -> DatasetResult<Arc<Dataset>> {
        (**self).load(id)
    }

    fn list(&self) -> DatasetResult<Vec<DatasetInfo>> {
        (**self).list()
    }
}
