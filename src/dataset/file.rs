//! Read-only store over persisted dataset files
//!
//! Layout: one file per dataset, `<data_dir>/<id>.json`:
//!
//! ```json
//! {"Dataset": {"id": "sections", "kind": "courses", "numRows": 2},
//!  "Data": [{"sections_dept": "cpsc", "sections_avg": 80}, ...]}
//! ```
//!
//! Writing these files is the ingestion side's job, not this store's.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;

use crate::observability::{log_event_with_fields, Event};
use crate::schema::Kind;

use super::errors::{DatasetError, DatasetResult};
use super::store::DatasetStore;
use super::types::{validate_id, Dataset, DatasetInfo, Row};

const DATASET_EXTENSION: &str = "json";

#[derive(Debug, Deserialize)]
struct PersistedDataset {
    #[serde(rename = "Dataset")]
    header: PersistedHeader,
    #[serde(rename = "Data", default)]
    data: Vec<Row>,
}

#[derive(Debug, Deserialize)]
struct PersistedHeader {
    id: String,
    kind: Kind,
}

/// Dataset store backed by a directory of JSON files
#[derive(Debug, Clone)]
pub struct FileStore {
    data_dir: PathBuf,
}

impl FileStore {
    /// Creates a store rooted at `data_dir`
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Root directory of the store
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Path of the file backing `id`
    pub fn dataset_path(&self, id: &str) -> PathBuf {
        self.data_dir.join(format!("{}.{}", id, DATASET_EXTENSION))
    }

    fn read(&self, id: &str) -> DatasetResult<Dataset> {
        validate_file_id(id)?;

        let path = self.dataset_path(id);
        let content = fs::read_to_string(&path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => DatasetError::NotFound(id.to_string()),
            _ => DatasetError::Io {
                id: id.to_string(),
                source: e,
            },
        })?;

        let persisted: PersistedDataset =
            serde_json::from_str(&content).map_err(|e| DatasetError::Malformed {
                id: id.to_string(),
                reason: e.to_string(),
            })?;

        if persisted.header.id != id {
            return Err(DatasetError::Malformed {
                id: id.to_string(),
                reason: format!("file declares id '{}'", persisted.header.id),
            });
        }

        Ok(Dataset::new(id, persisted.header.kind, persisted.data))
    }
}

impl DatasetStore for FileStore {
    fn load(&self, id: &str) -> DatasetResult<Arc<Dataset>> {
        self.read(id).map(Arc::new)
    }

    /// Lists readable datasets by id; unreadable files are logged and skipped
    fn list(&self) -> DatasetResult<Vec<DatasetInfo>> {
        let entries = fs::read_dir(&self.data_dir).map_err(|e| DatasetError::Io {
            id: self.data_dir.display().to_string(),
            source: e,
        })?;

        let mut ids = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| DatasetError::Io {
                id: self.data_dir.display().to_string(),
                source: e,
            })?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(DATASET_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                if validate_file_id(stem).is_ok() {
                    ids.push(stem.to_string());
                }
            }
        }
        ids.sort();

        let mut listing = Vec::with_capacity(ids.len());
        for id in &ids {
            match self.read(id) {
                Ok(dataset) => listing.push(dataset.info()),
                Err(e) => {
                    let reason = e.to_string();
                    log_event_with_fields(
                        Event::DatasetLoadFailed,
                        &[("dataset", id.as_str()), ("reason", reason.as_str())],
                    );
                }
            }
        }
        Ok(listing)
    }
}

/// Ids double as file names, so path components are refused as well.
fn validate_file_id(id: &str) -> DatasetResult<()> {
    validate_id(id)?;
    if id.contains('/') || id.contains('\\') || id == "." || id == ".." {
        return Err(DatasetError::InvalidId(id.to_string()));
    }
    Ok(())
}
