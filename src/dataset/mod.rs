//! Dataset store boundary for insightdb
//!
//! Datasets are produced by an external ingestion step and handed to the
//! query engine read-only. This module defines the row model, the
//! `DatasetStore` trait the engine consumes, and two stores:
//!
//! - `MemoryStore`: thread-safe, add/remove/list in insertion order
//! - `FileStore`: reads `<data_dir>/<id>.json` files
//!
//! No schema is enforced here. Field validity is the query validator's job.

mod errors;
mod file;
mod memory;
mod store;
mod types;

pub use errors::{DatasetError, DatasetResult};
pub use file::FileStore;
pub use memory::MemoryStore;
pub use store::DatasetStore;
pub use types::{validate_id, Dataset, DatasetInfo, Row};
