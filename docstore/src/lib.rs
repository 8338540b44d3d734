pub mod config;
pub mod credentials;
pub mod firestore;
pub mod memory;
pub mod store;
pub mod types;

use config::StoreConfig;
use firestore::FirestoreStore;
use memory::MemoryStore;
use std::sync::Arc;

pub use store::{DocumentStore, StoreError};
pub use types::{Comparison, DOCUMENT_ID, Document, FieldValue, Filter, Patch};

/// Builds the document store selected by `config`.
pub fn get_store(config: &StoreConfig) -> Result<Arc<dyn DocumentStore>, StoreError> {
    match config {
        StoreConfig::Memory { seed_file } => {
            let store = match seed_file {
                Some(path) => MemoryStore::from_seed_file(path)?,
                None => MemoryStore::new(),
            };
            Ok(Arc::new(store))
        }
        StoreConfig::Firestore {
            project_id,
            database,
            base_url,
            credentials: source,
        } => {
            let credentials = credentials::load(source)?;
            Ok(Arc::new(FirestoreStore::new(
                project_id,
                database,
                base_url.as_deref(),
                credentials,
            )?))
        }
    }
}
