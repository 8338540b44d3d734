//! In-memory document store.
//!
//! Collections keep documents in insertion order, which is the order `find_one` walks them.
//! State lives only as long as the process. Used for local development and tests.
use crate::store::{DocumentStore, StoreError};
use crate::types::{Document, FieldValue, Filter, Patch};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_yaml::Value as YamlValue;
use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::path::Path;
use tokio::sync::RwLock;

type Collections = HashMap<String, Vec<Document>>;

#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<Collections>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads collections from a YAML file shaped as `collection -> [ {id, field: value, ...} ]`.
    pub fn from_seed_file<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let file = File::open(path)?;
        let seed: BTreeMap<String, Vec<BTreeMap<String, YamlValue>>> =
            serde_yaml::from_reader(file)?;
        Self::from_seed(seed)
    }

    pub fn from_seed_str(yaml: &str) -> Result<Self, StoreError> {
        let seed: BTreeMap<String, Vec<BTreeMap<String, YamlValue>>> = serde_yaml::from_str(yaml)?;
        Self::from_seed(seed)
    }

    fn from_seed(
        seed: BTreeMap<String, Vec<BTreeMap<String, YamlValue>>>,
    ) -> Result<Self, StoreError> {
        let mut collections = Collections::new();

        for (collection, rows) in seed {
            let mut documents = Vec::with_capacity(rows.len());
            for mut row in rows {
                let id = match row.remove("id") {
                    Some(YamlValue::String(id)) => id,
                    _ => {
                        return Err(StoreError::Decode(format!(
                            "seed document in {collection} is missing a string id"
                        )));
                    }
                };

                let mut document = Document::new(id);
                for (field, value) in row {
                    document.fields.insert(field, seed_value(value)?);
                }
                documents.push(document);
            }
            collections.insert(collection, documents);
        }

        Ok(MemoryStore {
            collections: RwLock::new(collections),
        })
    }

    pub async fn insert(&self, collection: &str, document: Document) {
        self.collections
            .write()
            .await
            .entry(collection.to_string())
            .or_default()
            .push(document);
    }

    /// Returns a full copy of the document with the given id, if present.
    pub async fn get(&self, collection: &str, id: &str) -> Option<Document> {
        self.collections
            .read()
            .await
            .get(collection)?
            .iter()
            .find(|doc| doc.id == id)
            .cloned()
    }
}

fn seed_value(value: YamlValue) -> Result<FieldValue, StoreError> {
    match value {
        YamlValue::Null => Ok(FieldValue::Null),
        YamlValue::Bool(b) => Ok(FieldValue::Bool(b)),
        // YAML has no timestamp type here, so RFC 3339 strings become timestamps
        YamlValue::String(s) => Ok(match DateTime::parse_from_rfc3339(&s) {
            Ok(ts) => FieldValue::Timestamp(ts.with_timezone(&Utc)),
            Err(_) => FieldValue::String(s),
        }),
        YamlValue::Number(n) => n
            .as_i64()
            .map(FieldValue::Integer)
            .ok_or_else(|| StoreError::Decode(format!("unsupported seed number {n}"))),
        other => Err(StoreError::Decode(format!(
            "unsupported seed value {other:?}"
        ))),
    }
}

fn matches_all(document: &Document, filters: &[Filter]) -> bool {
    filters.iter().all(|filter| {
        if filter.is_document_id() {
            return filter
                .comparison
                .matches(&FieldValue::String(document.id.clone()), &filter.value);
        }
        // Documents lacking the field never match, whatever the comparison.
        document
            .get(&filter.field)
            .is_some_and(|stored| filter.comparison.matches(stored, &filter.value))
    })
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn find_one(
        &self,
        collection: &str,
        filters: &[Filter],
        projection: &[&str],
    ) -> Result<Option<Document>, StoreError> {
        let read_guard = self.collections.read().await;
        let Some(documents) = read_guard.get(collection) else {
            return Ok(None);
        };

        let found = documents
            .iter()
            .find(|doc| matches_all(doc, filters))
            .map(|doc| {
                let mut projected = Document::new(doc.id.clone());
                for field in projection {
                    if let Some(value) = doc.get(field) {
                        projected.fields.insert(field.to_string(), value.clone());
                    }
                }
                projected
            });

        Ok(found)
    }

    async fn update_where(
        &self,
        collection: &str,
        filters: &[Filter],
        patch: &Patch,
    ) -> Result<u64, StoreError> {
        let mut write_guard = self.collections.write().await;
        let Some(documents) = write_guard.get_mut(collection) else {
            return Ok(0);
        };

        let mut updated = 0;
        for doc in documents.iter_mut().filter(|doc| matches_all(doc, filters)) {
            for (field, value) in patch {
                doc.fields.insert(field.clone(), value.clone());
            }
            updated += 1;
        }

        Ok(updated)
    }
}
