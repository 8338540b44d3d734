use crate::auth::GlobalAuth;
use crate::config::Collections;
use crate::state::AppState;
use async_trait::async_trait;
use docstore::memory::MemoryStore;
use docstore::{Document, DocumentStore, Filter, Patch, StoreError};
use http::HeaderMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

pub const GLOBAL_KEY: &str = "global-secret";
pub const INSTITUTION_KEY: &str = "inst1-secret";

const SEED: &str = r#"
institution_keys:
  - id: k1
    institution_id: inst1
    api_key: inst1-secret
  - id: k2
    institution_id: inst2
    api_key: inst2-secret
institution_members:
  - id: m1
    institution_id: inst1
    rfid_uid: TAG1
    rfid_location: roomX
    in_room: false
  - id: m2
    institution_id: inst1
    rfid_uid: TAG2
    rfid_location: roomA
    in_room: true
  - id: m3
    institution_id: inst1
    rfid_uid: TAG3
  - id: m9
    institution_id: inst2
    rfid_uid: TAG9
    rfid_location: roomX
    in_room: false
reader_locations:
  - id: r1
    institution_id: inst1
    reader_mac_address: AA:BB:CC
    location: roomX
    last_online: null
  - id: r2
    institution_id: inst1
    reader_mac_address: DD:EE:FF
    location: roomY
  - id: r3
    institution_id: inst1
    reader_mac_address: R-A
    location: roomA
  - id: r9
    institution_id: inst2
    reader_mac_address: "99:99:99"
    location: roomZ
"#;

/// Memory store that counts calls and can be told to drop updates or fail outright.
pub struct TestStore {
    inner: MemoryStore,
    find_calls: AtomicUsize,
    update_calls: AtomicUsize,
    suppress_updates: bool,
    failing: bool,
}

impl TestStore {
    pub fn seeded() -> Self {
        TestStore {
            inner: MemoryStore::from_seed_str(SEED).unwrap(),
            find_calls: AtomicUsize::new(0),
            update_calls: AtomicUsize::new(0),
            suppress_updates: false,
            failing: false,
        }
    }

    /// Updates report zero documents touched, as if the document vanished after the lookup.
    pub fn suppress_updates(mut self) -> Self {
        self.suppress_updates = true;
        self
    }

    pub fn failing(mut self) -> Self {
        self.failing = true;
        self
    }

    pub fn find_calls(&self) -> usize {
        self.find_calls.load(Ordering::SeqCst)
    }

    pub fn update_calls(&self) -> usize {
        self.update_calls.load(Ordering::SeqCst)
    }

    pub async fn member(&self, id: &str) -> Document {
        self.inner.get("institution_members", id).await.unwrap()
    }

    pub async fn reader(&self, id: &str) -> Document {
        self.inner.get("reader_locations", id).await.unwrap()
    }

    fn unavailable() -> StoreError {
        StoreError::Status {
            status: 503,
            message: "unavailable".into(),
        }
    }
}

#[async_trait]
impl DocumentStore for TestStore {
    async fn find_one(
        &self,
        collection: &str,
        filters: &[Filter],
        projection: &[&str],
    ) -> Result<Option<Document>, StoreError> {
        self.find_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing {
            return Err(Self::unavailable());
        }
        self.inner.find_one(collection, filters, projection).await
    }

    async fn update_where(
        &self,
        collection: &str,
        filters: &[Filter],
        patch: &Patch,
    ) -> Result<u64, StoreError> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing {
            return Err(Self::unavailable());
        }
        if self.suppress_updates {
            return Ok(0);
        }
        self.inner.update_where(collection, filters, patch).await
    }
}

pub fn test_state(store: Arc<dyn DocumentStore>) -> AppState {
    AppState::new(
        store,
        GlobalAuth::new("x-api-key", GLOBAL_KEY.into()).unwrap(),
        Collections::default(),
    )
}

pub fn auth_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert("x-api-key", GLOBAL_KEY.parse().unwrap());
    headers
}
