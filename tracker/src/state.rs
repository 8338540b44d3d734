use crate::auth::GlobalAuth;
use crate::config::Collections;
use docstore::DocumentStore;
use std::sync::Arc;

/// Everything a handler needs, built once at startup.
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub auth: GlobalAuth,
    pub collections: Collections,
}

impl AppState {
    pub fn new(store: Arc<dyn DocumentStore>, auth: GlobalAuth, collections: Collections) -> Self {
        AppState {
            store,
            auth,
            collections,
        }
    }
}
