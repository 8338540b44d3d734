use crate::types::{Document, Filter, Patch};
use async_trait::async_trait;

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("store returned {status}: {message}")]
    Status { status: u16, message: String },
    #[error("could not decode store response: {0}")]
    Decode(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not parse seed file: {0}")]
    Seed(#[from] serde_yaml::Error),
    #[error("environment variable {0} is not set")]
    MissingEnv(String),
    #[error("invalid credentials: {0}")]
    InvalidCredentials(String),
    #[error("could not build credentials: {0}")]
    CredentialsBuild(#[from] google_cloud_auth::build_errors::Error),
    #[error("could not obtain access token: {0}")]
    Credentials(#[from] google_cloud_auth::errors::CredentialsError),
}

/// Query and update primitives over named collections of documents.
///
/// Filters are combined with logical AND. When several documents match, the order in
/// which they are considered is defined by the backing store.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Returns the first document matching all `filters`, carrying only the `projection`
    /// fields that are present on it.
    async fn find_one(
        &self,
        collection: &str,
        filters: &[Filter],
        projection: &[&str],
    ) -> Result<Option<Document>, StoreError>;

    /// Merges `patch` into every document matching all `filters` and returns how many
    /// documents were touched.
    async fn update_where(
        &self,
        collection: &str,
        filters: &[Filter],
        patch: &Patch,
    ) -> Result<u64, StoreError>;
}
