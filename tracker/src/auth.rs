use crate::config::AuthConfig;
use crate::errors::{ApiError, TrackerError};
use crate::model::{INSTITUTION_ID, institution_key};
use docstore::{DocumentStore, Filter};
use http::HeaderMap;
use http::header::HeaderName;

/// The service-wide shared secret and the header that must carry it.
#[derive(Debug, Clone)]
pub struct GlobalAuth {
    header_name: HeaderName,
    api_key: String,
}

impl GlobalAuth {
    pub fn new(header_name: &str, api_key: String) -> Result<Self, TrackerError> {
        Ok(GlobalAuth {
            header_name: HeaderName::from_bytes(header_name.as_bytes())?,
            api_key,
        })
    }

    /// Reads the key from the configured environment variable. An empty key is refused so
    /// that a blank header can never authorize.
    pub fn from_config(config: &AuthConfig) -> Result<Self, TrackerError> {
        let api_key = std::env::var(&config.global_api_key_env)
            .ok()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| TrackerError::MissingApiKey(config.global_api_key_env.clone()))?;

        Self::new(&config.header_name, api_key)
    }

    /// Exact match against the configured key. A missing or non-UTF-8 header fails.
    pub fn check(&self, headers: &HeaderMap) -> Result<(), ApiError> {
        match headers.get(&self.header_name).map(|v| v.to_str()) {
            Some(Ok(supplied)) if supplied == self.api_key => Ok(()),
            _ => Err(ApiError::Unauthorized),
        }
    }
}

/// Compares `api_key` with the secret stored for `institution_id`.
pub async fn check_institution(
    store: &dyn DocumentStore,
    collection: &str,
    institution_id: &str,
    api_key: &str,
) -> Result<(), ApiError> {
    let stored = store
        .find_one(
            collection,
            &[Filter::eq(INSTITUTION_ID, institution_id)],
            &[institution_key::API_KEY],
        )
        .await?;

    match stored.as_ref().and_then(|doc| doc.get_str(institution_key::API_KEY)) {
        Some(expected) if expected == api_key => Ok(()),
        _ => Err(ApiError::InstitutionUnauthorized),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docstore::Document;
    use docstore::memory::MemoryStore;
    use http::HeaderValue;

    fn headers(name: &str, value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_bytes(name.as_bytes()).unwrap(),
            HeaderValue::from_str(value).unwrap(),
        );
        headers
    }

    #[test]
    fn test_global_check() {
        let auth = GlobalAuth::new("x-api-key", "secret".into()).unwrap();

        assert!(auth.check(&headers("x-api-key", "secret")).is_ok());
        // Header names are case-insensitive
        assert!(auth.check(&headers("X-API-KEY", "secret")).is_ok());

        assert!(matches!(
            auth.check(&headers("x-api-key", "Secret")),
            Err(ApiError::Unauthorized)
        ));
        assert!(matches!(
            auth.check(&headers("x-other", "secret")),
            Err(ApiError::Unauthorized)
        ));
        assert!(matches!(
            auth.check(&HeaderMap::new()),
            Err(ApiError::Unauthorized)
        ));
    }

    #[test]
    fn test_invalid_header_name() {
        assert!(matches!(
            GlobalAuth::new("bad header", "secret".into()),
            Err(TrackerError::InvalidHeaderName(_))
        ));
    }

    #[test]
    fn test_from_config_requires_key() {
        let config = AuthConfig {
            header_name: "x-api-key".into(),
            global_api_key_env: "BADGETRACK_TEST_UNSET_GLOBAL_KEY".into(),
        };
        assert!(matches!(
            GlobalAuth::from_config(&config),
            Err(TrackerError::MissingApiKey(_))
        ));
    }

    #[tokio::test]
    async fn test_institution_check() {
        let store = MemoryStore::new();
        store
            .insert(
                "institution_keys",
                Document::new("k1")
                    .with("institution_id", "inst1")
                    .with("api_key", "inst1-secret"),
            )
            .await;
        store
            .insert(
                "institution_keys",
                Document::new("k2").with("institution_id", "inst2"),
            )
            .await;

        assert!(
            check_institution(&store, "institution_keys", "inst1", "inst1-secret")
                .await
                .is_ok()
        );
        assert!(matches!(
            check_institution(&store, "institution_keys", "inst1", "wrong").await,
            Err(ApiError::InstitutionUnauthorized)
        ));
        assert!(matches!(
            check_institution(&store, "institution_keys", "unknown", "inst1-secret").await,
            Err(ApiError::InstitutionUnauthorized)
        ));
        // Key document without a stored secret
        assert!(matches!(
            check_institution(&store, "institution_keys", "inst2", "").await,
            Err(ApiError::InstitutionUnauthorized)
        ));
    }
}
