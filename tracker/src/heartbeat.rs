use crate::errors::ApiError;
use crate::model::reader;
use crate::request::{parse_body, parse_timestamp, required_fields};
use crate::state::AppState;
use docstore::{FieldValue, Filter, Patch};
use http::HeaderMap;

const REQUIRED_FIELDS: [&str; 2] = ["last_online", "mac_address"];

/// Records that a reader is alive.
///
/// The update matches on MAC address alone, across every institution.
pub async fn update_last_online(
    state: &AppState,
    headers: &HeaderMap,
    body: &[u8],
) -> Result<&'static str, ApiError> {
    state.auth.check(headers)?;

    let body = parse_body(body)?;
    let [last_online, mac_address] = required_fields(&body, REQUIRED_FIELDS)?;
    let last_online = parse_timestamp("last_online", last_online)?;

    let patch = Patch::from([(
        reader::LAST_ONLINE.to_string(),
        FieldValue::Timestamp(last_online),
    )]);

    let updated = state
        .store
        .update_where(
            &state.collections.readers,
            &[Filter::eq(reader::MAC_ADDRESS, mac_address)],
            &patch,
        )
        .await?;

    if updated == 0 {
        tracing::warn!(mac_address, "Heartbeat from unknown reader");
        return Err(ApiError::UpdateNotApplied);
    }

    tracing::debug!(mac_address, updated, "Recorded reader heartbeat");
    Ok("Reader last online updated")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutils::{TestStore, auth_headers, test_state};
    use chrono::{TimeZone, Utc};
    use serde_json::json;
    use std::sync::Arc;

    fn heartbeat(mac_address: &str, last_online: &str) -> Vec<u8> {
        json!({ "last_online": last_online, "mac_address": mac_address })
            .to_string()
            .into_bytes()
    }

    #[tokio::test]
    async fn test_heartbeat_updates_last_online() {
        let store = Arc::new(TestStore::seeded());
        let state = test_state(store.clone());

        let result = update_last_online(
            &state,
            &auth_headers(),
            &heartbeat("AA:BB:CC", "2024-01-01T12:30:00+02:00"),
        )
        .await;
        assert_eq!(result.unwrap(), "Reader last online updated");

        let reader = store.reader("r1").await;
        assert_eq!(
            reader.get("last_online").and_then(FieldValue::as_timestamp),
            Some(Utc.with_ymd_and_hms(2024, 1, 1, 10, 30, 0).unwrap())
        );
        // Other readers untouched
        assert_eq!(store.reader("r2").await.get("last_online"), None);
    }

    #[tokio::test]
    async fn test_heartbeat_is_not_institution_scoped() {
        let store = Arc::new(TestStore::seeded());
        let state = test_state(store.clone());

        // 99:99:99 belongs to inst2; no institution credentials are needed
        update_last_online(
            &state,
            &auth_headers(),
            &heartbeat("99:99:99", "2024-01-01T10:00:00Z"),
        )
        .await
        .unwrap();
        assert!(store.reader("r9").await.get("last_online").is_some());
    }

    #[tokio::test]
    async fn test_heartbeat_rejections() {
        let store = Arc::new(TestStore::seeded());
        let state = test_state(store.clone());

        let result = update_last_online(
            &state,
            &HeaderMap::new(),
            &heartbeat("AA:BB:CC", "2024-01-01T10:00:00Z"),
        )
        .await;
        assert!(matches!(result, Err(ApiError::Unauthorized)));

        let result = update_last_online(&state, &auth_headers(), b"").await;
        assert!(matches!(result, Err(ApiError::MissingBody)));

        let body = json!({ "mac_address": "AA:BB:CC" }).to_string();
        let result = update_last_online(&state, &auth_headers(), body.as_bytes()).await;
        assert!(matches!(result, Err(ApiError::MissingField("last_online"))));

        let result =
            update_last_online(&state, &auth_headers(), &heartbeat("AA:BB:CC", "noon")).await;
        assert!(matches!(
            result,
            Err(ApiError::InvalidTimestamp { field: "last_online", .. })
        ));

        assert_eq!(store.update_calls(), 0);
    }

    #[tokio::test]
    async fn test_heartbeat_unknown_reader() {
        let store = Arc::new(TestStore::seeded());
        let state = test_state(store.clone());

        let result = update_last_online(
            &state,
            &auth_headers(),
            &heartbeat("00:00:00", "2024-01-01T10:00:00Z"),
        )
        .await;
        assert!(matches!(result, Err(ApiError::UpdateNotApplied)));
    }
}
