//! Document store backed by the Firestore REST API (v1).
//!
//! `find_one` is a single `:runQuery` call. `update_where` runs the same query projecting only
//! document names, then PATCHes each match with an update mask so that only the patched
//! fields change. A document deleted between the query and its PATCH is not counted.
//! Requests carry the headers of the configured Google credentials, or none for the emulator.
use crate::credentials::auth_headers;
use crate::store::{DocumentStore, StoreError};
use crate::types::{Comparison, DOCUMENT_ID, Document, FieldValue, Filter, Patch};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use google_cloud_auth::credentials::Credentials;
use reqwest::{RequestBuilder, StatusCode};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use std::collections::HashMap;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://firestore.googleapis.com";

#[derive(Deserialize)]
struct RunQueryItem {
    document: Option<FirestoreDocument>,
}

#[derive(Deserialize)]
struct FirestoreDocument {
    name: String,
    #[serde(default)]
    fields: HashMap<String, Value>,
}

pub struct FirestoreStore {
    client: reqwest::Client,
    base_url: Url,
    // projects/{project}/databases/{database}/documents
    database_path: String,
    credentials: Option<Credentials>,
}

impl FirestoreStore {
    pub fn new(
        project_id: &str,
        database: &str,
        base_url: Option<&str>,
        credentials: Option<Credentials>,
    ) -> Result<Self, StoreError> {
        let base_url = Url::parse(base_url.unwrap_or(DEFAULT_BASE_URL))?;
        if base_url.cannot_be_a_base() {
            return Err(StoreError::InvalidUrl(
                url::ParseError::RelativeUrlWithCannotBeABaseBase,
            ));
        }

        Ok(FirestoreStore {
            client: reqwest::Client::new(),
            base_url,
            database_path: format!("projects/{project_id}/databases/{database}/documents"),
            credentials,
        })
    }

    async fn authorize(&self, builder: RequestBuilder) -> Result<RequestBuilder, StoreError> {
        match &self.credentials {
            Some(credentials) => Ok(builder.headers(auth_headers(credentials).await?)),
            None => Ok(builder),
        }
    }

    /// `{base_url}/v1/{resource}`, percent-encoding each segment of `resource`.
    fn endpoint(&self, resource: &str) -> Result<Url, StoreError> {
        let mut endpoint = self.base_url.clone();
        endpoint
            .path_segments_mut()
            .map_err(|()| {
                StoreError::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase)
            })?
            .pop_if_empty()
            .push("v1")
            .extend(resource.split('/'));
        Ok(endpoint)
    }

    fn document_reference(&self, collection: &str, id: &str) -> String {
        format!("{}/{}/{}", self.database_path, collection, id)
    }

    fn encode_filter(&self, collection: &str, filter: &Filter) -> Value {
        let value = if filter.is_document_id() {
            match &filter.value {
                FieldValue::String(id) => {
                    json!({ "referenceValue": self.document_reference(collection, id) })
                }
                other => encode_value(other),
            }
        } else {
            encode_value(&filter.value)
        };

        json!({
            "fieldFilter": {
                "field": { "fieldPath": filter.field },
                "op": operator(filter.comparison),
                "value": value,
            }
        })
    }

    fn structured_query(
        &self,
        collection: &str,
        filters: &[Filter],
        projection: &[&str],
        limit: Option<u32>,
    ) -> Value {
        let mut query = Map::new();
        query.insert("from".into(), json!([{ "collectionId": collection }]));

        let select: Vec<Value> = if projection.is_empty() {
            vec![json!({ "fieldPath": DOCUMENT_ID })]
        } else {
            projection
                .iter()
                .map(|field| json!({ "fieldPath": field }))
                .collect()
        };
        query.insert("select".into(), json!({ "fields": select }));

        let mut encoded: Vec<Value> = filters
            .iter()
            .map(|f| self.encode_filter(collection, f))
            .collect();
        match encoded.len() {
            0 => {}
            1 => {
                query.insert("where".into(), encoded.remove(0));
            }
            _ => {
                query.insert(
                    "where".into(),
                    json!({ "compositeFilter": { "op": "AND", "filters": encoded } }),
                );
            }
        }

        if let Some(limit) = limit {
            query.insert("limit".into(), json!(limit));
        }

        json!({ "structuredQuery": Value::Object(query) })
    }

    async fn run_query(&self, body: &Value) -> Result<Vec<FirestoreDocument>, StoreError> {
        let url = self.endpoint(&format!("{}:runQuery", self.database_path))?;
        let response = self
            .authorize(self.client.post(url))
            .await?
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::Status {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        // Empty result sets come back as a single item carrying only a readTime
        let items = response.json::<Vec<RunQueryItem>>().await?;
        Ok(items.into_iter().filter_map(|item| item.document).collect())
    }

    async fn patch_document(&self, name: &str, patch: &Patch) -> Result<bool, StoreError> {
        let mut url = self.endpoint(name)?;
        {
            let mut pairs = url.query_pairs_mut();
            for field in patch.keys() {
                pairs.append_pair("updateMask.fieldPaths", field);
            }
            pairs.append_pair("currentDocument.exists", "true");
        }

        let fields: Map<String, Value> = patch
            .iter()
            .map(|(field, value)| (field.clone(), encode_value(value)))
            .collect();

        let response = self
            .authorize(self.client.patch(url))
            .await?
            .json(&json!({ "fields": fields }))
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => Ok(true),
            // The exists precondition failed: the document is gone
            StatusCode::NOT_FOUND => {
                tracing::warn!(document = name, "Document vanished before update");
                Ok(false)
            }
            status => Err(StoreError::Status {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            }),
        }
    }
}

#[async_trait]
impl DocumentStore for FirestoreStore {
    async fn find_one(
        &self,
        collection: &str,
        filters: &[Filter],
        projection: &[&str],
    ) -> Result<Option<Document>, StoreError> {
        let query = self.structured_query(collection, filters, projection, Some(1));
        let Some(found) = self.run_query(&query).await?.into_iter().next() else {
            return Ok(None);
        };

        let mut document = Document::new(document_id(&found.name));
        for (field, value) in &found.fields {
            document.fields.insert(field.clone(), decode_value(value)?);
        }
        Ok(Some(document))
    }

    async fn update_where(
        &self,
        collection: &str,
        filters: &[Filter],
        patch: &Patch,
    ) -> Result<u64, StoreError> {
        let query = self.structured_query(collection, filters, &[], None);
        let matches = self.run_query(&query).await?;

        let mut updated = 0;
        for found in matches {
            if self.patch_document(&found.name, patch).await? {
                updated += 1;
            }
        }
        Ok(updated)
    }
}

fn operator(comparison: Comparison) -> &'static str {
    match comparison {
        Comparison::Equal => "EQUAL",
        Comparison::NotEqual => "NOT_EQUAL",
        Comparison::LessThan => "LESS_THAN",
        Comparison::LessThanOrEqual => "LESS_THAN_OR_EQUAL",
        Comparison::GreaterThan => "GREATER_THAN",
        Comparison::GreaterThanOrEqual => "GREATER_THAN_OR_EQUAL",
    }
}

fn document_id(name: &str) -> &str {
    name.rsplit('/').next().unwrap_or(name)
}

fn encode_value(value: &FieldValue) -> Value {
    match value {
        FieldValue::Null => json!({ "nullValue": null }),
        FieldValue::Bool(b) => json!({ "booleanValue": b }),
        // Firestore carries 64-bit integers as strings
        FieldValue::Integer(i) => json!({ "integerValue": i.to_string() }),
        FieldValue::String(s) => json!({ "stringValue": s }),
        FieldValue::Timestamp(ts) => {
            json!({ "timestampValue": ts.to_rfc3339_opts(SecondsFormat::AutoSi, true) })
        }
    }
}

fn decode_value(value: &Value) -> Result<FieldValue, StoreError> {
    let unsupported = || StoreError::Decode(format!("unsupported value {value}"));
    let object = value.as_object().ok_or_else(unsupported)?;
    let (kind, inner) = object.iter().next().ok_or_else(unsupported)?;

    match (kind.as_str(), inner) {
        ("nullValue", _) => Ok(FieldValue::Null),
        ("booleanValue", Value::Bool(b)) => Ok(FieldValue::Bool(*b)),
        ("stringValue", Value::String(s)) => Ok(FieldValue::String(s.clone())),
        ("referenceValue", Value::String(s)) => Ok(FieldValue::String(s.clone())),
        ("integerValue", Value::String(s)) => s
            .parse()
            .map(FieldValue::Integer)
            .map_err(|_| unsupported()),
        ("integerValue", Value::Number(n)) => {
            n.as_i64().map(FieldValue::Integer).ok_or_else(unsupported)
        }
        ("timestampValue", Value::String(s)) => DateTime::parse_from_rfc3339(s)
            .map(|ts| FieldValue::Timestamp(ts.with_timezone(&Utc)))
            .map_err(|_| unsupported()),
        _ => Err(unsupported()),
    }
}
