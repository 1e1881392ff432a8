//! Firestore client for reading the source curriculum documents.
//!
//! Talks to the Firestore REST API and decodes its typed value encoding
//! into plain JSON, so downstream code sees ordinary field mappings.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::google_auth::GoogleAuth;
use crate::store::{ApiError, DocumentSource, SourceDocument};

const FIRESTORE_SCOPE: &str = "https://www.googleapis.com/auth/datastore";
const PAGE_SIZE: &str = "300";

/// Firestore REST client for a single project's default database.
#[derive(Clone)]
pub struct FirestoreClient {
    client: Client,
    project_id: String,
    auth: GoogleAuth,
}

impl FirestoreClient {
    /// Create a client from `FIREBASE_PROJECT_ID` and the service account
    /// key named by `GOOGLE_SA_KEY_PATH`.
    pub fn from_env() -> Result<Self> {
        let project_id = std::env::var("FIREBASE_PROJECT_ID")
            .context("FIREBASE_PROJECT_ID environment variable not set")?;
        let auth = GoogleAuth::from_env(FIRESTORE_SCOPE)?;

        Ok(Self {
            client: Client::new(),
            project_id,
            auth,
        })
    }

    fn collection_url(&self, collection: &str) -> String {
        format!(
            "https://firestore.googleapis.com/v1/projects/{}/databases/(default)/documents/{}",
            self.project_id, collection
        )
    }
}

#[async_trait]
impl DocumentSource for FirestoreClient {
    async fn list_documents(&self, collection: &str) -> Result<Vec<SourceDocument>> {
        let token = self.auth.access_token(&self.client).await?;
        let url = self.collection_url(collection);

        let mut documents = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self
                .client
                .get(&url)
                .bearer_auth(&token)
                .query(&[("pageSize", PAGE_SIZE)]);
            if let Some(ref t) = page_token {
                request = request.query(&[("pageToken", t.as_str())]);
            }

            let resp = request
                .send()
                .await
                .with_context(|| format!("Firestore list for '{}' failed", collection))?;

            if !resp.status().is_success() {
                let status = resp.status();
                let body = resp.text().await.unwrap_or_default();
                return Err(ApiError {
                    context: format!("Firestore list for '{}' failed", collection),
                    status: status.as_u16(),
                    body,
                }
                .into());
            }

            let page: ListDocumentsResponse = resp
                .json()
                .await
                .context("Failed to parse Firestore list response")?;

            documents.extend(page.documents.into_iter().map(decode_document));

            match page.next_page_token {
                Some(t) => page_token = Some(t),
                None => break,
            }
        }

        debug!("Listed {} documents from '{}'", documents.len(), collection);
        Ok(documents)
    }

    async fn get_document(&self, collection: &str, id: &str) -> Result<Option<SourceDocument>> {
        let token = self.auth.access_token(&self.client).await?;
        let url = format!("{}/{}", self.collection_url(collection), id);

        let resp = self
            .client
            .get(&url)
            .bearer_auth(&token)
            .send()
            .await
            .with_context(|| format!("Firestore get for '{}/{}' failed", collection, id))?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(ApiError {
                context: format!("Firestore get for '{}/{}' failed", collection, id),
                status: status.as_u16(),
                body,
            }
            .into());
        }

        let doc: FirestoreDocument = resp
            .json()
            .await
            .context("Failed to parse Firestore document")?;

        Ok(Some(decode_document(doc)))
    }
}

// ============================================================================
// Wire types and value decoding
// ============================================================================

#[derive(Debug, Deserialize)]
struct ListDocumentsResponse {
    #[serde(default)]
    documents: Vec<FirestoreDocument>,
    #[serde(rename = "nextPageToken")]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FirestoreDocument {
    /// Full resource name; the document id is the last path segment.
    name: String,
    #[serde(default)]
    fields: serde_json::Map<String, Value>,
}

fn decode_document(doc: FirestoreDocument) -> SourceDocument {
    let id = doc
        .name
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .to_string();
    let fields = Value::Object(
        doc.fields
            .iter()
            .map(|(k, v)| (k.clone(), decode_value(v)))
            .collect(),
    );

    SourceDocument { id, fields }
}

/// Decode one Firestore typed value into plain JSON.
///
/// Firestore wraps every field in a `{"<type>Value": ...}` object and
/// serializes integers as strings; arrays and maps nest recursively.
fn decode_value(value: &Value) -> Value {
    let Some(obj) = value.as_object() else {
        return value.clone();
    };

    if let Some(s) = obj.get("stringValue") {
        return s.clone();
    }
    if let Some(n) = obj.get("integerValue") {
        if let Some(parsed) = n.as_str().and_then(|s| s.parse::<i64>().ok()) {
            return Value::from(parsed);
        }
        return n.clone();
    }
    if let Some(n) = obj.get("doubleValue") {
        return n.clone();
    }
    if let Some(b) = obj.get("booleanValue") {
        return b.clone();
    }
    if obj.contains_key("nullValue") {
        return Value::Null;
    }
    if let Some(ts) = obj.get("timestampValue") {
        return ts.clone();
    }
    if let Some(arr) = obj.get("arrayValue") {
        let values = arr
            .get("values")
            .and_then(Value::as_array)
            .map(|items| items.iter().map(decode_value).collect())
            .unwrap_or_default();
        return Value::Array(values);
    }
    if let Some(map) = obj.get("mapValue") {
        let fields = map
            .get("fields")
            .and_then(Value::as_object)
            .map(|f| f.iter().map(|(k, v)| (k.clone(), decode_value(v))).collect())
            .unwrap_or_default();
        return Value::Object(fields);
    }

    value.clone()
}
