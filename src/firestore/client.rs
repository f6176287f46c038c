//! HTTP client wrapper for the Firestore REST API.

use crate::config::Config;
use crate::firestore::{
    DocumentStore,
    payload::{build_fields, parse_stored_chunk},
    types::{ChunkRecord, DocumentResponse, StoreError, StoredChunk},
};
use crate::identity::IdToken;
use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode, Url};
use serde_json::json;

const DATABASE: &str = "(default)";

/// Lightweight HTTP client for Firestore document reads and writes.
pub struct FirestoreService {
    pub(crate) client: Client,
    pub(crate) base_url: Url,
    pub(crate) project_id: String,
    pub(crate) access_token: Option<String>,
}

impl FirestoreService {
    /// Construct a new client from the loaded configuration.
    pub fn new(config: &Config) -> Result<Self, StoreError> {
        let client = Client::builder().user_agent("edurag/0.1").build()?;
        let base_url = Url::parse(&config.firestore_url)
            .map_err(|err| StoreError::InvalidUrl(format!("{}: {err}", config.firestore_url)))?;
        tracing::debug!(
            url = %base_url,
            project = %config.project_id,
            has_access_token = config.google_access_token.is_some(),
            "Initialized Firestore HTTP client"
        );

        Ok(Self {
            client,
            base_url,
            project_id: config.project_id.clone(),
            access_token: config.google_access_token.clone(),
        })
    }

    fn document_url(&self, collection: &str, id: &str) -> Result<Url, StoreError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| StoreError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend([
                "v1",
                "projects",
                self.project_id.as_str(),
                "databases",
                DATABASE,
                "documents",
                collection,
                id,
            ]);
        Ok(url)
    }

    /// The configured access token wins over a session token.
    fn request(&self, method: Method, url: Url, session: Option<&IdToken>) -> reqwest::RequestBuilder {
        let req = self.client.request(method, url);
        match (self.access_token.as_deref(), session) {
            (Some(token), _) => req.bearer_auth(token),
            (None, Some(token)) => req.bearer_auth(token.as_str()),
            (None, None) => req,
        }
    }

    async fn ensure_success<F>(
        &self,
        response: reqwest::Response,
        on_success: F,
    ) -> Result<(), StoreError>
    where
        F: FnOnce(),
    {
        if response.status().is_success() {
            on_success();
            Ok(())
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let error = StoreError::UnexpectedStatus { status, body };
            tracing::error!(error = %error, "Firestore request failed");
            Err(error)
        }
    }
}

#[async_trait]
impl DocumentStore for FirestoreService {
    async fn upsert_chunk(&self, collection: &str, record: &ChunkRecord) -> Result<(), StoreError> {
        let url = self.document_url(collection, &record.id)?;
        let response = self
            .request(Method::PATCH, url, None)
            .json(&json!({ "fields": build_fields(record) }))
            .send()
            .await?;

        self.ensure_success(response, || {
            tracing::debug!(collection, id = %record.id, "Chunk written");
        })
        .await
    }

    async fn fetch_chunk(
        &self,
        collection: &str,
        id: &str,
        session: Option<&IdToken>,
    ) -> Result<Option<StoredChunk>, StoreError> {
        let url = self.document_url(collection, id)?;
        let response = self.request(Method::GET, url, session).send().await?;

        match response.status() {
            StatusCode::NOT_FOUND => {
                tracing::debug!(collection, id, "Chunk not found");
                Ok(None)
            }
            status if status.is_success() => {
                let document: DocumentResponse = response.json().await?;
                Ok(Some(parse_stored_chunk(id, &document.fields)))
            }
            status => {
                let body = response.text().await.unwrap_or_default();
                let error = StoreError::UnexpectedStatus { status, body };
                tracing::error!(collection, id, error = %error, "Chunk lookup failed");
                Err(error)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::{
        Method::{GET, PATCH},
        MockServer,
    };

    fn service(server: &MockServer, access_token: Option<&str>) -> FirestoreService {
        FirestoreService {
            client: Client::builder()
                .user_agent("edurag-test")
                .build()
                .expect("client"),
            base_url: Url::parse(&server.base_url()).expect("url"),
            project_id: "demo".into(),
            access_token: access_token.map(str::to_string),
        }
    }

    const DOC_PATH: &str = "/v1/projects/demo/databases/(default)/documents/educational/lungs.pdf_chunk0";

    #[tokio::test]
    async fn upsert_chunk_patches_typed_document() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(PATCH)
                    .path(DOC_PATH)
                    .header("authorization", "Bearer service-token")
                    .json_body(json!({
                        "fields": {
                            "input": { "stringValue": "first chunk" },
                            "metadata": { "mapValue": { "fields": {
                                "source": { "stringValue": "lungs.pdf" },
                                "chunk": { "integerValue": "0" }
                            } } }
                        }
                    }));
                then.status(200).json_body(json!({ "name": "projects/demo/databases/(default)/documents/educational/lungs.pdf_chunk0" }));
            })
            .await;

        let store = service(&server, Some("service-token"));
        let record = ChunkRecord::new("lungs.pdf", 0, "first chunk".into());
        store
            .upsert_chunk("educational", &record)
            .await
            .expect("upsert");

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn fetch_chunk_returns_none_for_missing_document() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path(DOC_PATH);
                then.status(404).json_body(json!({
                    "error": { "code": 404, "status": "NOT_FOUND" }
                }));
            })
            .await;

        let store = service(&server, None);
        let found = store
            .fetch_chunk("educational", "lungs.pdf_chunk0", None)
            .await
            .expect("lookup");
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn fetch_chunk_uses_session_token_without_access_token() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path(DOC_PATH)
                    .header("authorization", "Bearer id-token");
                then.status(200).json_body(json!({
                    "name": "projects/demo/databases/(default)/documents/educational/lungs.pdf_chunk0",
                    "fields": {
                        "input": { "stringValue": "stored text" },
                        "metadata": { "mapValue": { "fields": {
                            "source": { "stringValue": "lungs.pdf" },
                            "chunk": { "integerValue": "0" }
                        } } }
                    }
                }));
            })
            .await;

        let store = service(&server, None);
        let session = IdToken::new("id-token");
        let found = store
            .fetch_chunk("educational", "lungs.pdf_chunk0", Some(&session))
            .await
            .expect("lookup")
            .expect("document");

        mock.assert_async().await;
        assert_eq!(found.text, "stored text");
        assert_eq!(found.metadata.map(|meta| meta.chunk), Some(0));
    }

    #[tokio::test]
    async fn fetch_chunk_surfaces_permission_errors() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path(DOC_PATH);
                then.status(403).body("PERMISSION_DENIED");
            })
            .await;

        let store = service(&server, None);
        let error = store
            .fetch_chunk("educational", "lungs.pdf_chunk0", None)
            .await
            .expect_err("forbidden");
        assert!(matches!(
            error,
            StoreError::UnexpectedStatus { status, .. } if status == StatusCode::FORBIDDEN
        ));
    }
}
