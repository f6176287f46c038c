//! Client for the Firestore vector-search extension's callable endpoint.
//!
//! The extension embeds the query and ranks the collection server-side; this client only sends
//! the callable envelope and reads back the ordered record identifiers.

use crate::identity::IdToken;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors returned by the vector-search endpoint.
#[derive(Debug, Error)]
pub enum VectorSearchError {
    /// Callable URL failed to parse.
    #[error("Invalid vector search URL: {0}")]
    InvalidUrl(String),
    /// HTTP layer failed before receiving a response.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// Endpoint responded with a non-success status.
    #[error("Unexpected vector search response ({status}): {body}")]
    UnexpectedStatus {
        /// HTTP status returned by the callable function.
        status: StatusCode,
        /// Body payload associated with the failing response.
        body: String,
    },
}

/// Query forwarded to the extension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VectorSearchRequest {
    /// Free-text question.
    pub query: String,
    /// Collection the extension searches.
    pub collection_name: String,
    /// Maximum number of identifiers to return.
    pub limit: usize,
}

/// Interface implemented by vector-search backends.
#[async_trait]
pub trait VectorSearchClient: Send + Sync {
    /// Return record identifiers ranked by the backend, at most `request.limit` of them.
    async fn search(
        &self,
        token: &IdToken,
        request: &VectorSearchRequest,
    ) -> Result<Vec<String>, VectorSearchError>;
}

/// HTTP client for the `ext-firestore-vector-search-queryCallable` function.
pub struct CallableSearchClient {
    http: Client,
    url: reqwest::Url,
}

impl CallableSearchClient {
    /// Build a client targeting the given callable URL.
    pub fn new(url: &str) -> Result<Self, VectorSearchError> {
        let http = Client::builder().user_agent("edurag/search").build()?;
        let url = reqwest::Url::parse(url)
            .map_err(|err| VectorSearchError::InvalidUrl(format!("{url}: {err}")))?;
        tracing::debug!(url = %url, "Initialized vector search client");
        Ok(Self { http, url })
    }
}

#[derive(Serialize)]
struct CallableRequest<'a> {
    data: &'a VectorSearchRequest,
}

#[derive(Deserialize)]
struct CallableResponse {
    #[serde(default)]
    result: Option<CallableResult>,
}

#[derive(Deserialize)]
struct CallableResult {
    #[serde(default)]
    ids: Vec<String>,
}

#[async_trait]
impl VectorSearchClient for CallableSearchClient {
    async fn search(
        &self,
        token: &IdToken,
        request: &VectorSearchRequest,
    ) -> Result<Vec<String>, VectorSearchError> {
        let response = self
            .http
            .post(self.url.clone())
            .bearer_auth(token.as_str())
            .json(&CallableRequest { data: request })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let error = VectorSearchError::UnexpectedStatus { status, body };
            tracing::error!(collection = %request.collection_name, error = %error, "Vector search failed");
            return Err(error);
        }

        let payload: CallableResponse = response.json().await?;
        let ids = payload.result.map(|result| result.ids).unwrap_or_default();
        tracing::debug!(
            collection = %request.collection_name,
            limit = request.limit,
            hits = ids.len(),
            "Vector search returned"
        );
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::{Method::POST, MockServer};
    use serde_json::json;

    fn request() -> VectorSearchRequest {
        VectorSearchRequest {
            query: "What is surfactant?".into(),
            collection_name: "educational".into(),
            limit: 3,
        }
    }

    #[tokio::test]
    async fn search_sends_callable_envelope_with_bearer() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/ext-firestore-vector-search-queryCallable")
                    .header("authorization", "Bearer token-1")
                    .json_body(json!({
                        "data": {
                            "query": "What is surfactant?",
                            "collectionName": "educational",
                            "limit": 3
                        }
                    }));
                then.status(200).json_body(json!({
                    "result": { "ids": ["a.pdf_chunk1", "b.pdf_chunk0"] }
                }));
            })
            .await;

        let client = CallableSearchClient::new(&server.url("/ext-firestore-vector-search-queryCallable"))
            .expect("client");
        let ids = client
            .search(&IdToken::new("token-1"), &request())
            .await
            .expect("search");

        mock.assert_async().await;
        assert_eq!(ids, vec!["a.pdf_chunk1", "b.pdf_chunk0"]);
    }

    #[tokio::test]
    async fn missing_result_path_yields_no_ids() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/search");
                then.status(200).json_body(json!({ "result": {} }));
            })
            .await;

        let client = CallableSearchClient::new(&server.url("/search")).expect("client");
        let ids = client
            .search(&IdToken::new("token-1"), &request())
            .await
            .expect("search");
        assert!(ids.is_empty());
    }

    #[tokio::test]
    async fn error_status_is_fatal() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/search");
                then.status(401).json_body(json!({
                    "error": { "message": "Unauthenticated", "status": "UNAUTHENTICATED" }
                }));
            })
            .await;

        let client = CallableSearchClient::new(&server.url("/search")).expect("client");
        let error = client
            .search(&IdToken::new("token-1"), &request())
            .await
            .expect_err("unauthorized");
        assert!(matches!(
            error,
            VectorSearchError::UnexpectedStatus { status, .. } if status == StatusCode::UNAUTHORIZED
        ));
    }
}
