//! Anonymous sign-in against the Firebase identity toolkit.
//!
//! The query pipeline needs a short-lived ID token before it may call the vector-search
//! extension. The token is obtained with the project's web API key and is never persisted.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

/// Errors raised while obtaining an ID token.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// Base URL failed to parse.
    #[error("Invalid identity URL: {0}")]
    InvalidUrl(String),
    /// HTTP layer failed before receiving a response.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// Identity endpoint responded with a non-success status.
    #[error("Sign-in failed ({status}): {body}")]
    UnexpectedStatus {
        /// HTTP status returned by the identity endpoint.
        status: StatusCode,
        /// Body payload associated with the failing response.
        body: String,
    },
    /// Response succeeded but carried no token.
    #[error("Sign-in response did not contain an ID token")]
    MissingToken,
}

/// Bearer token issued by anonymous sign-in.
#[derive(Clone, PartialEq, Eq)]
pub struct IdToken(String);

impl IdToken {
    /// Wrap a raw token string.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Borrow the raw token for an `Authorization` header.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for IdToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("IdToken(<redacted>)")
    }
}

/// Interface implemented by identity providers.
#[async_trait]
pub trait IdentityClient: Send + Sync {
    /// Create an anonymous account and return its ID token.
    async fn sign_in_anonymously(&self) -> Result<IdToken, IdentityError>;
}

/// Identity toolkit client using the `accounts:signUp` REST call.
pub struct FirebaseIdentityClient {
    http: Client,
    base_url: reqwest::Url,
    api_key: String,
}

impl FirebaseIdentityClient {
    /// Build a client for the given base URL and web API key.
    pub fn new(base_url: &str, api_key: impl Into<String>) -> Result<Self, IdentityError> {
        let http = Client::builder().user_agent("edurag/identity").build()?;
        let base_url = reqwest::Url::parse(base_url)
            .map_err(|err| IdentityError::InvalidUrl(format!("{base_url}: {err}")))?;
        tracing::debug!(url = %base_url, "Initialized identity client");
        Ok(Self {
            http,
            base_url,
            api_key: api_key.into(),
        })
    }

    fn endpoint(&self) -> Result<reqwest::Url, IdentityError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| IdentityError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(["v1", "accounts:signUp"]);
        Ok(url)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignUpResponse {
    #[serde(default)]
    id_token: Option<String>,
}

#[async_trait]
impl IdentityClient for FirebaseIdentityClient {
    async fn sign_in_anonymously(&self) -> Result<IdToken, IdentityError> {
        let response = self
            .http
            .post(self.endpoint()?)
            .query(&[("key", self.api_key.as_str())])
            .json(&json!({ "returnSecureToken": true }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let error = IdentityError::UnexpectedStatus { status, body };
            tracing::error!(error = %error, "Anonymous sign-in failed");
            return Err(error);
        }

        let body: SignUpResponse = response.json().await?;
        body.id_token
            .filter(|token| !token.trim().is_empty())
            .map(IdToken::new)
            .ok_or(IdentityError::MissingToken)
    }
}
