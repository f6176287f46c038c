//! Environment-driven configuration for both pipelines.

use std::env;
use thiserror::Error;

const DEFAULT_COLLECTION_NAME: &str = "educational";
const DEFAULT_PDF_DIR: &str = "educational_content";
const DEFAULT_CHUNK_SIZE: usize = 1000;
const DEFAULT_SEARCH_LIMIT: usize = 3;
const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";
const DEFAULT_SUMMARY_TOPIC: &str = "pulmonary";
const DEFAULT_FUNCTIONS_REGION: &str = "us-central1";
const DEFAULT_FIRESTORE_URL: &str = "https://firestore.googleapis.com";
const DEFAULT_IDENTITY_URL: &str = "https://identitytoolkit.googleapis.com";
const DEFAULT_GEMINI_URL: &str = "https://generativelanguage.googleapis.com";

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required environment variable was not provided.
    #[error("Missing environment variable: {0}")]
    MissingVariable(String),
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

/// How the ingestion pipeline reacts when a single file fails to extract or upload.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum IngestFailurePolicy {
    /// Abort the whole run on the first failing file.
    #[default]
    Abort,
    /// Record the failure and continue with the next file.
    Skip,
}

impl std::str::FromStr for IngestFailurePolicy {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "abort" => Ok(Self::Abort),
            "skip" => Ok(Self::Skip),
            _ => Err(()),
        }
    }
}

/// Runtime configuration shared by the ingestion and query pipelines.
#[derive(Debug, Clone)]
pub struct Config {
    /// Firebase project that owns the Firestore database and the search extension.
    pub project_id: String,
    /// Collection holding chunk records.
    pub collection_name: String,
    /// Directory scanned for PDF files during ingestion.
    pub pdf_dir: String,
    /// Words per chunk.
    pub chunk_size: usize,
    /// Maximum number of identifiers requested from vector search.
    pub search_limit: usize,
    /// Generative model used for summaries.
    pub gemini_model: String,
    /// Subject word injected into the summary instruction.
    pub summary_topic: String,
    /// Behavior when one file fails during ingestion.
    pub failure_policy: IngestFailurePolicy,
    /// Web API key for the identity and search endpoints.
    pub firebase_api_key: Option<String>,
    /// API key for the generative-text endpoint.
    pub gemini_api_key: Option<String>,
    /// OAuth access token used for Firestore reads and writes when present.
    pub google_access_token: Option<String>,
    /// Callable URL of the vector-search extension.
    pub vector_search_url: String,
    /// Base URL of the Firestore REST API.
    pub firestore_url: String,
    /// Base URL of the identity toolkit API.
    pub identity_url: String,
    /// Base URL of the Gemini API.
    pub gemini_url: String,
}

/// Secrets the query pipeline needs before it may issue any request.
#[derive(Clone)]
pub struct QueryCredentials {
    /// Web API key for sign-in and search.
    pub firebase_api_key: String,
    /// Gemini API key for summarization.
    pub gemini_api_key: String,
}

impl std::fmt::Debug for QueryCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryCredentials")
            .field("firebase_api_key", &"<redacted>")
            .field("gemini_api_key", &"<redacted>")
            .finish()
    }
}

impl Config {
    /// Load configuration from environment variables, performing validation along the way.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    ///
    /// Blank values are treated as unset so that an empty line in `.env` does not shadow a
    /// default.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let source = Source(lookup);
        let project_id = source.required("FIREBASE_PROJECT_ID")?;
        let region = source.or_default("FUNCTIONS_REGION", DEFAULT_FUNCTIONS_REGION);
        let vector_search_url = source.optional("VECTOR_SEARCH_URL").unwrap_or_else(|| {
            format!(
                "https://{region}-{project_id}.cloudfunctions.net/ext-firestore-vector-search-queryCallable"
            )
        });

        Ok(Self {
            collection_name: source.or_default("COLLECTION_NAME", DEFAULT_COLLECTION_NAME),
            pdf_dir: source.or_default("PDF_DIR", DEFAULT_PDF_DIR),
            chunk_size: source.positive("CHUNK_SIZE", DEFAULT_CHUNK_SIZE)?,
            search_limit: source.positive("SEARCH_LIMIT", DEFAULT_SEARCH_LIMIT)?,
            gemini_model: source.or_default("GEMINI_MODEL", DEFAULT_GEMINI_MODEL),
            summary_topic: source.or_default("SUMMARY_TOPIC", DEFAULT_SUMMARY_TOPIC),
            failure_policy: source
                .optional("INGEST_FAILURE_POLICY")
                .map(|value| {
                    value
                        .parse()
                        .map_err(|()| ConfigError::InvalidValue("INGEST_FAILURE_POLICY".into()))
                })
                .transpose()?
                .unwrap_or_default(),
            firebase_api_key: source.optional("FIREBASE_WEB_API_KEY"),
            gemini_api_key: source.optional("STUDIO_GEMINI_KEY"),
            google_access_token: source.optional("GOOGLE_ACCESS_TOKEN"),
            vector_search_url,
            firestore_url: source.or_default("FIRESTORE_URL", DEFAULT_FIRESTORE_URL),
            identity_url: source.or_default("IDENTITY_URL", DEFAULT_IDENTITY_URL),
            gemini_url: source.or_default("GEMINI_URL", DEFAULT_GEMINI_URL),
            project_id,
        })
    }

    /// Return both query secrets, or the first one that is missing.
    pub fn query_credentials(&self) -> Result<QueryCredentials, ConfigError> {
        let firebase_api_key = self
            .firebase_api_key
            .clone()
            .ok_or_else(|| ConfigError::MissingVariable("FIREBASE_WEB_API_KEY".into()))?;
        let gemini_api_key = self
            .gemini_api_key
            .clone()
            .ok_or_else(|| ConfigError::MissingVariable("STUDIO_GEMINI_KEY".into()))?;
        Ok(QueryCredentials {
            firebase_api_key,
            gemini_api_key,
        })
    }
}

struct Source<F>(F);

impl<F> Source<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }

    fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.optional(key)
            .ok_or_else(|| ConfigError::MissingVariable(key.to_string()))
    }

    fn or_default(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }

    fn positive(&self, key: &str, default: usize) -> Result<usize, ConfigError> {
        match self.optional(key) {
            None => Ok(default),
            Some(value) => value
                .parse::<usize>()
                .ok()
                .filter(|parsed| *parsed > 0)
                .ok_or_else(|| ConfigError::InvalidValue(key.to_string())),
        }
    }
}

/// Read `.env` if present, then load the configuration from the process environment.
pub fn load() -> Result<Config, ConfigError> {
    dotenvy::dotenv().ok();
    Config::from_env()
}
