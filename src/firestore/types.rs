//! Shared types used by the Firestore client and helpers.

use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;

/// Errors returned while interacting with Firestore.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Base URL or document path failed to parse.
    #[error("Invalid Firestore URL: {0}")]
    InvalidUrl(String),
    /// HTTP layer failed before receiving a response.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// Firestore responded with an unexpected status code.
    #[error("Unexpected Firestore response ({status}): {body}")]
    UnexpectedStatus {
        /// HTTP status returned from Firestore.
        status: StatusCode,
        /// Body payload associated with the failing response.
        body: String,
    },
}

/// Provenance stored next to each chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkMetadata {
    /// File name the chunk was extracted from.
    pub source: String,
    /// Zero-based position of the chunk within its file.
    pub chunk: usize,
}

/// Chunk record written during ingestion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkRecord {
    /// Document identifier, `{filename}_chunk{index}`.
    pub id: String,
    /// Whitespace-joined chunk text.
    pub text: String,
    /// Source file and chunk index.
    pub metadata: ChunkMetadata,
}

impl ChunkRecord {
    /// Build the record for chunk `index` of `filename`.
    pub fn new(filename: &str, index: usize, text: String) -> Self {
        Self {
            id: crate::processing::chunking::chunk_identifier(filename, index),
            text,
            metadata: ChunkMetadata {
                source: filename.to_string(),
                chunk: index,
            },
        }
    }
}

/// Record read back by identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredChunk {
    /// Document identifier.
    pub id: String,
    /// Stored text; empty when the document has no `input` field.
    pub text: String,
    /// Stored metadata, when present and well formed.
    pub metadata: Option<ChunkMetadata>,
}

#[derive(Deserialize)]
pub(crate) struct DocumentResponse {
    #[serde(default)]
    pub(crate) fields: Map<String, Value>,
}
