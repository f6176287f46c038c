//! Core data types and error definitions for the ingestion and query pipelines.

use crate::{
    firestore::{ChunkMetadata, StoreError},
    identity::IdentityError,
    metrics::MetricsSnapshot,
    processing::extract::ExtractionError,
    search::VectorSearchError,
    summarization::SummarizationClientError,
};
use thiserror::Error;

/// Errors produced while turning raw text into chunks.
#[derive(Debug, Error)]
pub enum ChunkingError {
    /// Ingestion configured an impossible word budget.
    #[error("chunk size must be greater than zero")]
    InvalidChunkSize,
}

/// Errors emitted by the ingestion pipeline.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Input directory is missing or cannot be listed.
    #[error("cannot read input directory {path}: {source}")]
    Directory {
        /// Directory that failed to open.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// Chunking step failed to segment the document.
    #[error("Failed to chunk document: {0}")]
    Chunking(#[from] ChunkingError),
    /// Text extraction failed for a file.
    #[error("Failed to extract text: {0}")]
    Extraction(#[from] ExtractionError),
    /// Writing a chunk to the document store failed.
    #[error("Failed to upload chunk {id}: {source}")]
    Upload {
        /// Identifier of the chunk being written.
        id: String,
        /// Store error raised by the write.
        #[source]
        source: StoreError,
    },
}

/// Errors that terminate a query run.
#[derive(Debug, Error)]
pub enum QueryError {
    /// Anonymous sign-in failed.
    #[error("Authentication failed: {0}")]
    Authentication(#[from] IdentityError),
    /// Reading the operator's question failed.
    #[error("Failed to read question: {0}")]
    Input(#[from] std::io::Error),
    /// Vector search request failed.
    #[error("Vector search failed: {0}")]
    Search(#[from] VectorSearchError),
    /// Fetching a matched record failed.
    #[error("Failed to fetch chunk: {0}")]
    Fetch(#[from] StoreError),
    /// Generative endpoint failed.
    #[error("Summarization failed: {0}")]
    Summarization(#[from] SummarizationClientError),
}

/// Per-file result of a successful ingestion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReport {
    /// File name as stored in chunk metadata.
    pub filename: String,
    /// Identifiers written, in chunk order.
    pub chunk_ids: Vec<String>,
}

impl FileReport {
    /// Number of chunks written for the file.
    pub fn chunk_count(&self) -> usize {
        self.chunk_ids.len()
    }
}

/// File that failed while the run continued under the `skip` policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedFile {
    /// File name that failed.
    pub filename: String,
    /// Rendered error.
    pub reason: String,
}

/// Summary of an ingestion run produced by [`crate::processing::IngestService::ingest_directory`].
#[derive(Debug, Clone, Default)]
pub struct IngestReport {
    /// Files whose chunks were all written.
    pub files: Vec<FileReport>,
    /// Candidate files skipped because they could not be read.
    pub skipped: Vec<String>,
    /// Files that failed extraction or upload.
    pub failed: Vec<FailedFile>,
    /// Counters captured at the end of the run.
    pub metrics: MetricsSnapshot,
}

/// Retrieved record that contributed text to the summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedChunk {
    /// Record identifier as returned by vector search.
    pub id: String,
    /// Stored text.
    pub text: String,
    /// Stored provenance, when the record carried it.
    pub metadata: Option<ChunkMetadata>,
}

/// Terminal state of a query run that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryOutcome {
    /// Summary generated from the retrieved chunks.
    Answered {
        /// Generated summary text.
        summary: String,
        /// Every identifier returned by search, in search order.
        ids: Vec<String>,
        /// Chunks that fed the prompt, in search order.
        matches: Vec<MatchedChunk>,
    },
    /// Operator entered nothing.
    EmptyQuestion,
    /// Vector search returned no identifiers.
    NoMatches,
    /// None of the returned identifiers resolved to a record.
    NoText {
        /// Identifiers returned by search.
        ids: Vec<String>,
    },
    /// Generative endpoint returned no text.
    NoSummary {
        /// Every identifier returned by search.
        ids: Vec<String>,
        /// Chunks that fed the prompt.
        matches: Vec<MatchedChunk>,
    },
}
