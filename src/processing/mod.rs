//! Ingestion and query pipelines: extraction, chunking, retrieval, and summarization.

pub mod chunking;
pub mod extract;
pub mod format;
mod ingest;
pub mod prompt;
mod query;
pub mod types;

pub use ingest::{IngestService, IngestSettings};
pub use query::{FixedQuestion, QueryService, QuerySettings, QuestionSource, StdinQuestion};
pub use types::{
    ChunkingError, FailedFile, FileReport, IngestError, IngestReport, MatchedChunk, QueryError,
    QueryOutcome,
};
