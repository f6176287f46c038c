//! Firestore document store integration.

use crate::identity::IdToken;
use async_trait::async_trait;

pub mod client;
pub(crate) mod payload;
pub mod types;

pub use client::FirestoreService;
pub use types::{ChunkMetadata, ChunkRecord, StoreError, StoredChunk};

/// Keyed record store holding chunk documents.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Create or overwrite the document `record.id` in `collection`.
    async fn upsert_chunk(&self, collection: &str, record: &ChunkRecord) -> Result<(), StoreError>;

    /// Look up a document by identifier; `Ok(None)` when it does not exist.
    ///
    /// `session` is the caller's ID token, used when the store has no credentials of its own.
    async fn fetch_chunk(
        &self,
        collection: &str,
        id: &str,
        session: Option<&IdToken>,
    ) -> Result<Option<StoredChunk>, StoreError>;
}
