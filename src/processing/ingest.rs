//! Ingestion pipeline: directory scan, extraction, chunking, and keyed uploads.

use crate::{
    config::{Config, IngestFailurePolicy},
    firestore::{ChunkRecord, DocumentStore, FirestoreService, StoreError},
    metrics::{IngestMetrics, MetricsSnapshot},
    processing::{
        chunking::chunk_words,
        extract::{ExtractionError, PdfTextExtractor, TextExtractor, is_pdf_candidate},
        types::{FailedFile, FileReport, IngestError, IngestReport},
    },
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;

/// Settings that shape one ingestion run.
#[derive(Debug, Clone)]
pub struct IngestSettings {
    /// Collection receiving chunk records.
    pub collection: String,
    /// Words per chunk.
    pub chunk_size: usize,
    /// Reaction to a failing file.
    pub failure_policy: IngestFailurePolicy,
}

impl IngestSettings {
    /// Derive settings from the loaded configuration.
    pub fn from_config(config: &Config) -> Self {
        Self {
            collection: config.collection_name.clone(),
            chunk_size: config.chunk_size,
            failure_policy: config.failure_policy,
        }
    }
}

/// Uploads the chunks of every PDF in a directory to the document store.
///
/// Files are handled one at a time in file-name order and each chunk is written with its own
/// request. Identifiers are derived from the file name, so re-running over the same directory
/// overwrites the same records instead of adding new ones.
pub struct IngestService {
    store: Arc<dyn DocumentStore>,
    extractor: Box<dyn TextExtractor>,
    settings: IngestSettings,
    totals: IngestMetrics,
}

impl IngestService {
    /// Build a service from explicit collaborators.
    pub fn new(
        store: Arc<dyn DocumentStore>,
        extractor: Box<dyn TextExtractor>,
        settings: IngestSettings,
    ) -> Self {
        Self {
            store,
            extractor,
            settings,
            totals: IngestMetrics::new(),
        }
    }

    /// Build a service backed by Firestore and the PDF extractor.
    pub fn from_config(config: &Config) -> Result<Self, StoreError> {
        let store = FirestoreService::new(config)?;
        Ok(Self::new(
            Arc::new(store),
            Box::new(PdfTextExtractor::new()),
            IngestSettings::from_config(config),
        ))
    }

    /// Ingest every PDF directly inside `dir`.
    pub async fn ingest_directory(&self, dir: &Path) -> Result<IngestReport, IngestError> {
        let candidates = list_candidates(dir)?;
        tracing::info!(
            dir = %dir.display(),
            files = candidates.len(),
            collection = %self.settings.collection,
            chunk_size = self.settings.chunk_size,
            "Starting ingestion"
        );

        let run = IngestMetrics::new();
        let mut report = IngestReport::default();
        for (path, filename) in candidates {
            match self.ingest_file(&path, &filename).await {
                Ok(file) => {
                    run.record_document(file.chunk_count() as u64);
                    report.files.push(file);
                }
                Err(IngestError::Extraction(error @ ExtractionError::Io { .. })) => {
                    tracing::warn!(file = %filename, error = %error, "Skipping unreadable file");
                    run.record_skipped();
                    report.skipped.push(filename);
                }
                Err(error) => {
                    run.record_failed();
                    match self.settings.failure_policy {
                        IngestFailurePolicy::Abort => {
                            self.totals.merge(run.snapshot());
                            tracing::error!(file = %filename, error = %error, "Aborting ingestion");
                            return Err(error);
                        }
                        IngestFailurePolicy::Skip => {
                            tracing::warn!(file = %filename, error = %error, "File failed; continuing");
                            report.failed.push(FailedFile {
                                filename,
                                reason: error.to_string(),
                            });
                        }
                    }
                }
            }
        }

        report.metrics = run.snapshot();
        self.totals.merge(report.metrics);
        tracing::info!(
            documents = report.metrics.documents_ingested,
            chunks = report.metrics.chunks_written,
            skipped = report.metrics.files_skipped,
            failed = report.metrics.files_failed,
            "Ingestion finished"
        );
        Ok(report)
    }

    /// Extract, chunk, and upload a single file stored under `filename`.
    pub async fn ingest_file(&self, path: &Path, filename: &str) -> Result<FileReport, IngestError> {
        let text = self.extractor.extract(path)?;
        let chunks = chunk_words(&text, self.settings.chunk_size)?;
        tracing::info!(file = %filename, chunks = chunks.len(), "Uploading chunks");

        let mut chunk_ids = Vec::with_capacity(chunks.len());
        for (index, chunk) in chunks.into_iter().enumerate() {
            let record = ChunkRecord::new(filename, index, chunk);
            self.store
                .upsert_chunk(&self.settings.collection, &record)
                .await
                .map_err(|source| IngestError::Upload {
                    id: record.id.clone(),
                    source,
                })?;
            chunk_ids.push(record.id);
        }

        tracing::info!(file = %filename, chunks = chunk_ids.len(), "Uploaded all chunks");
        Ok(FileReport {
            filename: filename.to_string(),
            chunk_ids,
        })
    }

    /// Counters summed over every directory run of this service.
    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.totals.snapshot()
    }
}

/// List `.pdf` files directly inside `dir`, sorted by name.
fn list_candidates(dir: &Path) -> Result<Vec<(PathBuf, String)>, IngestError> {
    let directory_error = |source: std::io::Error| IngestError::Directory {
        path: dir.display().to_string(),
        source,
    };

    let mut candidates = Vec::new();
    for entry in WalkDir::new(dir)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
    {
        match entry {
            Ok(entry) if entry.depth() == 0 => {
                if !entry.file_type().is_dir() {
                    return Err(directory_error(std::io::Error::other("not a directory")));
                }
            }
            Ok(entry) => {
                let filename = entry.file_name().to_string_lossy().into_owned();
                if entry.file_type().is_file() && is_pdf_candidate(&filename) {
                    candidates.push((entry.into_path(), filename));
                }
            }
            Err(error) if error.depth() == 0 => return Err(directory_error(error.into())),
            Err(error) => {
                tracing::warn!(error = %error, "Skipping unreadable directory entry");
            }
        }
    }
    Ok(candidates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::firestore::StoredChunk;
    use crate::identity::IdToken;
    use async_trait::async_trait;
    use std::collections::BTreeMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct MemoryStore {
        records: Mutex<BTreeMap<String, ChunkRecord>>,
        writes: AtomicUsize,
    }

    impl MemoryStore {
        fn ids(&self) -> Vec<String> {
            self.records.lock().unwrap().keys().cloned().collect()
        }

        fn get(&self, id: &str) -> Option<ChunkRecord> {
            self.records.lock().unwrap().get(id).cloned()
        }
    }

    #[async_trait]
    impl DocumentStore for MemoryStore {
        async fn upsert_chunk(
            &self,
            _collection: &str,
            record: &ChunkRecord,
        ) -> Result<(), StoreError> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            self.records
                .lock()
                .unwrap()
                .insert(record.id.clone(), record.clone());
            Ok(())
        }

        async fn fetch_chunk(
            &self,
            _collection: &str,
            id: &str,
            _session: Option<&IdToken>,
        ) -> Result<Option<StoredChunk>, StoreError> {
            Ok(self.get(id).map(|record| StoredChunk {
                id: record.id,
                text: record.text,
                metadata: Some(record.metadata),
            }))
        }
    }

    /// Reads files as plain text; a file containing `FAIL` is reported as unparsable.
    struct PlainTextExtractor;

    impl TextExtractor for PlainTextExtractor {
        fn extract(&self, path: &Path) -> Result<String, ExtractionError> {
            let text = std::fs::read_to_string(path).map_err(|source| ExtractionError::Io {
                path: path.display().to_string(),
                source,
            })?;
            if text.trim() == "FAIL" {
                return Err(ExtractionError::Parse {
                    path: path.display().to_string(),
                    message: "corrupt".into(),
                });
            }
            Ok(text)
        }
    }

    fn words(count: usize) -> String {
        (0..count)
            .map(|i| format!("w{i}"))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn service(store: Arc<MemoryStore>, policy: IngestFailurePolicy) -> IngestService {
        IngestService::new(
            store,
            Box::new(PlainTextExtractor),
            IngestSettings {
                collection: "educational".into(),
                chunk_size: 1000,
                failure_policy: policy,
            },
        )
    }

    #[tokio::test]
    async fn splits_2500_words_into_three_records() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("lungs.pdf"), words(2500)).unwrap();
        let store = Arc::new(MemoryStore::default());

        let report = service(store.clone(), IngestFailurePolicy::Abort)
            .ingest_directory(dir.path())
            .await
            .expect("ingest");

        assert_eq!(
            store.ids(),
            vec!["lungs.pdf_chunk0", "lungs.pdf_chunk1", "lungs.pdf_chunk2"]
        );
        let last = store.get("lungs.pdf_chunk2").expect("last chunk");
        assert_eq!(last.text.split_whitespace().count(), 500);
        assert_eq!(last.metadata.source, "lungs.pdf");
        assert_eq!(last.metadata.chunk, 2);
        assert_eq!(report.files.len(), 1);
        assert_eq!(report.files[0].chunk_count(), 3);
        assert_eq!(report.metrics.chunks_written, 3);
    }

    #[tokio::test]
    async fn reingesting_upserts_the_same_identifiers() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.pdf"), words(1500)).unwrap();
        let store = Arc::new(MemoryStore::default());
        let ingest = service(store.clone(), IngestFailurePolicy::Abort);

        let first = ingest.ingest_directory(dir.path()).await.expect("first");
        let ids_after_first = store.ids();
        let second = ingest.ingest_directory(dir.path()).await.expect("second");

        assert_eq!(store.ids(), ids_after_first);
        assert_eq!(store.ids().len(), 2);
        assert_eq!(store.writes.load(Ordering::SeqCst), 4);
        assert_eq!(first.files[0].chunk_ids, second.files[0].chunk_ids);
        assert_eq!(second.metrics.documents_ingested, 1);
        assert_eq!(second.metrics.chunks_written, 2);
        assert_eq!(ingest.metrics_snapshot().chunks_written, 4);
    }

    #[tokio::test]
    async fn only_pdf_files_in_the_top_level_are_candidates() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("upper.PDF"), "one two").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored words").unwrap();
        std::fs::create_dir(dir.path().join("nested.pdf")).unwrap();
        std::fs::write(dir.path().join("nested.pdf").join("inner.pdf"), "deep").unwrap();
        let store = Arc::new(MemoryStore::default());

        let report = service(store.clone(), IngestFailurePolicy::Abort)
            .ingest_directory(dir.path())
            .await
            .expect("ingest");

        assert_eq!(store.ids(), vec!["upper.PDF_chunk0"]);
        assert_eq!(report.files.len(), 1);
    }

    #[tokio::test]
    async fn empty_text_writes_no_records() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("blank.pdf"), "  \n ").unwrap();
        let store = Arc::new(MemoryStore::default());

        let report = service(store.clone(), IngestFailurePolicy::Abort)
            .ingest_directory(dir.path())
            .await
            .expect("ingest");

        assert!(store.ids().is_empty());
        assert_eq!(report.files[0].chunk_count(), 0);
        assert_eq!(report.metrics.documents_ingested, 1);
    }

    #[tokio::test]
    async fn abort_policy_stops_at_first_failing_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.pdf"), "alpha").unwrap();
        std::fs::write(dir.path().join("b.pdf"), "FAIL").unwrap();
        std::fs::write(dir.path().join("c.pdf"), "gamma").unwrap();
        let store = Arc::new(MemoryStore::default());

        let error = service(store.clone(), IngestFailurePolicy::Abort)
            .ingest_directory(dir.path())
            .await
            .expect_err("abort");

        assert!(matches!(
            error,
            IngestError::Extraction(ExtractionError::Parse { .. })
        ));
        assert_eq!(store.ids(), vec!["a.pdf_chunk0"]);
    }

    #[tokio::test]
    async fn skip_policy_isolates_failing_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.pdf"), "alpha").unwrap();
        std::fs::write(dir.path().join("b.pdf"), "FAIL").unwrap();
        std::fs::write(dir.path().join("c.pdf"), "gamma").unwrap();
        let store = Arc::new(MemoryStore::default());

        let report = service(store.clone(), IngestFailurePolicy::Skip)
            .ingest_directory(dir.path())
            .await
            .expect("skip");

        assert_eq!(store.ids(), vec!["a.pdf_chunk0", "c.pdf_chunk0"]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].filename, "b.pdf");
        assert_eq!(report.metrics.files_failed, 1);
    }

    #[tokio::test]
    async fn skip_policy_survives_a_pdf_the_parser_cannot_handle() {
        use crate::processing::extract::{HELLO_CONTENT, HELVETICA_RESOURCES, single_page_pdf};

        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("a.pdf"),
            single_page_pdf(HELVETICA_RESOURCES, HELLO_CONTENT),
        )
        .unwrap();
        std::fs::write(dir.path().join("b.pdf"), single_page_pdf("<< >>", HELLO_CONTENT)).unwrap();
        let store = Arc::new(MemoryStore::default());
        let ingest = IngestService::new(
            store.clone(),
            Box::new(PdfTextExtractor::new()),
            IngestSettings {
                collection: "educational".into(),
                chunk_size: 1000,
                failure_policy: IngestFailurePolicy::Skip,
            },
        );

        let report = ingest.ingest_directory(dir.path()).await.expect("skip");

        assert_eq!(store.ids(), vec!["a.pdf_chunk0"]);
        assert_eq!(store.get("a.pdf_chunk0").expect("record").text, "Hello world");
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].filename, "b.pdf");
        assert_eq!(report.metrics.files_failed, 1);
    }

    #[tokio::test]
    async fn missing_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(MemoryStore::default());

        let error = service(store, IngestFailurePolicy::Abort)
            .ingest_directory(&dir.path().join("absent"))
            .await
            .expect_err("missing dir");
        assert!(matches!(error, IngestError::Directory { .. }));
    }

    struct RejectingStore;

    #[async_trait]
    impl DocumentStore for RejectingStore {
        async fn upsert_chunk(
            &self,
            _collection: &str,
            _record: &ChunkRecord,
        ) -> Result<(), StoreError> {
            Err(StoreError::InvalidUrl("rejected".into()))
        }

        async fn fetch_chunk(
            &self,
            _collection: &str,
            _id: &str,
            _session: Option<&IdToken>,
        ) -> Result<Option<StoredChunk>, StoreError> {
            Ok(None)
        }
    }

    #[tokio::test]
    async fn upload_failure_names_the_chunk() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.pdf"), "alpha beta").unwrap();
        let ingest = IngestService::new(
            Arc::new(RejectingStore),
            Box::new(PlainTextExtractor),
            IngestSettings {
                collection: "educational".into(),
                chunk_size: 1,
                failure_policy: IngestFailurePolicy::Abort,
            },
        );

        let error = ingest
            .ingest_directory(dir.path())
            .await
            .expect_err("upload failure");
        assert!(matches!(error, IngestError::Upload { ref id, .. } if id == "a.pdf_chunk0"));
    }
}
