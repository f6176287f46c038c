//! Ingestion counters.

use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters describing one ingestion run.
#[derive(Default)]
pub struct IngestMetrics {
    documents_ingested: AtomicU64,
    chunks_written: AtomicU64,
    files_skipped: AtomicU64,
    files_failed: AtomicU64,
}

impl IngestMetrics {
    /// Create an empty metrics accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an ingested document and the number of chunks written for it.
    pub fn record_document(&self, chunk_count: u64) {
        self.documents_ingested.fetch_add(1, Ordering::Relaxed);
        self.chunks_written.fetch_add(chunk_count, Ordering::Relaxed);
    }

    /// Record a candidate file that could not be read.
    pub fn record_skipped(&self) {
        self.files_skipped.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a file whose extraction or upload failed.
    pub fn record_failed(&self) {
        self.files_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Add the counters of a finished run to these totals.
    pub fn merge(&self, run: MetricsSnapshot) {
        self.documents_ingested
            .fetch_add(run.documents_ingested, Ordering::Relaxed);
        self.chunks_written
            .fetch_add(run.chunks_written, Ordering::Relaxed);
        self.files_skipped.fetch_add(run.files_skipped, Ordering::Relaxed);
        self.files_failed.fetch_add(run.files_failed, Ordering::Relaxed);
    }

    /// Return a snapshot of the current counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            documents_ingested: self.documents_ingested.load(Ordering::Relaxed),
            chunks_written: self.chunks_written.load(Ordering::Relaxed),
            files_skipped: self.files_skipped.load(Ordering::Relaxed),
            files_failed: self.files_failed.load(Ordering::Relaxed),
        }
    }
}

/// Immutable view of ingestion counters used for reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Number of documents whose chunks were all written.
    pub documents_ingested: u64,
    /// Total chunk records written across all documents.
    pub chunks_written: u64,
    /// Candidate files skipped because they could not be read.
    pub files_skipped: u64,
    /// Files that failed extraction or upload.
    pub files_failed: u64,
}
