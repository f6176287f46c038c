//! Console rendering for pipeline results.

use std::fmt::Write as _;

use crate::processing::types::{IngestReport, MatchedChunk, QueryOutcome};

/// Render a query outcome as the text shown to the operator.
pub fn render_outcome(outcome: &QueryOutcome) -> String {
    match outcome {
        QueryOutcome::EmptyQuestion => "No question entered. Exiting.".to_string(),
        QueryOutcome::NoMatches => "No matching documents found.".to_string(),
        QueryOutcome::NoText { ids } => {
            let mut text = String::from("No text found for retrieved document IDs:\n");
            for id in ids {
                let _ = writeln!(text, "- {id}");
            }
            text.trim_end().to_string()
        }
        QueryOutcome::NoSummary { ids, matches } => {
            format!("{}\n\nNo summary generated.", render_matches(ids, matches))
        }
        QueryOutcome::Answered {
            summary,
            ids,
            matches,
        } => {
            format!("{}\n\nSummary:\n\n{summary}", render_matches(ids, matches))
        }
    }
}

/// List every searched identifier; resolved ones carry their provenance.
fn render_matches(ids: &[String], matches: &[MatchedChunk]) -> String {
    let mut text = String::from("Top relevant chunks found:");
    for id in ids {
        let metadata = matches
            .iter()
            .find(|matched| &matched.id == id)
            .and_then(|matched| matched.metadata.as_ref());
        match metadata {
            Some(metadata) => {
                let _ = write!(text, "\n- {id} ({}, chunk {})", metadata.source, metadata.chunk);
            }
            None => {
                let _ = write!(text, "\n- {id}");
            }
        }
    }
    text
}

/// Render the end-of-run ingestion summary.
pub fn render_ingest_report(report: &IngestReport) -> String {
    let mut text = String::new();
    for file in &report.files {
        let _ = writeln!(text, "{}: {} chunks", file.filename, file.chunk_count());
    }
    for filename in &report.skipped {
        let _ = writeln!(text, "{filename}: skipped (unreadable)");
    }
    for failed in &report.failed {
        let _ = writeln!(text, "{}: failed ({})", failed.filename, failed.reason);
    }
    let metrics = report.metrics;
    let _ = write!(
        text,
        "Done. {} documents, {} chunks written, {} skipped, {} failed.",
        metrics.documents_ingested, metrics.chunks_written, metrics.files_skipped, metrics.files_failed
    );
    text
}
