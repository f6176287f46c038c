//! Fixed-size word chunking.
//!
//! Text is split on any Unicode whitespace and regrouped into runs of exactly `chunk_size`
//! words; only the final run may be shorter. Boundaries ignore sentence and paragraph
//! structure, and every run is re-joined with single spaces, so concatenating the chunks
//! with spaces reproduces the whitespace-normalized input.

use super::types::ChunkingError;

/// Words per chunk when nothing else is configured.
pub const DEFAULT_CHUNK_SIZE: usize = 1000;

/// Split `text` into chunks of `chunk_size` words.
///
/// Returns an empty vector when the text holds no words.
pub fn chunk_words(text: &str, chunk_size: usize) -> Result<Vec<String>, ChunkingError> {
    if chunk_size == 0 {
        return Err(ChunkingError::InvalidChunkSize);
    }

    let words: Vec<&str> = text.split_whitespace().collect();
    Ok(words.chunks(chunk_size).map(|run| run.join(" ")).collect())
}

/// Document identifier for chunk `index` of `filename`.
pub fn chunk_identifier(filename: &str, index: usize) -> String {
    format!("{filename}_chunk{index}")
}
