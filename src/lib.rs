#![deny(missing_docs)]

//! Core library for edurag: PDF chunk ingestion into Firestore and retrieval-backed summaries.

/// Environment-driven configuration management.
pub mod config;
/// Firestore document store integration.
pub mod firestore;
/// Anonymous sign-in for the query pipeline.
pub mod identity;
/// Structured logging and tracing setup.
pub mod logging;
/// Ingestion counters.
pub mod metrics;
/// Ingestion and query pipelines.
pub mod processing;
/// Vector-search extension client.
pub mod search;
/// Generative summarization clients.
pub mod summarization;
