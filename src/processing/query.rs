//! Query pipeline: sign-in, vector search, record fetch, and summarization.
//!
//! Every stage gates the next one. A failure ends the run with a [`QueryError`]; an empty
//! result ends it with the matching [`QueryOutcome`] variant and no further calls.

use crate::{
    config::{Config, QueryCredentials},
    firestore::{DocumentStore, FirestoreService},
    identity::{FirebaseIdentityClient, IdToken, IdentityClient},
    processing::{
        prompt::build_summary_prompt,
        types::{MatchedChunk, QueryError, QueryOutcome},
    },
    search::{CallableSearchClient, VectorSearchClient, VectorSearchRequest},
    summarization::{GeminiSummarizationClient, SummarizationClient, SummarizationRequest},
};
use std::io::{BufRead, Write};
use std::sync::Arc;

/// Settings that shape one query run.
#[derive(Debug, Clone)]
pub struct QuerySettings {
    /// Collection searched and read.
    pub collection: String,
    /// Maximum identifiers requested from search.
    pub search_limit: usize,
    /// Generative model name.
    pub model: String,
    /// Topic word in the summary instruction.
    pub topic: String,
}

impl QuerySettings {
    /// Derive settings from the loaded configuration.
    pub fn from_config(config: &Config) -> Self {
        Self {
            collection: config.collection_name.clone(),
            search_limit: config.search_limit,
            model: config.gemini_model.clone(),
            topic: config.summary_topic.clone(),
        }
    }
}

/// Source of the operator's question.
pub trait QuestionSource {
    /// Return one raw question line.
    fn read_question(&mut self) -> std::io::Result<String>;
}

/// Question supplied up front, e.g. from a command-line flag.
#[derive(Debug, Clone)]
pub struct FixedQuestion(pub String);

impl QuestionSource for FixedQuestion {
    fn read_question(&mut self) -> std::io::Result<String> {
        Ok(std::mem::take(&mut self.0))
    }
}

/// Prompts on stdout and reads one line from stdin.
#[derive(Debug, Clone)]
pub struct StdinQuestion {
    prompt: String,
}

impl StdinQuestion {
    /// Create a source that shows `prompt` before reading.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
        }
    }
}

impl QuestionSource for StdinQuestion {
    fn read_question(&mut self) -> std::io::Result<String> {
        let mut stdout = std::io::stdout().lock();
        write!(stdout, "{}", self.prompt)?;
        stdout.flush()?;
        let mut line = String::new();
        std::io::stdin().lock().read_line(&mut line)?;
        Ok(line)
    }
}

/// Retrieval-then-summarization over the external services.
pub struct QueryService {
    identity: Box<dyn IdentityClient>,
    search: Box<dyn VectorSearchClient>,
    store: Arc<dyn DocumentStore>,
    summarizer: Box<dyn SummarizationClient>,
    settings: QuerySettings,
}

impl QueryService {
    /// Build a service from explicit collaborators.
    pub fn new(
        identity: Box<dyn IdentityClient>,
        search: Box<dyn VectorSearchClient>,
        store: Arc<dyn DocumentStore>,
        summarizer: Box<dyn SummarizationClient>,
        settings: QuerySettings,
    ) -> Self {
        Self {
            identity,
            search,
            store,
            summarizer,
            settings,
        }
    }

    /// Build a service backed by the Firebase, Firestore, and Gemini clients.
    pub fn from_config(
        config: &Config,
        credentials: &QueryCredentials,
    ) -> Result<Self, QueryError> {
        let identity =
            FirebaseIdentityClient::new(&config.identity_url, credentials.firebase_api_key.clone())?;
        let search = CallableSearchClient::new(&config.vector_search_url)?;
        let store = FirestoreService::new(config)?;
        let summarizer = GeminiSummarizationClient::new(
            config.gemini_url.clone(),
            credentials.gemini_api_key.clone(),
        )?;
        Ok(Self::new(
            Box::new(identity),
            Box::new(search),
            Arc::new(store),
            Box::new(summarizer),
            QuerySettings::from_config(config),
        ))
    }

    /// Run the full pipeline: sign in, read the question, answer it.
    pub async fn run(&self, source: &mut dyn QuestionSource) -> Result<QueryOutcome, QueryError> {
        let token = self.authenticate().await?;
        let question = source.read_question()?;
        self.answer(&token, &question).await
    }

    /// Obtain an ID token through anonymous sign-in.
    pub async fn authenticate(&self) -> Result<IdToken, QueryError> {
        tracing::info!("Signing in anonymously");
        Ok(self.identity.sign_in_anonymously().await?)
    }

    /// Answer `question` with an already authenticated session.
    pub async fn answer(&self, token: &IdToken, question: &str) -> Result<QueryOutcome, QueryError> {
        let question = question.trim();
        if question.is_empty() {
            return Ok(QueryOutcome::EmptyQuestion);
        }

        tracing::info!(question, collection = %self.settings.collection, "Querying vector search");
        let request = VectorSearchRequest {
            query: question.to_string(),
            collection_name: self.settings.collection.clone(),
            limit: self.settings.search_limit,
        };
        let ids = self.search.search(token, &request).await?;
        if ids.is_empty() {
            return Ok(QueryOutcome::NoMatches);
        }

        let matches = self.fetch_matches(token, &ids).await?;
        if matches.is_empty() {
            return Ok(QueryOutcome::NoText { ids });
        }

        let prompt = build_summary_prompt(
            &self.settings.topic,
            matches.iter().map(|matched| matched.text.as_str()),
        );
        tracing::info!(model = %self.settings.model, chunks = matches.len(), "Generating summary");
        let summary = self
            .summarizer
            .generate_summary(SummarizationRequest {
                model: self.settings.model.clone(),
                prompt,
            })
            .await?;

        if summary.trim().is_empty() {
            return Ok(QueryOutcome::NoSummary { ids, matches });
        }
        Ok(QueryOutcome::Answered {
            summary,
            ids,
            matches,
        })
    }

    async fn fetch_matches(
        &self,
        token: &IdToken,
        ids: &[String],
    ) -> Result<Vec<MatchedChunk>, QueryError> {
        tracing::info!(ids = ids.len(), "Fetching matched chunks");
        let mut matches = Vec::with_capacity(ids.len());
        for id in ids {
            let Some(stored) = self
                .store
                .fetch_chunk(&self.settings.collection, id, Some(token))
                .await?
            else {
                tracing::debug!(id = %id, "Matched identifier has no record");
                continue;
            };
            matches.push(MatchedChunk {
                id: stored.id,
                text: stored.text,
                metadata: stored.metadata,
            });
        }
        Ok(matches)
    }
}
