mod batch;
mod config;
mod services;
mod single_flight;


pub use batch::BatchOrchestrator;
pub use config::PipelineConfig;
pub use services::{DefaultPipelineServices, PipelineServices, RetrievedDocument};

use std::path::PathBuf;
use std::sync::Arc;

use common::{cache::AnswerCache, error::AppError};
use tracing::{info, warn};

use self::single_flight::InflightQueries;

/// The typed result for one row: a real answer, or the captured failure
/// text that takes its place in the output. Only the `Answer` variant is
/// ever written to the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerOutcome {
    Answer(String),
    Failed(String),
}

impl AnswerOutcome {
    pub fn is_answer(&self) -> bool {
        matches!(self, Self::Answer(_))
    }

    /// The string written into the output table's answer cell.
    pub fn into_cell(self) -> String {
        match self {
            Self::Answer(text) | Self::Failed(text) => text,
        }
    }
}

/// Turns one row value into one cached answer: derive the search query,
/// check the cache, otherwise retrieve, build a scratch document set,
/// query the index backend, cache and clean up.
pub struct RowPipeline {
    cache: AnswerCache,
    scratch_root: PathBuf,
    config: PipelineConfig,
    services: Arc<dyn PipelineServices>,
    inflight: InflightQueries,
}

impl RowPipeline {
    pub fn new(
        cache: AnswerCache,
        scratch_root: impl Into<PathBuf>,
        config: PipelineConfig,
        services: Arc<dyn PipelineServices>,
    ) -> Result<Self, AppError> {
        let scratch_root = scratch_root.into();
        std::fs::create_dir_all(&scratch_root)?;
        Ok(Self {
            cache,
            scratch_root,
            config,
            services,
            inflight: InflightQueries::default(),
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// The composite search string for one row: seed value plus the
    /// question's derived keywords. Deterministic; doubles as the cache
    /// key basis.
    pub fn build_search_query(row_value: &str, keywords: &[String]) -> String {
        let mut query = row_value.trim().to_string();
        for keyword in keywords {
            if !query.is_empty() {
                query.push(' ');
            }
            query.push_str(keyword);
        }
        query
    }

    /// Process one search query into an outcome. Infallible by contract:
    /// failures in retrieval or querying are captured into
    /// `AnswerOutcome::Failed` so one row can never abort the batch.
    #[tracing::instrument(skip_all, fields(search_query = %search_query))]
    pub async fn process(&self, search_query: &str, question: &str) -> AnswerOutcome {
        if let Some(answer) = self.cache.get(search_query).await {
            info!("answer served from cache");
            return AnswerOutcome::Answer(answer);
        }

        let key = AnswerCache::cache_key(search_query);
        let _guard = self.inflight.acquire(&key).await;

        // A concurrent duplicate may have finished while we waited.
        if let Some(answer) = self.cache.get(search_query).await {
            info!("answer computed by concurrent duplicate; served from cache");
            return AnswerOutcome::Answer(answer);
        }

        match self.compute(search_query, question, &key).await {
            Ok(answer) => {
                self.cache.put(search_query, &answer).await;
                AnswerOutcome::Answer(answer)
            }
            Err(err) => {
                warn!(error = %err, "row pipeline failed");
                AnswerOutcome::Failed(format!("error processing '{search_query}': {err}"))
            }
        }
    }

    async fn compute(
        &self,
        search_query: &str,
        question: &str,
        key: &str,
    ) -> Result<String, AppError> {
        let documents = self
            .services
            .retrieve_documents(search_query, self.config.retrieval_top_n)
            .await?;
        if documents.is_empty() {
            return Err(AppError::Retrieval(format!(
                "no retrievable sources for '{search_query}'"
            )));
        }

        // Scratch namespace unique per in-flight query; the single-flight
        // guard makes the key safe to reuse across duplicate rows.
        let scratch_dir = self.scratch_root.join(key);
        let result = self
            .build_and_query(&scratch_dir, &documents, question)
            .await;

        if let Err(e) = tokio::fs::remove_dir_all(&scratch_dir).await {
            warn!(
                scratch_dir = %scratch_dir.display(),
                error = %e,
                "failed to clean up scratch documents"
            );
        }

        result
    }

    async fn build_and_query(
        &self,
        scratch_dir: &std::path::Path,
        documents: &[RetrievedDocument],
        question: &str,
    ) -> Result<String, AppError> {
        tokio::fs::create_dir_all(scratch_dir).await?;
        for (i, document) in documents.iter().enumerate() {
            let body = format!("Source: {}\n\n{}", document.source, document.text);
            tokio::fs::write(scratch_dir.join(format!("doc_{i}.txt")), body).await?;
        }

        self.services
            .answer_from_documents(scratch_dir, question)
            .await
    }
}
