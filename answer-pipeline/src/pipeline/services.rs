use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use common::{error::AppError, utils::config::AppConfig};
use url::Url;

use crate::utils::{index_query, web_retrieval};

/// One source page retrieved for a search query. Ephemeral: lives only
/// long enough to be written into the scratch directory.
#[derive(Debug, Clone)]
pub struct RetrievedDocument {
    pub source: Url,
    pub text: String,
}

/// External collaborators of the per-row pipeline: the content retriever
/// and the index backend. Behind a trait so tests can count and fail
/// calls without any network.
#[async_trait]
pub trait PipelineServices: Send + Sync {
    /// Retrieve up to `top_n` cleaned documents for a search query.
    /// Individual unreachable sources are skipped; an empty vec (not an
    /// error) means nothing was retrievable.
    async fn retrieve_documents(
        &self,
        search_query: &str,
        top_n: usize,
    ) -> Result<Vec<RetrievedDocument>, AppError>;

    /// Build a transient index over the plain-text documents in
    /// `documents_dir` and answer `question` against it. The returned
    /// answer is fully materialized.
    async fn answer_from_documents(
        &self,
        documents_dir: &Path,
        question: &str,
    ) -> Result<String, AppError>;
}

pub struct DefaultPipelineServices {
    http: reqwest::Client,
    openai_client: Arc<async_openai::Client<async_openai::config::OpenAIConfig>>,
    config: AppConfig,
}

impl DefaultPipelineServices {
    pub fn new(
        openai_client: Arc<async_openai::Client<async_openai::config::OpenAIConfig>>,
        config: AppConfig,
    ) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .build()?;

        Ok(Self {
            http,
            openai_client,
            config,
        })
    }
}

#[async_trait]
impl PipelineServices for DefaultPipelineServices {
    async fn retrieve_documents(
        &self,
        search_query: &str,
        top_n: usize,
    ) -> Result<Vec<RetrievedDocument>, AppError> {
        web_retrieval::retrieve_top_documents(
            &self.http,
            &self.config.search_base_url,
            search_query,
            top_n,
        )
        .await
    }

    async fn answer_from_documents(
        &self,
        documents_dir: &Path,
        question: &str,
    ) -> Result<String, AppError> {
        index_query::answer_from_documents(
            &self.openai_client,
            &self.config.openai_model,
            documents_dir,
            question,
        )
        .await
    }
}
