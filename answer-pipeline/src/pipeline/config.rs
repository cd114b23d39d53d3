use common::utils::config::AppConfig;

/// Tuning knobs for the per-row pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// How many source documents to retrieve per search query.
    pub retrieval_top_n: usize,
    /// How many keywords to derive from the question.
    pub keyword_count: usize,
    /// Default width of the batch worker pool; callers may override per run.
    pub max_workers: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            retrieval_top_n: 3,
            keyword_count: 5,
            max_workers: 3,
        }
    }
}

impl PipelineConfig {
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            retrieval_top_n: config.retrieval_top_n,
            keyword_count: config.keyword_count,
            max_workers: config.max_workers,
        }
    }
}
