use std::sync::Arc;

use answer_pipeline::BatchOrchestrator;
use common::utils::config::AppConfig;

#[derive(Clone)]
pub struct ApiState {
    pub config: AppConfig,
    pub orchestrator: Arc<BatchOrchestrator>,
}

impl ApiState {
    pub fn new(config: AppConfig, orchestrator: Arc<BatchOrchestrator>) -> Self {
        Self {
            config,
            orchestrator,
        }
    }
}
