use std::path::PathBuf;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Clone, Deserialize, Debug)]
pub struct AppConfig {
    pub openai_api_key: String,
    #[serde(default = "default_base_url")]
    pub openai_base_url: String,
    #[serde(default = "default_model")]
    pub openai_model: String,
    /// Base URL of the SearxNG-compatible search endpoint used to locate
    /// source pages for a search query.
    #[serde(default = "default_search_base_url")]
    pub search_base_url: String,
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    pub http_port: u16,
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,
    #[serde(default = "default_retrieval_top_n")]
    pub retrieval_top_n: usize,
    #[serde(default = "default_keyword_count")]
    pub keyword_count: usize,
    /// Per-request timeout for outbound HTTP, in seconds. A stuck fetch is
    /// converted into a per-row failure, never a batch abort.
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,
    #[serde(default = "default_process_max_body_bytes")]
    pub process_max_body_bytes: usize,
}

impl AppConfig {
    pub fn cache_dir(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join("cache")
    }

    pub fn scratch_dir(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join("scratch")
    }

    pub fn upload_dir(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join("uploads")
    }

    pub fn output_dir(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join("outputs")
    }
}

fn default_data_dir() -> String {
    "./data".to_string()
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_search_base_url() -> String {
    "http://localhost:8888".to_string()
}

fn default_max_workers() -> usize {
    3
}

fn default_retrieval_top_n() -> usize {
    3
}

fn default_keyword_count() -> usize {
    5
}

fn default_http_timeout_secs() -> u64 {
    60
}

fn default_process_max_body_bytes() -> usize {
    10_000_000
}

pub fn get_config() -> Result<AppConfig, ConfigError> {
    let config = Config::builder()
        .add_source(File::with_name("config").required(false))
        .add_source(Environment::default())
        .build()?;

    config.try_deserialize()
}
