use api_state::ApiState;
use axum::{
    extract::{DefaultBodyLimit, FromRef},
    routing::{get, post},
    Router,
};
use routes::{
    download::download_output, liveness::live, process::process_table, readiness::ready,
};

pub mod api_state;
pub mod error;
mod routes;

/// Router for API functionality, version 1
pub fn api_routes_v1<S>(app_state: &ApiState) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
    ApiState: FromRef<S>,
{
    // Probes for k8s/systemd
    let probes = Router::new()
        .route("/ready", get(ready))
        .route("/live", get(live));

    let batch = Router::new()
        .route(
            "/process",
            post(process_table).layer(DefaultBodyLimit::max(
                app_state.config.process_max_body_bytes,
            )),
        )
        .route("/download/{filename}", get(download_output));

    probes.merge(batch)
}

#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::sync::Arc;

    use answer_pipeline::{
        BatchOrchestrator, PipelineConfig, PipelineServices, RetrievedDocument, RowPipeline,
    };
    use async_trait::async_trait;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        Router,
    };
    use common::{cache::AnswerCache, error::AppError, utils::config::AppConfig};
    use tower::ServiceExt;

    use super::*;

    struct NoopServices;

    #[async_trait]
    impl PipelineServices for NoopServices {
        async fn retrieve_documents(
            &self,
            _search_query: &str,
            _top_n: usize,
        ) -> Result<Vec<RetrievedDocument>, AppError> {
            Ok(Vec::new())
        }

        async fn answer_from_documents(
            &self,
            _documents_dir: &Path,
            _question: &str,
        ) -> Result<String, AppError> {
            Ok(String::new())
        }
    }

    fn test_router(data_dir: &Path) -> Router {
        let config = AppConfig {
            openai_api_key: "test-key".to_string(),
            openai_base_url: "http://localhost:1".to_string(),
            openai_model: "test-model".to_string(),
            search_base_url: "http://localhost:1".to_string(),
            data_dir: data_dir.display().to_string(),
            http_port: 0,
            max_workers: 2,
            retrieval_top_n: 3,
            keyword_count: 5,
            http_timeout_secs: 5,
            process_max_body_bytes: 1_000_000,
        };
        let pipeline = Arc::new(
            RowPipeline::new(
                AnswerCache::new(config.cache_dir()).unwrap(),
                config.scratch_dir(),
                PipelineConfig::from_app_config(&config),
                Arc::new(NoopServices),
            )
            .unwrap(),
        );
        let state = ApiState::new(config, Arc::new(BatchOrchestrator::new(pipeline)));
        Router::new()
            .nest("/api/v1", api_routes_v1(&state))
            .with_state(state)
    }

    #[tokio::test]
    async fn live_always_responds_ok() {
        let dir = tempfile::tempdir().unwrap();
        let response = test_router(dir.path())
            .oneshot(
                Request::builder()
                    .uri("/api/v1/live")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn ready_reports_ok_with_writable_data_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let response = test_router(dir.path())
            .oneshot(
                Request::builder()
                    .uri("/api/v1/ready")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn download_of_missing_artifact_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let response = test_router(dir.path())
            .oneshot(
                Request::builder()
                    .uri("/api/v1/download/nope.csv")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn download_rejects_traversal_attempts() {
        let dir = tempfile::tempdir().unwrap();
        let response = test_router(dir.path())
            .oneshot(
                Request::builder()
                    .uri("/api/v1/download/secret..csv")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn download_serves_existing_artifact_as_csv() {
        let dir = tempfile::tempdir().unwrap();
        let outputs = dir.path().join("outputs");
        std::fs::create_dir_all(&outputs).unwrap();
        std::fs::write(outputs.join("processed_companies.csv"), "company,answers\n").unwrap();

        let response = test_router(dir.path())
            .oneshot(
                Request::builder()
                    .uri("/api/v1/download/processed_companies.csv")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get("content-type").unwrap(),
            "text/csv"
        );
    }
}
