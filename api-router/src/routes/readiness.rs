use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use common::utils::config::AppConfig;
use serde_json::json;

use crate::api_state::ApiState;

/// Readiness probe: returns 200 if the data directories are usable,
/// else 503.
pub async fn ready(State(state): State<ApiState>) -> impl IntoResponse {
    match ensure_data_dirs(&state.config) {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "checks": { "data_dirs": "ok" }
            })),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "status": "error",
                "checks": { "data_dirs": "fail" },
                "reason": e.to_string()
            })),
        ),
    }
}

fn ensure_data_dirs(config: &AppConfig) -> std::io::Result<()> {
    for dir in [
        config.cache_dir(),
        config.scratch_dir(),
        config.upload_dir(),
        config.output_dir(),
    ] {
        std::fs::create_dir_all(dir)?;
    }
    Ok(())
}
