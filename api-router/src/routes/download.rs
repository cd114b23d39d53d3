use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
};
use tracing::info;

use crate::{api_state::ApiState, error::ApiError};

/// Serve a previously produced output artifact as a CSV attachment.
pub async fn download_output(
    State(state): State<ApiState>,
    Path(filename): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    if filename.contains(['/', '\\']) || filename.contains("..") {
        return Err(ApiError::ValidationError("Invalid file name".to_string()));
    }

    let path = state.config.output_dir().join(&filename);
    let contents = tokio::fs::read(&path)
        .await
        .map_err(|_| ApiError::NotFound(format!("File not found: {filename}")))?;

    info!(file = %filename, bytes = contents.len(), "serving output artifact");
    Ok((
        [
            (header::CONTENT_TYPE, mime::TEXT_CSV.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        contents,
    ))
}
