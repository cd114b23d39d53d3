use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use axum_typed_multipart::{FieldData, TryFromMultipart, TypedMultipart};
use common::{error::AppError, table::CsvTable};
use serde_json::json;
use tempfile::NamedTempFile;
use tracing::info;

use crate::{api_state::ApiState, error::ApiError};

#[derive(Debug, TryFromMultipart)]
pub struct ProcessParams {
    #[form_data(limit = "10000000")]
    pub file: FieldData<NamedTempFile>,
    pub column: String,
    pub question: String,
    pub max_workers: Option<usize>,
}

/// Run the batch over an uploaded table: one appended answer column, a
/// distinct output artifact named after the input. Synchronous by
/// contract; the response carries the artifact name for `/download`.
pub async fn process_table(
    State(state): State<ApiState>,
    TypedMultipart(input): TypedMultipart<ProcessParams>,
) -> Result<impl IntoResponse, ApiError> {
    let file_name = input
        .file
        .metadata
        .file_name
        .as_deref()
        .filter(|name| !name.is_empty())
        .map(sanitize_filename)
        .ok_or_else(|| ApiError::ValidationError("No file selected".to_string()))?;

    if !is_allowed_table_file(&file_name) {
        return Err(ApiError::ValidationError(
            "Invalid file type. Only CSV files are allowed".to_string(),
        ));
    }
    if input.column.trim().is_empty() {
        return Err(ApiError::ValidationError(
            "Column name not provided".to_string(),
        ));
    }
    if input.question.trim().is_empty() {
        return Err(ApiError::ValidationError(
            "Question not provided".to_string(),
        ));
    }

    let max_workers = input.max_workers.unwrap_or(state.config.max_workers);
    info!(
        file = %file_name,
        column = %input.column,
        max_workers,
        "received process request"
    );

    let table = CsvTable::from_path(input.file.contents.path()).map_err(ApiError::from)?;
    let output = state
        .orchestrator
        .run(table, &input.column, &input.question, max_workers)
        .await
        .map_err(ApiError::from)?;

    std::fs::create_dir_all(state.config.output_dir()).map_err(AppError::from)?;
    let output_name = format!("processed_{file_name}");
    let output_path = state.config.output_dir().join(&output_name);
    output.write_to_path(&output_path).map_err(ApiError::from)?;

    // The uploaded NamedTempFile is removed when `input` drops.
    Ok((
        StatusCode::OK,
        Json(json!({
            "status": "success",
            "message": "Processing completed",
            "output_file": output_name
        })),
    ))
}

fn is_allowed_table_file(file_name: &str) -> bool {
    mime_guess::from_path(file_name)
        .first()
        .is_some_and(|m| m == mime::TEXT_CSV)
}

/// Keep only filesystem-safe characters; the result is used verbatim in
/// the output artifact name.
fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect::<String>()
        .trim_start_matches('.')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_csv_files_are_allowed() {
        assert!(is_allowed_table_file("companies.csv"));
        assert!(is_allowed_table_file("companies.CSV"));
        assert!(!is_allowed_table_file("companies.xlsx"));
        assert!(!is_allowed_table_file("companies"));
        assert!(!is_allowed_table_file("script.sh"));
    }

    #[test]
    fn sanitizes_hostile_filenames() {
        assert_eq!(sanitize_filename("companies.csv"), "companies.csv");
        assert_eq!(sanitize_filename("../../etc/passwd"), "_.._etc_passwd");
        assert_eq!(sanitize_filename("my data (v2).csv"), "my_data__v2_.csv");
    }
}
