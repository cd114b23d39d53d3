use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use common::{error::AppError, table::CsvTable, utils::keywords::extract_keywords};
use futures::{stream, StreamExt};
use tracing::info;

use super::RowPipeline;

/// Name of the column appended to the output table.
pub const ANSWER_COLUMN: &str = "answers";

/// Drives `RowPipeline` over every row of a table with a bounded worker
/// pool, preserving input order in the output regardless of completion
/// order.
pub struct BatchOrchestrator {
    pipeline: Arc<RowPipeline>,
}

impl BatchOrchestrator {
    pub fn new(pipeline: Arc<RowPipeline>) -> Self {
        Self { pipeline }
    }

    /// Run the batch and return the input table with the answer column
    /// attached. A single row's failure lands in its answer cell; only
    /// catastrophic errors (missing column, a worker task that cannot
    /// run to completion) fail the whole batch.
    #[tracing::instrument(skip_all, fields(column = %column, rows = table.row_count()))]
    pub async fn run(
        &self,
        table: CsvTable,
        column: &str,
        question: &str,
        max_workers: usize,
    ) -> Result<CsvTable, AppError> {
        // Keyword derivation is shared across all rows, not per-row.
        let keywords = extract_keywords(question, self.pipeline.config().keyword_count);
        info!(?keywords, "derived question keywords");

        let seeds = table.column_values(column)?;
        let total = seeds.len();
        let completed = Arc::new(AtomicUsize::new(0));
        let question: Arc<str> = Arc::from(question);
        let width = max_workers.max(1);

        let raw_results = stream::iter(seeds.into_iter().enumerate().map(|(idx, seed)| {
            let pipeline = Arc::clone(&self.pipeline);
            let question = Arc::clone(&question);
            let completed = Arc::clone(&completed);
            let search_query = RowPipeline::build_search_query(&seed, &keywords);

            async move {
                tokio::spawn(async move {
                    let outcome = pipeline.process(&search_query, &question).await;
                    let done = completed.fetch_add(1, Ordering::SeqCst).saturating_add(1);
                    info!(completed = done, total, "processed row");
                    (idx, outcome)
                })
                .await
            }
        }))
        .buffer_unordered(width)
        .collect::<Vec<_>>()
        .await;

        // A JoinError means the pool lost a unit of work; that is a
        // batch-level failure, never a silently partial result.
        let mut ordered = Vec::with_capacity(raw_results.len());
        for result in raw_results {
            ordered.push(result?);
        }
        ordered.sort_by_key(|(idx, _)| *idx);

        let answers = ordered
            .into_iter()
            .map(|(_, outcome)| outcome.into_cell())
            .collect();
        table.with_answer_column(ANSWER_COLUMN, answers)
    }
}
