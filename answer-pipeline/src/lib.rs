#![allow(clippy::missing_docs_in_private_items)]

pub mod pipeline;
pub mod utils;

pub use pipeline::{
    AnswerOutcome, BatchOrchestrator, DefaultPipelineServices, PipelineConfig, PipelineServices,
    RetrievedDocument, RowPipeline,
};
