//! Pipeline orchestration: context, prompt assembly, token accounting

pub mod accounting;
mod context;
mod orchestrator;
mod prompt;

pub use accounting::{TiktokenCounter, TokenAccountant, TokenCounter};
pub use context::{PipelineContext, DEFAULT_GRAPH_CONCURRENCY, DEFAULT_STREAM_BUFFER};
pub use orchestrator::{Pipeline, PipelineStream};
pub use prompt::{
    AssembledPrompt, MergedContext, PromptAssembler, DEFAULT_SYSTEM_TEMPLATE, REQUEST_SLOT,
};
