//! Application state shared by the handlers

use std::sync::Arc;

use crate::domain::{ChatRecordRepository, RetrieverRepository, TemplateRepository};
use crate::infrastructure::pipeline::Pipeline;

/// Pipeline plus the stores behind the CRUD endpoints.
///
/// `templates` must be the repository the pipeline resolves stored
/// templates from.
#[derive(Debug, Clone)]
pub struct AppState {
    pub pipeline: Pipeline,
    pub templates: Arc<dyn TemplateRepository>,
    pub retrievers: Arc<dyn RetrieverRepository>,
    pub chat_records: Arc<dyn ChatRecordRepository>,
}

impl AppState {
    pub fn new(
        pipeline: Pipeline,
        templates: Arc<dyn TemplateRepository>,
        retrievers: Arc<dyn RetrieverRepository>,
        chat_records: Arc<dyn ChatRecordRepository>,
    ) -> Self {
        Self {
            pipeline,
            templates,
            retrievers,
            chat_records,
        }
    }
}
