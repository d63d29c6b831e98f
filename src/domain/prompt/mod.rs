//! Prompt templates and their storage

mod repository;
mod template;

pub use repository::{in_memory::InMemoryTemplateRepository, StoredTemplate, TemplateRepository};
pub use template::{PromptTemplate, TemplateError};
