//! Context merging and prompt assembly

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::domain::{
    ChatRequest, DomainError, Message, PipelinePhase, PromptTemplate, RetrievalStepResult,
    TemplateRepository,
};

/// Instruction used when a request names no template
pub const DEFAULT_SYSTEM_TEMPLATE: &str = "You are an AI assistant that helps people find \
information. Use the following context, to generate a response to the user request. \
Context:\n{context}";

/// Slot bound to the user query
pub const REQUEST_SLOT: &str = "request";

/// Retrieved content grouped by context key, keys in first-seen order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergedContext {
    entries: Vec<(String, Vec<String>)>,
}

impl MergedContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a step's contributions under its context key
    pub fn add(&mut self, key: &str, values: Vec<String>) {
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some((_, existing)) => existing.extend(values),
            None => self.entries.push((key.to_string(), values)),
        }
    }

    pub fn add_step(&mut self, step: &RetrievalStepResult) {
        self.add(step.context_key(), step.contributions());
    }

    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_slice())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All values, flattened in key order
    pub fn documents(&self) -> Vec<String> {
        self.entries
            .iter()
            .flat_map(|(_, values)| values.iter().cloned())
            .collect()
    }

    /// Template slot bindings: each key's values joined by newlines
    pub fn slot_values(&self) -> HashMap<String, String> {
        self.entries
            .iter()
            .map(|(k, v)| (k.clone(), v.join("\n")))
            .collect()
    }
}

/// Messages ready for generation
#[derive(Debug, Clone)]
pub struct AssembledPrompt {
    pub messages: Vec<Message>,
    /// The rendered system message
    pub rendered: String,
}

/// Builds the generation prompt from a request and its merged context
#[derive(Debug, Clone)]
pub struct PromptAssembler {
    templates: Arc<dyn TemplateRepository>,
    max_history_turns: Option<usize>,
}

impl PromptAssembler {
    pub fn new(templates: Arc<dyn TemplateRepository>, max_history_turns: Option<usize>) -> Self {
        Self {
            templates,
            max_history_turns,
        }
    }

    pub async fn assemble(
        &self,
        request: &ChatRequest,
        context: &MergedContext,
    ) -> Result<AssembledPrompt, DomainError> {
        self.build(request, context)
            .await
            .map_err(|e| e.in_phase(PipelinePhase::PromptAssembly))
    }

    async fn build(
        &self,
        request: &ChatRequest,
        context: &MergedContext,
    ) -> Result<AssembledPrompt, DomainError> {
        let template = self.resolve_template(request).await?;

        let mut values = context.slot_values();
        values.insert(REQUEST_SLOT.to_string(), request.query.clone());
        let rendered = template.render(&values);

        let mut messages = vec![Message::system(rendered.clone())];

        let history = &request.history;
        let skip = self
            .max_history_turns
            .map(|max| history.len().saturating_sub(max))
            .unwrap_or(0);
        for (human, ai) in &history[skip..] {
            messages.extend(Message::turn(human, ai));
        }

        messages.push(Message::user(request.query.clone()));

        debug!(
            template = %template.name,
            context_keys = context.len(),
            history_turns = history.len() - skip,
            "Prompt assembled"
        );

        Ok(AssembledPrompt { messages, rendered })
    }

    async fn resolve_template(&self, request: &ChatRequest) -> Result<PromptTemplate, DomainError> {
        if let Some(ref template) = request.prompt_template {
            template
                .validate()
                .map_err(|e| DomainError::validation(e.to_string()))?;
            return Ok(template.clone());
        }

        if let Some(ref name) = request.prompt_template_name {
            return self
                .templates
                .get(name)
                .await?
                .map(|stored| stored.template)
                .ok_or_else(|| DomainError::not_found(format!("Prompt template '{}' not found", name)));
        }

        Ok(PromptTemplate::new("default", DEFAULT_SYSTEM_TEMPLATE))
    }
}
