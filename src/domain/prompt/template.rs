//! Prompt template parsing and rendering
//!
//! Supports slot syntax: `{name}`
//! - `{name}` is replaced by the value bound to `name`, or nothing if unbound
//! - `{{` and `}}` render as literal braces

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Matches escaped braces or a slot
static SLOT_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{|\}\}|\{([A-Za-z_][A-Za-z0-9_]*)\}").unwrap());

/// Template validation errors
#[derive(Debug, Clone, Error, PartialEq)]
pub enum TemplateError {
    #[error("Template name cannot be empty")]
    EmptyName,

    #[error("Template '{name}' has no content")]
    EmptyTemplate { name: String },

    #[error("Template '{name}' sets few_shot_key without few_shot_value")]
    MissingFewShotValue { name: String },
}

/// A system prompt template.
///
/// Context keys, `request` and the optional few-shot key are bound as slots
/// at render time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptTemplate {
    pub name: String,
    pub template: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub few_shot_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub few_shot_value: Option<String>,
}

impl PromptTemplate {
    pub fn new(name: impl Into<String>, template: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            template: template.into(),
            few_shot_key: None,
            few_shot_value: None,
        }
    }

    pub fn with_few_shot(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.few_shot_key = Some(key.into());
        self.few_shot_value = Some(value.into());
        self
    }

    pub fn validate(&self) -> Result<(), TemplateError> {
        if self.name.trim().is_empty() {
            return Err(TemplateError::EmptyName);
        }

        if self.template.trim().is_empty() {
            return Err(TemplateError::EmptyTemplate {
                name: self.name.clone(),
            });
        }

        if self.few_shot_key.is_some() && self.few_shot_value.is_none() {
            return Err(TemplateError::MissingFewShotValue {
                name: self.name.clone(),
            });
        }

        Ok(())
    }

    /// Slot names referenced by the template, in order of first use
    pub fn slots(&self) -> Vec<String> {
        let mut seen = Vec::new();

        for cap in SLOT_PATTERN.captures_iter(&self.template) {
            if let Some(name) = cap.get(1) {
                let name = name.as_str().to_string();
                if !seen.contains(&name) {
                    seen.push(name);
                }
            }
        }

        seen
    }

    /// Render with the given slot values plus the few-shot binding
    pub fn render(&self, values: &HashMap<String, String>) -> String {
        let few_shot = self
            .few_shot_key
            .as_deref()
            .zip(self.few_shot_value.as_deref());

        SLOT_PATTERN
            .replace_all(&self.template, |cap: &Captures| match &cap[0] {
                "{{" => "{".to_string(),
                "}}" => "}".to_string(),
                _ => {
                    let slot = &cap[1];
                    match few_shot {
                        Some((key, value)) if key == slot => value.to_string(),
                        _ => values.get(slot).cloned().unwrap_or_default(),
                    }
                }
            })
            .into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_render_fills_slots() {
        let template = PromptTemplate::new("qa", "Context:\n{context}\nQuestion: {request}");
        let rendered = template.render(&values(&[("context", "a\nb"), ("request", "why?")]));

        assert_eq!(rendered, "Context:\na\nb\nQuestion: why?");
    }

    #[test]
    fn test_unbound_slots_render_empty() {
        let template = PromptTemplate::new("qa", "[{context}] [{graph}]");
        let rendered = template.render(&values(&[("context", "x")]));

        assert_eq!(rendered, "[x] []");
    }

    #[test]
    fn test_escaped_braces_are_literal() {
        let template = PromptTemplate::new("json", "Reply as {{\"answer\": ...}} using {context}");
        let rendered = template.render(&values(&[("context", "docs")]));

        assert_eq!(rendered, "Reply as {\"answer\": ...} using docs");
    }

    #[test]
    fn test_few_shot_slot() {
        let template = PromptTemplate::new("fs", "Examples:\n{examples}\n{context}")
            .with_few_shot("examples", "Q: 1+1 A: 2");
        let rendered = template.render(&values(&[("context", "ctx")]));

        assert_eq!(rendered, "Examples:\nQ: 1+1 A: 2\nctx");
    }

    #[test]
    fn test_slots_in_order() {
        let template = PromptTemplate::new("t", "{b} {a} {b} {{c}}");
        assert_eq!(template.slots(), vec!["b".to_string(), "a".to_string()]);
    }

    #[test]
    fn test_validate() {
        assert!(PromptTemplate::new("ok", "{context}").validate().is_ok());
        assert_eq!(
            PromptTemplate::new("", "x").validate(),
            Err(TemplateError::EmptyName)
        );

        let mut missing = PromptTemplate::new("fs", "x");
        missing.few_shot_key = Some("examples".to_string());
        assert!(matches!(
            missing.validate(),
            Err(TemplateError::MissingFewShotValue { .. })
        ));
    }
}
