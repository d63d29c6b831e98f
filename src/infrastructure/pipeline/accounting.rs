//! Token accounting for generation calls

use std::fmt::Debug;
use std::sync::Arc;

use moka::sync::Cache;
use tiktoken_rs::CoreBPE;
use tracing::{debug, warn};

use crate::domain::{ChatModel, DomainError, Message, TokenUsage};

/// Counts tokens the way a given model's tokenizer would
pub trait TokenCounter: Send + Sync + Debug {
    fn count(&self, model_name: &str, text: &str) -> Result<u32, DomainError>;
}

/// BPE tokenizers from tiktoken, loaded once per model name.
///
/// Models without a registered tokenizer use `cl100k_base`.
#[derive(Clone)]
pub struct TiktokenCounter {
    tokenizers: Cache<String, Arc<CoreBPE>>,
}

impl Debug for TiktokenCounter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TiktokenCounter")
            .field("loaded", &self.tokenizers.entry_count())
            .finish()
    }
}

impl Default for TiktokenCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl TiktokenCounter {
    pub fn new() -> Self {
        Self {
            tokenizers: Cache::new(32),
        }
    }

    fn tokenizer(&self, model_name: &str) -> Result<Arc<CoreBPE>, DomainError> {
        if let Some(bpe) = self.tokenizers.get(model_name) {
            return Ok(bpe);
        }

        let bpe = match tiktoken_rs::get_bpe_from_model(model_name) {
            Ok(bpe) => bpe,
            Err(_) => {
                warn!(model = %model_name, "No tokenizer registered for model, using cl100k_base");
                tiktoken_rs::cl100k_base().map_err(|e| {
                    DomainError::internal(format!("Failed to load cl100k_base tokenizer: {}", e))
                })?
            }
        };

        let bpe = Arc::new(bpe);
        self.tokenizers.insert(model_name.to_string(), bpe.clone());
        Ok(bpe)
    }
}

impl TokenCounter for TiktokenCounter {
    fn count(&self, model_name: &str, text: &str) -> Result<u32, DomainError> {
        let bpe = self.tokenizer(model_name)?;
        Ok(bpe.encode_ordinary(text).len() as u32)
    }
}

/// Derives the token usage of a generation call
#[derive(Debug, Clone)]
pub struct TokenAccountant {
    counter: Arc<dyn TokenCounter>,
}

impl TokenAccountant {
    pub fn new(counter: Arc<dyn TokenCounter>) -> Self {
        Self { counter }
    }

    /// Usage reported by the backend wins; otherwise the prompt (message
    /// contents concatenated) and the response are tokenized.
    pub fn account(
        &self,
        model: ChatModel,
        prompt: &[Message],
        response: &str,
        reported: Option<TokenUsage>,
    ) -> Result<TokenUsage, DomainError> {
        if let Some(usage) = reported {
            debug!(total = usage.total_tokens(), "Using backend token usage");
            return Ok(usage);
        }

        let prompt_text = Message::concat(prompt);
        let prompt_tokens = self.counter.count(model.model_name(), &prompt_text)?;
        let completion_tokens = self.counter.count(model.model_name(), response)?;

        debug!(prompt_tokens, completion_tokens, "Tokenized usage");
        Ok(TokenUsage::new(prompt_tokens, completion_tokens))
    }
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Returns scripted counts per text and records every call
    #[derive(Debug, Default)]
    pub struct MockTokenCounter {
        counts: HashMap<String, u32>,
        calls: Mutex<Vec<(String, String)>>,
    }

    impl MockTokenCounter {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_count(mut self, text: &str, count: u32) -> Self {
            self.counts.insert(text.to_string(), count);
            self
        }

        pub fn calls(&self) -> Vec<(String, String)> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl TokenCounter for MockTokenCounter {
        fn count(&self, model_name: &str, text: &str) -> Result<u32, DomainError> {
            self.calls
                .lock()
                .unwrap()
                .push((model_name.to_string(), text.to_string()));
            Ok(self.counts.get(text).copied().unwrap_or(0))
        }
    }
}
