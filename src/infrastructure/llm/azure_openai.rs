use std::collections::VecDeque;

use async_trait::async_trait;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::domain::{
    DomainError, FinishReason, LlmProvider, LlmRequest, LlmResponse, LlmStream, Message,
    MessageRole, StreamChunk, TokenUsage,
};
use crate::infrastructure::http_client::HttpClientTrait;

pub const DEFAULT_API_VERSION: &str = "2024-02-01";

/// Azure OpenAI API configuration
#[derive(Debug, Clone)]
pub struct AzureOpenAiConfig {
    pub endpoint: String,
    pub api_key: String,
    pub api_version: String,
}

impl AzureOpenAiConfig {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            api_version: DEFAULT_API_VERSION.to_string(),
        }
    }

    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    /// URL of a deployment operation such as `chat/completions` or `embeddings`
    pub fn deployment_url(&self, deployment: &str, operation: &str) -> String {
        format!(
            "{}/openai/deployments/{}/{}?api-version={}",
            self.endpoint.trim_end_matches('/'),
            deployment,
            operation,
            self.api_version
        )
    }

    pub fn headers(&self) -> Vec<(&str, &str)> {
        vec![
            ("api-key", self.api_key.as_str()),
            ("Content-Type", "application/json"),
        ]
    }
}

/// Azure OpenAI chat completion provider
#[derive(Debug)]
pub struct AzureOpenAiProvider<C: HttpClientTrait> {
    client: C,
    config: AzureOpenAiConfig,
}

impl<C: HttpClientTrait> AzureOpenAiProvider<C> {
    pub fn new(client: C, config: AzureOpenAiConfig) -> Self {
        Self { client, config }
    }

    fn build_url(&self, deployment: &str) -> String {
        self.config.deployment_url(deployment, "chat/completions")
    }

    fn build_request(&self, request: &LlmRequest) -> serde_json::Value {
        let messages: Vec<AzureMessage> = request.messages.iter().map(AzureMessage::from).collect();

        let mut body = serde_json::json!({
            "messages": messages,
            "stream": request.stream,
        });

        if let Some(temp) = request.temperature {
            body["temperature"] = serde_json::json!(temp);
        }

        if let Some(max_tokens) = request.max_tokens {
            body["max_tokens"] = serde_json::json!(max_tokens);
        }

        body
    }

    fn parse_response(&self, json: serde_json::Value) -> Result<LlmResponse, DomainError> {
        let response: AzureResponse = serde_json::from_value(json).map_err(|e| {
            DomainError::provider("azure_openai", format!("Failed to parse response: {}", e))
        })?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| DomainError::provider("azure_openai", "No choices in response"))?;

        let message = Message::assistant(choice.message.content.unwrap_or_default());

        let mut llm_response = LlmResponse::new(response.id, response.model, message);

        if let Some(reason) = choice.finish_reason {
            llm_response = llm_response.with_finish_reason(parse_finish_reason(&reason));
        }

        if let Some(usage) = response.usage {
            llm_response =
                llm_response.with_usage(TokenUsage::new(usage.prompt_tokens, usage.completion_tokens));
        }

        Ok(llm_response)
    }
}

#[async_trait]
impl<C: HttpClientTrait> LlmProvider for AzureOpenAiProvider<C> {
    async fn chat(&self, deployment: &str, request: LlmRequest) -> Result<LlmResponse, DomainError> {
        let mut req = request;
        req.stream = false;

        let url = self.build_url(deployment);
        let body = self.build_request(&req);

        let response = self
            .client
            .post_json(&url, self.config.headers(), &body)
            .await?;

        self.parse_response(response)
    }

    async fn chat_stream(
        &self,
        deployment: &str,
        request: LlmRequest,
    ) -> Result<LlmStream, DomainError> {
        let mut req = request;
        req.stream = true;

        let url = self.build_url(deployment);
        let body = self.build_request(&req);

        let byte_stream = self
            .client
            .post_json_stream(&url, self.config.headers(), &body)
            .await?;

        let state = (byte_stream, SseDecoder::new(deployment), VecDeque::new(), false);
        let stream = futures::stream::unfold(
            state,
            |(mut bytes, mut decoder, mut pending, mut done)| async move {
                loop {
                    if let Some(item) = pending.pop_front() {
                        return Some((item, (bytes, decoder, pending, done)));
                    }

                    if done {
                        return None;
                    }

                    match bytes.next().await {
                        Some(Ok(chunk)) => pending.extend(decoder.push(&chunk)),
                        Some(Err(e)) => {
                            pending.push_back(Err(e));
                            done = true;
                        }
                        None => {
                            pending.extend(decoder.finish());
                            done = true;
                        }
                    }
                }
            },
        );

        Ok(Box::pin(stream))
    }

    fn provider_name(&self) -> &'static str {
        "azure_openai"
    }
}

/// Incremental decoder for server-sent events.
///
/// Network reads may split an event across chunks or carry several events
/// at once; complete lines are decoded and the remainder is buffered.
#[derive(Debug)]
struct SseDecoder {
    model: String,
    buffer: Vec<u8>,
    finished: bool,
}

impl SseDecoder {
    fn new(model: &str) -> Self {
        Self {
            model: model.to_string(),
            buffer: Vec::new(),
            finished: false,
        }
    }

    fn push(&mut self, bytes: &[u8]) -> Vec<Result<StreamChunk, DomainError>> {
        self.buffer.extend_from_slice(bytes);
        let mut chunks = Vec::new();

        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&line);

            if let Some(chunk) = self.decode_line(line.trim_end()) {
                chunks.push(chunk);
            }
        }

        chunks
    }

    fn finish(&mut self) -> Vec<Result<StreamChunk, DomainError>> {
        let rest = std::mem::take(&mut self.buffer);
        let line = String::from_utf8_lossy(&rest);

        self.decode_line(line.trim_end()).into_iter().collect()
    }

    fn decode_line(&mut self, line: &str) -> Option<Result<StreamChunk, DomainError>> {
        if self.finished {
            return None;
        }

        let data = line.strip_prefix("data:")?.trim_start();

        if data == "[DONE]" {
            self.finished = true;
            return Some(Ok(StreamChunk::new(String::new(), self.model.clone())
                .with_finish_reason(FinishReason::Stop)));
        }

        let chunk = match serde_json::from_str::<AzureStreamChunk>(data) {
            Ok(chunk) => chunk,
            Err(e) => {
                warn!(error = %e, "Skipping malformed stream event");
                return None;
            }
        };

        // Content filter preambles arrive with no choices
        let choice = chunk.choices.into_iter().next()?;
        let model = chunk.model.filter(|m| !m.is_empty()).unwrap_or_else(|| self.model.clone());
        let mut stream_chunk = StreamChunk::new(chunk.id, model);

        if let Some(delta) = choice.delta.and_then(|d| d.content) {
            stream_chunk = stream_chunk.with_delta(delta);
        }

        if let Some(reason) = choice.finish_reason {
            stream_chunk = stream_chunk.with_finish_reason(parse_finish_reason(&reason));
        }

        Some(Ok(stream_chunk))
    }
}

fn parse_finish_reason(reason: &str) -> FinishReason {
    match reason {
        "length" => FinishReason::Length,
        "content_filter" => FinishReason::ContentFilter,
        _ => FinishReason::Stop,
    }
}

// Azure OpenAI wire types

#[derive(Debug, Serialize)]
struct AzureMessage {
    role: &'static str,
    content: String,
}

impl From<&Message> for AzureMessage {
    fn from(message: &Message) -> Self {
        let role = match message.role {
            MessageRole::System => "system",
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        };

        Self {
            role,
            content: message.content.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct AzureResponse {
    id: String,
    model: String,
    choices: Vec<AzureChoice>,
    usage: Option<AzureUsage>,
}

#[derive(Debug, Deserialize)]
struct AzureChoice {
    message: AzureResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AzureResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AzureUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct AzureStreamChunk {
    #[serde(default)]
    id: String,
    model: Option<String>,
    #[serde(default)]
    choices: Vec<AzureStreamChoice>,
}

#[derive(Debug, Deserialize)]
struct AzureStreamChoice {
    delta: Option<AzureDelta>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AzureDelta {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::http_client::mock::MockHttpClient;
    use bytes::Bytes;

    const ENDPOINT: &str = "https://myresource.openai.azure.com";
    const CHAT_URL: &str = "https://myresource.openai.azure.com/openai/deployments/gpt-4o/chat/completions?api-version=2024-02-01";

    fn provider(client: MockHttpClient) -> AzureOpenAiProvider<MockHttpClient> {
        AzureOpenAiProvider::new(client, AzureOpenAiConfig::new(ENDPOINT, "test-api-key"))
    }

    fn sse(events: &[&str]) -> String {
        events.iter().map(|e| format!("data: {}\n\n", e)).collect()
    }

    fn delta(id: &str, content: &str) -> String {
        serde_json::json!({
            "id": id,
            "model": "gpt-4o",
            "choices": [{"delta": {"content": content}, "finish_reason": null}]
        })
        .to_string()
    }

    #[tokio::test]
    async fn test_azure_openai_chat() {
        let mock_response = serde_json::json!({
            "id": "chatcmpl-123",
            "model": "gpt-4o",
            "choices": [{
                "message": {"role": "assistant", "content": "Hello from Azure!"},
                "finish_reason": "stop"
            }],
            "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}
        });

        let provider = provider(MockHttpClient::new().with_response(CHAT_URL, mock_response));
        let request = LlmRequest::new(vec![Message::user("Hello!")]);

        let response = provider.chat("gpt-4o", request).await.unwrap();

        assert_eq!(response.content(), "Hello from Azure!");
        assert_eq!(response.finish_reason, Some(FinishReason::Stop));
        assert_eq!(response.usage, Some(TokenUsage::new(10, 5)));
    }

    #[tokio::test]
    async fn test_chat_without_usage() {
        let mock_response = serde_json::json!({
            "id": "chatcmpl-124",
            "model": "gpt-4o",
            "choices": [{"message": {"content": "Hi"}, "finish_reason": "stop"}]
        });

        let provider = provider(MockHttpClient::new().with_response(CHAT_URL, mock_response));
        let response = provider
            .chat("gpt-4o", LlmRequest::new(vec![Message::user("Hi")]))
            .await
            .unwrap();

        assert!(response.usage.is_none());
    }

    #[tokio::test]
    async fn test_url_building() {
        let config = AzureOpenAiConfig::new("https://myresource.openai.azure.com/", "key")
            .with_api_version("2024-06-01");

        let provider = AzureOpenAiProvider::new(MockHttpClient::new(), config);

        assert_eq!(
            provider.build_url("my-deployment"),
            "https://myresource.openai.azure.com/openai/deployments/my-deployment/chat/completions?api-version=2024-06-01"
        );
    }

    #[tokio::test]
    async fn test_stream_keeps_every_event_of_a_read() {
        // Two deltas in one network read, then one event split across reads
        let body = sse(&[&delta("1", "Hel"), &delta("1", "lo"), &delta("1", " world"), "[DONE]"]);
        let split = body.find(" world").unwrap();
        let chunks = vec![
            Bytes::from(body[..split].to_string()),
            Bytes::from(body[split..].to_string()),
        ];

        let provider = provider(MockHttpClient::new().with_stream_response(CHAT_URL, chunks));
        let stream = provider
            .chat_stream("gpt-4o", LlmRequest::new(vec![Message::user("hi")]))
            .await
            .unwrap();

        let chunks: Vec<StreamChunk> = stream.map(|c| c.unwrap()).collect().await;
        let text: String = chunks.iter().filter_map(|c| c.delta.clone()).collect();

        assert_eq!(text, "Hello world");
        assert_eq!(chunks.last().unwrap().finish_reason, Some(FinishReason::Stop));
    }

    #[tokio::test]
    async fn test_stream_skips_empty_choice_preamble() {
        let preamble = serde_json::json!({"id": "", "model": "", "choices": [], "prompt_filter_results": []});
        let body = sse(&[&preamble.to_string(), &delta("1", "ok"), "[DONE]"]);

        let provider = provider(
            MockHttpClient::new().with_stream_response(CHAT_URL, vec![Bytes::from(body)]),
        );
        let stream = provider
            .chat_stream("gpt-4o", LlmRequest::new(vec![Message::user("hi")]))
            .await
            .unwrap();

        let deltas: Vec<String> = stream
            .filter_map(|c| async move { c.ok().and_then(|c| c.delta) })
            .collect()
            .await;

        assert_eq!(deltas, vec!["ok".to_string()]);
    }

    #[test]
    fn test_decoder_flushes_unterminated_last_line() {
        let mut decoder = SseDecoder::new("gpt-4o");
        let line = format!("data: {}", delta("1", "tail"));

        assert!(decoder.push(line.as_bytes()).is_empty());

        let rest = decoder.finish();
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0].as_ref().unwrap().delta.as_deref(), Some("tail"));
    }
}
