//! OpenAI chat completion 客戶端
//!
//! Speaks the `/chat/completions` wire format, which most hosted and
//! self-hosted LLM gateways accept, so pointing `api_base` elsewhere is
//! enough to switch providers.

use async_trait::async_trait;
use reqwest::Client;

use crate::domain::model::{ChatReply, ChatRequest};
use crate::domain::ports::CompletionClient;
use crate::utils::error::{Result, SiftError};

pub struct OpenAiClient {
    api_key: String,
    base_url: String,
    http: Client,
}

impl OpenAiClient {
    pub fn new(api_key: &str, base_url: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            http: Client::new(),
        }
    }
}

/// Keep error bodies short enough to read in a log line.
fn trim_error_body(mut text: String) -> String {
    const LIMIT: usize = 300;
    if text.len() > LIMIT {
        let mut end = LIMIT;
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        text.truncate(end);
    }
    text
}

#[async_trait]
impl CompletionClient for OpenAiClient {
    async fn complete(&self, request: &ChatRequest) -> Result<ChatReply> {
        let url = format!("{}/chat/completions", self.base_url);
        let mut payload = serde_json::json!({
            "model": request.model,
            "messages": [
                {"role": "system", "content": request.system},
                {"role": "user", "content": request.user},
            ],
        });
        if request.json_output {
            payload["response_format"] = serde_json::json!({"type": "json_object"});
        }

        tracing::debug!("🌐 POST {} (model={})", url, request.model);
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = trim_error_body(response.text().await.unwrap_or_default());
            return Err(SiftError::ApiStatusError {
                status: status.as_u16(),
                message,
            });
        }

        let body: serde_json::Value = response.json().await?;
        let text = body
            .pointer("/choices/0/message/content")
            .and_then(|v| v.as_str())
            .ok_or_else(|| SiftError::AnalysisError {
                stage: "completion".to_string(),
                details: "response carries no message content".to_string(),
            })?
            .to_string();
        let model = body
            .get("model")
            .and_then(|v| v.as_str())
            .unwrap_or(&request.model)
            .to_string();

        Ok(ChatReply {
            text,
            model,
            provider: "openai".to_string(),
        })
    }

    fn provider_name(&self) -> &str {
        "openai"
    }
}
