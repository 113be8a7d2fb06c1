//! OpenAI-compatible completion adapter.
//!
//! Works with OpenAI, DeepSeek, and any provider using the
//! OpenAI chat completions API format.
//! Uses browser `fetch()` via gloo-net for WASM compatibility.
//! Every round trip is raced against a gloo-timers timeout.

use async_trait::async_trait;
use futures::future::{self, Either};
use gloo_net::http::Request;
use gloo_timers::future::TimeoutFuture;
use serde::Deserialize;
use serde_json::{json, Value};

use chester_core::ports::*;
use chester_types::{
    ChesterError, Result,
    config::LlmConfig,
    message::{Message, Role},
};

/// Provider that speaks the OpenAI chat completions protocol.
pub struct OpenAiCompatProvider {
    config: LlmConfig,
    base_url: String,
}

impl OpenAiCompatProvider {
    pub fn new(config: LlmConfig) -> Self {
        let base_url = config.base_url().trim_end_matches('/').to_string();
        Self { config, base_url }
    }

    pub(crate) fn endpoint(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url)
    }

    pub(crate) fn build_request_body(&self, req: &ChatRequest) -> Value {
        let messages: Vec<Value> = req
            .messages
            .iter()
            .map(|m| json!({ "role": m.role, "content": m.content }))
            .collect();

        json!({
            "model": self.config.model,
            "messages": messages,
            "max_tokens": req.max_tokens.unwrap_or(self.config.max_tokens),
            "temperature": req.temperature.unwrap_or(self.config.temperature),
        })
    }

    async fn post(&self, req: ChatRequest) -> Result<ChatResponse> {
        let body = self.build_request_body(&req);
        log::debug!(
            "Completion request to {} ({} messages)",
            self.config.provider.label(),
            req.messages.len()
        );

        let response = Request::post(&self.endpoint())
            .header("Content-Type", "application/json")
            .header("Authorization", &format!("Bearer {}", self.config.api_key))
            .json(&body)
            .map_err(|e| ChesterError::Network(e.to_string()))?
            .send()
            .await
            .map_err(|e| ChesterError::Network(e.to_string()))?;

        if !response.ok() {
            let status = response.status();
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(ChesterError::Completion(format!("HTTP {}: {}", status, text)));
        }

        let data: ApiResponse = response
            .json()
            .await
            .map_err(|e| ChesterError::Completion(e.to_string()))?;
        parse_api_response(data)
    }
}

#[async_trait(?Send)]
impl CompletionPort for OpenAiCompatProvider {
    async fn chat_completion(&self, req: ChatRequest) -> Result<ChatResponse> {
        let timeout_ms = self.config.timeout_ms;
        let request = Box::pin(self.post(req));
        let timer = TimeoutFuture::new(u32::try_from(timeout_ms).unwrap_or(u32::MAX));

        match future::select(request, timer).await {
            Either::Left((result, _)) => result,
            Either::Right(((), _)) => {
                log::warn!("Completion request timed out after {}ms", timeout_ms);
                Err(ChesterError::Timeout(timeout_ms))
            }
        }
    }
}

// ─── API response types ──────────────────────────────────────

#[derive(Deserialize)]
pub(crate) struct ApiResponse {
    choices: Vec<ApiChoice>,
    usage: Option<ApiUsage>,
}

#[derive(Deserialize)]
struct ApiChoice {
    message: ApiMessage,
}

#[derive(Deserialize)]
struct ApiMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct ApiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

pub(crate) fn parse_api_response(data: ApiResponse) -> Result<ChatResponse> {
    let choice = data
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| ChesterError::Completion("No choices in response".to_string()))?;

    let usage = data.usage.map(|u| TokenUsage {
        prompt_tokens: u.prompt_tokens,
        completion_tokens: u.completion_tokens,
        total_tokens: u.total_tokens,
    });

    Ok(ChatResponse {
        message: Message {
            role: Role::Assistant,
            content: choice.message.content.unwrap_or_default(),
        },
        usage,
    })
}
