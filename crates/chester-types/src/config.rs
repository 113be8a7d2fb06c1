use serde::{Deserialize, Serialize};

use crate::{ChesterError, Result};

/// Top-level client configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChesterConfig {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub chat: ChatConfig,
}

impl ChesterConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Credentials baked in at build time, the way the mobile bundle receives them.
    pub fn from_build_env() -> Self {
        let mut config = Self::default();
        if let Some(url) = option_env!("CHESTER_BACKEND_URL") {
            config.backend.url = url.to_string();
        }
        if let Some(key) = option_env!("CHESTER_BACKEND_KEY") {
            config.backend.anon_key = key.to_string();
        }
        if let Some(key) = option_env!("CHESTER_OPENAI_API_KEY") {
            config.llm.api_key = key.to_string();
        }
        config
    }

    pub fn validate(&self) -> Result<()> {
        if self.backend.url.trim().is_empty() {
            return Err(ChesterError::Config("backend.url is not set".to_string()));
        }
        if self.backend.anon_key.trim().is_empty() {
            return Err(ChesterError::Config("backend.anon_key is not set".to_string()));
        }
        if self.llm.api_key.trim().is_empty() {
            return Err(ChesterError::Config("llm.api_key is not set".to_string()));
        }
        if self.llm.provider == LlmProvider::Custom && self.llm.api_base.is_none() {
            return Err(ChesterError::Config(
                "llm.api_base is required for a custom provider".to_string(),
            ));
        }
        if self.chat.title_max_chars == 0 {
            return Err(ChesterError::Config(
                "chat.title_max_chars must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Backend-as-a-service endpoint (REST tables + auth)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BackendConfig {
    pub url: String,
    pub anon_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub provider: LlmProvider,
    pub model: String,
    pub api_key: String,
    pub api_base: Option<String>,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Upper bound on one completion round trip
    pub timeout_ms: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::OpenAI,
            model: "gpt-4o-mini".to_string(),
            api_key: String::new(),
            api_base: None,
            max_tokens: 512,
            temperature: 0.7,
            timeout_ms: 30_000,
        }
    }
}

impl LlmConfig {
    pub fn base_url(&self) -> String {
        self.api_base
            .clone()
            .unwrap_or_else(|| self.provider.default_base_url().to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LlmProvider {
    OpenAI,
    DeepSeek,
    Custom,
}

impl LlmProvider {
    pub fn default_base_url(&self) -> &str {
        match self {
            LlmProvider::OpenAI => "https://api.openai.com",
            LlmProvider::DeepSeek => "https://api.deepseek.com",
            LlmProvider::Custom => "",
        }
    }

    pub fn label(&self) -> &str {
        match self {
            LlmProvider::OpenAI => "OpenAI",
            LlmProvider::DeepSeek => "DeepSeek",
            LlmProvider::Custom => "Custom",
        }
    }
}

/// Conversation behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Persona prompt sent ahead of every user turn
    pub system_prompt: String,
    pub title_max_chars: usize,
    pub default_mood: String,
    /// Shown in the transcript when the completion service fails
    pub fallback_reply: String,
    /// Zero-message sessions younger than this survive list cleanup
    pub provisional_grace_secs: u64,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            title_max_chars: 40,
            default_mood: "neutral".to_string(),
            fallback_reply: "Sorry, something went wrong...".to_string(),
            provisional_grace_secs: 120,
        }
    }
}

const DEFAULT_SYSTEM_PROMPT: &str = r#"You are Chester, a warm and attentive journaling companion.
The person you are talking with is reflecting on their day and their feelings.

Listen first. Reflect back what you hear in plain, gentle language.
Ask at most one open question at a time to help them go deeper.
Do not diagnose, lecture, or give medical advice. If they mention being
in danger, encourage them to reach out to local emergency services or a
crisis line.

Keep replies short: two to four sentences.
"#;
