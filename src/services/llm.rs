use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use url::Url;

/// Client for the LLM chat-completion APIs that generate quiz questions.
///
/// Providers are tried in configuration order; the first one that returns a
/// usable completion wins.
#[derive(Debug)]
pub struct LlmService {
    http_client: Client,
    providers: Vec<ProviderConfig>,
}

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Invalid provider URL: {0}")]
    Url(#[from] url::ParseError),
    /// The provider answered with a non-success status.
    #[error("Provider error ({status}): {message}")]
    Provider { status: u16, message: String },
    /// No provider has an API key configured.
    #[error("No LLM provider configured")]
    NoProvider,
    /// The provider answered but the completion was empty or too short to
    /// contain a question.
    #[error("Empty response from provider")]
    EmptyResponse,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ProviderKind {
    OpenAi,
    Anthropic,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Anthropic => "anthropic",
        }
    }
}

#[derive(Clone, Debug)]
pub struct ProviderConfig {
    pub kind: ProviderKind,
    pub api_key: String,
    pub base_url: Url,
    pub model: String,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: String,
}

#[derive(Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicBlock>,
}

#[derive(Deserialize)]
struct AnthropicBlock {
    #[serde(default)]
    text: String,
}

impl LlmService {
    /// Build from environment, registering each provider that has a key.
    pub fn from_env() -> Result<Self, LlmError> {
        let mut providers = Vec::new();

        if let Ok(api_key) = dotenvy::var("OPENAI_API_KEY") {
            let base = dotenvy::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1/".to_string());
            providers.push(ProviderConfig {
                kind: ProviderKind::OpenAi,
                api_key,
                base_url: Url::parse(&base)?,
                model: dotenvy::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string()),
            });
        }

        if let Ok(api_key) = dotenvy::var("ANTHROPIC_API_KEY") {
            let base = dotenvy::var("ANTHROPIC_BASE_URL")
                .unwrap_or_else(|_| "https://api.anthropic.com/v1/".to_string());
            providers.push(ProviderConfig {
                kind: ProviderKind::Anthropic,
                api_key,
                base_url: Url::parse(&base)?,
                model: dotenvy::var("ANTHROPIC_MODEL")
                    .unwrap_or_else(|_| "claude-3-5-haiku-latest".to_string()),
            });
        }

        tracing::info!(
            "[LLM] Configured providers: {:?}",
            providers.iter().map(|p| p.kind.as_str()).collect::<Vec<_>>()
        );

        Ok(LlmService {
            http_client: Client::new(),
            providers,
        })
    }

    /// Build with an explicit provider list. Used by the test suites to
    /// point at a mock server.
    pub fn with_providers(providers: Vec<ProviderConfig>) -> Self {
        LlmService {
            http_client: Client::new(),
            providers,
        }
    }

    pub fn is_available(&self) -> bool {
        !self.providers.is_empty()
    }

    /// Generate a completion for the prompt, falling through the configured
    /// providers until one answers.
    pub async fn generate_text(&self, prompt: &str) -> Result<String, LlmError> {
        if self.providers.is_empty() {
            return Err(LlmError::NoProvider);
        }

        let mut last_error = LlmError::NoProvider;
        for provider in &self.providers {
            let result = match provider.kind {
                ProviderKind::OpenAi => self.generate_openai(provider, prompt).await,
                ProviderKind::Anthropic => self.generate_anthropic(provider, prompt).await,
            };

            match result {
                Ok(text) if !text.trim().is_empty() => return Ok(text),
                Ok(_) => last_error = LlmError::EmptyResponse,
                Err(e) => {
                    tracing::warn!("[LLM] Provider {} failed: {}", provider.kind.as_str(), e);
                    last_error = e;
                }
            }
        }

        Err(last_error)
    }

    async fn generate_openai(
        &self,
        provider: &ProviderConfig,
        prompt: &str,
    ) -> Result<String, LlmError> {
        let url = provider.base_url.join("chat/completions")?;

        let response = self
            .http_client
            .post(url)
            .bearer_auth(&provider.api_key)
            .json(&json!({
                "model": provider.model,
                "messages": [{"role": "user", "content": prompt}],
                "max_tokens": 2048,
                "temperature": 0.7,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(LlmError::Provider {
                status: response.status().as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        let completion: ChatCompletionResponse = response.json().await?;
        completion
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or(LlmError::EmptyResponse)
    }

    async fn generate_anthropic(
        &self,
        provider: &ProviderConfig,
        prompt: &str,
    ) -> Result<String, LlmError> {
        let url = provider.base_url.join("messages")?;

        let response = self
            .http_client
            .post(url)
            .header("x-api-key", &provider.api_key)
            .header("anthropic-version", "2023-06-01")
            .json(&json!({
                "model": provider.model,
                "max_tokens": 2048,
                "messages": [{"role": "user", "content": prompt}],
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(LlmError::Provider {
                status: response.status().as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        let completion: AnthropicResponse = response.json().await?;
        completion
            .content
            .into_iter()
            .next()
            .map(|block| block.text)
            .ok_or(LlmError::EmptyResponse)
    }
}
