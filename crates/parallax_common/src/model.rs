//! Model-service clients.
//!
//! Two collaborator contracts: the planner proposes the next viewpoint from
//! the belief and history, the perception judge reads one rendered view.
//! Both are trait seams with a real HTTP implementation (Ollama-style API
//! first, OpenAI-compatible fallback) and a scripted fake for tests.

use crate::scene::ImageHandle;
use anyhow::Result;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use std::time::Duration;

/// Configuration for one model endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub enabled: bool,
    pub endpoint: String,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub timeout_secs: u64,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: "http://localhost:11434".to_string(),
            model: "llama3.2-vision:11b".to_string(),
            api_key: None,
            timeout_secs: 60,
            temperature: 0.3,
            max_tokens: 500,
        }
    }
}

/// Model-service errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ModelError {
    #[error("model service is disabled in configuration")]
    Disabled,

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("request timeout after {0} seconds")]
    Timeout(u64),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("model returned empty response")]
    EmptyResponse,

    #[error("unreadable image: {0}")]
    Image(String),
}

/// Viewpoint-proposing service: free text with `<think>` and `<answer>`
/// blocks, the latter holding a JSON action plan.
pub trait PlannerModel: Send + Sync {
    fn propose(&self, system_prompt: &str, user_prompt: &str) -> Result<String, ModelError>;
}

/// Per-view vision judge: free text whose `<answer>` block holds a sign
/// tuple scoped to the requested axes.
pub trait PerceptionModel: Send + Sync {
    fn judge(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        image: &ImageHandle,
    ) -> Result<String, ModelError>;
}

/// Real client over HTTP.
pub struct HttpChatModel {
    config: ModelConfig,
    client: reqwest::blocking::Client,
}

impl HttpChatModel {
    pub fn new(config: ModelConfig) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to create HTTP client: {}", e))?;

        Ok(Self { config, client })
    }

    /// Check if endpoint is Ollama-style.
    fn is_ollama_endpoint(&self) -> bool {
        self.config.endpoint.contains("11434") || self.config.endpoint.contains("ollama")
    }

    fn chat(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        image: Option<&ImageHandle>,
    ) -> Result<String, ModelError> {
        if !self.config.enabled {
            return Err(ModelError::Disabled);
        }

        if self.is_ollama_endpoint() {
            match self.call_ollama(system_prompt, user_prompt, image) {
                Ok(text) => return Ok(text),
                Err(e) => {
                    tracing::debug!("Ollama API failed, trying OpenAI-compatible: {}", e);
                }
            }
        }

        self.call_openai_compatible(system_prompt, user_prompt, image)
    }

    /// Ollama-style `/api/generate`. Vision input rides in the `images`
    /// array as raw base64.
    fn call_ollama(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        image: Option<&ImageHandle>,
    ) -> Result<String, ModelError> {
        let url = format!("{}/api/generate", self.config.endpoint);

        let mut request_body = serde_json::json!({
            "model": self.config.model,
            "system": system_prompt,
            "prompt": user_prompt,
            "stream": false,
            "options": {
                "temperature": self.config.temperature,
                "num_predict": self.config.max_tokens,
            },
        });
        if let Some(handle) = image {
            let (b64, _) = encode_image(handle)?;
            request_body["images"] = serde_json::json!([b64]);
        }

        let response = self
            .client
            .post(&url)
            .json(&request_body)
            .send()
            .map_err(|e| self.transport_error(e))?;

        if !response.status().is_success() {
            return Err(ModelError::Http(format!(
                "HTTP {} from Ollama",
                response.status()
            )));
        }

        let response_json: serde_json::Value = response
            .json()
            .map_err(|e| ModelError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        let text = response_json
            .get("response")
            .and_then(|v| v.as_str())
            .ok_or(ModelError::EmptyResponse)?;

        Ok(text.trim().to_string())
    }

    /// OpenAI-compatible `/v1/chat/completions`. Vision input rides as an
    /// `image_url` content part with a base64 data URL.
    fn call_openai_compatible(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        image: Option<&ImageHandle>,
    ) -> Result<String, ModelError> {
        let url = format!("{}/v1/chat/completions", self.config.endpoint);

        let user_content = match image {
            Some(handle) => {
                let (b64, mime) = encode_image(handle)?;
                serde_json::json!([
                    {"type": "text", "text": user_prompt},
                    {"type": "image_url", "image_url": {"url": format!("data:{mime};base64,{b64}")}},
                ])
            }
            None => serde_json::json!(user_prompt),
        };

        let request_body = serde_json::json!({
            "model": self.config.model,
            "messages": [
                {"role": "system", "content": system_prompt},
                {"role": "user", "content": user_content},
            ],
            "temperature": self.config.temperature,
            "max_tokens": self.config.max_tokens,
        });

        let mut request = self.client.post(&url).json(&request_body);
        if let Some(api_key) = &self.config.api_key {
            request = request.bearer_auth(api_key);
        }

        let response = request.send().map_err(|e| self.transport_error(e))?;

        if !response.status().is_success() {
            return Err(ModelError::Http(format!(
                "HTTP {} from OpenAI-compatible API",
                response.status()
            )));
        }

        let response_json: serde_json::Value = response
            .json()
            .map_err(|e| ModelError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        let text = response_json
            .get("choices")
            .and_then(|v| v.get(0))
            .and_then(|v| v.get("message"))
            .and_then(|v| v.get("content"))
            .and_then(|v| v.as_str())
            .ok_or(ModelError::EmptyResponse)?;

        Ok(text.trim().to_string())
    }

    fn transport_error(&self, e: reqwest::Error) -> ModelError {
        if e.is_timeout() {
            ModelError::Timeout(self.config.timeout_secs)
        } else {
            ModelError::Http(format!("Request failed: {}", e))
        }
    }
}

impl PlannerModel for HttpChatModel {
    fn propose(&self, system_prompt: &str, user_prompt: &str) -> Result<String, ModelError> {
        self.chat(system_prompt, user_prompt, None)
    }
}

impl PerceptionModel for HttpChatModel {
    fn judge(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        image: &ImageHandle,
    ) -> Result<String, ModelError> {
        self.chat(system_prompt, user_prompt, Some(image))
    }
}

/// Read an image handle into `(base64, mime)`.
fn encode_image(handle: &ImageHandle) -> Result<(String, &'static str), ModelError> {
    let bytes = handle
        .read()
        .map_err(|e| ModelError::Image(format!("{}: {}", handle.path().display(), e)))?;
    let mime = match handle
        .path()
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    };
    Ok((BASE64.encode(bytes), mime))
}

/// Fake model for testing: serves a scripted list of responses to both
/// collaborator traits.
pub struct FakeModel {
    responses: Mutex<Vec<Result<String, ModelError>>>,
    cycling: bool,
    call_count: Mutex<usize>,
}

impl FakeModel {
    /// Responses are consumed in order; the last one repeats.
    pub fn new(responses: Vec<Result<String, ModelError>>) -> Self {
        Self {
            responses: Mutex::new(responses),
            cycling: false,
            call_count: Mutex::new(0),
        }
    }

    /// Always return the same text.
    pub fn always(text: &str) -> Self {
        Self::new(vec![Ok(text.to_string())])
    }

    /// Always return the same error.
    pub fn always_error(error: ModelError) -> Self {
        Self::new(vec![Err(error)])
    }

    /// Cycle through the given texts forever.
    pub fn cycling(texts: &[&str]) -> Self {
        Self {
            responses: Mutex::new(texts.iter().map(|t| Ok(t.to_string())).collect()),
            cycling: true,
            call_count: Mutex::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }

    fn next(&self) -> Result<String, ModelError> {
        let mut count = self.call_count.lock().unwrap();
        *count += 1;

        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            return Err(ModelError::EmptyResponse);
        }
        if self.cycling {
            responses[(*count - 1) % responses.len()].clone()
        } else if responses.len() == 1 {
            responses[0].clone()
        } else {
            responses.remove(0)
        }
    }
}

impl PlannerModel for FakeModel {
    fn propose(&self, _system_prompt: &str, _user_prompt: &str) -> Result<String, ModelError> {
        self.next()
    }
}

impl PerceptionModel for FakeModel {
    fn judge(
        &self,
        _system_prompt: &str,
        _user_prompt: &str,
        _image: &ImageHandle,
    ) -> Result<String, ModelError> {
        self.next()
    }
}
