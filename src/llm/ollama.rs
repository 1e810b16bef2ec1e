//! Local Ollama backend.
//!
//! Primary path is the structured chat endpoint; if that call fails at the
//! transport level the gateway retries once against the plain completion
//! endpoint with the prompts concatenated. Only when both fail does the
//! caller see the sentinel string.

use serde::{Deserialize, Serialize};

use super::{GatewayError, LlmGateway};

pub struct OllamaGateway {
    base_url: String,
    model: String,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl OllamaGateway {
    pub fn new(base_url: &str, model: &str, timeout_secs: u64) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            client,
            timeout_secs,
        }
    }

    fn chat(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String, GatewayError> {
        let url = format!("{}/api/chat", self.base_url);
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage { role: "system", content: system_prompt.into() },
                ChatMessage { role: "user", content: user_prompt.into() },
            ],
            options: GenerationOptions {
                temperature,
                num_predict: max_tokens,
            },
            stream: false,
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .map_err(|e| self.map_transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(GatewayError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = response
            .json()
            .map_err(|e| GatewayError::ResponseParsing(e.to_string()))?;

        Ok(parsed.message.content)
    }

    /// Plain completion fallback with system and user prompt concatenated.
    fn generate(
        &self,
        prompt: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String, GatewayError> {
        let url = format!("{}/api/generate", self.base_url);
        let body = GenerateRequest {
            model: &self.model,
            prompt,
            options: GenerationOptions {
                temperature,
                num_predict: max_tokens,
            },
            stream: false,
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .map_err(|e| self.map_transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(GatewayError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateResponse = response
            .json()
            .map_err(|e| GatewayError::ResponseParsing(e.to_string()))?;

        Ok(parsed.response)
    }

    fn map_transport_error(&self, e: reqwest::Error) -> GatewayError {
        if e.is_connect() {
            GatewayError::Connection(self.base_url.clone())
        } else if e.is_timeout() {
            GatewayError::Timeout(self.timeout_secs)
        } else {
            GatewayError::HttpClient(e.to_string())
        }
    }
}

impl LlmGateway for OllamaGateway {
    fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> String {
        match self.chat(system_prompt, user_prompt, max_tokens, temperature) {
            Ok(text) => text,
            Err(chat_err) => {
                tracing::warn!(
                    error = %chat_err,
                    "Ollama chat call failed, falling back to generate endpoint"
                );
                let combined = format!("{system_prompt}\n\n{user_prompt}");
                match self.generate(&combined, max_tokens, temperature) {
                    Ok(text) => text,
                    Err(generate_err) => generate_err.into_sentinel(),
                }
            }
        }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    options: GenerationOptions,
    stream: bool,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: String,
}

#[derive(Serialize)]
struct GenerationOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: String,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    options: GenerationOptions,
    stream: bool,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}
