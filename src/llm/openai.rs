//! Cloud backend: OpenAI-compatible chat completions.
//!
//! A missing API key is tolerated until call time, where it degrades to the
//! same sentinel contract as any network failure — startup never refuses to
//! construct the gateway.

use serde::{Deserialize, Serialize};

use super::{GatewayError, LlmGateway};

const OPENAI_API_BASE: &str = "https://api.openai.com/v1";

pub struct OpenAiGateway {
    api_key: Option<String>,
    model: String,
    base_url: String,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl OpenAiGateway {
    pub fn new(api_key: Option<String>, model: &str, timeout_secs: u64) -> Self {
        Self::with_base_url(api_key, model, OPENAI_API_BASE, timeout_secs)
    }

    /// Custom base URL, for OpenAI-compatible proxies.
    pub fn with_base_url(
        api_key: Option<String>,
        model: &str,
        base_url: &str,
        timeout_secs: u64,
    ) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            api_key,
            model: model.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            timeout_secs,
        }
    }

    fn chat_completion(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String, GatewayError> {
        let api_key = self.api_key.as_deref().ok_or(GatewayError::MissingApiKey)?;

        let url = format!("{}/chat/completions", self.base_url);
        let body = ChatCompletionRequest {
            model: &self.model,
            messages: vec![
                RequestMessage { role: "system", content: system_prompt },
                RequestMessage { role: "user", content: user_prompt },
            ],
            max_tokens,
            temperature,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .map_err(|e| {
                if e.is_connect() {
                    GatewayError::Connection(self.base_url.clone())
                } else if e.is_timeout() {
                    GatewayError::Timeout(self.timeout_secs)
                } else {
                    GatewayError::HttpClient(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(GatewayError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .map_err(|e| GatewayError::ResponseParsing(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content.trim().to_string())
            .ok_or_else(|| GatewayError::ResponseParsing("response contained no choices".into()))
    }
}

impl LlmGateway for OpenAiGateway {
    fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> String {
        match self.chat_completion(system_prompt, user_prompt, max_tokens, temperature) {
            Ok(text) => text,
            Err(e) => e.into_sentinel(),
        }
    }
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<RequestMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct RequestMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ResponseChoice>,
}

#[derive(Deserialize)]
struct ResponseChoice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: String,
}
