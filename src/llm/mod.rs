//! LLM gateway: the abstraction boundary to a chat-completion service.
//!
//! Callers hand over a system prompt and a user prompt and always get a
//! string back. Network, auth and timeout failures are converted to a
//! textual sentinel at this boundary instead of propagating — downstream
//! parsing code has a single uniform contract: it received *some* text,
//! which may or may not parse. The backend (local Ollama vs cloud API) is
//! selected once at startup; callers never branch on which one is active.

pub mod ollama;
pub mod openai;

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use thiserror::Error;

use crate::config::{LlmEngine, ScanConfig};

pub use ollama::OllamaGateway;
pub use openai::OpenAiGateway;

/// Chat-completion capability. Implementations are interchangeable and
/// must never panic or error out of `complete`.
pub trait LlmGateway: Send + Sync {
    /// One completion round-trip. On any backend failure the returned string
    /// is an explanatory sentinel (`"Error: ..."`), never a panic.
    fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> String;
}

/// Backend-internal failures. Converted to sentinel strings before they
/// leave the gateway.
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("cannot reach LLM backend at {0}")]
    Connection(String),

    #[error("LLM request timed out after {0}s")]
    Timeout(u64),

    #[error("LLM backend returned status {status}: {body}")]
    Api { status: u16, body: String },

    #[error("malformed LLM backend response: {0}")]
    ResponseParsing(String),

    #[error("OpenAI API key not configured — set the OPENAI_API_KEY environment variable")]
    MissingApiKey,

    #[error("HTTP client error: {0}")]
    HttpClient(String),
}

impl GatewayError {
    /// The uniform textual failure contract: downstream parsers receive
    /// this string instead of an exception.
    pub(crate) fn into_sentinel(self) -> String {
        tracing::warn!(error = %self, "LLM gateway call failed, returning sentinel response");
        format!("Error: {self}")
    }
}

/// Select the gateway implementation for the configured engine.
pub fn resolve_gateway(config: &ScanConfig) -> Arc<dyn LlmGateway> {
    match config.engine {
        LlmEngine::Local => {
            tracing::info!(
                base_url = %config.ollama_base_url,
                model = %config.ollama_model,
                "using local Ollama gateway"
            );
            Arc::new(OllamaGateway::new(
                &config.ollama_base_url,
                &config.ollama_model,
                config.llm_timeout_secs,
            ))
        }
        LlmEngine::Cloud => {
            tracing::info!(model = %config.openai_model, "using OpenAI gateway");
            Arc::new(OpenAiGateway::new(
                config.openai_api_key.clone(),
                &config.openai_model,
                config.llm_timeout_secs,
            ))
        }
    }
}

/// Scripted gateway for tests: pops queued responses in FIFO order and
/// records every call. An exhausted queue answers with the no-defects
/// sentinel so over-long test scenarios stay harmless.
#[derive(Default)]
pub struct MockGateway {
    responses: Mutex<VecDeque<String>>,
    calls: Mutex<Vec<(String, String)>>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_response(&self, response: impl Into<String>) {
        self.responses.lock().unwrap().push_back(response.into());
    }

    /// Every `(system_prompt, user_prompt)` pair seen so far.
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl LlmGateway for MockGateway {
    fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        _max_tokens: u32,
        _temperature: f32,
    ) -> String {
        self.calls
            .lock()
            .unwrap()
            .push((system_prompt.to_string(), user_prompt.to_string()));
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| "NO DEFECTS FOUND".to_string())
    }
}
