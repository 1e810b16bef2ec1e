//! Runtime configuration for the defect scan pipeline.
//!
//! All values are resolved once at startup (environment variables with
//! defaults) and are read-only afterwards. The engine switch mirrors the
//! deployment reality: a local Ollama instance for development, an
//! OpenAI-compatible endpoint for hosted runs.

use serde::Serialize;

/// Which LLM backend the gateway talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LlmEngine {
    /// Local Ollama instance.
    Local,
    /// OpenAI-compatible cloud API.
    Cloud,
}

/// Pipeline configuration, read-only after construction.
#[derive(Debug, Clone, Serialize)]
pub struct ScanConfig {
    pub engine: LlmEngine,
    /// API key for the cloud backend. Absence is tolerated at startup;
    /// the gateway degrades to a sentinel response at call time.
    #[serde(skip_serializing)]
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub ollama_base_url: String,
    pub ollama_model: String,
    /// Target token budget per chunk handed to the extractor.
    pub chunk_max_tokens: usize,
    /// Hard ceiling applied to chunk text right before prompting,
    /// independent of the chunker's target size.
    pub prompt_token_ceiling: usize,
    /// At most this many chunks are processed per document; the rest are
    /// skipped and the skip count logged.
    pub max_chunks_per_document: usize,
    pub llm_timeout_secs: u64,
    /// `max_tokens` passed to the completion call.
    pub max_response_tokens: u32,
    pub temperature: f32,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            engine: LlmEngine::Local,
            openai_api_key: None,
            openai_model: "gpt-3.5-turbo".into(),
            ollama_base_url: "http://localhost:11434".into(),
            ollama_model: "llama3:8b".into(),
            chunk_max_tokens: 400,
            prompt_token_ceiling: 500,
            max_chunks_per_document: 10,
            llm_timeout_secs: 300,
            max_response_tokens: 1000,
            temperature: 0.3,
        }
    }
}

impl ScanConfig {
    /// Build a config from environment variables, falling back to defaults
    /// for anything unset or unparseable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            engine: parse_engine(std::env::var("LLM_ENGINE").ok().as_deref()),
            openai_api_key: std::env::var("OPENAI_API_KEY").ok().filter(|k| !k.is_empty()),
            openai_model: env_or("OPENAI_MODEL", &defaults.openai_model),
            ollama_base_url: env_or("OLLAMA_BASE_URL", &defaults.ollama_base_url),
            ollama_model: env_or("OLLAMA_MODEL", &defaults.ollama_model),
            chunk_max_tokens: env_parse("SCAN_CHUNK_MAX_TOKENS", defaults.chunk_max_tokens),
            prompt_token_ceiling: env_parse("SCAN_PROMPT_TOKEN_CEILING", defaults.prompt_token_ceiling),
            max_chunks_per_document: env_parse("SCAN_MAX_CHUNKS", defaults.max_chunks_per_document),
            llm_timeout_secs: env_parse("SCAN_LLM_TIMEOUT_SECS", defaults.llm_timeout_secs),
            max_response_tokens: env_parse("SCAN_MAX_RESPONSE_TOKENS", defaults.max_response_tokens),
            temperature: env_parse("SCAN_TEMPERATURE", defaults.temperature),
        }
    }

    /// Model identifier for the active engine, used to size token estimates.
    pub fn active_model(&self) -> &str {
        match self.engine {
            LlmEngine::Local => &self.ollama_model,
            LlmEngine::Cloud => &self.openai_model,
        }
    }
}

/// `LLM_ENGINE` semantics: "openai"/"cloud" select the cloud backend,
/// anything else (including unset) stays local.
fn parse_engine(value: Option<&str>) -> LlmEngine {
    match value.map(|v| v.trim().to_lowercase()).as_deref() {
        Some("openai") | Some("cloud") => LlmEngine::Cloud,
        _ => LlmEngine::Local,
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).ok().filter(|v| !v.is_empty()).unwrap_or_else(|| default.to_string())
}

fn env_parse<T: std::str::FromStr + Copy>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_engine_is_local() {
        let config = ScanConfig::default();
        assert_eq!(config.engine, LlmEngine::Local);
        assert_eq!(config.ollama_base_url, "http://localhost:11434");
        assert_eq!(config.ollama_model, "llama3:8b");
    }

    #[test]
    fn engine_parsing_openai_variants() {
        assert_eq!(parse_engine(Some("openai")), LlmEngine::Cloud);
        assert_eq!(parse_engine(Some("OpenAI")), LlmEngine::Cloud);
        assert_eq!(parse_engine(Some("cloud")), LlmEngine::Cloud);
    }

    #[test]
    fn engine_parsing_defaults_to_local() {
        assert_eq!(parse_engine(None), LlmEngine::Local);
        assert_eq!(parse_engine(Some("local")), LlmEngine::Local);
        assert_eq!(parse_engine(Some("ollama")), LlmEngine::Local);
        assert_eq!(parse_engine(Some("")), LlmEngine::Local);
    }

    #[test]
    fn active_model_follows_engine() {
        let mut config = ScanConfig::default();
        assert_eq!(config.active_model(), "llama3:8b");
        config.engine = LlmEngine::Cloud;
        assert_eq!(config.active_model(), "gpt-3.5-turbo");
    }

    #[test]
    fn api_key_not_serialized() {
        let config = ScanConfig {
            openai_api_key: Some("sk-secret".into()),
            ..ScanConfig::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("sk-secret"));
        assert!(json.contains("\"engine\":\"local\""));
    }

    #[test]
    fn chunk_budget_below_prompt_ceiling() {
        let config = ScanConfig::default();
        assert!(config.chunk_max_tokens <= config.prompt_token_ceiling);
    }
}
