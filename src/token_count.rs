//! Token estimation for chunk sizing.
//!
//! An exact tokenizer would pull in a per-model vocabulary; for sizing
//! chunks a deterministic estimate is enough. Recognized model families get
//! the ~4-characters-per-token approximation their tokenizers average out
//! to; anything else falls back to a whitespace word count. The estimate is
//! monotonic in input length and never fails.

/// Model families whose tokenizers average close to 4 characters per token.
const CHAR_RATIO_FAMILIES: &[&str] = &["gpt", "llama", "mistral", "qwen", "gemma", "medgemma"];

const CHARS_PER_TOKEN: usize = 4;

/// Deterministic token counter for a fixed model identifier.
#[derive(Debug, Clone)]
pub struct TokenCounter {
    model: String,
    recognized: bool,
}

impl TokenCounter {
    pub fn new(model: &str) -> Self {
        let normalized = model.trim().to_lowercase();
        let recognized = CHAR_RATIO_FAMILIES
            .iter()
            .any(|family| normalized.starts_with(family));
        Self {
            model: model.to_string(),
            recognized,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Estimate the token count of `text`. Empty input yields 0.
    pub fn count(&self, text: &str) -> usize {
        if text.is_empty() {
            return 0;
        }
        if self.recognized {
            let chars = text.chars().count();
            chars.div_ceil(CHARS_PER_TOKEN)
        } else {
            text.split_whitespace().count()
        }
    }
}

impl Default for TokenCounter {
    fn default() -> Self {
        Self::new("llama3:8b")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_counts_zero() {
        assert_eq!(TokenCounter::new("gpt-3.5-turbo").count(""), 0);
        assert_eq!(TokenCounter::new("unknown-model").count(""), 0);
    }

    #[test]
    fn recognized_model_uses_char_ratio() {
        let counter = TokenCounter::new("gpt-4o-mini");
        // 8 chars -> ceil(8/4) = 2
        assert_eq!(counter.count("abcdefgh"), 2);
        // 9 chars -> ceil(9/4) = 3
        assert_eq!(counter.count("abcdefghi"), 3);
    }

    #[test]
    fn ollama_default_model_is_recognized() {
        let counter = TokenCounter::new("llama3:8b");
        assert_eq!(counter.count("abcd"), 1);
    }

    #[test]
    fn unrecognized_model_falls_back_to_word_count() {
        let counter = TokenCounter::new("acme-lm-7");
        assert_eq!(counter.count("three short words"), 3);
        assert_eq!(counter.count("  padded   whitespace  "), 2);
    }

    #[test]
    fn count_is_monotonic_in_length() {
        for model in ["gpt-3.5-turbo", "acme-lm-7"] {
            let counter = TokenCounter::new(model);
            let mut text = String::new();
            let mut previous = 0;
            for word in ["alpha", "beta", "gamma", "delta", "epsilon"] {
                text.push_str(word);
                text.push(' ');
                let current = counter.count(&text);
                assert!(current >= previous, "count decreased for {model}");
                previous = current;
            }
        }
    }

    #[test]
    fn count_is_deterministic() {
        let counter = TokenCounter::new("mistral-7b");
        let text = "the same input every time.";
        assert_eq!(counter.count(text), counter.count(text));
    }
}
