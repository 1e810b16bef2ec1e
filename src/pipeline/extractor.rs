//! Per-chunk defect extraction.
//!
//! One extraction is one gateway round-trip: bound the chunk text, build the
//! prompt, complete, interpret. The interpretation never fails — a sentinel
//! "no defects" answer yields nothing, a well-formed answer yields records,
//! and anything unrecognizable yields exactly one synthetic record so the
//! chunk's output is never silently lost.

use std::sync::Arc;

use crate::config::ScanConfig;
use crate::llm::LlmGateway;
use crate::token_count::TokenCounter;

use super::parser::{parse_defect_response, BlockContext};
use super::prompt::{build_extraction_prompt, EXTRACTION_SYSTEM_PROMPT, NO_DEFECTS_SENTINEL};
use super::types::{truncate_chars, Chunk, Confidence, DefectRecord};

/// Cap on the evidence carried by a synthetic fallback record.
const FALLBACK_EVIDENCE_CAP: usize = 500;

pub struct DefectExtractor {
    gateway: Arc<dyn LlmGateway>,
    counter: TokenCounter,
    prompt_token_ceiling: usize,
    max_response_tokens: u32,
    temperature: f32,
}

impl DefectExtractor {
    pub fn new(gateway: Arc<dyn LlmGateway>, config: &ScanConfig) -> Self {
        Self {
            gateway,
            counter: TokenCounter::new(config.active_model()),
            prompt_token_ceiling: config.prompt_token_ceiling,
            max_response_tokens: config.max_response_tokens,
            temperature: config.temperature,
        }
    }

    /// Extract every defect mentioned in one chunk.
    pub fn extract(&self, chunk: &Chunk) -> Vec<DefectRecord> {
        let bounded = self.bound_chunk_text(&chunk.text);
        let user_prompt =
            build_extraction_prompt(&chunk.document, &chunk.location_label, &bounded);

        let response = self.gateway.complete(
            EXTRACTION_SYSTEM_PROMPT,
            &user_prompt,
            self.max_response_tokens,
            self.temperature,
        );

        if response
            .to_uppercase()
            .contains(NO_DEFECTS_SENTINEL)
        {
            tracing::debug!(
                document = %chunk.document,
                chunk_index = chunk.index,
                "chunk reported no defects"
            );
            return Vec::new();
        }

        let context = BlockContext {
            document: &chunk.document,
            chunk_index: chunk.index,
            location: &chunk.location_label,
        };
        let (_, records) = parse_defect_response(&response, &context, false);

        if records.is_empty() {
            tracing::warn!(
                document = %chunk.document,
                chunk_index = chunk.index,
                "response had no recognizable defect blocks, keeping it as a synthetic record"
            );
            return vec![unstructured_record(&response, &context)];
        }

        tracing::debug!(
            document = %chunk.document,
            chunk_index = chunk.index,
            defects = records.len(),
            "chunk extraction complete"
        );
        records
    }

    /// Hard safety net applied regardless of the chunker's target size:
    /// pathologically large chunk text is cut down to the prompt ceiling.
    fn bound_chunk_text(&self, text: &str) -> String {
        if self.counter.count(text) <= self.prompt_token_ceiling {
            return text.to_string();
        }

        let mut bounded = String::new();
        for word in text.split_whitespace() {
            let candidate = if bounded.is_empty() {
                word.to_string()
            } else {
                format!("{bounded} {word}")
            };
            if self.counter.count(&candidate) > self.prompt_token_ceiling {
                break;
            }
            bounded = candidate;
        }
        tracing::warn!(
            original_tokens = self.counter.count(text),
            ceiling = self.prompt_token_ceiling,
            "chunk text exceeded the prompt ceiling and was truncated"
        );
        bounded.push_str("... [truncated]");
        bounded
    }
}

/// Fallback for a response with no `DEFECT #` marker at all: one
/// low-confidence record carrying the raw response as evidence.
fn unstructured_record(response: &str, context: &BlockContext<'_>) -> DefectRecord {
    let mut record =
        DefectRecord::with_defaults(context.document, context.location, context.chunk_index);
    record.defect_type = "Unstructured".to_string();
    record.description =
        "Model response did not follow the defect block format.".to_string();
    record.evidence = truncate_chars(response.trim(), FALLBACK_EVIDENCE_CAP).to_string();
    record.confidence = Confidence::Low;
    record
}
