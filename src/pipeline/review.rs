//! Final review pass over the deduplicated defect list.
//!
//! One extra gateway round-trip that asks the model to consolidate the
//! cross-document list and write a lead-in summary. The pass is strictly
//! non-destructive: when the reviewer's answer parses to zero records the
//! pre-review list is returned unchanged, so a flaky review can degrade the
//! report's polish but never its content.

use std::sync::Arc;

use crate::config::ScanConfig;
use crate::llm::LlmGateway;

use super::parser::{parse_defect_response, BlockContext};
use super::prompt::{build_review_prompt, REVIEW_SYSTEM_PROMPT};
use super::types::DefectRecord;

pub struct FinalReviewer {
    gateway: Arc<dyn LlmGateway>,
    max_response_tokens: u32,
    temperature: f32,
}

impl FinalReviewer {
    pub fn new(gateway: Arc<dyn LlmGateway>, config: &ScanConfig) -> Self {
        Self {
            gateway,
            max_response_tokens: config.max_response_tokens,
            temperature: config.temperature,
        }
    }

    /// Consolidate the deduplicated list. Returns the reviewer's free-text
    /// summary and the consolidated records.
    pub fn review(&self, records: &[DefectRecord]) -> (String, Vec<DefectRecord>) {
        if records.is_empty() {
            return (String::new(), Vec::new());
        }

        let user_prompt = build_review_prompt(records);
        let response = self.gateway.complete(
            REVIEW_SYSTEM_PROMPT,
            &user_prompt,
            self.max_response_tokens,
            self.temperature,
        );

        // The reviewer reports provenance itself via DOCUMENT:/LOCATION:
        // lines; these defaults only cover blocks that omit them.
        let context = BlockContext {
            document: "Unknown",
            chunk_index: 0,
            location: "Unknown",
        };
        let (summary, reviewed) = parse_defect_response(&response, &context, true);

        if reviewed.is_empty() {
            tracing::warn!(
                input = records.len(),
                "review response parsed to zero records, keeping the pre-review list"
            );
            return (String::new(), records.to_vec());
        }

        tracing::debug!(
            input = records.len(),
            output = reviewed.len(),
            "final review complete"
        );
        (summary, reviewed)
    }
}
