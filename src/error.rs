//! Crate-level error type.
//!
//! The pipeline fails loud only at the very top (no input at all) and soft
//! everywhere inside: gateway failures become sentinel strings, parse
//! failures degrade to synthetic records, review failures fall back to the
//! pre-review list. Gateway-internal errors live in `llm::GatewayError` and
//! never cross the gateway boundary.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("no documents loaded — scan a corpus before requesting a defect report")]
    EmptyCorpus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_corpus_message_names_the_remedy() {
        let msg = ScanError::EmptyCorpus.to_string();
        assert!(msg.contains("no documents"));
        assert!(msg.contains("scan"));
    }
}
