//! Data model for the defect pipeline.

use serde::{Deserialize, Serialize};

/// How sure the model was about a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    #[default]
    Medium,
    High,
}

impl Confidence {
    /// Lenient parse of a free-text confidence field. Anything that isn't
    /// recognizably high or low stays at the medium default.
    pub fn parse(value: &str) -> Self {
        let normalized = value.trim().to_lowercase();
        if normalized.contains("high") {
            Self::High
        } else if normalized.contains("low") {
            Self::Low
        } else {
            Self::Medium
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

pub const DEFAULT_DEFECT_TYPE: &str = "Unknown";
pub const DEFAULT_SEVERITY: u8 = 3;

/// One defect mention extracted from document text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefectRecord {
    pub document: String,
    pub location: String,
    pub chunk_index: usize,
    pub defect_type: String,
    pub description: String,
    /// Verbatim quote from the source text supporting the finding.
    pub evidence: String,
    /// 1 (cosmetic) to 5 (critical).
    pub severity: u8,
    pub confidence: Confidence,
}

impl DefectRecord {
    /// Record with every model-supplied field at its default.
    pub fn with_defaults(
        document: impl Into<String>,
        location: impl Into<String>,
        chunk_index: usize,
    ) -> Self {
        Self {
            document: document.into(),
            location: location.into(),
            chunk_index,
            defect_type: DEFAULT_DEFECT_TYPE.to_string(),
            description: String::new(),
            evidence: String::new(),
            severity: DEFAULT_SEVERITY,
            confidence: Confidence::Medium,
        }
    }

    /// Retention invariant: a record carries content when either the
    /// description or the evidence is non-empty.
    pub fn has_content(&self) -> bool {
        !self.description.trim().is_empty() || !self.evidence.trim().is_empty()
    }
}

/// A token-bounded slice of one document, sized for one LLM round-trip.
#[derive(Debug, Clone)]
pub struct Chunk {
    /// Display name of the source document.
    pub document: String,
    /// 0-based position within the document; sequence order is significant.
    pub index: usize,
    pub text: String,
    /// Human-readable origin, e.g. "Page 3" or "Chunk 2/7".
    pub location_label: String,
}

/// Final output of one scan run. Immutable after construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefectReport {
    pub defects: Vec<DefectRecord>,
    pub defect_count: usize,
    pub document_count: usize,
    pub summary_text: String,
    /// Formatted human-readable rendition; doubles as the primary payload
    /// for the presentation layer.
    pub display: String,
}

/// Char-boundary-safe prefix of at most `max_chars` characters.
pub(crate) fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confidence_parse_is_lenient() {
        assert_eq!(Confidence::parse("high"), Confidence::High);
        assert_eq!(Confidence::parse(" HIGH "), Confidence::High);
        assert_eq!(Confidence::parse("Low confidence"), Confidence::Low);
        assert_eq!(Confidence::parse("medium"), Confidence::Medium);
        assert_eq!(Confidence::parse("garbage"), Confidence::Medium);
        assert_eq!(Confidence::parse(""), Confidence::Medium);
    }

    #[test]
    fn defaults_match_contract() {
        let record = DefectRecord::with_defaults("pdf_a", "Page 1", 0);
        assert_eq!(record.defect_type, "Unknown");
        assert_eq!(record.severity, 3);
        assert_eq!(record.confidence, Confidence::Medium);
        assert!(!record.has_content());
    }

    #[test]
    fn content_requires_description_or_evidence() {
        let mut record = DefectRecord::with_defaults("pdf_a", "Page 1", 0);
        record.description = "cracked weld".into();
        assert!(record.has_content());

        let mut record = DefectRecord::with_defaults("pdf_a", "Page 1", 0);
        record.evidence = "the weld shows cracks".into();
        assert!(record.has_content());

        let mut record = DefectRecord::with_defaults("pdf_a", "Page 1", 0);
        record.description = "   ".into();
        assert!(!record.has_content());
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate_chars("abcdef", 3), "abc");
        assert_eq!(truncate_chars("ab", 3), "ab");
        // multi-byte characters must not be cut mid-codepoint
        assert_eq!(truncate_chars("żółć!", 3), "żół");
    }

    #[test]
    fn record_serializes_with_lowercase_confidence() {
        let mut record = DefectRecord::with_defaults("pdf_a", "Page 1", 2);
        record.confidence = Confidence::High;
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"confidence\":\"high\""));
        assert!(json.contains("\"chunk_index\":2"));
    }
}
