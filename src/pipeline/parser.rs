//! Free-text parser for the DEFECT block format.
//!
//! The response is split on `DEFECT #<n>:` markers; each block is scanned
//! independently with one regex per field, capturing lazily up to the next
//! known field label or the end of the block. Missing fields keep their
//! defaults; a record missing both description and evidence is dropped.
//!
//! Known limitation, by contract with the prompt: field patterns stop at
//! the next field label wherever it appears, so a field value that itself
//! contains a label-like substring (the literal text `TYPE:` inside an
//! evidence quote, say) truncates that value early. The prompt and this
//! grammar evolve together; do not tighten one without the other.

use std::sync::OnceLock;

use regex::Regex;

use super::types::{Confidence, DefectRecord};

/// Provenance defaults applied to every record parsed from one response.
#[derive(Debug, Clone, Copy)]
pub struct BlockContext<'a> {
    pub document: &'a str,
    pub chunk_index: usize,
    pub location: &'a str,
}

const FIELD_LABELS: &str = "TYPE|DESCRIPTION|EVIDENCE|SEVERITY|CONFIDENCE|DOCUMENT|LOCATION";

struct FieldPatterns {
    defect_type: Regex,
    description: Regex,
    evidence: Regex,
    severity: Regex,
    confidence: Regex,
    document: Regex,
    location: Regex,
}

fn field_pattern(label: &str) -> Regex {
    // Lazy capture up to the next field label or the end of the block.
    Regex::new(&format!(
        r"(?is)\b{label}\s*:\s*(.*?)\s*(?:\b(?:{FIELD_LABELS})\s*:|$)"
    ))
    .expect("field pattern must compile")
}

fn patterns() -> &'static FieldPatterns {
    static PATTERNS: OnceLock<FieldPatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| FieldPatterns {
        defect_type: field_pattern("TYPE"),
        description: field_pattern("DESCRIPTION"),
        evidence: field_pattern("EVIDENCE"),
        severity: field_pattern("SEVERITY"),
        confidence: field_pattern("CONFIDENCE"),
        document: field_pattern("DOCUMENT"),
        location: field_pattern("LOCATION"),
    })
}

fn marker_regex() -> &'static Regex {
    static MARKER: OnceLock<Regex> = OnceLock::new();
    MARKER.get_or_init(|| Regex::new(r"(?i)DEFECT\s*#\s*\d+\s*:").expect("marker must compile"))
}

/// Parse an LLM response into the free-text lead-in (everything before the
/// first `DEFECT #` marker) and the defect records it contains.
///
/// With `review_fields` set, `DOCUMENT:` and `LOCATION:` lines override the
/// context defaults — the review pass reports provenance itself.
pub fn parse_defect_response(
    response: &str,
    context: &BlockContext<'_>,
    review_fields: bool,
) -> (String, Vec<DefectRecord>) {
    let markers: Vec<regex::Match<'_>> = marker_regex().find_iter(response).collect();
    if markers.is_empty() {
        return (response.trim().to_string(), Vec::new());
    }

    let summary = response[..markers[0].start()].trim().to_string();
    let mut records = Vec::new();
    for (i, marker) in markers.iter().enumerate() {
        let block_end = markers
            .get(i + 1)
            .map(|next| next.start())
            .unwrap_or(response.len());
        let block = &response[marker.end()..block_end];
        if let Some(record) = parse_block(block, context, review_fields) {
            records.push(record);
        }
    }
    (summary, records)
}

fn parse_block(
    block: &str,
    context: &BlockContext<'_>,
    review_fields: bool,
) -> Option<DefectRecord> {
    let p = patterns();
    let mut record =
        DefectRecord::with_defaults(context.document, context.location, context.chunk_index);

    if let Some(value) = capture(&p.defect_type, block) {
        record.defect_type = value;
    }
    if let Some(value) = capture(&p.description, block) {
        record.description = value;
    }
    if let Some(value) = capture(&p.evidence, block) {
        record.evidence = value;
    }
    if let Some(value) = capture(&p.severity, block) {
        // A malformed severity keeps the default; it never drops the record.
        if let Some(severity) = parse_severity(&value) {
            record.severity = severity;
        }
    }
    if let Some(value) = capture(&p.confidence, block) {
        record.confidence = Confidence::parse(&value);
    }
    if review_fields {
        if let Some(value) = capture(&p.document, block) {
            record.document = value;
        }
        if let Some(value) = capture(&p.location, block) {
            record.location = value;
        }
    }

    record.has_content().then_some(record)
}

fn capture(pattern: &Regex, block: &str) -> Option<String> {
    pattern
        .captures(block)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_severity(value: &str) -> Option<u8> {
    let digits: String = value
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse::<u8>().ok().map(|s| s.clamp(1, 5))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> BlockContext<'static> {
        BlockContext {
            document: "pdf_report",
            chunk_index: 2,
            location: "Chunk 3/7",
        }
    }

    #[test]
    fn parses_a_complete_block() {
        let response = "DEFECT #1:\nTYPE: Corrosion\nDESCRIPTION: Rust on the intake valve.\n\
                        EVIDENCE: heavy rust was observed on the intake valve\n\
                        SEVERITY: 4\nCONFIDENCE: high\n";
        let (summary, records) = parse_defect_response(response, &context(), false);
        assert!(summary.is_empty());
        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r.defect_type, "Corrosion");
        assert_eq!(r.description, "Rust on the intake valve.");
        assert_eq!(r.evidence, "heavy rust was observed on the intake valve");
        assert_eq!(r.severity, 4);
        assert_eq!(r.confidence, Confidence::High);
        assert_eq!(r.document, "pdf_report");
        assert_eq!(r.location, "Chunk 3/7");
        assert_eq!(r.chunk_index, 2);
    }

    #[test]
    fn parses_multiple_blocks_in_order() {
        let response = "DEFECT #1:\nDESCRIPTION: first finding\n\n\
                        DEFECT #2:\nDESCRIPTION: second finding\n";
        let (_, records) = parse_defect_response(response, &context(), false);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].description, "first finding");
        assert_eq!(records[1].description, "second finding");
    }

    #[test]
    fn missing_fields_keep_defaults() {
        let response = "DEFECT #1:\nDESCRIPTION: only a description here\n";
        let (_, records) = parse_defect_response(response, &context(), false);
        let r = &records[0];
        assert_eq!(r.defect_type, "Unknown");
        assert_eq!(r.severity, 3);
        assert_eq!(r.confidence, Confidence::Medium);
        assert!(r.evidence.is_empty());
    }

    #[test]
    fn malformed_severity_keeps_default_without_dropping_record() {
        for bad in ["severe", "N/A", "high", ""] {
            let response = format!("DEFECT #1:\nDESCRIPTION: finding\nSEVERITY: {bad}\n");
            let (_, records) = parse_defect_response(&response, &context(), false);
            assert_eq!(records.len(), 1, "severity '{bad}' dropped the record");
            assert_eq!(records[0].severity, 3, "severity '{bad}' changed the default");
        }
    }

    #[test]
    fn numeric_severity_is_clamped_to_scale() {
        let response = "DEFECT #1:\nDESCRIPTION: finding\nSEVERITY: 9\n";
        let (_, records) = parse_defect_response(response, &context(), false);
        assert_eq!(records[0].severity, 5);

        let response = "DEFECT #1:\nDESCRIPTION: finding\nSEVERITY: 0\n";
        let (_, records) = parse_defect_response(response, &context(), false);
        assert_eq!(records[0].severity, 1);
    }

    #[test]
    fn severity_with_trailing_commentary_parses_leading_digits() {
        let response = "DEFECT #1:\nDESCRIPTION: finding\nSEVERITY: 4 (serious)\n";
        let (_, records) = parse_defect_response(response, &context(), false);
        assert_eq!(records[0].severity, 4);
    }

    #[test]
    fn block_without_description_or_evidence_is_dropped() {
        let response = "DEFECT #1:\nTYPE: Corrosion\nSEVERITY: 4\n\n\
                        DEFECT #2:\nDESCRIPTION: kept\n";
        let (_, records) = parse_defect_response(response, &context(), false);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].description, "kept");
    }

    #[test]
    fn response_without_markers_yields_no_records() {
        let response = "I could not find anything structured to report here.";
        let (summary, records) = parse_defect_response(response, &context(), false);
        assert!(records.is_empty());
        assert_eq!(summary, response);
    }

    #[test]
    fn lead_in_before_first_marker_becomes_summary() {
        let response = "Overall the corpus describes two recurring issues.\n\n\
                        DEFECT #1:\nDESCRIPTION: recurring leak\n";
        let (summary, records) = parse_defect_response(response, &context(), true);
        assert_eq!(summary, "Overall the corpus describes two recurring issues.");
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn marker_matching_is_case_and_spacing_tolerant() {
        let response = "defect # 1 :\nDESCRIPTION: lower-case marker\n";
        let (_, records) = parse_defect_response(response, &context(), false);
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn review_fields_override_context_provenance() {
        let response = "DEFECT #1:\nDESCRIPTION: consolidated finding\n\
                        DOCUMENT: word_minutes.docx\nLOCATION: Page 5\n";
        let (_, records) = parse_defect_response(response, &context(), true);
        assert_eq!(records[0].document, "word_minutes.docx");
        assert_eq!(records[0].location, "Page 5");
    }

    #[test]
    fn review_fields_ignored_in_extraction_mode() {
        let response = "DEFECT #1:\nDESCRIPTION: finding\nDOCUMENT: somewhere_else\n";
        let (_, records) = parse_defect_response(response, &context(), false);
        assert_eq!(records[0].document, "pdf_report");
    }

    #[test]
    fn review_fields_missing_fall_back_to_context() {
        let response = "DEFECT #1:\nDESCRIPTION: finding without provenance\n";
        let (_, records) = parse_defect_response(response, &context(), true);
        assert_eq!(records[0].document, "pdf_report");
        assert_eq!(records[0].location, "Chunk 3/7");
    }

    #[test]
    fn label_like_substring_truncates_the_field_value() {
        // Documented limitation: the evidence quote contains the literal
        // text "TYPE:", so the capture stops there.
        let response = "DEFECT #1:\nEVIDENCE: the form field TYPE: was left blank\n";
        let (_, records) = parse_defect_response(response, &context(), false);
        assert_eq!(records[0].evidence, "the form field");
    }

    #[test]
    fn multiline_description_captured_up_to_next_label() {
        let response =
            "DEFECT #1:\nDESCRIPTION: the seal leaks\nunder sustained pressure\nEVIDENCE: leak noted\n";
        let (_, records) = parse_defect_response(response, &context(), false);
        assert_eq!(records[0].description, "the seal leaks\nunder sustained pressure");
        assert_eq!(records[0].evidence, "leak noted");
    }
}
