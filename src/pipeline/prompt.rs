//! Prompt construction for the extraction and review passes.
//!
//! The block format described here and the field regexes in `parser` must
//! stay in lockstep — a prompt change without a parser change (or vice
//! versa) silently degrades every scan.

use super::types::{truncate_chars, DefectRecord};

/// Phrase the model is instructed to answer with when a chunk mentions no
/// defects. Matched case-insensitively.
pub const NO_DEFECTS_SENTINEL: &str = "NO DEFECTS FOUND";

pub const EXTRACTION_SYSTEM_PROMPT: &str = r#"
You are a quality analyst reading excerpts of inspection and report documents.
Your ONLY task is to list defects that are MENTIONED IN the text: faults,
failures, damage, nonconformities or quality issues that the document talks
about. Do NOT report flaws of the document itself (formatting, typos, missing
sections).

For every defect mentioned, output one block in exactly this format:

DEFECT #1:
TYPE: <short defect category>
DESCRIPTION: <one or two sentences describing the defect>
EVIDENCE: <verbatim quote from the text that mentions it>
SEVERITY: <integer 1-5, 5 = most severe>
CONFIDENCE: <low | medium | high>

Number the blocks sequentially. Do not add commentary between blocks.
If the text mentions no defects at all, reply with exactly: NO DEFECTS FOUND
"#;

pub const REVIEW_SYSTEM_PROMPT: &str = r#"
You are a senior quality analyst reviewing a combined list of defect findings
collected from several documents. Consolidate the list: merge findings that
describe the same defect, correct mislabeled types, and add any defect that
the list clearly implies but does not state.

Start your answer with a short free-text summary of the overall findings.
Then output the consolidated list, one block per defect, in exactly this
format:

DEFECT #1:
TYPE: <short defect category>
DESCRIPTION: <one or two sentences describing the defect>
EVIDENCE: <verbatim quote supporting it>
SEVERITY: <integer 1-5, 5 = most severe>
CONFIDENCE: <low | medium | high>
DOCUMENT: <source document name>
LOCATION: <where in the document it was found>

Number the blocks sequentially. Do not drop distinct defects.
"#;

/// User prompt for one chunk of one document.
pub fn build_extraction_prompt(
    document_name: &str,
    location_label: &str,
    chunk_text: &str,
) -> String {
    format!(
        "Document: {document_name}\nExcerpt: {location_label}\n\n\
         <document>\n{chunk_text}\n</document>\n\n\
         List every defect mentioned in the excerpt above."
    )
}

/// Caps applied to each record before it enters the review prompt, so the
/// prompt size stays bounded no matter how verbose extraction was.
const REVIEW_DESCRIPTION_CAP: usize = 100;
const REVIEW_EVIDENCE_CAP: usize = 50;

/// User prompt for the final review pass over the deduplicated list.
pub fn build_review_prompt(records: &[DefectRecord]) -> String {
    let mut listing = String::new();
    for (i, record) in records.iter().enumerate() {
        listing.push_str(&format!(
            "DEFECT #{n}:\nTYPE: {ty}\nDESCRIPTION: {desc}\nEVIDENCE: {ev}\n\
             SEVERITY: {sev}\nCONFIDENCE: {conf}\nDOCUMENT: {doc}\nLOCATION: {loc}\n\n",
            n = i + 1,
            ty = record.defect_type,
            desc = truncate_chars(&record.description, REVIEW_DESCRIPTION_CAP),
            ev = truncate_chars(&record.evidence, REVIEW_EVIDENCE_CAP),
            sev = record.severity,
            conf = record.confidence.as_str(),
            doc = record.document,
            loc = record.location,
        ));
    }

    format!(
        "Here are the defect findings collected so far ({count} entries):\n\n\
         {listing}\
         Review and consolidate this list as instructed.",
        count = records.len(),
    )
}
