//! Cross-chunk defect deduplication.
//!
//! Two chunks of the same document routinely report the same defect. The
//! dedup key is `(type, description, evidence prefix, document)` with all
//! parts lowercased and trimmed; the evidence contributes only its first 50
//! characters so minor quote-length differences still collide. A colliding
//! record survives anyway when its *full* evidence differs from every kept
//! record of the same type, description and document — a genuinely new
//! quote is a new sighting, not a duplicate. First occurrence wins; input
//! order is preserved.

use std::collections::HashSet;

use super::types::{truncate_chars, DefectRecord};

const EVIDENCE_KEY_CHARS: usize = 50;

fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

fn dedupe_key(record: &DefectRecord) -> (String, String, String, String) {
    let evidence = normalize(&record.evidence);
    (
        normalize(&record.defect_type),
        normalize(&record.description),
        truncate_chars(&evidence, EVIDENCE_KEY_CHARS).to_string(),
        normalize(&record.document),
    )
}

/// Drop duplicate sightings, keeping the first of each.
pub fn dedupe(records: &[DefectRecord]) -> Vec<DefectRecord> {
    let mut seen: HashSet<(String, String, String, String)> = HashSet::new();
    let mut kept: Vec<DefectRecord> = Vec::new();

    for record in records {
        let key = dedupe_key(record);
        if seen.contains(&key) {
            let evidence = normalize(&record.evidence);
            let already_sighted = kept.iter().any(|existing| {
                normalize(&existing.defect_type) == key.0
                    && normalize(&existing.description) == key.1
                    && normalize(&existing.document) == key.3
                    && normalize(&existing.evidence) == evidence
            });
            if already_sighted {
                continue;
            }
        }
        seen.insert(key);
        kept.push(record.clone());
    }

    if kept.len() < records.len() {
        tracing::debug!(
            input = records.len(),
            kept = kept.len(),
            "dropped duplicate defect records"
        );
    }
    kept
}
