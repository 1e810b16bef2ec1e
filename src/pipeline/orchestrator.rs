//! Run coordination: extraction, dedup, review, report.
//!
//! One run walks the corpus document by document. All chunks of one document
//! are dispatched to the gateway concurrently and their results recombined
//! in chunk order once every task has resolved; documents themselves are
//! processed sequentially, which caps in-flight LLM calls at one document's
//! chunk count. A failed chunk task contributes zero records and the run
//! continues.

use std::sync::Arc;

use crate::chunker::TextChunker;
use crate::config::ScanConfig;
use crate::document::{Corpus, Document};
use crate::error::ScanError;
use crate::llm::{resolve_gateway, LlmGateway};
use crate::token_count::TokenCounter;

use super::dedupe::dedupe;
use super::extractor::DefectExtractor;
use super::review::FinalReviewer;
use super::types::{truncate_chars, Chunk, DefectRecord, DefectReport};

const REPORT_TITLE: &str = "DEFECT SCAN REPORT";
const REPORT_SUBTITLE: &str = "Defects mentioned in the scanned documents";

const DISPLAY_DESCRIPTION_CAP: usize = 100;
const DISPLAY_EVIDENCE_CAP: usize = 50;

pub struct ScanOrchestrator {
    config: ScanConfig,
    gateway: Arc<dyn LlmGateway>,
}

impl ScanOrchestrator {
    /// Orchestrator with the gateway resolved from the configured engine.
    pub fn new(config: ScanConfig) -> Self {
        let gateway = resolve_gateway(&config);
        Self { config, gateway }
    }

    /// Orchestrator over an explicit gateway (tests, custom backends).
    pub fn with_gateway(config: ScanConfig, gateway: Arc<dyn LlmGateway>) -> Self {
        Self { config, gateway }
    }

    /// Scan the corpus and build the final report.
    ///
    /// The corpus is an explicit snapshot: the run reads nothing but its
    /// argument and holds no state afterwards.
    pub async fn run(&self, corpus: &Corpus) -> Result<DefectReport, ScanError> {
        if corpus.is_empty() {
            return Err(ScanError::EmptyCorpus);
        }

        tracing::info!(documents = corpus.len(), "defect scan started");
        let extractor = Arc::new(DefectExtractor::new(self.gateway.clone(), &self.config));
        let chunker = TextChunker::new(
            TokenCounter::new(self.config.active_model()),
            self.config.chunk_max_tokens,
        );

        let mut collected: Vec<DefectRecord> = Vec::new();
        for document in corpus.iter() {
            let mut chunks = plan_chunks(document, &chunker);
            if chunks.len() > self.config.max_chunks_per_document {
                tracing::warn!(
                    document = %document.key,
                    skipped = chunks.len() - self.config.max_chunks_per_document,
                    limit = self.config.max_chunks_per_document,
                    "document exceeds the chunk limit, skipping the excess"
                );
                chunks.truncate(self.config.max_chunks_per_document);
            }
            if chunks.is_empty() {
                tracing::debug!(document = %document.key, "document yielded no text to scan");
                continue;
            }

            // Fire all chunk tasks for this document, then await them in
            // spawn order so downstream processing stays deterministic.
            let mut handles = Vec::with_capacity(chunks.len());
            for chunk in chunks {
                let extractor = extractor.clone();
                handles.push(tokio::task::spawn_blocking(move || extractor.extract(&chunk)));
            }
            for handle in handles {
                match handle.await {
                    Ok(mut records) => collected.append(&mut records),
                    Err(e) => {
                        tracing::warn!(
                            document = %document.key,
                            error = %e,
                            "chunk extraction task failed, dropping its output"
                        );
                    }
                }
            }
        }

        let deduped = dedupe(&collected);
        tracing::info!(
            extracted = collected.len(),
            unique = deduped.len(),
            "extraction complete, running final review"
        );

        let reviewer = FinalReviewer::new(self.gateway.clone(), &self.config);
        let review_input = deduped.clone();
        let (summary, defects) =
            match tokio::task::spawn_blocking(move || reviewer.review(&review_input)).await {
                Ok(result) => result,
                Err(e) => {
                    tracing::warn!(error = %e, "review task failed, keeping the pre-review list");
                    (String::new(), deduped)
                }
            };

        let summary_text = if summary.trim().is_empty() {
            format!(
                "Detected {} unique defects across {} documents.",
                defects.len(),
                corpus.len()
            )
        } else {
            summary.trim().to_string()
        };

        let display = render_report(&defects, &summary_text);
        tracing::info!(defects = defects.len(), "defect scan finished");

        Ok(DefectReport {
            defect_count: defects.len(),
            document_count: corpus.len(),
            summary_text,
            display,
            defects,
        })
    }
}

/// Turn one document into location-labeled chunks.
///
/// Page-structured documents are chunked page by page and labeled
/// `Page <n>`; otherwise the unified text body is preferred, with the
/// reader's pre-chunked segments as fallback, labeled `Chunk <i>/<total>`.
fn plan_chunks(document: &Document, chunker: &TextChunker) -> Vec<Chunk> {
    let name = document.display_name();

    if let Some(pages) = document.pages.as_ref().filter(|p| !p.is_empty()) {
        let mut planned = Vec::new();
        for page in pages {
            if page.text.trim().is_empty() {
                continue;
            }
            for text in chunker.chunk(&page.text) {
                planned.push(Chunk {
                    document: name.to_string(),
                    index: planned.len(),
                    text,
                    location_label: format!("Page {}", page.page_number),
                });
            }
        }
        return planned;
    }

    let pieces = if !document.text.trim().is_empty() {
        chunker.chunk(&document.text)
    } else if let Some(pre_chunked) = &document.chunks {
        chunker.chunk_all(pre_chunked)
    } else {
        Vec::new()
    };

    let total = pieces.len();
    pieces
        .into_iter()
        .enumerate()
        .filter(|(_, text)| !text.trim().is_empty())
        .map(|(i, text)| Chunk {
            document: name.to_string(),
            index: i,
            text,
            location_label: format!("Chunk {}/{}", i + 1, total),
        })
        .collect()
}

/// Human-readable rendition of the final defect list.
fn render_report(defects: &[DefectRecord], summary: &str) -> String {
    let mut sections = vec![format!("{REPORT_TITLE}\n{REPORT_SUBTITLE}"), summary.to_string()];

    for (i, defect) in defects.iter().enumerate() {
        sections.push(format!(
            "#{n}: {ty}: {desc}\n   Evidence: '{ev}'...\n   Found in: {doc} ({loc})",
            n = i + 1,
            ty = defect.defect_type,
            desc = truncate_chars(&defect.description, DISPLAY_DESCRIPTION_CAP),
            ev = truncate_chars(&defect.evidence, DISPLAY_EVIDENCE_CAP),
            doc = defect.document,
            loc = defect.location,
        ));
    }

    sections.join("\n\n")
}
