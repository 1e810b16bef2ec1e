//! LLM-backed defect extraction over an in-memory document corpus.
//!
//! Documents arrive from an external reader as raw text (optionally page- or
//! segment-structured). A scan chunks each document within a token budget,
//! asks an LLM to enumerate the defects each chunk *mentions*, parses the
//! free-text answers into structured records, deduplicates across chunks and
//! documents, runs one consolidating review round-trip and renders a report.
//!
//! ```no_run
//! use defect_scan::config::ScanConfig;
//! use defect_scan::document::{Corpus, Document, DocumentType};
//! use defect_scan::pipeline::ScanOrchestrator;
//!
//! # async fn scan() -> Result<(), defect_scan::error::ScanError> {
//! let corpus = Corpus::new(vec![Document::from_text(
//!     "pdf_inspection_report.pdf",
//!     DocumentType::Pdf,
//!     "The intake valve shows heavy corrosion.",
//! )]);
//!
//! let orchestrator = ScanOrchestrator::new(ScanConfig::from_env());
//! let report = orchestrator.run(&corpus).await?;
//! println!("{}", report.display);
//! # Ok(())
//! # }
//! ```

pub mod chunker;
pub mod config;
pub mod document;
pub mod error;
pub mod llm;
pub mod pipeline;
pub mod token_count;

pub use config::{LlmEngine, ScanConfig};
pub use document::{Corpus, Document, DocumentPage, DocumentType};
pub use error::ScanError;
pub use pipeline::{DefectRecord, DefectReport, ScanOrchestrator};

/// Install the global tracing subscriber, filtered by `RUST_LOG` (default
/// `info`). Safe to call more than once; later calls are no-ops.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
