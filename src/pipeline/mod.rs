//! The defect extraction pipeline.
//!
//! Stages, in run order: per-chunk extraction ([`extractor`]), cross-chunk
//! deduplication ([`dedupe`]), one consolidating review round-trip
//! ([`review`]) and report assembly ([`orchestrator`]). The shared data
//! model lives in [`types`]; [`prompt`] and [`parser`] define the block
//! format the model is asked to produce and the grammar that reads it back.

pub mod dedupe;
pub mod extractor;
pub mod orchestrator;
pub mod parser;
pub mod prompt;
pub mod review;
pub mod types;

pub use dedupe::dedupe;
pub use extractor::DefectExtractor;
pub use orchestrator::ScanOrchestrator;
pub use review::FinalReviewer;
pub use types::{Chunk, Confidence, DefectRecord, DefectReport};
