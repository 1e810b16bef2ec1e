//! Input data model: documents as delivered by the external reader.
//!
//! The reader collaborator (out of scope here) extracts raw text from PDF,
//! Word and Excel containers and hands over `Document` records keyed as
//! `<type>_<name>`. Word documents may arrive pre-chunked instead of carrying
//! a unified text body; PDFs may carry per-page text.

use serde::{Deserialize, Serialize};

/// Container format the reader extracted the text from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentType {
    Pdf,
    Word,
    Excel,
}

impl DocumentType {
    /// Resolve a document type from the `<type>_` key prefix.
    pub fn from_key_prefix(prefix: &str) -> Option<Self> {
        match prefix.to_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "word" => Some(Self::Word),
            "excel" => Some(Self::Excel),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Word => "word",
            Self::Excel => "excel",
        }
    }
}

/// One page of extracted text, when the reader preserved page structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentPage {
    pub page_number: u32,
    pub text: String,
}

/// A document as produced by the reader. Immutable for the duration of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Unique per corpus, format `<type>_<name>`.
    pub key: String,
    pub doc_type: DocumentType,
    /// Unified text body. May be empty when the reader pre-chunked instead.
    #[serde(default)]
    pub text: String,
    /// Per-page text, when the container had page structure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pages: Option<Vec<DocumentPage>>,
    /// Pre-chunked text segments (the Word reader emits these).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunks: Option<Vec<String>>,
}

impl Document {
    /// Document with a unified text body and no page structure.
    pub fn from_text(key: impl Into<String>, doc_type: DocumentType, text: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            doc_type,
            text: text.into(),
            pages: None,
            chunks: None,
        }
    }

    /// Human-readable name: everything after the first `_` in the key,
    /// or the whole key when there is no prefix.
    pub fn display_name(&self) -> &str {
        match self.key.split_once('_') {
            Some((_, name)) if !name.is_empty() => name,
            _ => &self.key,
        }
    }

    /// Type label resolved from the key prefix, falling back to the
    /// document's own type field for keys without a recognized prefix.
    pub fn type_label(&self) -> &'static str {
        self.key
            .split_once('_')
            .and_then(|(prefix, _)| DocumentType::from_key_prefix(prefix))
            .unwrap_or(self.doc_type)
            .as_str()
    }
}

/// Ordered snapshot of the in-memory document corpus for one scan run.
///
/// Passed explicitly into the orchestrator — no component holds corpus state
/// between runs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Corpus {
    documents: Vec<Document>,
}

impl Corpus {
    pub fn new(documents: Vec<Document>) -> Self {
        Self { documents }
    }

    pub fn push(&mut self, document: Document) {
        self.documents.push(document);
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Document> {
        self.documents.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_prefix_resolution() {
        assert_eq!(DocumentType::from_key_prefix("pdf"), Some(DocumentType::Pdf));
        assert_eq!(DocumentType::from_key_prefix("WORD"), Some(DocumentType::Word));
        assert_eq!(DocumentType::from_key_prefix("excel"), Some(DocumentType::Excel));
        assert_eq!(DocumentType::from_key_prefix("zip"), None);
    }

    #[test]
    fn display_name_strips_type_prefix() {
        let doc = Document::from_text("pdf_inspection_report.pdf", DocumentType::Pdf, "");
        assert_eq!(doc.display_name(), "inspection_report.pdf");
    }

    #[test]
    fn display_name_without_prefix_is_whole_key() {
        let doc = Document::from_text("report", DocumentType::Word, "");
        assert_eq!(doc.display_name(), "report");
    }

    #[test]
    fn type_label_prefers_key_prefix() {
        // Key prefix wins even when it disagrees with the type field.
        let mut doc = Document::from_text("word_minutes.docx", DocumentType::Pdf, "");
        assert_eq!(doc.type_label(), "word");

        doc.key = "minutes.docx".into();
        assert_eq!(doc.type_label(), "pdf");
    }

    #[test]
    fn corpus_len_and_iteration_order() {
        let mut corpus = Corpus::default();
        assert!(corpus.is_empty());

        corpus.push(Document::from_text("pdf_a", DocumentType::Pdf, "one"));
        corpus.push(Document::from_text("word_b", DocumentType::Word, "two"));

        assert_eq!(corpus.len(), 2);
        let keys: Vec<&str> = corpus.iter().map(|d| d.key.as_str()).collect();
        assert_eq!(keys, vec!["pdf_a", "word_b"]);
    }

    #[test]
    fn document_roundtrips_through_json() {
        let doc = Document {
            key: "pdf_report".into(),
            doc_type: DocumentType::Pdf,
            text: "body".into(),
            pages: Some(vec![DocumentPage {
                page_number: 1,
                text: "body".into(),
            }]),
            chunks: None,
        };
        let json = serde_json::to_string(&doc).unwrap();
        let back: Document = serde_json::from_str(&json).unwrap();
        assert_eq!(back.key, "pdf_report");
        assert_eq!(back.pages.unwrap()[0].page_number, 1);
        assert!(back.chunks.is_none());
    }
}
