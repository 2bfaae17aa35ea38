//! Sources of positioned page tokens.
//!
//! Text extraction itself happens outside the pipeline. A [`TokenSource`]
//! hands the pipeline one page of tokens at a time as a blocking call.

use crate::error::{Error, Result};
use crate::model::{PageTokens, TextToken};
use crate::template::scanner::{load_document, page_box, page_ids, page_text_runs};
use lopdf::{Document, ObjectId};
use serde::Deserialize;
use std::path::Path;

/// A paginated stream of positioned tokens.
pub trait TokenSource {
    /// Number of pages available.
    fn page_count(&self) -> usize;

    /// Tokens of page `index` (zero-based).
    fn page(&mut self, index: usize) -> Result<PageTokens>;

    /// Short description for logging.
    fn name(&self) -> &'static str;
}

/// Pages of tokens read from JSON.
///
/// Accepts either an array of pages (`[{"width":..,"height":..,"tokens":[..]}]`)
/// or a bare array of tokens, read as a single page.
#[derive(Debug, Clone, Default)]
pub struct JsonTokenSource {
    pages: Vec<PageTokens>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TokenDocument {
    Pages(Vec<PageTokens>),
    Tokens(Vec<TextToken>),
}

impl JsonTokenSource {
    /// Wrap already-parsed pages.
    pub fn new(pages: Vec<PageTokens>) -> Self {
        Self { pages }
    }

    /// Parse a JSON token document.
    pub fn from_json(input: &str) -> Result<Self> {
        let doc: TokenDocument = serde_json::from_str(input)
            .map_err(|e| Error::TokenSource(format!("unreadable token JSON: {}", e)))?;
        let pages = match doc {
            TokenDocument::Pages(pages) => pages,
            TokenDocument::Tokens(tokens) => vec![PageTokens {
                tokens,
                ..PageTokens::default()
            }],
        };
        Ok(Self { pages })
    }

    /// Read a JSON token file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }
}

impl TokenSource for JsonTokenSource {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page(&mut self, index: usize) -> Result<PageTokens> {
        self.pages
            .get(index)
            .cloned()
            .ok_or_else(|| Error::TokenSource(format!("page {} out of range", index)))
    }

    fn name(&self) -> &'static str {
        "json"
    }
}

/// The text layer of a text-based PDF.
///
/// Every shown string becomes one token at its baseline origin. Scanned
/// documents without a text layer yield empty pages.
pub struct PdfTextSource {
    doc: Document,
    pages: Vec<ObjectId>,
}

impl PdfTextSource {
    /// Parse PDF bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let doc = load_document(bytes).map_err(as_source_error)?;
        let pages = page_ids(&doc);
        Ok(Self { doc, pages })
    }

    /// Read a PDF file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_bytes(&std::fs::read(path)?)
    }
}

impl TokenSource for PdfTextSource {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page(&mut self, index: usize) -> Result<PageTokens> {
        let page_id = *self
            .pages
            .get(index)
            .ok_or_else(|| Error::TokenSource(format!("page {} out of range", index)))?;
        let [x0, y0, x1, y1] = page_box(&self.doc, page_id).map_err(as_source_error)?;
        let tokens = page_text_runs(&self.doc, page_id)
            .map_err(as_source_error)?
            .into_iter()
            .filter(|run| !run.text.trim().is_empty())
            .map(|run| TextToken::new(run.text, run.x - x0, run.y - y0, run.width, run.height))
            .collect();
        Ok(PageTokens {
            width: x1 - x0,
            height: y1 - y0,
            tokens,
        })
    }

    fn name(&self) -> &'static str {
        "pdf"
    }
}

fn as_source_error(err: Error) -> Error {
    match err {
        Error::InvalidTemplate(msg) => Error::TokenSource(msg),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_pages() {
        let json = r#"[
            {"width": 595, "height": 842, "tokens": [{"text": "নাম:", "x": 0, "y": 100}]},
            {"tokens": []}
        ]"#;
        let mut source = JsonTokenSource::from_json(json).unwrap();
        assert_eq!(source.page_count(), 2);
        let first = source.page(0).unwrap();
        assert_eq!(first.width, 595.0);
        assert_eq!(first.tokens[0].text, "নাম:");
        assert!(source.page(1).unwrap().tokens.is_empty());
        assert!(matches!(source.page(2), Err(Error::TokenSource(_))));
    }

    #[test]
    fn test_json_bare_token_list() {
        let json = r#"[{"text": "রহিম", "x": 40, "y": 100, "width": 30, "height": 10}]"#;
        let mut source = JsonTokenSource::from_json(json).unwrap();
        assert_eq!(source.page_count(), 1);
        assert_eq!(source.page(0).unwrap().tokens[0].width, 30.0);
    }

    #[test]
    fn test_json_garbage_rejected() {
        assert!(matches!(JsonTokenSource::from_json("{"), Err(Error::TokenSource(_))));
    }

    #[test]
    fn test_pdf_text_layer() {
        let bytes = crate::template::builtin::render(None).unwrap();
        let mut source = PdfTextSource::from_bytes(&bytes).unwrap();
        assert_eq!(source.page_count(), 1);
        let page = source.page(0).unwrap();
        assert_eq!((page.width, page.height), (260.0, 210.0));
        assert!(page.tokens.iter().any(|t| t.text == "Voter No:" && t.x == 12.0 && t.y == 103.0));
    }

    #[test]
    fn test_pdf_garbage_is_source_error() {
        assert!(matches!(
            PdfTextSource::from_bytes(b"%PDF-1.4 nonsense"),
            Err(Error::TokenSource(_))
        ));
    }
}
