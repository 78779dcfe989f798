//! Plain-text sources for gazette documents.
//!
//! Text extraction from typeset or scanned documents happens outside this
//! crate; these adapters are the seam the service calls through.

use std::sync::Arc;

/// Failure inside a text extraction collaborator. Fatal to the run.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("document is not valid UTF-8 text: {0}")]
    Encoding(#[from] std::str::Utf8Error),
    #[error("text recognition failed: {0}")]
    Recognition(String),
    #[error("document source unavailable: {0}")]
    Unavailable(String),
}

/// Best-effort document-to-text extraction.
pub trait TextSource: Send + Sync {
    fn extract_text(&self, document: &[u8]) -> Result<String, SourceError>;
}

impl<T: TextSource + ?Sized> TextSource for Arc<T> {
    fn extract_text(&self, document: &[u8]) -> Result<String, SourceError> {
        (**self).extract_text(document)
    }
}

/// Treats the document bytes as already-extracted UTF-8 text.
#[derive(Debug, Default, Clone, Copy)]
pub struct Utf8TextSource;

impl TextSource for Utf8TextSource {
    fn extract_text(&self, document: &[u8]) -> Result<String, SourceError> {
        let text = std::str::from_utf8(document)?;
        Ok(text.trim_start_matches('\u{feff}').to_string())
    }
}

/// Uses `fallback` (typically image-based recognition) when `primary` yields
/// no usable text.
#[derive(Debug, Clone)]
pub struct FallbackTextSource<P, F> {
    primary: P,
    fallback: F,
}

impl<P, F> FallbackTextSource<P, F> {
    pub fn new(primary: P, fallback: F) -> Self {
        Self { primary, fallback }
    }
}

impl<P, F> TextSource for FallbackTextSource<P, F>
where
    P: TextSource,
    F: TextSource,
{
    fn extract_text(&self, document: &[u8]) -> Result<String, SourceError> {
        let text = self.primary.extract_text(document)?;
        if !text.trim().is_empty() {
            return Ok(text);
        }

        tracing::debug!("primary extraction produced no text; using fallback source");
        self.fallback.extract_text(document)
    }
}
