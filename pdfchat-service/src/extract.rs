//! Turning uploaded bytes into plain text.
//!
//! Extractors are looked up by file extension, case-insensitively. The
//! default registry handles `.pdf` (when the `pdf` feature is enabled),
//! `.txt` and `.md`.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{Result, ServiceError};

/// Converts raw file bytes into text.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    /// Extract the text of `bytes`. `filename` is only used in error messages.
    async fn extract(&self, bytes: &[u8], filename: &str) -> Result<String>;
}

/// PDF text extraction via `pdf-extract`.
///
/// The parser is synchronous and can panic on malformed input, so it runs on
/// the blocking pool; a panic there surfaces as an extraction error.
#[cfg(feature = "pdf")]
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfTextExtractor;

#[cfg(feature = "pdf")]
#[async_trait]
impl TextExtractor for PdfTextExtractor {
    async fn extract(&self, bytes: &[u8], filename: &str) -> Result<String> {
        let owned = bytes.to_vec();
        let joined =
            tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&owned)).await;

        match joined {
            Ok(Ok(text)) => Ok(text),
            Ok(Err(e)) => Err(extraction_error(filename, format!("PDF parse error: {e}"))),
            Err(e) => Err(extraction_error(filename, format!("PDF parser aborted: {e}"))),
        }
    }
}

/// UTF-8 text files (`.txt`, `.md`). A leading byte-order mark is dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextExtractor;

#[async_trait]
impl TextExtractor for PlainTextExtractor {
    async fn extract(&self, bytes: &[u8], filename: &str) -> Result<String> {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| extraction_error(filename, format!("file is not valid UTF-8: {e}")))?;
        Ok(text.strip_prefix('\u{feff}').unwrap_or(text).to_string())
    }
}

fn extraction_error(filename: &str, message: String) -> ServiceError {
    ServiceError::Extraction { filename: filename.to_string(), message }
}

/// Maps lowercase file extensions to extractors.
#[derive(Clone)]
pub struct ExtractorRegistry {
    extractors: BTreeMap<String, Arc<dyn TextExtractor>>,
}

impl ExtractorRegistry {
    /// A registry with no extractors.
    pub fn empty() -> Self {
        Self { extractors: BTreeMap::new() }
    }

    /// Register `extractor` for `extension` (without the leading dot),
    /// replacing any previous registration.
    pub fn register(&mut self, extension: &str, extractor: Arc<dyn TextExtractor>) -> &mut Self {
        let key = extension.trim_start_matches('.').to_ascii_lowercase();
        self.extractors.insert(key, extractor);
        self
    }

    pub fn with(mut self, extension: &str, extractor: Arc<dyn TextExtractor>) -> Self {
        self.register(extension, extractor);
        self
    }

    /// Supported extensions, sorted, each with a leading dot.
    pub fn supported(&self) -> Vec<String> {
        self.extractors.keys().map(|ext| format!(".{ext}")).collect()
    }

    /// The extractor responsible for `filename`.
    pub fn for_filename(&self, filename: &str) -> Result<Arc<dyn TextExtractor>> {
        let extension = Path::new(filename)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        self.extractors.get(&extension).cloned().ok_or_else(|| {
            ServiceError::UnsupportedFileType {
                filename: filename.to_string(),
                supported: self.supported().join(", "),
            }
        })
    }
}

impl Default for ExtractorRegistry {
    fn default() -> Self {
        let plain: Arc<dyn TextExtractor> = Arc::new(PlainTextExtractor);
        let registry = Self::empty().with("txt", plain.clone()).with("md", plain);
        #[cfg(feature = "pdf")]
        let registry = registry.with("pdf", Arc::new(PdfTextExtractor));
        registry
    }
}
