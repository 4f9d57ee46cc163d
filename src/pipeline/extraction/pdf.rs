use super::types::{ExtractionStrategy, PageText};
use super::ExtractionError;
use crate::models::ExtractionMethod;

/// Text-layer extraction using the pdf-extract crate.
/// Handles digital PDFs with embedded, well-formed text.
pub struct PdfTextLayerStrategy;

impl ExtractionStrategy for PdfTextLayerStrategy {
    fn method(&self) -> ExtractionMethod {
        ExtractionMethod::PdfTextLayer
    }

    fn extract(&self, bytes: &[u8]) -> Result<Vec<PageText>, ExtractionError> {
        let page_texts = pdf_extract::extract_text_from_mem_by_pages(bytes)
            .map_err(|e| ExtractionError::PdfParsing(e.to_string()))?;

        Ok(page_texts
            .into_iter()
            .enumerate()
            .map(|(i, text)| PageText {
                page_number: i + 1,
                text,
            })
            .collect())
    }
}

/// Walks page content streams with lopdf. Slower and cruder than the text
/// layer, but tolerates fonts and structures pdf-extract gives up on.
pub struct PdfObjectTextStrategy;

impl ExtractionStrategy for PdfObjectTextStrategy {
    fn method(&self) -> ExtractionMethod {
        ExtractionMethod::PdfObjectText
    }

    fn extract(&self, bytes: &[u8]) -> Result<Vec<PageText>, ExtractionError> {
        let doc = lopdf::Document::load_mem(bytes)
            .map_err(|e| ExtractionError::PdfParsing(e.to_string()))?;

        let pages = doc
            .get_pages()
            .into_keys()
            .enumerate()
            .map(|(i, number)| {
                // A single unreadable page should not sink the document.
                let text = doc.extract_text(&[number]).unwrap_or_else(|e| {
                    tracing::debug!(page = number, error = %e, "Page text unavailable");
                    String::new()
                });
                PageText {
                    page_number: i + 1,
                    text,
                }
            })
            .collect();

        Ok(pages)
    }
}
