use super::types::{ExtractionStrategy, PageText};
use super::ExtractionError;
use crate::models::ExtractionMethod;

const BOM: char = '\u{FEFF}';
const FORM_FEED: char = '\u{000C}';

/// Above this share of undecodable characters the input is treated as binary.
const MAX_REPLACEMENT_SHARE: f32 = 0.10;

/// Strict UTF-8 decode. Form feeds split pages.
pub struct Utf8DecodeStrategy;

impl ExtractionStrategy for Utf8DecodeStrategy {
    fn method(&self) -> ExtractionMethod {
        ExtractionMethod::Utf8Decode
    }

    fn extract(&self, bytes: &[u8]) -> Result<Vec<PageText>, ExtractionError> {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| ExtractionError::EncodingError(e.to_string()))?;
        Ok(split_pages(text.trim_start_matches(BOM)))
    }
}

/// Lossy decode of whatever bytes arrived. Refuses obviously binary input.
pub struct LossyDecodeStrategy;

impl ExtractionStrategy for LossyDecodeStrategy {
    fn method(&self) -> ExtractionMethod {
        ExtractionMethod::LossyDecode
    }

    fn extract(&self, bytes: &[u8]) -> Result<Vec<PageText>, ExtractionError> {
        let text = String::from_utf8_lossy(bytes);

        let total = text.chars().count();
        if total > 0 {
            let undecodable = text
                .chars()
                .filter(|&c| {
                    c == char::REPLACEMENT_CHARACTER
                        || (c.is_control() && !matches!(c, '\n' | '\r' | '\t' | FORM_FEED))
                })
                .count();
            let share = undecodable as f32 / total as f32;
            if share > MAX_REPLACEMENT_SHARE {
                return Err(ExtractionError::BinaryContent {
                    replacement_share: share * 100.0,
                });
            }
        }

        Ok(split_pages(text.trim_start_matches(BOM)))
    }
}

fn split_pages(text: &str) -> Vec<PageText> {
    text.split(FORM_FEED)
        .enumerate()
        .map(|(i, page)| PageText {
            page_number: i + 1,
            text: page.to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utf8_reads_text() {
        let pages = Utf8DecodeStrategy.extract("Matter of Peña".as_bytes()).unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].text, "Matter of Peña");
    }

    #[test]
    fn utf8_strips_bom() {
        let bytes = "\u{FEFF}Brief in support".as_bytes();
        let pages = Utf8DecodeStrategy.extract(bytes).unwrap();
        assert_eq!(pages[0].text, "Brief in support");
    }

    #[test]
    fn utf8_rejects_invalid_bytes() {
        let result = Utf8DecodeStrategy.extract(&[0x66, 0x6f, 0xff, 0xfe]);
        assert!(matches!(result, Err(ExtractionError::EncodingError(_))));
    }

    #[test]
    fn form_feed_splits_pages() {
        let pages = Utf8DecodeStrategy.extract(b"page one\x0cpage two\x0cpage three").unwrap();
        assert_eq!(pages.len(), 3);
        assert_eq!(pages[2].page_number, 3);
        assert_eq!(pages[1].text, "page two");
    }

    #[test]
    fn lossy_tolerates_stray_bytes() {
        let mut bytes = b"Order of the Immigration Judge granting relief".to_vec();
        bytes.push(0xff);
        let pages = LossyDecodeStrategy.extract(&bytes).unwrap();
        assert!(pages[0].text.starts_with("Order of the Immigration Judge"));
    }

    #[test]
    fn lossy_rejects_binary() {
        let bytes: Vec<u8> = (0u8..=255).cycle().take(2048).collect();
        let result = LossyDecodeStrategy.extract(&bytes);
        assert!(matches!(result, Err(ExtractionError::BinaryContent { .. })));
    }
}
