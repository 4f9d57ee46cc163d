use crate::models::MediaKind;

/// Marker prefixed to every synthetic summary.
/// No digits and no `@`, so redaction leaves it intact.
pub const SYNTHETIC_TEXT_SENTINEL: &str = "[[LEXSCAN:SYNTHETIC-SUMMARY]]";

/// Descriptive stand-in text built from file metadata alone.
///
/// Downstream stages recognise it through [`super::DocumentText::Synthetic`]
/// and never treat it as document evidence.
pub fn synthetic_summary(file_name: &str, file_size_bytes: u64, kind: MediaKind) -> String {
    let kind_label = match kind {
        MediaKind::Pdf => "PDF document",
        MediaKind::PlainText => "plain-text document",
        MediaKind::Other => "file of unrecognized type",
    };
    format!(
        "{SYNTHETIC_TEXT_SENTINEL} No readable text could be extracted from \"{}\". \
         The upload is a {kind_label} of {}. Review the original file directly.",
        display_name(file_name),
        human_size(file_size_bytes),
    )
}

fn display_name(file_name: &str) -> &str {
    let trimmed = file_name.trim();
    if trimmed.is_empty() {
        "unnamed upload"
    } else {
        trimmed
    }
}

fn human_size(bytes: u64) -> String {
    const KIB: f64 = 1024.0;
    const MIB: f64 = KIB * 1024.0;
    let b = bytes as f64;
    if b >= MIB {
        format!("{:.1} MB", b / MIB)
    } else if b >= KIB {
        format!("{:.1} KB", b / KIB)
    } else {
        format!("{bytes} bytes")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_is_marked() {
        let text = synthetic_summary("nta_scan.pdf", 2048, MediaKind::Pdf);
        assert!(text.starts_with(SYNTHETIC_TEXT_SENTINEL));
        assert!(text.contains("nta_scan.pdf"));
        assert!(text.contains("PDF document"));
        assert!(text.contains("2.0 KB"));
    }

    #[test]
    fn empty_file_name_is_described() {
        let text = synthetic_summary("  ", 10, MediaKind::Other);
        assert!(text.contains("unnamed upload"));
        assert!(text.contains("10 bytes"));
    }

    #[test]
    fn sizes_scale() {
        assert_eq!(human_size(512), "512 bytes");
        assert_eq!(human_size(3 * 1024 * 1024), "3.0 MB");
    }
}
