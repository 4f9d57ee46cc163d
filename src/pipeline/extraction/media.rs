use crate::models::MediaKind;

const PDF_MAGIC: &[u8] = b"%PDF";
const PDF_MEDIA_TYPE: &str = "application/pdf";
const FALLBACK_MEDIA_TYPE: &str = "application/octet-stream";

/// Decide which strategy chain applies.
///
/// Magic bytes win over the declared type, which wins over the file
/// extension. Anything unrecognized lands in `Other`.
pub fn resolve_media_kind(bytes: &[u8], declared: Option<&str>, file_name: &str) -> MediaKind {
    if bytes.starts_with(PDF_MAGIC) {
        return MediaKind::Pdf;
    }
    if let Some(kind) = declared.and_then(kind_for_media_type) {
        return kind;
    }
    mime_guess::from_path(file_name)
        .first()
        .and_then(|mime| kind_for_media_type(mime.essence_str()))
        .unwrap_or(MediaKind::Other)
}

/// Media type recorded on the job: the declared one, else a guess from the
/// file name, else `application/octet-stream`.
pub fn effective_media_type(declared: Option<&str>, file_name: &str) -> String {
    declared
        .map(normalize)
        .filter(|m| !m.is_empty())
        .or_else(|| mime_guess::from_path(file_name).first().map(|m| m.essence_str().to_string()))
        .unwrap_or_else(|| FALLBACK_MEDIA_TYPE.to_string())
}

fn kind_for_media_type(media_type: &str) -> Option<MediaKind> {
    let media_type = normalize(media_type);
    if media_type == PDF_MEDIA_TYPE {
        Some(MediaKind::Pdf)
    } else if media_type.starts_with("text/") {
        Some(MediaKind::PlainText)
    } else {
        None
    }
}

/// Lowercase and drop parameters (`text/plain; charset=utf-8` → `text/plain`).
fn normalize(media_type: &str) -> String {
    media_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}
