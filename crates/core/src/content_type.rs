/// Extensions stored untransformed because any re-encoding would alter bytes.
const DOCUMENT_EXTENSIONS: &[&str] = &["pdf", "doc", "docx", "txt", "zip", "rar", "xlsx", "pptx"];

fn extension(filename: &str) -> Option<String> {
    let (_, ext) = filename.rsplit_once('.')?;
    Some(ext.to_ascii_lowercase())
}

/// MIME type served for a downloaded file, inferred from its display name.
pub fn content_type_for(filename: &str) -> &'static str {
    match extension(filename).as_deref() {
        Some("pdf") => "application/pdf",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("txt") => "text/plain",
        Some("doc" | "docx") => "application/msword",
        _ => "application/octet-stream",
    }
}

/// Whether `filename` names a document that must never be transformed.
pub fn is_document(filename: &str) -> bool {
    extension(filename).is_some_and(|ext| is_document_extension(&ext))
}

/// Whether a bare extension or format name (`"pdf"`, `"DOCX"`) is a document.
pub fn is_document_extension(ext: &str) -> bool {
    DOCUMENT_EXTENSIONS
        .iter()
        .any(|doc| doc.eq_ignore_ascii_case(ext))
}
