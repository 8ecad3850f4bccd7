//! Extension resolution for uploads.
//!
//! The declared filename wins over content sniffing: a file named `notes.txt`
//! keeps `.txt` even when its bytes look like a PNG.

use std::borrow::Cow;

/// Derive the leading-dot extension for an upload.
///
/// 1. The last dot-suffix of `name`, when it has at least one character.
/// 2. Otherwise the extension sniffed from the magic bytes of `data`.
/// 3. Otherwise the empty string.
///
/// ```
/// use coffer_storage::resolve_extension;
///
/// assert_eq!(resolve_extension("report.pdf", b"anything"), ".pdf");
/// assert_eq!(resolve_extension("README", b"plain text"), "");
/// ```
pub fn resolve_extension(name: &str, data: &[u8]) -> String {
    if let Some(ext) = declared_extension(name) {
        return ext.to_string();
    }

    match infer::get(data) {
        Some(kind) => {
            tracing::debug!(name, detected = kind.extension(), "Sniffed extension from content");
            format!(".{}", kind.extension())
        }
        None => String::new(),
    }
}

/// The last `.xxx` suffix of the final path segment of `name`.
///
/// Dotfiles such as `.env` have no extension.
fn declared_extension(name: &str) -> Option<&str> {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let dot = base.rfind('.')?;
    if dot == 0 || dot + 1 == base.len() {
        return None;
    }
    Some(&base[dot..])
}

/// Percent-decode a declared filename.
///
/// Names that are not valid percent-encoded UTF-8 are kept verbatim.
pub fn decode_name(name: &str) -> Cow<'_, str> {
    urlencoding::decode(name).unwrap_or(Cow::Borrowed(name))
}
