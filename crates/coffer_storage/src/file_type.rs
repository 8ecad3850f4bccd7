//! Coarse file type categories.

use serde::{Deserialize, Serialize};

/// Coarse category of a stored file, derived from its extension.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    strum::EnumIter,
    strum::Display,
    strum::EnumString,
    strum::IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum FileType {
    /// Raster and vector images (PNG, JPEG, SVG, etc.)
    Image,
    /// Video content (MP4, WebM, MOV, etc.)
    Video,
    /// Audio content (MP3, WAV, FLAC, etc.)
    Audio,
    /// Documents, spreadsheets, presentations and text
    Document,
    /// Compressed archives
    Archive,
    /// Anything not in the table
    #[default]
    Other,
}

impl FileType {
    /// Map an extension to its category.
    ///
    /// Accepts the extension with or without its leading dot and ignores case.
    /// Unknown or empty extensions map to [`FileType::Other`].
    ///
    /// ```
    /// use coffer_storage::FileType;
    ///
    /// assert_eq!(FileType::for_extension(".PNG"), FileType::Image);
    /// assert_eq!(FileType::for_extension("pdf"), FileType::Document);
    /// assert_eq!(FileType::for_extension(".xyz"), FileType::Other);
    /// ```
    pub fn for_extension(extension: &str) -> Self {
        let ext = extension.trim_start_matches('.').to_ascii_lowercase();
        match ext.as_str() {
            "png" | "jpg" | "jpeg" | "gif" | "webp" | "bmp" | "tif" | "tiff" | "svg" | "ico"
            | "heic" | "heif" | "avif" => FileType::Image,
            "mp4" | "m4v" | "mov" | "avi" | "mkv" | "webm" | "wmv" | "flv" | "mpeg" | "mpg"
            | "3gp" => FileType::Video,
            "mp3" | "wav" | "ogg" | "oga" | "flac" | "aac" | "m4a" | "wma" | "opus" | "mid"
            | "midi" => FileType::Audio,
            "pdf" | "doc" | "docx" | "xls" | "xlsx" | "ppt" | "pptx" | "odt" | "ods" | "odp"
            | "rtf" | "txt" | "md" | "csv" | "epub" => FileType::Document,
            "zip" | "rar" | "7z" | "tar" | "gz" | "tgz" | "bz2" | "xz" | "zst" => {
                FileType::Archive
            }
            _ => FileType::Other,
        }
    }

    /// Convert to string representation for metadata storage.
    pub fn as_str(&self) -> &'static str {
        self.into()
    }
}
