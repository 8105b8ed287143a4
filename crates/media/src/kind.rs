use serde::{Deserialize, Serialize};

/// Broad media classification used for library grouping and preview routing.
///
/// Serialized values are part of the persisted-library contract, so the
/// lowercase names must stay stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Video,
    Audio,
    Image,
    Unknown,
}

/// Video container extensions the library will surface.
pub const VIDEO_EXTENSIONS: &[&str] = &[
    "mp4", "avi", "mov", "mkv", "wmv", "flv", "webm", "m4v", "3gp",
];

/// Audio extensions the library will surface.
pub const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "aac", "flac", "ogg", "m4a", "wma"];

/// Still-image extensions the library will surface.
pub const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "bmp", "webp", "svg", "tiff",
];

impl MediaKind {
    /// Classifies a file extension (with or without the leading dot).
    pub fn from_extension(extension: &str) -> Self {
        let normalized = normalize_extension(extension);
        let normalized = normalized.as_str();

        if VIDEO_EXTENSIONS.contains(&normalized) {
            Self::Video
        } else if AUDIO_EXTENSIONS.contains(&normalized) {
            Self::Audio
        } else if IMAGE_EXTENSIONS.contains(&normalized) {
            Self::Image
        } else {
            Self::Unknown
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Audio => "audio",
            Self::Image => "image",
            Self::Unknown => "unknown",
        }
    }
}

/// Returns true when the extension belongs to a kind the library lists.
pub fn is_supported_extension(extension: &str) -> bool {
    !matches!(MediaKind::from_extension(extension), MediaKind::Unknown)
}

/// Maps a file extension to its MIME type.
///
/// Unrecognized extensions fall back to `application/octet-stream` so every
/// entry the library hands out carries a usable content type.
pub fn mime_type_for_extension(extension: &str) -> &'static str {
    match normalize_extension(extension).as_str() {
        "mp4" | "m4v" => "video/mp4",
        "avi" => "video/avi",
        "mov" => "video/quicktime",
        "mkv" => "video/x-matroska",
        "wmv" => "video/x-ms-wmv",
        "flv" => "video/x-flv",
        "webm" => "video/webm",
        "3gp" => "video/3gpp",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "aac" => "audio/aac",
        "flac" => "audio/flac",
        "ogg" => "audio/ogg",
        "m4a" => "audio/mp4",
        "wma" => "audio/x-ms-wma",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "tiff" => "image/tiff",
        _ => "application/octet-stream",
    }
}

fn normalize_extension(extension: &str) -> String {
    extension.trim().trim_start_matches('.').to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_every_supported_extension_into_its_kind() {
        for extension in VIDEO_EXTENSIONS {
            assert_eq!(MediaKind::from_extension(extension), MediaKind::Video);
        }
        for extension in AUDIO_EXTENSIONS {
            assert_eq!(MediaKind::from_extension(extension), MediaKind::Audio);
        }
        for extension in IMAGE_EXTENSIONS {
            assert_eq!(MediaKind::from_extension(extension), MediaKind::Image);
        }
    }

    #[test]
    fn classification_ignores_case_and_leading_dot() {
        assert_eq!(MediaKind::from_extension(".MP4"), MediaKind::Video);
        assert_eq!(MediaKind::from_extension("Jpeg"), MediaKind::Image);
        assert_eq!(MediaKind::from_extension(".WAV"), MediaKind::Audio);
    }

    #[test]
    fn unknown_extensions_fall_through() {
        assert_eq!(MediaKind::from_extension("exe"), MediaKind::Unknown);
        assert_eq!(MediaKind::from_extension(""), MediaKind::Unknown);
        assert!(!is_supported_extension("txt"));
        assert_eq!(
            mime_type_for_extension("txt"),
            "application/octet-stream"
        );
    }

    #[test]
    fn mime_table_matches_container_families() {
        assert_eq!(mime_type_for_extension("mp4"), "video/mp4");
        assert_eq!(mime_type_for_extension("m4v"), "video/mp4");
        assert_eq!(mime_type_for_extension("mov"), "video/quicktime");
        assert_eq!(mime_type_for_extension("m4a"), "audio/mp4");
        assert_eq!(mime_type_for_extension("svg"), "image/svg+xml");
    }

    #[test]
    fn serde_uses_lowercase_kind_names() {
        let encoded = serde_json::to_string(&MediaKind::Video).expect("serialize kind");
        assert_eq!(encoded, "\"video\"");

        let decoded: MediaKind = serde_json::from_str("\"image\"").expect("deserialize kind");
        assert_eq!(decoded, MediaKind::Image);
    }
}
