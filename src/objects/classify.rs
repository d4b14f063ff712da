//! Media kind classification by key suffix

use serde::{Deserialize, Serialize};
use std::fmt;

const IMAGE_EXTENSIONS: [&str; 7] = [".png", ".jpg", ".jpeg", ".gif", ".svg", ".webp", ".tiff"];
const VIDEO_EXTENSIONS: [&str; 3] = [".mp4", ".avi", ".webm"];
const PDF_EXTENSIONS: [&str; 1] = [".pdf"];

/// How an object is previewed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    /// Inline image
    Image,
    /// Inline video player
    Video,
    /// Inline PDF viewer
    Pdf,
    /// Download link only
    Other,
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
            MediaKind::Pdf => "pdf",
            MediaKind::Other => "other",
        };
        write!(f, "{}", name)
    }
}

/// Classify an object key by its lowercased suffix
///
/// Video is checked before PDF, and PDF before image.
pub fn classify(key: &str) -> MediaKind {
    let key = key.to_lowercase();
    let has_suffix = |exts: &[&str]| exts.iter().any(|ext| key.ends_with(*ext));

    if has_suffix(&VIDEO_EXTENSIONS[..]) {
        MediaKind::Video
    } else if has_suffix(&PDF_EXTENSIONS[..]) {
        MediaKind::Pdf
    } else if has_suffix(&IMAGE_EXTENSIONS[..]) {
        MediaKind::Image
    } else {
        MediaKind::Other
    }
}
