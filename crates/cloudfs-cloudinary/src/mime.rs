//! Extension-based MIME type detection

use cloudfs_core::ports::IMimeTypeDetector;

/// Detects MIME types from the file extension using `mime_guess`
#[derive(Debug, Clone, Copy, Default)]
pub struct GuessMimeTypeDetector;

impl IMimeTypeDetector for GuessMimeTypeDetector {
    fn detect_from_path(&self, path: &str) -> Option<String> {
        mime_guess::from_path(path)
            .first()
            .map(|mime| mime.essence_str().to_string())
    }
}
