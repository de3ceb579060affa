//! MIME type detection port
//!
//! The adapter never trusts the remote store for content types; it infers
//! them locally from the path. Implementations are pluggable so callers can
//! supply their own extension map.

/// Maps a path to a MIME type
pub trait IMimeTypeDetector: Send + Sync {
    /// Returns the MIME type for `path`, or `None` if it cannot be determined
    fn detect_from_path(&self, path: &str) -> Option<String>;
}
