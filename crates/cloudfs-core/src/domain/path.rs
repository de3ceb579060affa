//! Virtual filesystem paths
//!
//! [`VfsPath`] is the normalised form every adapter works with: relative,
//! slash-separated, no leading or trailing slash, and the empty string for
//! the root. [`PathPrefixer`] scopes an adapter to a subtree of the remote
//! store by transparently adding and removing a fixed prefix.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use super::errors::DomainError;

/// A normalised, root-relative virtual filesystem path
///
/// `""`, `"."` and `"/"` all denote the root. Empty and `.` segments are
/// dropped and `..` pops the previous segment; climbing above the root is
/// rejected. Segment content is otherwise preserved verbatim, so names with
/// spaces, brackets or braces survive untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VfsPath(String);

impl VfsPath {
    /// Parse and normalise a path
    ///
    /// # Errors
    /// Returns [`DomainError::PathTraversal`] if the path climbs above the root
    /// and [`DomainError::InvalidPath`] if it contains a NUL byte.
    pub fn parse(path: &str) -> Result<Self, DomainError> {
        if path.contains('\0') {
            return Err(DomainError::InvalidPath(format!(
                "Path contains a NUL byte: {path:?}"
            )));
        }

        let mut segments: Vec<&str> = Vec::new();
        for segment in path.split('/') {
            match segment {
                "" | "." => continue,
                ".." => {
                    if segments.pop().is_none() {
                        return Err(DomainError::PathTraversal(path.to_string()));
                    }
                }
                other => segments.push(other),
            }
        }

        Ok(Self(segments.join("/")))
    }

    /// The root path
    #[must_use]
    pub fn root() -> Self {
        Self(String::new())
    }

    /// Get the inner string reference
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true for the root path
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Directory portion of the path (`""` for entries directly under the root)
    #[must_use]
    pub fn dirname(&self) -> &str {
        match self.0.rfind('/') {
            Some(idx) => &self.0[..idx],
            None => "",
        }
    }

    /// Last segment of the path (`""` for the root)
    #[must_use]
    pub fn basename(&self) -> &str {
        match self.0.rfind('/') {
            Some(idx) => &self.0[idx + 1..],
            None => &self.0,
        }
    }

    /// Text after the last dot of the basename, if the basename has a dot
    ///
    /// `archive.tar.gz` yields `gz`, `.env` yields `env`, `README` yields `None`.
    #[must_use]
    pub fn extension(&self) -> Option<&str> {
        let basename = self.basename();
        basename.rfind('.').map(|idx| &basename[idx + 1..])
    }

    /// Basename without its last `.extension`
    #[must_use]
    pub fn file_stem(&self) -> &str {
        let basename = self.basename();
        match basename.rfind('.') {
            Some(idx) => &basename[..idx],
            None => basename,
        }
    }

    /// Parent directory as a path
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        if self.is_root() {
            None
        } else {
            Some(Self(self.dirname().to_string()))
        }
    }

    /// Append a relative path
    ///
    /// # Errors
    /// Returns an error if the joined path is invalid
    pub fn join(&self, child: &str) -> Result<Self, DomainError> {
        if self.is_root() {
            Self::parse(child)
        } else {
            Self::parse(&format!("{}/{child}", self.0))
        }
    }
}

impl Display for VfsPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for VfsPath {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for VfsPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<VfsPath> for String {
    fn from(path: VfsPath) -> Self {
        path.0
    }
}

// ============================================================================
// PathPrefixer
// ============================================================================

/// Maps adapter-relative paths to remote paths under a fixed prefix
///
/// An empty prefix is the identity mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathPrefixer {
    prefix: String,
}

impl PathPrefixer {
    /// Create a prefixer, normalising the prefix like any other path
    ///
    /// # Errors
    /// Returns an error if the prefix is not a valid path
    pub fn new(prefix: &str) -> Result<Self, DomainError> {
        let prefix = VfsPath::parse(prefix)?;
        Ok(Self {
            prefix: prefix.into(),
        })
    }

    /// The normalised prefix (`""` when none is configured)
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Remote location of an adapter-relative path
    #[must_use]
    pub fn prefix_path(&self, path: &VfsPath) -> String {
        if self.prefix.is_empty() {
            path.as_str().to_string()
        } else if path.is_root() {
            self.prefix.clone()
        } else {
            format!("{}/{}", self.prefix, path)
        }
    }

    /// Adapter-relative form of a remote location
    ///
    /// A remote path equal to the prefix maps to the root. Paths outside the
    /// prefix are returned unchanged.
    #[must_use]
    pub fn strip_prefix(&self, remote: &str) -> String {
        let remote = remote.trim_matches('/');
        if self.prefix.is_empty() {
            return remote.to_string();
        }
        if remote == self.prefix {
            return String::new();
        }
        remote
            .strip_prefix(self.prefix.as_str())
            .and_then(|rest| rest.strip_prefix('/'))
            .unwrap_or(remote)
            .to_string()
    }
}
