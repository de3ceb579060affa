//! Folder addressing mode of the remote account

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::errors::DomainError;

/// How the remote store represents folders
///
/// Fixed for the lifetime of an adapter and passed explicitly to every
/// translation and listing function.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FolderMode {
    /// Folders are an `asset_folder` attribute; public IDs are base names
    #[default]
    Dynamic,
    /// Folders are encoded in the public ID as `dir/name`
    Fixed,
}

impl Display for FolderMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dynamic => write!(f, "dynamic"),
            Self::Fixed => write!(f, "fixed"),
        }
    }
}

impl FromStr for FolderMode {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dynamic" => Ok(Self::Dynamic),
            "fixed" => Ok(Self::Fixed),
            other => Err(DomainError::ValidationFailed(format!(
                "Unknown folder mode '{other}', expected 'dynamic' or 'fixed'"
            ))),
        }
    }
}
