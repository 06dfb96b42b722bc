//! Remote Client Abstraction
//!
//! Contract with the network collaborator that performs the actual
//! transfers (downloads, depth-qualified listings, preview fetches).
//! Hosts bring the transport; the transfer core only drives it.
//!
//! Outcomes follow the server's code convention: 0 is success, 404 is
//! not-found, anything else is a transport failure. Success maps to
//! `Ok`, the rest to [`RemoteError`].

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

use crate::error::BridgeError;
use crate::store::{FileRecord, ItemId, RemotePath};

/// Failure outcome of a remote operation.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteError {
    /// The server reported the object does not exist (404)
    #[error("Remote object not found")]
    NotFound,

    /// Any other non-success outcome
    #[error("Remote transport failure (code {code})")]
    Transport { code: i32 },
}

impl RemoteError {
    /// Map a raw outcome code; 0 means success and maps to `None`
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => None,
            404 => Some(Self::NotFound),
            other => Some(Self::Transport { code: other }),
        }
    }

    /// The outcome code carried by this error
    pub fn code(&self) -> i32 {
        match self {
            Self::NotFound => 404,
            Self::Transport { code } => *code,
        }
    }
}

pub type RemoteResult<T> = std::result::Result<T, RemoteError>;

/// Traversal scope of a listing request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Depth {
    /// This item only
    Zero,
    /// The item and its full subtree
    Infinity,
}

impl Depth {
    /// Wire representation used by the listing request
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Zero => "0",
            Self::Infinity => "infinity",
        }
    }
}

/// Caller intent behind a download or synchronization request.
///
/// Branches behavior downstream: `Synchronize` marks a
/// download-triggering synchronization and makes a directory sync fan
/// out into downloads for every changed file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Selector {
    /// Open the file in the app
    Open,
    /// Keep the file available offline
    Offline,
    /// Save the file to the local media library
    SaveMedia,
    /// Download-triggering synchronization
    Synchronize,
}

impl Selector {
    /// Get the string representation for logging and storage
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Offline => "offline",
            Self::SaveMedia => "save-media",
            Self::Synchronize => "synchronize",
        }
    }

    /// Whether this selector makes a synchronization fan out into
    /// downloads of changed files
    pub fn triggers_download(&self) -> bool {
        matches!(self, Self::Synchronize)
    }
}

impl FromStr for Selector {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(Self::Open),
            "offline" => Ok(Self::Offline),
            "save-media" => Ok(Self::SaveMedia),
            "synchronize" => Ok(Self::Synchronize),
            _ => Err(BridgeError::InvalidValue(format!("Invalid selector: {}", s))),
        }
    }
}

impl std::fmt::Display for Selector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// File or folder descriptor returned by a remote listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteEntry {
    /// Provider-assigned object id
    pub id: ItemId,
    /// Server path of the containing folder
    pub path: RemotePath,
    /// File or folder name
    pub name: String,
    /// Whether the entry is a folder
    pub is_directory: bool,
    /// Content-version tag
    pub etag: String,
    /// Server reports a preview is available
    pub has_preview: bool,
    /// Remote creation timestamp
    pub created_at: Option<DateTime<Utc>>,
    /// Remote upload timestamp
    pub uploaded_at: Option<DateTime<Utc>>,
    /// Size in bytes
    pub size: u64,
    /// MIME type, if reported
    pub content_type: Option<String>,
}

/// Dual-size preview fetch request.
#[derive(Debug, Clone)]
pub struct PreviewRequest {
    /// Remote source path or file id understood by the client
    pub source: String,
    /// Local destination for the larger preview
    pub preview_local: PathBuf,
    /// Local destination for the small icon
    pub icon_local: PathBuf,
    /// Preview edge length in pixels
    pub preview_size: u32,
    /// Icon edge length in pixels
    pub icon_size: u32,
}

/// Images produced by a preview fetch.
#[derive(Debug, Clone, Default)]
pub struct PreviewImages {
    /// Small icon, when the fetch produced one
    pub icon: Option<Bytes>,
    /// Larger preview, when the fetch produced one
    pub preview: Option<Bytes>,
}

/// Network client performing the actual transfers.
///
/// All operations suspend until the server answers. Cancellation is
/// cooperative: callers drop the in-flight future, which aborts the
/// underlying transfer.
#[async_trait]
pub trait RemoteClient: Send + Sync {
    /// Download the file described by `record`.
    ///
    /// `selector` records the caller's intent; when `set_favorite` is
    /// true the item is marked favorite after a successful transfer.
    async fn download(
        &self,
        record: &FileRecord,
        selector: Selector,
        set_favorite: bool,
    ) -> RemoteResult<()>;

    /// List the item at `path` with the given traversal depth.
    ///
    /// `body` optionally replaces the default property request with a
    /// caller-supplied structured query.
    async fn list_folder(
        &self,
        path: &RemotePath,
        depth: Depth,
        show_hidden: bool,
        body: Option<String>,
    ) -> RemoteResult<Vec<RemoteEntry>>;

    /// Fetch the dual-size preview images for one item
    async fn fetch_preview(&self, request: PreviewRequest) -> RemoteResult<PreviewImages>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_code_mapping() {
        assert_eq!(RemoteError::from_code(0), None);
        assert_eq!(RemoteError::from_code(404), Some(RemoteError::NotFound));
        assert_eq!(
            RemoteError::from_code(500),
            Some(RemoteError::Transport { code: 500 })
        );
        assert_eq!(RemoteError::NotFound.code(), 404);
        assert_eq!(RemoteError::Transport { code: 503 }.code(), 503);
    }

    #[test]
    fn test_depth_wire_format() {
        assert_eq!(Depth::Zero.as_str(), "0");
        assert_eq!(Depth::Infinity.as_str(), "infinity");
    }

    #[test]
    fn test_selector_round_trip() {
        for selector in [
            Selector::Open,
            Selector::Offline,
            Selector::SaveMedia,
            Selector::Synchronize,
        ] {
            assert_eq!(selector.as_str().parse::<Selector>().unwrap(), selector);
        }
        assert!("bogus".parse::<Selector>().is_err());
    }

    #[test]
    fn test_only_synchronize_triggers_download() {
        assert!(Selector::Synchronize.triggers_download());
        assert!(!Selector::Open.triggers_download());
        assert!(!Selector::Offline.triggers_download());
        assert!(!Selector::SaveMedia.triggers_download());
    }
}
