//! Metadata Store Abstraction
//!
//! Defines the contract with the persistent file-metadata store and the
//! record model shared across the workspace. The store owns its own
//! consistency for concurrent writes; callers only describe *what* to
//! look up or mutate.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::{BridgeError, Result};
use crate::remote::RemoteEntry;

/// Stable identifier of a remote file or folder object.
///
/// The provider assigns this id; it survives renames and moves and is the
/// de-duplication and cancellation key throughout the transfer subsystem.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemId(String);

impl ItemId {
    /// Wrap a provider-assigned object id
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the string representation
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ItemId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Server-side path of a file or folder.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RemotePath(String);

impl RemotePath {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Append a path component
    pub fn join(&self, name: &str) -> RemotePath {
        if self.0.ends_with('/') {
            RemotePath(format!("{}{}", self.0, name))
        } else {
            RemotePath(format!("{}/{}", self.0, name))
        }
    }

    /// Whether `other` lives under this path (prefix match on components)
    pub fn is_ancestor_of(&self, other: &RemotePath) -> bool {
        other.0.starts_with(&self.0)
            && (other.0.len() == self.0.len()
                || self.0.ends_with('/')
                || other.0.as_bytes().get(self.0.len()) == Some(&b'/'))
    }
}

impl std::fmt::Display for RemotePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle status of a stored record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    /// Record is settled; no transfer in flight
    Normal,
    /// A download for this record is in flight
    Downloading,
    /// An upload for this record is in flight
    Uploading,
}

impl RecordStatus {
    /// Get the string representation for storage
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Downloading => "downloading",
            Self::Uploading => "uploading",
        }
    }
}

impl FromStr for RecordStatus {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "normal" => Ok(Self::Normal),
            "downloading" => Ok(Self::Downloading),
            "uploading" => Ok(Self::Uploading),
            _ => Err(BridgeError::InvalidValue(format!(
                "Invalid record status: {}",
                s
            ))),
        }
    }
}

/// Stored attribute snapshot of a remote file or folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Provider-assigned object id
    pub id: ItemId,
    /// Server path of the containing folder
    pub path: RemotePath,
    /// File or folder name
    pub name: String,
    /// Whether this record describes a folder
    pub is_directory: bool,
    /// Content-version tag reported by the server
    pub etag: String,
    /// Record lifecycle status
    pub status: RecordStatus,
    /// Marked as favorite
    pub favorite: bool,
    /// Server reports a preview is available
    pub has_preview: bool,
    /// Type-specific placeholder icon name, if any
    pub icon_name: Option<String>,
    /// Remote creation timestamp
    pub created_at: Option<DateTime<Utc>>,
    /// Remote upload timestamp
    pub uploaded_at: Option<DateTime<Utc>>,
    /// Size in bytes
    pub size: u64,
    /// MIME type, if known
    pub content_type: Option<String>,
}

impl FileRecord {
    /// Full server path of this item (folder path + name)
    pub fn full_path(&self) -> RemotePath {
        self.path.join(&self.name)
    }
}

/// Match criterion for store lookups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordQuery {
    /// The exact record at `path`, with the given status
    Exact { path: RemotePath, status: RecordStatus },
    /// Every record whose path is under `root`, with the given status
    Subtree { root: RemotePath, status: RecordStatus },
}

/// Persistent metadata store.
///
/// Implementations must provide their own internal consistency for
/// concurrent writes; the transfer core mutates the store from several
/// queues at once and serializes only synchronization-driven writes.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Convert remote listing entries into store records.
    ///
    /// When `include_folder` is true the listed folder itself is
    /// converted alongside its children (directory listings); otherwise
    /// only the entries are converted.
    async fn convert_entries(
        &self,
        entries: Vec<RemoteEntry>,
        include_folder: bool,
    ) -> Result<Vec<FileRecord>>;

    /// Look up stored records matching a query
    async fn find_records(&self, query: RecordQuery) -> Result<Vec<FileRecord>>;

    /// Compute the delta between remote-reported and stored records and
    /// apply it, returning the records that changed.
    ///
    /// When `verify_local` is true, local file presence is checked while
    /// computing the delta (download-triggering synchronization).
    async fn apply_updates(
        &self,
        remote: Vec<FileRecord>,
        stored: Vec<FileRecord>,
        verify_local: bool,
    ) -> Result<Vec<FileRecord>>;

    /// Insert or update a single record
    async fn upsert_record(&self, record: &FileRecord) -> Result<()>;

    /// Delete the record with the given id
    async fn delete_record(&self, id: &ItemId) -> Result<()>;

    /// Delete the folder at `root` and everything stored under it
    async fn delete_subtree(&self, root: &RemotePath) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(path: &str, name: &str) -> FileRecord {
        FileRecord {
            id: ItemId::new("id-1"),
            path: RemotePath::new(path),
            name: name.to_string(),
            is_directory: false,
            etag: "etag-1".to_string(),
            status: RecordStatus::Normal,
            favorite: false,
            has_preview: false,
            icon_name: None,
            created_at: None,
            uploaded_at: None,
            size: 0,
            content_type: None,
        }
    }

    #[test]
    fn test_full_path_joins_name() {
        let rec = record("/remote/files", "report.pdf");
        assert_eq!(rec.full_path().as_str(), "/remote/files/report.pdf");

        let rec = record("/remote/files/", "report.pdf");
        assert_eq!(rec.full_path().as_str(), "/remote/files/report.pdf");
    }

    #[test]
    fn test_ancestor_check() {
        let root = RemotePath::new("/remote/files/photos");
        assert!(root.is_ancestor_of(&RemotePath::new("/remote/files/photos/2024/a.jpg")));
        assert!(root.is_ancestor_of(&RemotePath::new("/remote/files/photos")));
        assert!(!root.is_ancestor_of(&RemotePath::new("/remote/files/photos-old/a.jpg")));
        assert!(!root.is_ancestor_of(&RemotePath::new("/remote/files")));
    }

    #[test]
    fn test_record_status_round_trip() {
        assert_eq!(RecordStatus::Normal.as_str(), "normal");
        assert_eq!("normal".parse::<RecordStatus>().unwrap(), RecordStatus::Normal);
        assert!("bogus".parse::<RecordStatus>().is_err());
    }

    #[test]
    fn test_record_serialization() {
        let rec = record("/remote/files", "report.pdf");
        let json = serde_json::to_string(&rec).unwrap();
        let back: FileRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, rec);
    }
}
