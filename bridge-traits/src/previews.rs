//! Local Preview Cache Abstraction
//!
//! Path resolution and existence checks for locally cached preview and
//! icon files, keyed by item id and content etag. Pure path math plus a
//! cheap cache probe; no I/O beyond existence checks.

use std::path::PathBuf;

use crate::store::{FileRecord, ItemId};

/// Local storage of fetched preview and icon images.
pub trait PreviewStore: Send + Sync {
    /// Whether a cached preview/icon already exists for this item at
    /// this content version
    fn preview_exists(&self, id: &ItemId, etag: &str) -> bool;

    /// Local path where the larger preview for this item is stored
    fn preview_path(&self, id: &ItemId, etag: &str) -> PathBuf;

    /// Local path where the small icon for this item is stored
    fn icon_path(&self, id: &ItemId, etag: &str) -> PathBuf;

    /// Remote source identifier for a preview fetch of `record`,
    /// resolved against the active server base URL
    fn remote_source(&self, record: &FileRecord, active_url: &str) -> String;
}
