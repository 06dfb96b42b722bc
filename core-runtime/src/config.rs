//! # Core Configuration Module
//!
//! Assembles the transfer core's injected dependencies and tuning knobs.
//!
//! ## Overview
//!
//! The configuration system uses a builder to construct a [`CoreConfig`]
//! holding every collaborator bridge the transfer scheduler needs. It
//! enforces fail-fast validation: a missing bridge is reported with an
//! actionable error at build time, not as a panic deep inside a queue.
//!
//! There is deliberately no ambient global here. The built config is
//! handed to the scheduler once at startup and owned by it for the
//! process lifetime.
//!
//! ## Required Dependencies
//!
//! - `RemoteClient` - network transfers
//! - `MetadataStore` - persistent record store
//! - `PreviewStore` - local preview/icon cache
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::CoreConfig;
//! use std::sync::Arc;
//!
//! let config = CoreConfig::builder()
//!     .remote_client(Arc::new(MyDavClient::new()))
//!     .metadata_store(Arc::new(MyStore::new()))
//!     .preview_store(Arc::new(MyPreviewCache::new()))
//!     .build()
//!     .expect("Failed to build config");
//! ```

use bridge_traits::{MetadataStore, PreviewStore, RemoteClient};
use std::sync::Arc;
use std::time::Duration;

use crate::error::{Error, Result};

/// Tuning knobs for the transfer scheduler.
#[derive(Debug, Clone)]
pub struct TransferTuning {
    /// Window during which repeated media-reload requests collapse into
    /// one notification
    pub debounce_window: Duration,
    /// Edge length of fetched icons, in pixels
    pub icon_size: u32,
    /// Edge length of fetched previews, in pixels
    pub preview_size: u32,
    /// Whether remote listings include hidden files
    pub show_hidden_files: bool,
    /// Cross-fade duration when presenting a fetched thumbnail
    pub cross_fade: Duration,
}

impl Default for TransferTuning {
    fn default() -> Self {
        Self {
            debounce_window: Duration::from_secs(1),
            icon_size: 256,
            preview_size: 512,
            show_hidden_files: false,
            cross_fade: Duration::from_millis(750),
        }
    }
}

impl TransferTuning {
    /// Set the reload debounce window
    pub fn with_debounce_window(mut self, window: Duration) -> Self {
        self.debounce_window = window;
        self
    }

    /// Set the icon pixel size
    pub fn with_icon_size(mut self, size: u32) -> Self {
        self.icon_size = size;
        self
    }

    /// Set the preview pixel size
    pub fn with_preview_size(mut self, size: u32) -> Self {
        self.preview_size = size;
        self
    }

    /// Include hidden files in remote listings
    pub fn with_show_hidden_files(mut self, show: bool) -> Self {
        self.show_hidden_files = show;
        self
    }

    /// Set the thumbnail cross-fade duration
    pub fn with_cross_fade(mut self, duration: Duration) -> Self {
        self.cross_fade = duration;
        self
    }
}

/// Assembled dependencies and settings for the transfer core.
#[derive(Clone)]
pub struct CoreConfig {
    /// Network client performing the actual transfers
    pub remote_client: Arc<dyn RemoteClient>,
    /// Persistent metadata store
    pub metadata_store: Arc<dyn MetadataStore>,
    /// Local preview/icon cache
    pub preview_store: Arc<dyn PreviewStore>,
    /// Scheduler tuning knobs
    pub tuning: TransferTuning,
}

impl CoreConfig {
    /// Start building a configuration
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field("tuning", &self.tuning)
            .finish_non_exhaustive()
    }
}

/// Builder for [`CoreConfig`] with fail-fast validation.
#[derive(Default)]
pub struct CoreConfigBuilder {
    remote_client: Option<Arc<dyn RemoteClient>>,
    metadata_store: Option<Arc<dyn MetadataStore>>,
    preview_store: Option<Arc<dyn PreviewStore>>,
    tuning: Option<TransferTuning>,
}

impl CoreConfigBuilder {
    /// Set the network client
    pub fn remote_client(mut self, client: Arc<dyn RemoteClient>) -> Self {
        self.remote_client = Some(client);
        self
    }

    /// Set the metadata store
    pub fn metadata_store(mut self, store: Arc<dyn MetadataStore>) -> Self {
        self.metadata_store = Some(store);
        self
    }

    /// Set the preview cache
    pub fn preview_store(mut self, store: Arc<dyn PreviewStore>) -> Self {
        self.preview_store = Some(store);
        self
    }

    /// Set the scheduler tuning (defaults apply otherwise)
    pub fn tuning(mut self, tuning: TransferTuning) -> Self {
        self.tuning = Some(tuning);
        self
    }

    /// Validate and build the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CapabilityMissing`] naming the first absent
    /// required bridge.
    pub fn build(self) -> Result<CoreConfig> {
        let remote_client = self.remote_client.ok_or_else(|| missing("RemoteClient"))?;
        let metadata_store = self.metadata_store.ok_or_else(|| missing("MetadataStore"))?;
        let preview_store = self.preview_store.ok_or_else(|| missing("PreviewStore"))?;

        Ok(CoreConfig {
            remote_client,
            metadata_store,
            preview_store,
            tuning: self.tuning.unwrap_or_default(),
        })
    }
}

fn missing(capability: &str) -> Error {
    Error::CapabilityMissing {
        capability: capability.to_string(),
        message: format!(
            "No {} implementation provided. Inject the host adapter before building the config.",
            capability
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::{
        Depth, FileRecord, ItemId, PreviewImages, PreviewRequest, RecordQuery, RemoteEntry,
        RemotePath, RemoteResult, Selector,
    };
    use std::path::PathBuf;

    struct NullClient;

    #[async_trait]
    impl RemoteClient for NullClient {
        async fn download(
            &self,
            _record: &FileRecord,
            _selector: Selector,
            _set_favorite: bool,
        ) -> RemoteResult<()> {
            Ok(())
        }

        async fn list_folder(
            &self,
            _path: &RemotePath,
            _depth: Depth,
            _show_hidden: bool,
            _body: Option<String>,
        ) -> RemoteResult<Vec<RemoteEntry>> {
            Ok(Vec::new())
        }

        async fn fetch_preview(&self, _request: PreviewRequest) -> RemoteResult<PreviewImages> {
            Ok(PreviewImages::default())
        }
    }

    struct NullStore;

    #[async_trait]
    impl MetadataStore for NullStore {
        async fn convert_entries(
            &self,
            _entries: Vec<RemoteEntry>,
            _include_folder: bool,
        ) -> bridge_traits::error::Result<Vec<FileRecord>> {
            Ok(Vec::new())
        }

        async fn find_records(
            &self,
            _query: RecordQuery,
        ) -> bridge_traits::error::Result<Vec<FileRecord>> {
            Ok(Vec::new())
        }

        async fn apply_updates(
            &self,
            _remote: Vec<FileRecord>,
            _stored: Vec<FileRecord>,
            _verify_local: bool,
        ) -> bridge_traits::error::Result<Vec<FileRecord>> {
            Ok(Vec::new())
        }

        async fn upsert_record(&self, _record: &FileRecord) -> bridge_traits::error::Result<()> {
            Ok(())
        }

        async fn delete_record(&self, _id: &ItemId) -> bridge_traits::error::Result<()> {
            Ok(())
        }

        async fn delete_subtree(&self, _root: &RemotePath) -> bridge_traits::error::Result<()> {
            Ok(())
        }
    }

    struct NullPreviews;

    impl PreviewStore for NullPreviews {
        fn preview_exists(&self, _id: &ItemId, _etag: &str) -> bool {
            false
        }

        fn preview_path(&self, id: &ItemId, etag: &str) -> PathBuf {
            PathBuf::from(format!("{}-{}.preview", id, etag))
        }

        fn icon_path(&self, id: &ItemId, etag: &str) -> PathBuf {
            PathBuf::from(format!("{}-{}.icon", id, etag))
        }

        fn remote_source(&self, record: &FileRecord, active_url: &str) -> String {
            format!("{}{}", active_url, record.full_path())
        }
    }

    #[test]
    fn test_tuning_defaults() {
        let tuning = TransferTuning::default();
        assert_eq!(tuning.debounce_window, Duration::from_secs(1));
        assert_eq!(tuning.icon_size, 256);
        assert_eq!(tuning.preview_size, 512);
        assert!(!tuning.show_hidden_files);
        assert_eq!(tuning.cross_fade, Duration::from_millis(750));
    }

    #[test]
    fn test_tuning_builder() {
        let tuning = TransferTuning::default()
            .with_debounce_window(Duration::from_millis(250))
            .with_icon_size(128)
            .with_preview_size(1024)
            .with_show_hidden_files(true)
            .with_cross_fade(Duration::from_millis(100));

        assert_eq!(tuning.debounce_window, Duration::from_millis(250));
        assert_eq!(tuning.icon_size, 128);
        assert_eq!(tuning.preview_size, 1024);
        assert!(tuning.show_hidden_files);
        assert_eq!(tuning.cross_fade, Duration::from_millis(100));
    }

    #[test]
    fn test_build_fails_without_remote_client() {
        let result = CoreConfig::builder()
            .metadata_store(Arc::new(NullStore))
            .preview_store(Arc::new(NullPreviews))
            .build();

        match result {
            Err(Error::CapabilityMissing { capability, .. }) => {
                assert_eq!(capability, "RemoteClient");
            }
            other => panic!("Expected CapabilityMissing, got {:?}", other.is_ok()),
        }
    }

    #[test]
    fn test_build_fails_without_store() {
        let result = CoreConfig::builder()
            .remote_client(Arc::new(NullClient))
            .preview_store(Arc::new(NullPreviews))
            .build();

        assert!(matches!(
            result,
            Err(Error::CapabilityMissing { capability, .. }) if capability == "MetadataStore"
        ));
    }

    #[test]
    fn test_build_with_all_bridges() {
        let config = CoreConfig::builder()
            .remote_client(Arc::new(NullClient))
            .metadata_store(Arc::new(NullStore))
            .preview_store(Arc::new(NullPreviews))
            .tuning(TransferTuning::default().with_show_hidden_files(true))
            .build()
            .unwrap();

        assert!(config.tuning.show_hidden_files);
    }
}
