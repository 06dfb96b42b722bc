//! # Transfer Scheduler
//!
//! The aggregate owning one bounded queue per work class plus the
//! reload debouncer.
//!
//! ## Overview
//!
//! The scheduler is the single enqueue/cancel surface for background
//! network-bound work:
//! - **Downloads** (bound 5)
//! - **Synchronizations** (bound 1, a deliberate serialization
//!   boundary: store mutations driven by synchronization never
//!   interleave with each other)
//! - **Thumbnail fetches** (bound 10)
//! - **Media metadata refreshes** (bound 10)
//!
//! Queues are independent: work in one never blocks admission or
//! execution in another. Enqueue operations are fire-and-forget; task
//! failures never propagate back to the caller.
//!
//! Construct one scheduler at startup from a validated [`CoreConfig`]
//! and pass it explicitly to callers; there is no ambient global
//! instance.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::{CoreConfig, EventBus};
//! use core_transfer::TransferScheduler;
//! use bridge_traits::Selector;
//!
//! let config = CoreConfig::builder()
//!     .remote_client(client)
//!     .metadata_store(store)
//!     .preview_store(previews)
//!     .build()?;
//! let scheduler = TransferScheduler::new(config, EventBus::default());
//!
//! scheduler.download(record, Selector::Open, false);
//! scheduler.cancel_all();
//! ```

use std::sync::Arc;

use bridge_traits::{
    FileRecord, ItemId, MetadataStore, PreviewStore, RemoteClient, Selector, SlotToken,
    ThumbnailSurface,
};
use core_runtime::config::{CoreConfig, TransferTuning};
use core_runtime::events::{CoreEvent, EventBus, LibraryEvent};
use tracing::debug;

use crate::debounce::Debouncer;
use crate::download::DownloadTask;
use crate::media_refresh::MediaRefreshTask;
use crate::queue::TaskQueue;
use crate::synchronize::SynchronizeTask;
use crate::task::TaskClass;
use crate::thumbnail::ThumbnailTask;

/// Multi-queue scheduler for background transfer work.
///
/// Must be created inside a tokio runtime; each queue runs a dispatcher
/// task for the scheduler's lifetime.
pub struct TransferScheduler {
    client: Arc<dyn RemoteClient>,
    store: Arc<dyn MetadataStore>,
    previews: Arc<dyn PreviewStore>,
    tuning: TransferTuning,
    event_bus: EventBus,

    downloads: Arc<TaskQueue>,
    synchronizations: Arc<TaskQueue>,
    thumbnails: Arc<TaskQueue>,
    media_refreshes: Arc<TaskQueue>,

    debouncer: Arc<Debouncer>,
}

impl TransferScheduler {
    /// Create the scheduler with one queue per work class.
    pub fn new(config: CoreConfig, event_bus: EventBus) -> Self {
        let CoreConfig {
            remote_client,
            metadata_store,
            preview_store,
            tuning,
        } = config;

        let downloads = Arc::new(TaskQueue::new(TaskClass::Download, event_bus.clone()));
        let synchronizations = Arc::new(TaskQueue::new(TaskClass::Synchronize, event_bus.clone()));
        let thumbnails = Arc::new(TaskQueue::new(TaskClass::Thumbnail, event_bus.clone()));
        let media_refreshes = Arc::new(TaskQueue::new(TaskClass::MediaRefresh, event_bus.clone()));

        let reload_bus = event_bus.clone();
        let debouncer = Arc::new(Debouncer::new(tuning.debounce_window, move || {
            reload_bus
                .emit(CoreEvent::Library(LibraryEvent::MediaReloadRequested))
                .ok();
        }));

        Self {
            client: remote_client,
            store: metadata_store,
            previews: preview_store,
            tuning,
            event_bus,
            downloads,
            synchronizations,
            thumbnails,
            media_refreshes,
            debouncer,
        }
    }

    /// The bus this scheduler publishes on
    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    /// Cancel everything in every queue.
    ///
    /// Safe to call from any thread; in-flight completions racing this
    /// call finish normally.
    pub fn cancel_all(&self) {
        self.cancel_all_downloads();
        self.cancel_all_synchronizations();
        self.cancel_all_thumbnails();
        self.cancel_all_media_refreshes();
    }

    // ========================================================================
    // Downloads
    // ========================================================================

    /// Enqueue a file download.
    ///
    /// Returns `false` when a download for the same item is already
    /// pending or running.
    pub fn download(&self, record: FileRecord, selector: Selector, set_favorite: bool) -> bool {
        let task = DownloadTask::new(record, selector, set_favorite, Arc::clone(&self.client));
        self.downloads.admit(Arc::new(task))
    }

    /// Cancel the download for one item
    pub fn cancel_download(&self, item_id: &ItemId) {
        self.downloads.cancel(item_id);
    }

    /// Cancel every download
    pub fn cancel_all_downloads(&self) {
        self.downloads.cancel_all();
    }

    /// Downloads currently pending or running.
    ///
    /// Callers use this to gate additional scheduling decisions, e.g.
    /// holding back bulk downloads while the queue is busy.
    pub fn download_count(&self) -> usize {
        self.downloads.count()
    }

    // ========================================================================
    // Synchronization
    // ========================================================================

    /// Enqueue a synchronization of one file or directory subtree.
    pub fn synchronize(&self, record: FileRecord, selector: Selector) -> bool {
        let task = SynchronizeTask::new(
            record,
            selector,
            self.tuning.show_hidden_files,
            Arc::clone(&self.client),
            Arc::clone(&self.store),
            Arc::clone(&self.downloads),
        );
        self.synchronizations.admit(Arc::new(task))
    }

    /// Cancel every synchronization
    pub fn cancel_all_synchronizations(&self) {
        self.synchronizations.cancel_all();
    }

    /// Synchronizations currently pending or running
    pub fn synchronize_count(&self) -> usize {
        self.synchronizations.count()
    }

    // ========================================================================
    // Thumbnails
    // ========================================================================

    /// Enqueue a thumbnail fetch for a list cell.
    ///
    /// Skips cheaply (returns `false`, no queue churn) unless the item
    /// has a preview and no cached preview exists for its current etag.
    /// Also returns `false` when a fetch for the item is already queued.
    pub fn download_thumbnail(
        &self,
        record: FileRecord,
        active_url: impl Into<String>,
        surface: Arc<dyn ThumbnailSurface>,
        position: SlotToken,
    ) -> bool {
        if !record.has_preview || self.previews.preview_exists(&record.id, &record.etag) {
            debug!(item_id = %record.id, "No preview needed, skipping thumbnail fetch");
            return false;
        }

        let task = ThumbnailTask::new(
            record,
            active_url.into(),
            surface,
            position,
            Arc::clone(&self.client),
            Arc::clone(&self.previews),
            self.tuning.icon_size,
            self.tuning.preview_size,
            self.tuning.cross_fade,
        );
        self.thumbnails.admit(Arc::new(task))
    }

    /// Cancel the thumbnail fetch for one item
    pub fn cancel_thumbnail(&self, item_id: &ItemId) {
        self.thumbnails.cancel(item_id);
    }

    /// Cancel every thumbnail fetch
    pub fn cancel_all_thumbnails(&self) {
        self.thumbnails.cancel_all();
    }

    /// Thumbnail fetches currently pending or running
    pub fn thumbnail_count(&self) -> usize {
        self.thumbnails.count()
    }

    // ========================================================================
    // Media metadata refresh
    // ========================================================================

    /// Enqueue a metadata refresh for a media item.
    pub fn refresh_media_metadata(&self, record: FileRecord) -> bool {
        let task = MediaRefreshTask::new(
            record,
            Arc::clone(&self.client),
            Arc::clone(&self.store),
            Arc::clone(&self.debouncer),
            self.event_bus.clone(),
        );
        self.media_refreshes.admit(Arc::new(task))
    }

    /// Cancel the metadata refresh for one item
    pub fn cancel_media_refresh(&self, item_id: &ItemId) {
        self.media_refreshes.cancel(item_id);
    }

    /// Cancel every metadata refresh
    pub fn cancel_all_media_refreshes(&self) {
        self.media_refreshes.cancel_all();
    }

    /// Metadata refreshes currently pending or running
    pub fn media_refresh_count(&self) -> usize {
        self.media_refreshes.count()
    }

    /// Request the coalesced media reload notification.
    ///
    /// Repeated requests within one debounce window emit exactly one
    /// [`LibraryEvent::MediaReloadRequested`].
    pub fn request_media_reload(&self) {
        self.debouncer.request();
    }
}

impl std::fmt::Debug for TransferScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransferScheduler")
            .field("downloads", &self.downloads.count())
            .field("synchronizations", &self.synchronizations.count())
            .field("thumbnails", &self.thumbnails.count())
            .field("media_refreshes", &self.media_refreshes.count())
            .finish()
    }
}
