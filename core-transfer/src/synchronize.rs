//! # Synchronize Task
//!
//! Reconciles one file or one directory subtree against the remote.
//!
//! A directory target lists with infinite depth and matches every
//! stored record under it; a file target lists only itself. When the
//! request was a download-triggering synchronization, every changed
//! non-directory record fans out into an ordinary download through
//! the download queue, so the synchronize queue's serialization is
//! never widened.
//!
//! A not-found answer for a directory means the remote subtree is gone:
//! the stored subtree is deleted. Any other failure mutates nothing.

use std::sync::Arc;

use async_trait::async_trait;
use bridge_traits::{
    error::Result, Depth, FileRecord, ItemId, MetadataStore, RecordQuery, RecordStatus,
    RemoteClient, RemoteEntry, RemoteError, Selector,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::download::DownloadTask;
use crate::queue::TaskQueue;
use crate::task::{QueueTask, TaskOutcome};

/// Queued synchronization of one file or directory.
pub struct SynchronizeTask {
    record: FileRecord,
    selector: Selector,
    show_hidden: bool,
    client: Arc<dyn RemoteClient>,
    store: Arc<dyn MetadataStore>,
    downloads: Arc<TaskQueue>,
}

impl SynchronizeTask {
    /// Create a synchronize task; `downloads` receives the fan-out when
    /// the selector triggers downloads.
    pub fn new(
        record: FileRecord,
        selector: Selector,
        show_hidden: bool,
        client: Arc<dyn RemoteClient>,
        store: Arc<dyn MetadataStore>,
        downloads: Arc<TaskQueue>,
    ) -> Self {
        Self {
            record,
            selector,
            show_hidden,
            client,
            store,
            downloads,
        }
    }

    /// Convert the listing into records, diff against the store, apply,
    /// and fan changed files out into downloads when requested.
    async fn apply_listing(
        &self,
        entries: Vec<RemoteEntry>,
        query: RecordQuery,
        include_folder: bool,
        download: bool,
    ) -> Result<()> {
        let converted = self.store.convert_entries(entries, include_folder).await?;
        if converted.is_empty() {
            return Ok(());
        }

        let stored = self.store.find_records(query).await?;
        let changed = self.store.apply_updates(converted, stored, download).await?;

        if download {
            for record in changed.into_iter().filter(|r| !r.is_directory) {
                debug!(item_id = %record.id, "Enqueuing download for changed record");
                let task = DownloadTask::new(
                    record,
                    Selector::Synchronize,
                    false,
                    Arc::clone(&self.client),
                );
                self.downloads.admit(Arc::new(task));
            }
        }

        Ok(())
    }
}

#[async_trait]
impl QueueTask for SynchronizeTask {
    fn item_id(&self) -> &ItemId {
        &self.record.id
    }

    async fn run(&self, token: &CancellationToken) -> TaskOutcome {
        if token.is_cancelled() {
            return TaskOutcome::Cancelled;
        }

        let target = self.record.full_path();
        let (depth, query, include_folder) = if self.record.is_directory {
            (
                Depth::Infinity,
                RecordQuery::Subtree {
                    root: target.clone(),
                    status: RecordStatus::Normal,
                },
                true,
            )
        } else {
            (
                Depth::Zero,
                RecordQuery::Exact {
                    path: target.clone(),
                    status: RecordStatus::Normal,
                },
                false,
            )
        };
        let download = self.selector.triggers_download();

        debug!(
            item_id = %self.record.id,
            path = %target,
            depth = depth.as_str(),
            download,
            "Starting synchronization"
        );

        let listing = tokio::select! {
            _ = token.cancelled() => return TaskOutcome::Cancelled,
            listing = self
                .client
                .list_folder(&target, depth, self.show_hidden, None) => listing,
        };

        match listing {
            Ok(entries) => {
                if let Err(error) = self
                    .apply_listing(entries, query, include_folder, download)
                    .await
                {
                    warn!(item_id = %self.record.id, error = %error, "Failed to apply listing to store");
                }
                TaskOutcome::Completed
            }
            Err(RemoteError::NotFound) if self.record.is_directory => {
                if let Err(error) = self.store.delete_subtree(&target).await {
                    warn!(item_id = %self.record.id, error = %error, "Failed to delete vanished subtree");
                }
                TaskOutcome::NotFound
            }
            Err(error) => error.into(),
        }
    }
}
