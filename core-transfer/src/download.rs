//! # Download Task
//!
//! Downloads one file through the remote client. Retry policy, if any,
//! belongs to the client; this task finishes on whatever outcome the
//! client reports.

use std::sync::Arc;

use async_trait::async_trait;
use bridge_traits::{FileRecord, ItemId, RemoteClient, Selector};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::task::{QueueTask, TaskOutcome};

/// Queued download of a single file.
pub struct DownloadTask {
    record: FileRecord,
    selector: Selector,
    set_favorite: bool,
    client: Arc<dyn RemoteClient>,
}

impl DownloadTask {
    /// Create a download task.
    ///
    /// `selector` records why the download was requested; when
    /// `set_favorite` is true the item is marked favorite after a
    /// successful transfer.
    pub fn new(
        record: FileRecord,
        selector: Selector,
        set_favorite: bool,
        client: Arc<dyn RemoteClient>,
    ) -> Self {
        Self {
            record,
            selector,
            set_favorite,
            client,
        }
    }
}

#[async_trait]
impl QueueTask for DownloadTask {
    fn item_id(&self) -> &ItemId {
        &self.record.id
    }

    async fn run(&self, token: &CancellationToken) -> TaskOutcome {
        if token.is_cancelled() {
            return TaskOutcome::Cancelled;
        }

        debug!(
            item_id = %self.record.id,
            selector = %self.selector,
            set_favorite = self.set_favorite,
            "Starting download"
        );

        let result = tokio::select! {
            _ = token.cancelled() => return TaskOutcome::Cancelled,
            result = self
                .client
                .download(&self.record, self.selector, self.set_favorite) => result,
        };

        match result {
            Ok(()) => TaskOutcome::Completed,
            Err(error) => error.into(),
        }
    }
}
