//! # Thumbnail Task
//!
//! Fetches the dual-size (icon + preview) images for one item and
//! presents the icon in the list cell that requested it.
//!
//! The position token captured at enqueue time can go stale (the list
//! may scroll or reload before the fetch completes), so the slot is
//! re-resolved at presentation time and a stale token presents nothing.
//! A failed fetch degrades to the item's type-appropriate placeholder
//! instead of failing visibly.

use std::sync::Arc;

use async_trait::async_trait;
use bridge_traits::{
    FileRecord, ImageTransition, ItemId, PreviewImages, PreviewRequest, PreviewStore, RemoteClient,
    SlotImage, SlotToken, ThumbnailSurface,
};
use core_runtime::logging::strip_path;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::task::{QueueTask, TaskOutcome};

/// Queued preview fetch for one list cell.
pub struct ThumbnailTask {
    record: FileRecord,
    active_url: String,
    surface: Arc<dyn ThumbnailSurface>,
    position: SlotToken,
    client: Arc<dyn RemoteClient>,
    previews: Arc<dyn PreviewStore>,
    icon_size: u32,
    preview_size: u32,
    cross_fade: std::time::Duration,
}

impl ThumbnailTask {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        record: FileRecord,
        active_url: String,
        surface: Arc<dyn ThumbnailSurface>,
        position: SlotToken,
        client: Arc<dyn RemoteClient>,
        previews: Arc<dyn PreviewStore>,
        icon_size: u32,
        preview_size: u32,
        cross_fade: std::time::Duration,
    ) -> Self {
        Self {
            record,
            active_url,
            surface,
            position,
            client,
            previews,
            icon_size,
            preview_size,
            cross_fade,
        }
    }
}

#[async_trait]
impl QueueTask for ThumbnailTask {
    fn item_id(&self) -> &ItemId {
        &self.record.id
    }

    async fn run(&self, token: &CancellationToken) -> TaskOutcome {
        if token.is_cancelled() {
            return TaskOutcome::Cancelled;
        }

        let request = PreviewRequest {
            source: self.previews.remote_source(&self.record, &self.active_url),
            preview_local: self.previews.preview_path(&self.record.id, &self.record.etag),
            icon_local: self.previews.icon_path(&self.record.id, &self.record.etag),
            preview_size: self.preview_size,
            icon_size: self.icon_size,
        };

        debug!(
            item_id = %self.record.id,
            file = %strip_path(self.record.full_path().as_str()),
            "Fetching thumbnail"
        );

        let result = tokio::select! {
            _ = token.cancelled() => return TaskOutcome::Cancelled,
            result = self.client.fetch_preview(request) => result,
        };

        // The list may have scrolled or reloaded since enqueue; only a
        // still-live slot gets an image.
        if let Some(slot) = self.surface.resolve_slot(&self.position) {
            let image = match &result {
                Ok(PreviewImages {
                    icon: Some(icon), ..
                }) => SlotImage::Icon(icon.clone()),
                _ => SlotImage::Placeholder {
                    icon_name: self.record.icon_name.clone(),
                },
            };
            slot.present(image, ImageTransition::CrossFade(self.cross_fade));
        } else {
            debug!(item_id = %self.record.id, "Slot no longer visible, dropping thumbnail");
        }

        match result {
            Ok(_) => TaskOutcome::Completed,
            Err(error) => error.into(),
        }
    }
}
