//! # Media Metadata Refresh Task
//!
//! Asks the remote for the current preview-availability and timestamp
//! attributes of one media item and reconciles the stored record.
//!
//! A changed attribute persists an updated copy and requests the
//! coalesced data-source reload; a not-found answer deletes the stored
//! record and notifies observers of the deletion.

use std::sync::Arc;

use async_trait::async_trait;
use bridge_traits::{Depth, FileRecord, ItemId, MetadataStore, RemoteClient, RemoteError};
use core_runtime::events::{CoreEvent, EventBus, LibraryEvent};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::debounce::Debouncer;
use crate::task::{QueueTask, TaskOutcome};

/// Fixed property query sent with the zero-depth refresh listing.
pub const MEDIA_PROPFIND_BODY: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<d:propfind xmlns:d="DAV:" xmlns:oc="http://owncloud.org/ns" xmlns:nc="http://nextcloud.org/ns">
<d:prop>
    <has-preview xmlns="http://nextcloud.org/ns"/>
    <creation_time xmlns="http://nextcloud.org/ns"/>
    <upload_time xmlns="http://nextcloud.org/ns"/>
</d:prop>
</d:propfind>"#;

/// Queued metadata refresh for one media item.
pub struct MediaRefreshTask {
    record: FileRecord,
    client: Arc<dyn RemoteClient>,
    store: Arc<dyn MetadataStore>,
    debouncer: Arc<Debouncer>,
    event_bus: EventBus,
}

impl MediaRefreshTask {
    pub fn new(
        record: FileRecord,
        client: Arc<dyn RemoteClient>,
        store: Arc<dyn MetadataStore>,
        debouncer: Arc<Debouncer>,
        event_bus: EventBus,
    ) -> Self {
        Self {
            record,
            client,
            store,
            debouncer,
            event_bus,
        }
    }
}

#[async_trait]
impl QueueTask for MediaRefreshTask {
    fn item_id(&self) -> &ItemId {
        &self.record.id
    }

    async fn run(&self, token: &CancellationToken) -> TaskOutcome {
        if token.is_cancelled() {
            return TaskOutcome::Cancelled;
        }

        let target = self.record.full_path();
        debug!(item_id = %self.record.id, path = %target, "Refreshing media metadata");

        let listing = tokio::select! {
            _ = token.cancelled() => return TaskOutcome::Cancelled,
            listing = self.client.list_folder(
                &target,
                Depth::Zero,
                false,
                Some(MEDIA_PROPFIND_BODY.to_string()),
            ) => listing,
        };

        match listing {
            Ok(entries) => {
                if let Some(entry) = entries.first() {
                    let mut updated = self.record.clone();
                    let mut modified = false;

                    if updated.has_preview != entry.has_preview {
                        updated.has_preview = entry.has_preview;
                        modified = true;
                    }
                    if entry.created_at.is_some() && updated.created_at != entry.created_at {
                        updated.created_at = entry.created_at;
                        modified = true;
                    }
                    if entry.uploaded_at.is_some() && updated.uploaded_at != entry.uploaded_at {
                        updated.uploaded_at = entry.uploaded_at;
                        modified = true;
                    }

                    if modified {
                        match self.store.upsert_record(&updated).await {
                            Ok(()) => self.debouncer.request(),
                            Err(error) => {
                                warn!(item_id = %self.record.id, error = %error, "Failed to persist refreshed metadata");
                            }
                        }
                    }
                }
                TaskOutcome::Completed
            }
            Err(RemoteError::NotFound) => {
                if let Err(error) = self.store.delete_record(&self.record.id).await {
                    warn!(item_id = %self.record.id, error = %error, "Failed to delete vanished record");
                }
                self.event_bus
                    .emit(CoreEvent::Library(LibraryEvent::FileDeleted {
                        item_id: self.record.id.clone(),
                        code: RemoteError::NotFound.code(),
                    }))
                    .ok();
                TaskOutcome::NotFound
            }
            Err(error) => error.into(),
        }
    }
}
