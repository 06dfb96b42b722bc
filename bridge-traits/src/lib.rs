//! # Host Bridge Traits
//!
//! Collaborator contracts that must be implemented by the host
//! application around the transfer core.
//!
//! ## Overview
//!
//! This crate defines the boundary between the transfer scheduling core
//! and everything it does not own: the network transport, the persistent
//! metadata store, the local preview cache, and the list UI. Each trait
//! is one capability; hosts ship one adapter per capability.
//!
//! ## Traits
//!
//! ### Networking
//! - [`RemoteClient`](remote::RemoteClient) - Downloads, depth-qualified
//!   listings, dual-size preview fetches
//!
//! ### Persistence
//! - [`MetadataStore`](store::MetadataStore) - Record lookup, remote-entry
//!   conversion, delta application, deletion
//! - [`PreviewStore`](previews::PreviewStore) - Local preview/icon cache
//!   paths and existence checks
//!
//! ### Presentation
//! - [`ThumbnailSurface`](surface::ThumbnailSurface) /
//!   [`ImageSlot`](surface::ImageSlot) - Resolve a visual slot by
//!   position token and present an image with a transition
//!
//! ## Error Handling
//!
//! Store-side operations use [`BridgeError`](error::BridgeError); remote
//! operations use [`RemoteError`](remote::RemoteError), which carries the
//! server's outcome-code convention (404 = not-found, other non-zero =
//! transport failure).
//!
//! ## Thread Safety
//!
//! All traits require `Send + Sync`; implementations are shared across
//! queues as `Arc<dyn …>` and must tolerate concurrent calls.

pub mod error;
pub mod previews;
pub mod remote;
pub mod store;
pub mod surface;

pub use error::BridgeError;

// Re-export commonly used types
pub use previews::PreviewStore;
pub use remote::{
    Depth, PreviewImages, PreviewRequest, RemoteClient, RemoteEntry, RemoteError, RemoteResult,
    Selector,
};
pub use store::{FileRecord, ItemId, MetadataStore, RecordQuery, RecordStatus, RemotePath};
pub use surface::{ImageSlot, ImageTransition, SlotImage, SlotToken, ThumbnailSurface};
