//! UI Surface Abstraction
//!
//! One capability: resolve a visible slot by its position token and set
//! an image on it. Each concrete list widget ships one adapter at the
//! host boundary; the transfer core never learns which widget it is
//! talking to.

use bytes::Bytes;
use std::sync::Arc;
use std::time::Duration;

/// Position token identifying a visual slot in a list surface.
///
/// Tokens can go stale: the list may scroll or reload between enqueue
/// and fetch completion, so slots must be re-resolved at presentation
/// time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotToken {
    pub section: usize,
    pub row: usize,
}

impl SlotToken {
    pub fn new(section: usize, row: usize) -> Self {
        Self { section, row }
    }
}

/// Image to present in a slot.
#[derive(Debug, Clone)]
pub enum SlotImage {
    /// A fetched icon
    Icon(Bytes),
    /// A type-appropriate placeholder; `icon_name` selects the asset,
    /// falling back to the generic file glyph when absent
    Placeholder { icon_name: Option<String> },
}

/// Visual transition applied when presenting an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageTransition {
    /// Swap immediately
    None,
    /// Cross-fade over the given duration
    CrossFade(Duration),
}

/// A live, currently-visible slot that can display an image.
pub trait ImageSlot: Send + Sync {
    /// Present an image with the given transition
    fn present(&self, image: SlotImage, transition: ImageTransition);
}

/// A list surface that can resolve position tokens into live slots.
pub trait ThumbnailSurface: Send + Sync {
    /// Resolve a position token into the slot currently shown there.
    ///
    /// Returns `None` when the token no longer refers to a visible slot
    /// (scrolled away, reloaded, recycled).
    fn resolve_slot(&self, token: &SlotToken) -> Option<Arc<dyn ImageSlot>>;
}
