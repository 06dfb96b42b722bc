//! # Event Bus System
//!
//! Event-driven notification surface for the transfer core, built on
//! `tokio::sync::broadcast`.
//!
//! ## Overview
//!
//! The transfer queues produce two kinds of signals: library-facing
//! notifications the UI subscribes to (a coalesced "reload your data
//! source", a per-file deletion notice) and transfer lifecycle events
//! useful for observability. Both flow through one [`EventBus`] so
//! subscribers stay decoupled from the queues that emit.
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{CoreEvent, EventBus, LibraryEvent};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let bus = EventBus::new(100);
//! let mut sub = bus.subscribe();
//!
//! bus.emit(CoreEvent::Library(LibraryEvent::MediaReloadRequested)).ok();
//!
//! let event = sub.recv().await.unwrap();
//! assert!(matches!(event, CoreEvent::Library(LibraryEvent::MediaReloadRequested)));
//! # }
//! ```
//!
//! ## Error Handling
//!
//! `emit` fails only when no subscriber exists; producers treat that as
//! a non-event (`.ok()`). Slow subscribers receive
//! `RecvError::Lagged(n)` and keep receiving newer events.

use bridge_traits::ItemId;
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;

// Re-export commonly used types
pub use tokio::sync::broadcast::error::{RecvError, SendError};
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

// ============================================================================
// Core Event Types
// ============================================================================

/// Top-level event enum encompassing all event categories.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "payload")]
pub enum CoreEvent {
    /// Transfer lifecycle events
    Transfer(TransferEvent),
    /// Library-facing notifications
    Library(LibraryEvent),
}

impl CoreEvent {
    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &str {
        match self {
            CoreEvent::Transfer(e) => e.description(),
            CoreEvent::Library(e) => e.description(),
        }
    }

    /// Returns the severity level of the event.
    pub fn severity(&self) -> EventSeverity {
        match self {
            CoreEvent::Library(LibraryEvent::FileDeleted { .. }) => EventSeverity::Info,
            _ => EventSeverity::Debug,
        }
    }
}

/// Event severity levels for filtering and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    /// Debug-level events (verbose)
    Debug,
    /// Informational events
    Info,
    /// Warning events
    Warning,
}

// ============================================================================
// Transfer Events
// ============================================================================

/// Events describing task lifecycle inside the transfer queues.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum TransferEvent {
    /// A task left the pending state and started running.
    TaskStarted {
        /// The item the task operates on.
        item_id: ItemId,
        /// Queue class name ("download", "synchronize", ...).
        class: String,
    },
    /// A task reached a terminal state and released its slot.
    TaskFinished {
        /// The item the task operated on.
        item_id: ItemId,
        /// Queue class name.
        class: String,
        /// Terminal outcome ("completed", "not-found", "cancelled",
        /// "transport-failure").
        outcome: String,
    },
}

impl TransferEvent {
    fn description(&self) -> &str {
        match self {
            TransferEvent::TaskStarted { .. } => "Transfer task started",
            TransferEvent::TaskFinished { .. } => "Transfer task finished",
        }
    }
}

// ============================================================================
// Library Events
// ============================================================================

/// Notifications consumed by the presentation layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum LibraryEvent {
    /// The media data source should reload. Debounced: bursts of
    /// metadata refreshes collapse into one of these per window.
    MediaReloadRequested,
    /// A stored file turned out to no longer exist remotely and was
    /// removed from the store.
    FileDeleted {
        /// The deleted item.
        item_id: ItemId,
        /// Remote outcome code that triggered the deletion.
        code: i32,
    },
}

impl LibraryEvent {
    fn description(&self) -> &str {
        match self {
            LibraryEvent::MediaReloadRequested => "Media data source reload requested",
            LibraryEvent::FileDeleted { .. } => "File deleted from store",
        }
    }
}

// ============================================================================
// Event Bus
// ============================================================================

/// Central event bus for publishing and subscribing to events.
///
/// Uses `tokio::sync::broadcast` internally: multiple producers (clone
/// the bus), multiple independent consumers (each `subscribe()` creates
/// a new receiver), non-blocking sends, lagging detection.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    /// Creates a new event bus with the specified buffer size.
    ///
    /// Subscribers that fall behind by more than `capacity` events
    /// receive `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of subscribers that received the event, or an
    /// error when there are none.
    pub fn emit(&self, event: CoreEvent) -> Result<usize, SendError<CoreEvent>> {
        self.sender.send(event)
    }

    /// Creates a new subscriber to receive events.
    ///
    /// Each call creates an independent receiver that will receive all
    /// future events. Past events are not replayed.
    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.sender.subscribe()
    }

    /// Returns the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_event_bus_creation() {
        let bus = EventBus::new(10);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_event_emission_no_subscribers() {
        let bus = EventBus::new(10);
        let event = CoreEvent::Library(LibraryEvent::MediaReloadRequested);

        // Should error when no subscribers
        assert!(bus.emit(event).is_err());
    }

    #[tokio::test]
    async fn test_multiple_subscribers_receive_same_event() {
        let bus = EventBus::new(10);
        let mut sub1 = bus.subscribe();
        let mut sub2 = bus.subscribe();

        let event = CoreEvent::Library(LibraryEvent::FileDeleted {
            item_id: ItemId::new("item-1"),
            code: 404,
        });

        bus.emit(event.clone()).ok();

        assert_eq!(sub1.recv().await.unwrap(), event);
        assert_eq!(sub2.recv().await.unwrap(), event);
    }

    #[tokio::test]
    async fn test_lagged_subscriber() {
        let bus = EventBus::new(2); // Very small buffer
        let mut sub = bus.subscribe();

        for _ in 0..5 {
            bus.emit(CoreEvent::Library(LibraryEvent::MediaReloadRequested))
                .ok();
        }

        // First recv should indicate lagging
        let result = sub.recv().await;
        assert!(matches!(result, Err(RecvError::Lagged(_))));
    }

    #[tokio::test]
    async fn test_event_severity_and_description() {
        let deleted = CoreEvent::Library(LibraryEvent::FileDeleted {
            item_id: ItemId::new("item-1"),
            code: 404,
        });
        assert_eq!(deleted.severity(), EventSeverity::Info);
        assert_eq!(deleted.description(), "File deleted from store");

        let reload = CoreEvent::Library(LibraryEvent::MediaReloadRequested);
        assert_eq!(reload.severity(), EventSeverity::Debug);
    }

    #[tokio::test]
    async fn test_event_serialization() {
        let event = CoreEvent::Transfer(TransferEvent::TaskFinished {
            item_id: ItemId::new("item-9"),
            class: "download".to_string(),
            outcome: "completed".to_string(),
        });

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("item-9"));

        let deserialized: CoreEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, event);
    }
}
