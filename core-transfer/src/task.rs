//! # Task Model
//!
//! Identity, class, state machine, and terminal outcomes for queued
//! transfer tasks.
//!
//! ## State Machine
//!
//! ```text
//! Pending → Running → Finished
//!     ↓         ↓
//!     └────→ Cancelled
//! ```
//!
//! A task is owned by its queue while active. `Finished` and
//! `Cancelled` are terminal; reaching either releases the concurrency
//! slot exactly once.

use async_trait::async_trait;
use bridge_traits::{ItemId, RemoteError};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

// ============================================================================
// ID Types
// ============================================================================

/// Unique identifier of one queued task instance.
///
/// Distinct from [`ItemId`]: the same item can be processed by many task
/// instances over time, but never by two active ones in a de-duplicating
/// queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskId(Uuid);

impl TaskId {
    /// Create a new random task ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Class & State
// ============================================================================

/// Work class of a task; selects the queue it runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskClass {
    /// File downloads
    Download,
    /// Directory/file synchronization against the store
    Synchronize,
    /// Dual-size preview fetches for list cells
    Thumbnail,
    /// Zero-depth metadata refresh for media items
    MediaRefresh,
}

impl TaskClass {
    /// Get the string representation for logging and events
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Download => "download",
            Self::Synchronize => "synchronize",
            Self::Thumbnail => "thumbnail",
            Self::MediaRefresh => "media-refresh",
        }
    }

    /// Maximum number of concurrently running tasks of this class.
    ///
    /// Synchronize is fixed at 1: synchronization mutates the store and
    /// must never interleave with itself.
    pub fn concurrency_bound(&self) -> usize {
        match self {
            Self::Download => 5,
            Self::Synchronize => 1,
            Self::Thumbnail => 10,
            Self::MediaRefresh => 10,
        }
    }

    /// Whether a queue of this class rejects a task for an item that is
    /// already pending or running.
    ///
    /// Downloads de-duplicate too, so downloads fanned out by a
    /// synchronization and independently requested ones share one rule.
    pub fn deduplicates(&self) -> bool {
        !matches!(self, Self::Synchronize)
    }
}

impl std::fmt::Display for TaskClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The current state of a queued task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskState {
    /// Admitted, waiting for a concurrency slot
    Pending,
    /// Holding a slot and executing
    Running,
    /// Cancelled before or during execution
    Cancelled,
    /// Reached a natural completion point
    Finished,
}

impl TaskState {
    /// Check if this state represents a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskState::Cancelled | TaskState::Finished)
    }

    /// Check if this state still occupies the queue (pending or running)
    pub fn is_active(&self) -> bool {
        matches!(self, TaskState::Pending | TaskState::Running)
    }

    /// Get the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskState::Pending => "pending",
            TaskState::Running => "running",
            TaskState::Cancelled => "cancelled",
            TaskState::Finished => "finished",
        }
    }
}

impl std::fmt::Display for TaskState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Outcomes
// ============================================================================

/// Terminal outcome of one task execution.
///
/// Every task terminates with exactly one of these; none of them
/// propagates to the caller of enqueue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskOutcome {
    /// The task ran to completion (the operation itself may still have
    /// done nothing, e.g. an empty listing)
    Completed,
    /// The remote reported a non-404 failure
    TransportFailure(i32),
    /// The remote reported the target does not exist
    NotFound,
    /// The task was cancelled before or during execution
    Cancelled,
}

impl TaskOutcome {
    /// Get the string representation for logging and events
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::TransportFailure(_) => "transport-failure",
            Self::NotFound => "not-found",
            Self::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for TaskOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<RemoteError> for TaskOutcome {
    fn from(error: RemoteError) -> Self {
        match error {
            RemoteError::NotFound => Self::NotFound,
            RemoteError::Transport { code } => Self::TransportFailure(code),
        }
    }
}

// ============================================================================
// Task Trait
// ============================================================================

/// A unit of work runnable on a [`TaskQueue`](crate::queue::TaskQueue).
///
/// Implementations must check `token` before starting any I/O and race
/// in-flight collaborator futures against it; a cancelled task returns
/// [`TaskOutcome::Cancelled`] without further side effects. The queue
/// guarantees `run` is called at most once per admitted task.
#[async_trait]
pub trait QueueTask: Send + Sync + 'static {
    /// Identity of the item this task operates on
    fn item_id(&self) -> &ItemId;

    /// Execute the task to a terminal outcome
    async fn run(&self, token: &CancellationToken) -> TaskOutcome;
}

// ============================================================================
// Tests
// ============================================================================
