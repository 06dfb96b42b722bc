//! # Transfer Queue Module
//!
//! Multi-queue scheduler for background network-bound work.
//!
//! ## Overview
//!
//! This module accepts file-download, directory-synchronization,
//! thumbnail-fetch, and media-metadata-refresh tasks, routes each to an
//! independently concurrency-bounded queue, de-duplicates in-flight
//! tasks by item identity, supports per-task and per-queue cooperative
//! cancellation, and coalesces the data-source reload notifications
//! that would otherwise fire once per completed refresh.
//!
//! ## Components
//!
//! - **Task Model** (`task`): identity, class, state machine, outcomes
//! - **Bounded Queue** (`queue`): admission, de-duplication, slot
//!   accounting, cancellation for one work class
//! - **Debouncer** (`debounce`): collapses reload bursts into one
//!   notification per window
//! - **Task bodies** (`download`, `synchronize`, `thumbnail`,
//!   `media_refresh`): the four work classes
//! - **Scheduler** (`scheduler`): the aggregate owning one queue per
//!   class and the debouncer

pub mod debounce;
pub mod download;
pub mod media_refresh;
pub mod queue;
pub mod scheduler;
pub mod synchronize;
pub mod task;
pub mod thumbnail;

pub use debounce::{DebounceState, Debouncer};
pub use download::DownloadTask;
pub use media_refresh::{MediaRefreshTask, MEDIA_PROPFIND_BODY};
pub use queue::TaskQueue;
pub use scheduler::TransferScheduler;
pub use synchronize::SynchronizeTask;
pub use task::{QueueTask, TaskClass, TaskId, TaskOutcome, TaskState};
pub use thumbnail::ThumbnailTask;
