//! # Bounded Task Queue
//!
//! A named, independently concurrency-limited runner of tasks of one
//! class. Owns admission, de-duplication, cancellation, and slot
//! accounting for its tasks.
//!
//! ## Overview
//!
//! Admission registers the task and hands it to the queue's dispatcher
//! over an unbounded channel. The dispatcher processes admissions
//! strictly in order: it acquires a slot from the queue's semaphore for
//! the head task before looking at the next one, so admission order is
//! start order whenever the queue is saturated. Task bodies run on
//! spawned tasks; the slot is held for the duration of the body and
//! released exactly once when it reaches a terminal outcome.
//!
//! ## Cancellation
//!
//! Cooperative only. `cancel` marks pending entries cancelled
//! immediately (they will never start) and signals the
//! `CancellationToken` of running ones; a running task observes the
//! token at its next checkpoint, stops without further side effects,
//! and still finishes normally, which is what releases the slot.
//!
//! ## De-duplication
//!
//! Queues whose class de-duplicates reject (silently, returning
//! `false`) any task whose item already has a pending or running task
//! in this queue.

use std::sync::{Arc, Mutex, MutexGuard};

use bridge_traits::ItemId;
use core_runtime::events::{CoreEvent, EventBus, TransferEvent};
use tokio::sync::{mpsc, Semaphore};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::task::{QueueTask, TaskClass, TaskId, TaskOutcome, TaskState};

/// One registered task and its control state.
#[derive(Debug, Clone)]
struct QueueEntry {
    task_id: TaskId,
    item_id: ItemId,
    state: TaskState,
    token: CancellationToken,
}

/// Message handed from `admit` to the dispatcher.
struct Admission {
    task: Arc<dyn QueueTask>,
    task_id: TaskId,
    item_id: ItemId,
    token: CancellationToken,
}

/// A concurrency-bounded queue for one task class.
///
/// Must be created inside a tokio runtime; the dispatcher lives as a
/// background task for the lifetime of the queue.
pub struct TaskQueue {
    class: TaskClass,
    entries: Arc<Mutex<Vec<QueueEntry>>>,
    admissions: mpsc::UnboundedSender<Admission>,
}

impl TaskQueue {
    /// Create a queue for `class` with the class's concurrency bound.
    pub fn new(class: TaskClass, event_bus: EventBus) -> Self {
        let entries: Arc<Mutex<Vec<QueueEntry>>> = Arc::new(Mutex::new(Vec::new()));
        let (admissions, rx) = mpsc::unbounded_channel();

        Self::spawn_dispatcher(class, Arc::clone(&entries), event_bus, rx);

        Self {
            class,
            entries,
            admissions,
        }
    }

    /// The task class this queue runs
    pub fn class(&self) -> TaskClass {
        self.class
    }

    /// Admit a task.
    ///
    /// Returns `false` without registering anything when the class
    /// de-duplicates and a task for the same item is already pending or
    /// running. Admission order is start order under saturation.
    pub fn admit(&self, task: Arc<dyn QueueTask>) -> bool {
        let item_id = task.item_id().clone();
        let task_id = TaskId::new();
        let token = CancellationToken::new();

        {
            let mut entries = self.registry();
            if self.class.deduplicates()
                && entries
                    .iter()
                    .any(|e| e.item_id == item_id && e.state.is_active())
            {
                debug!(
                    queue = self.class.as_str(),
                    item_id = %item_id,
                    "Task for item already queued, rejecting"
                );
                return false;
            }

            entries.push(QueueEntry {
                task_id,
                item_id: item_id.clone(),
                state: TaskState::Pending,
                token: token.clone(),
            });
        }

        debug!(
            queue = self.class.as_str(),
            item_id = %item_id,
            task_id = %task_id,
            "Task admitted"
        );

        let admission = Admission {
            task,
            task_id,
            item_id,
            token,
        };
        if self.admissions.send(admission).is_err() {
            // Dispatcher is gone; the queue is being torn down.
            self.registry().retain(|e| e.task_id != task_id);
            return false;
        }

        true
    }

    /// Cancel every pending or running task for `item_id`.
    ///
    /// Pending tasks are cancelled synchronously and will never start;
    /// running tasks are signalled and stop at their next checkpoint.
    pub fn cancel(&self, item_id: &ItemId) {
        let mut entries = self.registry();
        for entry in entries
            .iter_mut()
            .filter(|e| e.item_id == *item_id && e.state.is_active())
        {
            if entry.state == TaskState::Pending {
                entry.state = TaskState::Cancelled;
            }
            entry.token.cancel();
            debug!(
                queue = self.class.as_str(),
                item_id = %item_id,
                task_id = %entry.task_id,
                "Cancellation requested"
            );
        }
    }

    /// Cancel every pending or running task in this queue.
    pub fn cancel_all(&self) {
        let mut entries = self.registry();
        for entry in entries.iter_mut().filter(|e| e.state.is_active()) {
            if entry.state == TaskState::Pending {
                entry.state = TaskState::Cancelled;
            }
            entry.token.cancel();
        }
        debug!(queue = self.class.as_str(), "Cancelled all tasks");
    }

    /// Number of tasks currently pending or running.
    pub fn count(&self) -> usize {
        self.registry()
            .iter()
            .filter(|e| e.state.is_active())
            .count()
    }

    fn registry(&self) -> MutexGuard<'_, Vec<QueueEntry>> {
        self.entries.lock().expect("queue registry poisoned")
    }

    /// Dispatcher loop: one admission at a time, in order. The head
    /// admission holds the line until it gets a slot or is cancelled,
    /// which is what makes admission order the start order.
    fn spawn_dispatcher(
        class: TaskClass,
        entries: Arc<Mutex<Vec<QueueEntry>>>,
        event_bus: EventBus,
        mut rx: mpsc::UnboundedReceiver<Admission>,
    ) {
        let semaphore = Arc::new(Semaphore::new(class.concurrency_bound()));

        tokio::spawn(async move {
            while let Some(admission) = rx.recv().await {
                if admission.token.is_cancelled() {
                    Self::finalize(
                        &entries,
                        &event_bus,
                        class,
                        &admission.item_id,
                        admission.task_id,
                        TaskOutcome::Cancelled,
                    );
                    continue;
                }

                let permit = tokio::select! {
                    _ = admission.token.cancelled() => None,
                    permit = Arc::clone(&semaphore).acquire_owned() => permit.ok(),
                };
                let Some(permit) = permit else {
                    Self::finalize(
                        &entries,
                        &event_bus,
                        class,
                        &admission.item_id,
                        admission.task_id,
                        TaskOutcome::Cancelled,
                    );
                    continue;
                };

                Self::mark_running(&entries, admission.task_id);
                event_bus
                    .emit(CoreEvent::Transfer(TransferEvent::TaskStarted {
                        item_id: admission.item_id.clone(),
                        class: class.as_str().to_string(),
                    }))
                    .ok();

                let entries = Arc::clone(&entries);
                let event_bus = event_bus.clone();
                tokio::spawn(async move {
                    let outcome = admission.task.run(&admission.token).await;
                    Self::finalize(
                        &entries,
                        &event_bus,
                        class,
                        &admission.item_id,
                        admission.task_id,
                        outcome,
                    );
                    // Slot released exactly once, after the registry is
                    // already clean.
                    drop(permit);
                });
            }
        });
    }

    fn mark_running(entries: &Mutex<Vec<QueueEntry>>, task_id: TaskId) {
        let mut entries = entries.lock().expect("queue registry poisoned");
        if let Some(entry) = entries
            .iter_mut()
            .find(|e| e.task_id == task_id && e.state == TaskState::Pending)
        {
            entry.state = TaskState::Running;
        }
    }

    /// Deregister a task and publish its terminal outcome. Runs exactly
    /// once per admitted task, on whatever thread completion arrives.
    fn finalize(
        entries: &Mutex<Vec<QueueEntry>>,
        event_bus: &EventBus,
        class: TaskClass,
        item_id: &ItemId,
        task_id: TaskId,
        outcome: TaskOutcome,
    ) {
        {
            let mut entries = entries.lock().expect("queue registry poisoned");
            entries.retain(|e| e.task_id != task_id);
        }

        debug!(
            queue = class.as_str(),
            item_id = %item_id,
            task_id = %task_id,
            outcome = outcome.as_str(),
            "Task finished"
        );

        event_bus
            .emit(CoreEvent::Transfer(TransferEvent::TaskFinished {
                item_id: item_id.clone(),
                class: class.as_str().to_string(),
                outcome: outcome.as_str().to_string(),
            }))
            .ok();
    }
}

impl std::fmt::Debug for TaskQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskQueue")
            .field("class", &self.class)
            .field("count", &self.count())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;
    use tokio::sync::Notify;
    use tokio::time::sleep;

    /// Task that blocks on a gate until released, or until cancelled.
    struct GatedTask {
        id: ItemId,
        gate: Arc<Notify>,
        started: Arc<AtomicBool>,
        order: Arc<Mutex<Vec<String>>>,
        outcome: TaskOutcome,
    }

    impl GatedTask {
        fn new(id: &str, order: Arc<Mutex<Vec<String>>>) -> (Arc<Self>, Arc<Notify>, Arc<AtomicBool>) {
            let gate = Arc::new(Notify::new());
            let started = Arc::new(AtomicBool::new(false));
            let task = Arc::new(Self {
                id: ItemId::new(id),
                gate: Arc::clone(&gate),
                started: Arc::clone(&started),
                order,
                outcome: TaskOutcome::Completed,
            });
            (task, gate, started)
        }
    }

    #[async_trait]
    impl QueueTask for GatedTask {
        fn item_id(&self) -> &ItemId {
            &self.id
        }

        async fn run(&self, token: &CancellationToken) -> TaskOutcome {
            self.started.store(true, Ordering::SeqCst);
            self.order.lock().unwrap().push(self.id.to_string());
            tokio::select! {
                _ = token.cancelled() => TaskOutcome::Cancelled,
                _ = self.gate.notified() => self.outcome,
            }
        }
    }

    async fn wait_until(what: &str, cond: impl Fn() -> bool) {
        for _ in 0..500 {
            if cond() {
                return;
            }
            sleep(Duration::from_millis(10)).await;
        }
        panic!("timed out waiting for: {}", what);
    }

    fn order_log() -> Arc<Mutex<Vec<String>>> {
        Arc::new(Mutex::new(Vec::new()))
    }

    #[tokio::test]
    async fn test_admit_and_complete() {
        let queue = TaskQueue::new(TaskClass::Download, EventBus::new(16));
        let (task, gate, started) = GatedTask::new("item-1", order_log());

        assert!(queue.admit(task));
        assert_eq!(queue.count(), 1);

        wait_until("task started", || started.load(Ordering::SeqCst)).await;
        gate.notify_one();
        wait_until("queue drained", || queue.count() == 0).await;
    }

    #[tokio::test]
    async fn test_dedup_rejects_second_task_for_same_item() {
        let queue = TaskQueue::new(TaskClass::Thumbnail, EventBus::new(16));
        let order = order_log();
        let (first, gate, started) = GatedTask::new("item-1", Arc::clone(&order));
        let (second, _gate2, started2) = GatedTask::new("item-1", Arc::clone(&order));

        assert!(queue.admit(first));
        wait_until("first started", || started.load(Ordering::SeqCst)).await;

        assert!(!queue.admit(second));
        assert_eq!(queue.count(), 1);

        gate.notify_one();
        wait_until("queue drained", || queue.count() == 0).await;
        assert!(!started2.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_readmission_allowed_after_completion() {
        let queue = TaskQueue::new(TaskClass::Thumbnail, EventBus::new(16));
        let order = order_log();

        let (first, gate, _) = GatedTask::new("item-1", Arc::clone(&order));
        assert!(queue.admit(first));
        gate.notify_one();
        wait_until("queue drained", || queue.count() == 0).await;

        let (second, gate2, started2) = GatedTask::new("item-1", Arc::clone(&order));
        assert!(queue.admit(second));
        wait_until("second started", || started2.load(Ordering::SeqCst)).await;
        gate2.notify_one();
        wait_until("queue drained", || queue.count() == 0).await;
    }

    #[tokio::test]
    async fn test_cancel_pending_never_runs() {
        // Synchronize queue has bound 1: the second task stays pending.
        let queue = TaskQueue::new(TaskClass::Synchronize, EventBus::new(16));
        let order = order_log();

        let (running, gate, started) = GatedTask::new("item-a", Arc::clone(&order));
        let (pending, _gate2, started2) = GatedTask::new("item-b", Arc::clone(&order));

        assert!(queue.admit(running));
        wait_until("first started", || started.load(Ordering::SeqCst)).await;
        assert!(queue.admit(pending));
        assert_eq!(queue.count(), 2);

        // Cancelling the pending task takes effect synchronously.
        queue.cancel(&ItemId::new("item-b"));
        assert_eq!(queue.count(), 1);

        gate.notify_one();
        wait_until("queue drained", || queue.count() == 0).await;
        assert!(!started2.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_cancel_running_stops_at_checkpoint() {
        let queue = TaskQueue::new(TaskClass::Download, EventBus::new(16));
        let (task, _gate, started) = GatedTask::new("item-1", order_log());

        assert!(queue.admit(task));
        wait_until("task started", || started.load(Ordering::SeqCst)).await;

        queue.cancel(&ItemId::new("item-1"));
        wait_until("queue drained", || queue.count() == 0).await;
    }

    #[tokio::test]
    async fn test_cancel_all_drains_running_and_pending() {
        let queue = TaskQueue::new(TaskClass::Synchronize, EventBus::new(16));
        let order = order_log();
        let mut started_flags = Vec::new();

        for i in 0..4 {
            let (task, _gate, started) = GatedTask::new(&format!("item-{}", i), Arc::clone(&order));
            assert!(queue.admit(task));
            started_flags.push(started);
        }
        wait_until("first started", || started_flags[0].load(Ordering::SeqCst)).await;
        assert_eq!(queue.count(), 4);

        queue.cancel_all();
        wait_until("queue drained", || queue.count() == 0).await;

        // Only the running task ever started.
        let started_count = started_flags
            .iter()
            .filter(|f| f.load(Ordering::SeqCst))
            .count();
        assert_eq!(started_count, 1);
    }

    #[tokio::test]
    async fn test_start_order_is_admission_order() {
        let queue = TaskQueue::new(TaskClass::Synchronize, EventBus::new(16));
        let order = order_log();

        let mut gates = Vec::new();
        for name in ["item-a", "item-b", "item-c"] {
            let (task, gate, _) = GatedTask::new(name, Arc::clone(&order));
            assert!(queue.admit(task));
            gates.push(gate);
        }

        wait_until("a started", || order.lock().unwrap().len() == 1).await;
        gates[0].notify_one();
        wait_until("b started", || order.lock().unwrap().len() == 2).await;
        gates[1].notify_one();
        wait_until("c started", || order.lock().unwrap().len() == 3).await;
        gates[2].notify_one();
        wait_until("queue drained", || queue.count() == 0).await;

        assert_eq!(*order.lock().unwrap(), vec!["item-a", "item-b", "item-c"]);
    }

    #[tokio::test]
    async fn test_failed_task_releases_slot() {
        let queue = TaskQueue::new(TaskClass::Synchronize, EventBus::new(16));
        let order = order_log();

        let gate = Arc::new(Notify::new());
        let failing = Arc::new(GatedTask {
            id: ItemId::new("item-fail"),
            gate: Arc::clone(&gate),
            started: Arc::new(AtomicBool::new(false)),
            order: Arc::clone(&order),
            outcome: TaskOutcome::TransportFailure(500),
        });
        assert!(queue.admit(failing));

        let (next, gate2, started2) = GatedTask::new("item-next", Arc::clone(&order));
        assert!(queue.admit(next));

        gate.notify_one();
        // The failure must free the slot for the next pending task.
        wait_until("next started", || started2.load(Ordering::SeqCst)).await;
        gate2.notify_one();
        wait_until("queue drained", || queue.count() == 0).await;
    }

    #[tokio::test]
    async fn test_finished_events_emitted_per_task() {
        let bus = EventBus::new(32);
        let mut sub = bus.subscribe();
        let queue = TaskQueue::new(TaskClass::Download, bus);

        let (task, gate, _) = GatedTask::new("item-1", order_log());
        assert!(queue.admit(task));
        gate.notify_one();
        wait_until("queue drained", || queue.count() == 0).await;
        // The finished event is published right after deregistration;
        // give it a beat to land in the channel.
        sleep(Duration::from_millis(50)).await;

        let mut finished = 0;
        while let Ok(event) = sub.try_recv() {
            if let CoreEvent::Transfer(TransferEvent::TaskFinished { outcome, .. }) = event {
                assert_eq!(outcome, "completed");
                finished += 1;
            }
        }
        assert_eq!(finished, 1);
    }
}
