//! # Reload Debouncer
//!
//! Collapses bursts of "data changed" signals into at most one
//! notification per window.
//!
//! ## States
//!
//! ```text
//! Idle --request()--> Pending --window elapses--> emit, back to Idle
//!          ^             |
//!          |             +-- request() while Pending: no-op
//! ```
//!
//! Requesting while a fire is already scheduled coalesces (it does not
//! reset the window); the fire transitions back to `Idle` and emits the
//! signal once.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::time::sleep;
use tracing::trace;

/// Debounce state: at most one scheduled fire pending at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebounceState {
    /// No fire scheduled
    Idle,
    /// A fire is scheduled at the end of the current window
    Pending,
}

/// Coalesces repeated reload requests into one signal per window.
///
/// Must be created inside a tokio runtime; the pending fire runs on a
/// spawned timer task.
pub struct Debouncer {
    window: Duration,
    state: Arc<Mutex<DebounceState>>,
    signal: Arc<dyn Fn() + Send + Sync>,
}

impl Debouncer {
    /// Create a debouncer that invokes `signal` once per window.
    pub fn new(window: Duration, signal: impl Fn() + Send + Sync + 'static) -> Self {
        Self {
            window,
            state: Arc::new(Mutex::new(DebounceState::Idle)),
            signal: Arc::new(signal),
        }
    }

    /// Request the signal.
    ///
    /// Schedules a fire at the end of the window when idle; a no-op when
    /// a fire is already pending.
    pub fn request(&self) {
        {
            let mut state = self.state.lock().expect("debouncer state poisoned");
            if *state == DebounceState::Pending {
                trace!("Reload already pending, coalescing");
                return;
            }
            *state = DebounceState::Pending;
        }

        let window = self.window;
        let state = Arc::clone(&self.state);
        let signal = Arc::clone(&self.signal);
        tokio::spawn(async move {
            sleep(window).await;
            *state.lock().expect("debouncer state poisoned") = DebounceState::Idle;
            signal();
        });
    }

    /// Current state (for introspection and tests)
    pub fn state(&self) -> DebounceState {
        *self.state.lock().expect("debouncer state poisoned")
    }
}

impl std::fmt::Debug for Debouncer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Debouncer")
            .field("window", &self.window)
            .field("state", &self.state())
            .finish()
    }
}
