//! # Core Runtime
//!
//! Ambient services shared by the transfer core: the event bus the
//! queues publish on, logging/tracing setup, and the dependency-injected
//! configuration that wires collaborator bridges into the scheduler.
//!
//! ## Components
//!
//! - **Events** (`events`): `EventBus` over `tokio::sync::broadcast`
//!   carrying transfer lifecycle and library notifications
//! - **Logging** (`logging`): `tracing-subscriber` initialization with
//!   format and filter configuration
//! - **Config** (`config`): `CoreConfig` builder with fail-fast
//!   validation of required collaborator bridges

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use config::{CoreConfig, CoreConfigBuilder, TransferTuning};
pub use error::{Error, Result};
pub use events::{CoreEvent, EventBus, EventSeverity, LibraryEvent, TransferEvent};
pub use logging::{init_logging, LogFormat, LoggingConfig};
