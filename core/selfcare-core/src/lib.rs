//! # selfcare-core
//!
//! Core library for the selfcare agent: the reboot-reminder escalation
//! state machine and the capability seams the daemon wires up per
//! platform.
//!
//! ## Design Principles
//!
//! - **Synchronous**: No async runtime dependency. The daemon schedules
//!   with plain threads.
//! - **Graceful degradation**: A missing or corrupt state file yields an
//!   empty state and a warning, never a startup failure.
//! - **Platform-agnostic**: Uptime retrieval, dialog presentation and
//!   device control live behind small traits ([`uptime::UptimeSource`],
//!   [`prompt::WarningPrompt`], [`devices::DeviceController`]); the state
//!   machine never touches the platform directly.

pub mod devices;
pub mod error;
pub mod escalation;
pub mod paths;
pub mod privilege;
pub mod prompt;
pub mod skip_state;
pub mod uptime;

pub use error::CoreError;
pub use escalation::{EscalationEngine, UPTIME_THRESHOLD};
pub use skip_state::{SkipDuration, SkipState, SkipStateStore};
