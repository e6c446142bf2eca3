//! Host integration: platform detection and shell command execution
//!
//! Everything that touches the machine the assistant runs on lives here.
//! The executor is the one place where model-suggested text becomes a real
//! process, so it is only ever reached after the confirmation gate.

pub mod executor;
pub mod host;

pub use executor::{CommandRunner, ExecutionOutcome, ExecutionStatus, ShellExecutor};
pub use host::{HostInfo, OsFamily};
