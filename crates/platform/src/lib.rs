#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Platform boundary for vernal
//!
//! Everything that leaves the process goes through here: child process
//! execution, the OS service manager and archive extraction. Each boundary
//! is an async trait so the orchestrator and watchdog can be driven by fakes
//! in tests.
//!
//! ## Architecture
//!
//! - **`ProcessOperations`**: runs a [`PlatformCommand`] and captures its output
//! - **`ServiceController`**: start/stop the worker service (`launchctl`)
//! - **`ArchiveInstaller`**: unpack the distribution archive (`tar`)

pub mod archive;
pub mod context;
pub mod fs;
pub mod process;
pub mod service;

pub use archive::{ArchiveInstaller, TarArchiveInstaller};
pub use context::{Platform, PlatformContext};
pub use process::{CommandOutput, HostProcessOperations, PlatformCommand, ProcessOperations};
pub use service::{LaunchctlController, ServiceController};
