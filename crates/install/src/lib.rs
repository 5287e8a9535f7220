#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Installation orchestration for vernal
//!
//! [`Installer`] owns the [`InstallState`](vernal_types::InstallState) and
//! drives one attempt at a time: log in, write the service configuration,
//! download the distribution archive and unpack it. Observers subscribe to
//! the state and see every transition in order.
//!
//! Collaborators are injected through [`InstallerBuilder`]; nothing is looked
//! up globally.

mod builder;
pub mod config_file;
mod installer;
mod pipeline;

pub use builder::InstallerBuilder;
pub use installer::Installer;
pub use vernal_state::Subscription;
