#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Core type definitions for the vernal installer
//!
//! This crate provides the data model shared by the installation
//! orchestrator, the service watchdog and the front ends: install state,
//! login payloads, on-disk layout and service-manager commands.

pub mod layout;
pub mod login;
pub mod server;
pub mod service;
pub mod state;

// Re-export commonly used types
pub use layout::InstallationLayout;
pub use login::{Credentials, LoginFailure, LoginMessage, LoginResponse, LoginSuccess, Organization};
pub use server::ApiServer;
pub use service::ServiceCommand;
pub use state::{InstallState, ProgressInfo};
pub use url::Url;

use serde::{Deserialize, Serialize};

/// Color output choice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorChoice {
    Always,
    Auto,
    Never,
}

// Implement clap::ValueEnum for ColorChoice
impl clap::ValueEnum for ColorChoice {
    fn value_variants<'a>() -> &'a [Self] {
        &[Self::Always, Self::Auto, Self::Never]
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        Some(match self {
            Self::Always => clap::builder::PossibleValue::new("always"),
            Self::Auto => clap::builder::PossibleValue::new("auto"),
            Self::Never => clap::builder::PossibleValue::new("never"),
        })
    }
}

impl Default for ColorChoice {
    fn default() -> Self {
        Self::Auto
    }
}
