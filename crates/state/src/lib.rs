#![warn(mismatched_lifetime_syntaxes)]
#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! State management for vernal
//!
//! Two pieces live here: [`StateCapsule`], the observable holder the
//! installer publishes its state through, and [`Preferences`], the small
//! persisted key/value store that survives restarts (completion flag,
//! server URL override).

pub mod capsule;
pub mod preferences;

pub use capsule::{StateCapsule, Subscription};
pub use preferences::{
    FilePreferences, MemoryPreferences, Preferences, COMPLETE_KEY, PRODUCTION_URL_KEY,
};
