//! SPSnet Settings
//!
//! Environment-driven configuration for the spsnet server. Every knob has
//! a default; unparseable values fall back to the default rather than
//! aborting startup.

mod config;

pub use config::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Missing required setting: {0}")]
    Missing(&'static str),
}

pub type Result<T> = std::result::Result<T, SettingsError>;
