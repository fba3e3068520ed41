//! SPSnet Discord
//!
//! The Discord command layer, served over Discord's HTTP interactions
//! webhook (no gateway connection): Discord POSTs signed interaction
//! payloads to `/discord/interactions`, the handler verifies the ed25519
//! signature against the application public key, answers pings, and
//! dispatches the three game commands:
//!
//! - `/info` — report the caller's corporation stats and blink URL
//! - `/incorporate` — register a new corporation on-chain and in the cache
//! - `/hire <amount>` — spend CREDz on security forces
//!
//! Commands are registered with Discord's REST API via [`register_commands`].

mod commands;
mod interaction;
mod register;
mod verify;

pub use commands::{router, DiscordState};
pub use interaction::*;
pub use register::{commands_payload, register_commands};
pub use verify::verify_signature;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DiscordError {
    #[error("Missing signature headers")]
    MissingSignature,

    #[error("Invalid interaction signature")]
    InvalidSignature,

    #[error("Invalid interaction payload: {0}")]
    InvalidPayload(String),

    #[error("Player already has a corporation!")]
    AlreadyIncorporated,

    #[error("Player has not incorporated yet!")]
    NotIncorporated,

    #[error("You don't have enough CREDz!")]
    InsufficientCredz,

    #[error("Missing required option: {0}")]
    MissingOption(&'static str),

    #[error("Invalid amount")]
    InvalidAmount,

    #[error("Command registration failed: {0}")]
    RegistrationFailed(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Chain error: {0}")]
    Chain(#[from] spsnet_chain::ChainError),

    #[error("Store error: {0}")]
    Store(#[from] spsnet_store::StoreError),
}

pub type Result<T> = std::result::Result<T, DiscordError>;
