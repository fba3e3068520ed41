//! SPSnet Blinks
//!
//! The Solana Actions ("blinks") HTTP API. Two endpoints:
//!
//! - `GET /api/corporation?q=<pubkey>` renders the action descriptor for a
//!   corporation, with linked buy actions for each goods size.
//! - `POST /api/corporation/buy?q=<pubkey>&size=1|2|3` builds the buy
//!   transaction, server-signed as fee payer, and returns it base64
//!   encoded for the user's wallet to co-sign.
//!
//! Action clients expect errors as a descriptor payload with HTTP 200 and
//! permissive CORS on every route; both are handled here.

mod action;
mod routes;

pub use action::*;
pub use routes::{router, BlinksState};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BlinksError {
    #[error("Undefined.")]
    MissingParameter,

    #[error("{0} not an integer")]
    SizeNotAnInteger(String),

    #[error("{0} is not 1|2|3")]
    SizeOutOfRange(String),

    #[error("Invalid account: {0}")]
    InvalidAccount(String),

    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    #[error("Corp Not Found!")]
    CorporationNotFound,

    #[error("{0}s til you can buy more goods!")]
    PurchaseCooldown(u64),

    #[error("Chain error: {0}")]
    Chain(#[from] spsnet_chain::ChainError),

    #[error("Store error: {0}")]
    Store(#[from] spsnet_store::StoreError),
}

pub type Result<T> = std::result::Result<T, BlinksError>;
