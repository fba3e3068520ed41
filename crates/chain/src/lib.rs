//! SPSnet Chain
//!
//! Solana client for the rpl-sps-blinks program.
//!
//! Supports two modes:
//! - **Mock Mode**: For development/testing without a validator. The mock
//!   applies the program's exact state transitions to in-memory accounts.
//! - **Live Mode**: Actual Solana RPC calls against the deployed program.
//!
//! ## Transaction shapes
//!
//! Every transaction carries a compute-unit-price instruction ahead of the
//! program instruction and is a v0 message signed by the server authority.
//! The blink buy transaction is special: the server signs as fee payer and
//! the message is returned partially signed, awaiting the purchasing
//! user's signature from their wallet.

mod client;
mod instructions;
mod pda;

pub use client::{ChainClient, ChainConfig, ChainMode};
pub use instructions::*;
pub use pda::{player_pda, sps_pda};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChainError {
    #[error("RPC error: {0}")]
    RpcError(String),

    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    #[error("Account not found: {0}")]
    AccountNotFound(String),

    #[error("Account decode error: {0}")]
    AccountDecode(#[from] spsnet_core::CoreError),

    #[error("Not authorized: no signing keypair configured")]
    NotAuthorized,

    #[error("Message compile error: {0}")]
    CompileError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

pub type Result<T> = std::result::Result<T, ChainError>;
