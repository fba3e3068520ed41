//! SPSnet Raids
//!
//! The raid scheduler: a timer loop that randomly attacks living
//! corporations on-chain and reconciles the outcomes into the relational
//! cache.
//!
//! Each round:
//! 1. Load living corporations from the cache.
//! 2. Select each with independent probability, skipping corporations
//!    raided within the last hour (round-robin protection), and roll a
//!    goblin count for every selection.
//! 3. Submit one raid transaction per selection in bounded-size batches,
//!    everything within a batch in flight concurrently, tracking per-item
//!    success.
//! 4. After a settle delay, re-read the raided SPS accounts from chain
//!    and write the delta back: corporations dead on chain are marked
//!    dead in the cache, every confirmed raid gets its last-raided
//!    timestamp bumped.
//!
//! A row is only ever marked dead from the chain's view of the account —
//! a failed or unconfirmed transaction changes nothing.

mod scheduler;

pub use scheduler::{Raid, RaidConfig, RaidReport, RaidScheduler};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RaidsError {
    #[error("Store error: {0}")]
    Store(#[from] spsnet_store::StoreError),

    #[error("Chain error: {0}")]
    Chain(#[from] spsnet_chain::ChainError),
}

pub type Result<T> = std::result::Result<T, RaidsError>;
