//! SPSnet Store
//!
//! The off-chain relational cache of corporations. The chain is the source
//! of truth for corporation state; this cache exists so the raid scheduler
//! and the HTTP/Discord layers can enumerate and gate corporations without
//! scanning program accounts.

mod corporation;

pub use corporation::{Corporation, CorporationStore};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Corporation not found: {0}")]
    NotFound(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;
