//! SPSnet Core Types
//!
//! This crate defines the fundamental data structures shared by every
//! spsnet crate: the goods catalogue, mirrors of the on-chain SPS and
//! Player accounts, and the constants fixed by the deployed program.

mod account;
mod error;
mod types;

pub use account::*;
pub use error::*;
pub use types::*;

/// The deployed rpl-sps-blinks program.
/// Program: 7M5gyKT88N9fViSMjNcizfq5Rtz9CSLN8agu7r7TRULY
pub const PROGRAM_ID: PublicKey = [
    94, 75, 10, 47, 77, 241, 21, 55, 17, 77, 136, 68, 166, 66, 163, 252,
    245, 0, 166, 39, 36, 170, 45, 215, 0, 164, 184, 160, 212, 229, 119, 153,
];

/// The server authority that signs incorporate/hire/raid transactions.
/// Wallet: A2UG3TvnBLjVb2uzz19igwfBN42soLXYHgQZe1TKFsV8
pub const SERVER_AUTHORITY: PublicKey = [
    134, 25, 149, 220, 117, 206, 142, 13, 167, 48, 225, 138, 62, 252, 0, 218,
    169, 33, 93, 213, 157, 27, 156, 183, 208, 44, 134, 236, 188, 213, 137, 119,
];

/// PDA seed for SPS accounts: ["sps", discord_id]
pub const SPS_SEED: &[u8] = b"sps";

/// PDA seed for Player accounts: ["player", authority]
pub const PLAYER_SEED: &[u8] = b"player";

/// CREDz cost of one security force unit
pub const SECURITY_COST: u64 = 20;

/// Security forces a fresh corporation starts with
pub const STARTING_SECURITY_FORCES: u64 = 10;

/// The cluster produces roughly two slots per second; the program's
/// purchase cooldowns are expressed in slots at this rate.
pub const SLOTS_PER_SECOND: u64 = 2;

/// Goblin counts rolled per raid (inclusive bounds)
pub const MIN_GOBLINS: u64 = 1;
pub const MAX_GOBLINS: u64 = 5;
