use serde::{Deserialize, Serialize};

use crate::SLOTS_PER_SECOND;

/// 32-byte public key / account address
pub type PublicKey = [u8; 32];

/// Transaction signature (Solana format)
pub type TransactionSignature = [u8; 64];

/// Goods a blink user can buy from a corporation.
///
/// Each size awards the corporation CREDz and locks the buyer out for a
/// cooldown window, both fixed by the on-chain program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GoodsSize {
    /// 10 CREDz, 1 hour cooldown
    Small,
    /// 60 CREDz, 3 hour cooldown
    Medium,
    /// 120 CREDz, 6 hour cooldown
    Large,
}

impl GoodsSize {
    /// CREDz credited to the corporation (and goods credited to the buyer)
    pub fn credz(&self) -> u64 {
        match self {
            Self::Small => 10,
            Self::Medium => 60,
            Self::Large => 120,
        }
    }

    /// Purchase cooldown in slots
    pub fn cooldown_slots(&self) -> u64 {
        self.cooldown_hours() * 60 * 60 * SLOTS_PER_SECOND
    }

    /// Purchase cooldown in whole hours
    pub fn cooldown_hours(&self) -> u64 {
        match self {
            Self::Small => 1,
            Self::Medium => 3,
            Self::Large => 6,
        }
    }

    /// Borsh enum variant index, as serialized in instruction data
    pub fn variant(&self) -> u8 {
        match self {
            Self::Small => 0,
            Self::Medium => 1,
            Self::Large => 2,
        }
    }

    /// Parse the 1-3 size parameter used by the blink buy endpoint
    pub fn from_blink_size(size: u8) -> Option<Self> {
        match size {
            1 => Some(Self::Small),
            2 => Some(Self::Medium),
            3 => Some(Self::Large),
            _ => None,
        }
    }

    /// Human label used on action buttons
    pub fn label(&self) -> &'static str {
        match self {
            Self::Small => "Small Goods",
            Self::Medium => "Medium Goods",
            Self::Large => "Large Goods",
        }
    }
}
