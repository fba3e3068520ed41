//! PDA derivation for the rpl-sps-blinks program

use solana_sdk::pubkey::Pubkey;
use spsnet_core::{PLAYER_SEED, SPS_SEED};

/// Derive the SPS PDA for a Discord user: ["sps", discord_id]
pub fn sps_pda(program_id: &Pubkey, discord_id: &str) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[SPS_SEED, discord_id.as_bytes()], program_id)
}

/// Derive the Player PDA for a wallet: ["player", authority]
pub fn player_pda(program_id: &Pubkey, authority: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[PLAYER_SEED, authority.as_ref()], program_id)
}
