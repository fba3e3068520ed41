//! Instruction builders for the rpl-sps-blinks program.
//!
//! Built from raw account metas and discriminators so the off-chain stack
//! does not depend on the Anchor runtime. Account order matches the
//! deployed IDL.

use solana_sdk::{
    instruction::{AccountMeta, Instruction},
    pubkey::Pubkey,
};
use solana_sdk_ids::system_program;
use spsnet_core::GoodsSize;

use crate::pda::{player_pda, sps_pda};

/// Anchor instruction discriminators for the rpl-sps-blinks program.
/// Each is the first 8 bytes of SHA256("global:<instruction_name>").
pub mod discriminator {
    pub const INCORPORATE: [u8; 8] = [0x10, 0x9d, 0x48, 0x07, 0xa8, 0xee, 0x9e, 0x1b];
    pub const BUY_GOODS: [u8; 8] = [0x0f, 0x0a, 0x30, 0x44, 0xb7, 0xc4, 0xc2, 0xab];
    pub const HIRE_SECURITY: [u8; 8] = [0x9b, 0xcd, 0x7a, 0xbe, 0xf2, 0xbc, 0x18, 0x6c];
    pub const RAID: [u8; 8] = [0xe8, 0x1c, 0x8d, 0x30, 0xa9, 0x71, 0xca, 0x15];
    pub const RESET_PLAYER_TIMER: [u8; 8] = [0xa8, 0x00, 0x28, 0x31, 0x5a, 0x07, 0x83, 0xa7];
    pub const REVIVE_SPS: [u8; 8] = [0xdd, 0x03, 0x1d, 0xe9, 0x36, 0xb7, 0xcd, 0x1d];
}

/// incorporate(discord_id) — creates the caller's SPS PDA
pub fn incorporate(program_id: &Pubkey, server: &Pubkey, discord_id: &str) -> Instruction {
    let (sps, _) = sps_pda(program_id, discord_id);

    let mut data = discriminator::INCORPORATE.to_vec();
    data.extend_from_slice(&(discord_id.len() as u32).to_le_bytes());
    data.extend_from_slice(discord_id.as_bytes());

    Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new_readonly(system_program::id(), false),
            AccountMeta::new(*server, true),
            AccountMeta::new(sps, false),
        ],
        data,
    }
}

/// buy_goods(goods_size) — blink user buys goods from a corporation.
/// The server pays fees; the buying wallet co-signs as authority.
pub fn buy_goods(
    program_id: &Pubkey,
    payer: &Pubkey,
    authority: &Pubkey,
    sps: &Pubkey,
    size: GoodsSize,
) -> Instruction {
    let (player, _) = player_pda(program_id, authority);

    let mut data = discriminator::BUY_GOODS.to_vec();
    data.push(size.variant());

    Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new_readonly(system_program::id(), false),
            AccountMeta::new(*payer, true),
            AccountMeta::new_readonly(*authority, true),
            AccountMeta::new(player, false),
            AccountMeta::new(*sps, false),
        ],
        data,
    }
}

/// hire_security(amount) — spends CREDz on security forces
pub fn hire_security(
    program_id: &Pubkey,
    server: &Pubkey,
    sps: &Pubkey,
    amount: u64,
) -> Instruction {
    let mut data = discriminator::HIRE_SECURITY.to_vec();
    data.extend_from_slice(&amount.to_le_bytes());

    Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new_readonly(*server, true),
            AccountMeta::new(*sps, false),
        ],
        data,
    }
}

/// raid(goblins) — the server sends goblins against a corporation
pub fn raid(program_id: &Pubkey, server: &Pubkey, sps: &Pubkey, goblins: u64) -> Instruction {
    let mut data = discriminator::RAID.to_vec();
    data.extend_from_slice(&goblins.to_le_bytes());

    Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new_readonly(*server, true),
            AccountMeta::new(*sps, false),
        ],
        data,
    }
}

/// reset_player_timer() — admin: clear a player's purchase cooldown
pub fn reset_player_timer(program_id: &Pubkey, server: &Pubkey, player: &Pubkey) -> Instruction {
    Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new_readonly(*server, true),
            AccountMeta::new(*player, false),
        ],
        data: discriminator::RESET_PLAYER_TIMER.to_vec(),
    }
}

/// revive_sps() — admin: bring a destroyed corporation back
pub fn revive_sps(program_id: &Pubkey, server: &Pubkey, sps: &Pubkey) -> Instruction {
    Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new_readonly(*server, true),
            AccountMeta::new(*sps, false),
        ],
        data: discriminator::REVIVE_SPS.to_vec(),
    }
}
