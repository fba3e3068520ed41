use anchor_lang::prelude::*;

declare_id!("7M5gyKT88N9fViSMjNcizfq5Rtz9CSLN8agu7r7TRULY");

/// Longest Discord snowflake id the program stores
pub const DISCORD_USER_ID_LEN: usize = 20;
/// The off-chain server authority allowed to drive the game
pub const SERVER_KEY: Pubkey = anchor_lang::pubkey!("A2UG3TvnBLjVb2uzz19igwfBN42soLXYHgQZe1TKFsV8");
/// CREDz cost of one security force unit
pub const SECURITY_COST: u64 = 20;
/// Security forces a fresh corporation starts with
pub const STARTING_SECURITY_FORCES: u64 = 10;

#[program]
pub mod rpl_sps_blinks {
    use super::*;

    /// Register the SPS PDA for a Discord user.
    ///
    /// Only the server may call this: owners are Discord users proxied by
    /// the bot, not keypairs.
    pub fn incorporate(ctx: Context<Incorporate>, discord_id: String) -> Result<()> {
        let sps = &mut ctx.accounts.sps;

        sps.owner_discord_id = discord_id;
        sps.battle_points = 0;
        sps.credz = 0;
        sps.security_forces = STARTING_SECURITY_FORCES;
        sps.is_dead = false;

        Ok(())
    }

    /// A blink user buys goods from an SPS on a time-locked basis.
    ///
    /// Small/Medium/Large goods credit 10/60/120 CREDz to the SPS and
    /// lock the buyer out for 1/3/6 hours of slots.
    pub fn buy_goods(ctx: Context<BuyGoods>, goods_size: GoodsSize) -> Result<()> {
        let player = &mut ctx.accounts.player;
        player.owner = ctx.accounts.authority.key();

        let sps = &mut ctx.accounts.sps;

        let clock = Clock::get()?;
        let slot = clock.slot;
        require!(slot >= player.next_purchase_slot, SPSError::PurchaseCooldown);

        let (credz, cooldown_slots) = goods_size.terms();
        player.goods_bought += credz;
        sps.credz += credz;
        player.next_purchase_slot += slot + cooldown_slots;

        Ok(())
    }

    /// Spend CREDz on security forces, 20 CREDz each.
    pub fn hire_security(ctx: Context<HireSecurity>, amount: u64) -> Result<()> {
        let sps = &mut ctx.accounts.sps;

        let cost = amount * SECURITY_COST;
        require!(sps.credz >= cost, SPSError::InsufficentCredz);

        sps.credz -= cost;
        sps.security_forces += amount;

        Ok(())
    }

    /// The server raids an SPS with a goblin horde.
    ///
    /// One security force defeats one goblin and earns one battle point.
    /// If the goblins are not outnumbered the SPS is destroyed.
    pub fn raid(ctx: Context<Raid>, goblins: u64) -> Result<()> {
        let sps = &mut ctx.accounts.sps;

        if !sps.is_dead {
            if sps.security_forces > goblins {
                sps.security_forces -= goblins;
                sps.battle_points += goblins;
            } else {
                // security forces wiped out
                sps.security_forces = 0;
                sps.is_dead = true;
            }
        }

        Ok(())
    }

    /// Admin escape hatch: clear a player's purchase cooldown.
    pub fn reset_player_timer(ctx: Context<ResetPlayerTimer>) -> Result<()> {
        ctx.accounts.player.next_purchase_slot = 0;
        Ok(())
    }

    /// Admin escape hatch: revive a destroyed SPS with starting forces.
    pub fn revive_sps(ctx: Context<ReviveSps>) -> Result<()> {
        let sps = &mut ctx.accounts.sps;
        sps.is_dead = false;
        sps.security_forces = STARTING_SECURITY_FORCES;
        Ok(())
    }
}

// ============================================================================
// Accounts
// ============================================================================

#[derive(Accounts)]
#[instruction(discord_id: String)]
pub struct Incorporate<'info> {
    pub system_program: Program<'info, System>,

    #[account(mut, address = SERVER_KEY)]
    pub server: Signer<'info>,

    #[account(
        init,
        space = 8 + SPS::INIT_SPACE,
        payer = server,
        seeds = [
            b"sps",
            discord_id.as_bytes(),
        ],
        bump,
    )]
    pub sps: Account<'info, SPS>,
}

#[derive(Accounts)]
pub struct BuyGoods<'info> {
    pub system_program: Program<'info, System>,

    /// The server fronts rent and fees for blink purchases
    #[account(mut, address = SERVER_KEY)]
    pub payer: Signer<'info>,

    pub authority: Signer<'info>,

    #[account(
        init_if_needed,
        space = 8 + Player::INIT_SPACE,
        payer = payer,
        seeds = [
            b"player",
            authority.key().as_ref(),
        ],
        bump,
    )]
    pub player: Account<'info, Player>,

    #[account(mut)]
    pub sps: Account<'info, SPS>,
}

#[derive(Accounts)]
pub struct HireSecurity<'info> {
    #[account(address = SERVER_KEY)]
    pub server: Signer<'info>,

    #[account(mut)]
    pub sps: Account<'info, SPS>,
}

#[derive(Accounts)]
pub struct Raid<'info> {
    #[account(address = SERVER_KEY)]
    pub server: Signer<'info>,

    #[account(mut)]
    pub sps: Account<'info, SPS>,
}

#[derive(Accounts)]
pub struct ResetPlayerTimer<'info> {
    #[account(address = SERVER_KEY)]
    pub server: Signer<'info>,

    #[account(mut)]
    pub player: Account<'info, Player>,
}

#[derive(Accounts)]
pub struct ReviveSps<'info> {
    #[account(address = SERVER_KEY)]
    pub server: Signer<'info>,

    #[account(mut)]
    pub sps: Account<'info, SPS>,
}

// ============================================================================
// Account Data
// ============================================================================

#[account]
#[derive(InitSpace)]
pub struct SPS {
    /// Discord user id of the owner
    #[max_len(DISCORD_USER_ID_LEN)]
    pub owner_discord_id: String,
    /// Goblins defeated across all raids
    pub battle_points: u64,
    /// Spendable CREDz balance
    pub credz: u64,
    /// Security forces available to repel raids
    pub security_forces: u64,
    /// Set once a raid wipes out all security forces
    pub is_dead: bool,
}

#[account]
#[derive(InitSpace)]
pub struct Player {
    pub owner: Pubkey,
    pub goods_bought: u64,
    pub next_purchase_slot: u64,
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug)]
pub enum GoodsSize {
    Small,
    Medium,
    Large,
}

impl GoodsSize {
    /// (CREDz credited, cooldown in slots) — the cluster runs ~2 slots/sec
    pub fn terms(&self) -> (u64, u64) {
        match self {
            GoodsSize::Small => (10, 60 * 60 * 2),
            GoodsSize::Medium => (60, 3 * 60 * 60 * 2),
            GoodsSize::Large => (120, 6 * 60 * 60 * 2),
        }
    }
}

#[error_code]
pub enum SPSError {
    #[msg("Player still in cooldown to buy more goods")]
    PurchaseCooldown,

    #[msg("Insufficent CREDz")]
    InsufficentCredz,
}
