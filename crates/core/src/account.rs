//! Mirrors of the on-chain account types.
//!
//! The program serializes accounts with Borsh behind an 8-byte Anchor
//! discriminator (the first 8 bytes of SHA256("account:<TypeName>")).
//! Decoding walks the layout by hand so no crate here depends on the
//! Anchor runtime.

use crate::{CoreError, PublicKey, Result, STARTING_SECURITY_FORCES};

/// Discriminator for SPS accounts: SHA256("account:SPS")[..8]
pub const SPS_DISCRIMINATOR: [u8; 8] = [0x70, 0xa5, 0xa2, 0x91, 0x44, 0xc5, 0x13, 0x60];

/// Discriminator for Player accounts: SHA256("account:Player")[..8]
pub const PLAYER_DISCRIMINATOR: [u8; 8] = [0xcd, 0xde, 0x70, 0x07, 0xa5, 0x9b, 0xce, 0xda];

/// On-chain state of a corporation (SPS account).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpsState {
    /// Discord user id of the owner
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

impl SpsState {
    /// Fresh state as written by the incorporate instruction
    pub fn incorporated(owner_discord_id: String) -> Self {
        Self {
            owner_discord_id,
            battle_points: 0,
            credz: 0,
            security_forces: STARTING_SECURITY_FORCES,
            is_dead: false,
        }
    }

    /// Decode from raw account data (discriminator included).
    ///
    /// Layout after the discriminator:
    ///   owner_discord_id: u32 LE length + bytes
    ///   battle_points:    u64
    ///   credz:            u64
    ///   security_forces:  u64
    ///   is_dead:          bool
    pub fn decode(data: &[u8]) -> Result<Self> {
        let mut r = Reader::with_discriminator(data, &SPS_DISCRIMINATOR)?;
        let owner_discord_id = r.read_string()?;
        let battle_points = r.read_u64()?;
        let credz = r.read_u64()?;
        let security_forces = r.read_u64()?;
        let is_dead = r.read_bool()?;
        Ok(Self {
            owner_discord_id,
            battle_points,
            credz,
            security_forces,
            is_dead,
        })
    }
}

/// On-chain state of a blink buyer (Player account).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerState {
    /// Wallet that owns this player record
    pub owner: PublicKey,
    /// Lifetime goods value purchased
    pub goods_bought: u64,
    /// Slot after which the next purchase is allowed
    pub next_purchase_slot: u64,
}

impl PlayerState {
    /// Decode from raw account data (discriminator included).
    ///
    /// Layout after the discriminator:
    ///   owner:              [u8; 32]
    ///   goods_bought:       u64
    ///   next_purchase_slot: u64
    pub fn decode(data: &[u8]) -> Result<Self> {
        let mut r = Reader::with_discriminator(data, &PLAYER_DISCRIMINATOR)?;
        let owner = r.read_pubkey()?;
        let goods_bought = r.read_u64()?;
        let next_purchase_slot = r.read_u64()?;
        Ok(Self {
            owner,
            goods_bought,
            next_purchase_slot,
        })
    }

    /// Whether the purchase cooldown is still running at `slot`
    pub fn in_cooldown(&self, slot: u64) -> bool {
        slot < self.next_purchase_slot
    }

    /// Slots remaining until the next purchase is allowed
    pub fn cooldown_remaining(&self, slot: u64) -> u64 {
        self.next_purchase_slot.saturating_sub(slot)
    }
}

/// Minimal cursor over Borsh-encoded account data
struct Reader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> Reader<'a> {
    fn with_discriminator(data: &'a [u8], discriminator: &[u8; 8]) -> Result<Self> {
        if data.len() < 8 {
            return Err(CoreError::AccountTooShort(data.len()));
        }
        if &data[..8] != discriminator {
            return Err(CoreError::DiscriminatorMismatch);
        }
        Ok(Self { data, offset: 8 })
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        let end = self
            .offset
            .checked_add(len)
            .ok_or(CoreError::AccountTooShort(self.data.len()))?;
        if end > self.data.len() {
            return Err(CoreError::AccountTooShort(self.data.len()));
        }
        let slice = &self.data[self.offset..end];
        self.offset = end;
        Ok(slice)
    }

    fn read_u32(&mut self) -> Result<u32> {
        Ok(u32::from_le_bytes(self.take(4)?.try_into().expect("4 bytes")))
    }

    fn read_u64(&mut self) -> Result<u64> {
        Ok(u64::from_le_bytes(self.take(8)?.try_into().expect("8 bytes")))
    }

    fn read_bool(&mut self) -> Result<bool> {
        Ok(self.take(1)?[0] != 0)
    }

    fn read_pubkey(&mut self) -> Result<PublicKey> {
        Ok(self.take(32)?.try_into().expect("32 bytes"))
    }

    fn read_string(&mut self) -> Result<String> {
        let len = self.read_u32()? as usize;
        let bytes = self.take(len)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| CoreError::InvalidString)
    }
}
