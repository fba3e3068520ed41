//! Chain client for the rpl-sps-blinks program
//!
//! Supports two modes:
//! - **Mock Mode**: For development/testing without a validator. Accounts
//!   live in memory and every operation applies the program's state
//!   transitions directly.
//! - **Live Mode**: Actual Solana RPC calls to the deployed program.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use tracing::{debug, info};

use solana_client::nonblocking::rpc_client::RpcClient;
use solana_client::rpc_config::RpcSendTransactionConfig;
use solana_sdk::{
    commitment_config::CommitmentConfig,
    compute_budget::ComputeBudgetInstruction,
    hash::Hash,
    instruction::Instruction,
    message::{v0, VersionedMessage},
    pubkey::Pubkey,
    signature::{Keypair, Signature},
    signer::Signer,
    transaction::VersionedTransaction,
};

use spsnet_core::{
    GoodsSize, PlayerState, SpsState, TransactionSignature, PROGRAM_ID, SECURITY_COST,
    STARTING_SECURITY_FORCES,
};

use crate::{instructions, pda, ChainError, Result};

/// Chain mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainMode {
    /// Mock mode for development - accounts are tracked in-memory
    Mock,
    /// Live Solana mode (requires the deployed program)
    Live,
}

/// Chain client configuration
#[derive(Debug, Clone)]
pub struct ChainConfig {
    /// Chain mode (Mock or Live)
    pub mode: ChainMode,
    /// Solana RPC endpoint (only used in Live mode)
    pub rpc_url: String,
    /// Program ID for the rpl-sps-blinks program
    pub program_id: [u8; 32],
    /// Commitment level for transactions
    pub commitment: String,
    /// Compute unit price attached to every transaction
    pub priority_fee_micro_lamports: u64,
    /// Resubmission attempts for fire-and-forget sends
    pub max_retries: usize,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            mode: ChainMode::Mock,
            rpc_url: "https://api.devnet.solana.com".to_string(),
            program_id: PROGRAM_ID,
            commitment: "confirmed".to_string(),
            priority_fee_micro_lamports: 1000,
            max_retries: 5,
        }
    }
}

impl ChainConfig {
    /// Create a mock configuration for development
    pub fn mock() -> Self {
        Self {
            mode: ChainMode::Mock,
            ..Default::default()
        }
    }

    /// Create a live configuration against the given RPC endpoint
    pub fn live(rpc_url: impl Into<String>) -> Self {
        Self {
            mode: ChainMode::Live,
            rpc_url: rpc_url.into(),
            ..Default::default()
        }
    }

    /// Get commitment config for the Solana client
    fn commitment_config(&self) -> CommitmentConfig {
        match self.commitment.as_str() {
            "finalized" => CommitmentConfig::finalized(),
            "confirmed" => CommitmentConfig::confirmed(),
            "processed" => CommitmentConfig::processed(),
            _ => CommitmentConfig::confirmed(),
        }
    }
}

/// In-memory state for mock mode
#[derive(Debug, Default)]
struct MockState {
    /// SPS accounts by address
    sps: HashMap<Pubkey, SpsState>,
    /// Player accounts by address
    players: HashMap<Pubkey, PlayerState>,
    /// Current slot
    slot: u64,
    /// Transaction counter for generating mock signatures
    tx_counter: u64,
}

/// Chain client for on-chain game operations
///
/// This client abstracts the Solana RPC calls and transaction building.
/// In mock mode, operations mutate in-memory accounts with the program's
/// state transitions.
pub struct ChainClient {
    config: ChainConfig,
    /// Server authority keypair for signing transactions
    signer_keypair: Option<Keypair>,
    /// Solana RPC client (only used in Live mode)
    rpc_client: Option<Arc<RpcClient>>,
    /// Mock state (only used in Mock mode)
    mock_state: Arc<RwLock<MockState>>,
}

impl ChainClient {
    /// Create a read-only client (no signing keypair)
    pub fn new(config: ChainConfig) -> Self {
        let rpc_client = Self::rpc_for(&config);
        Self {
            config,
            signer_keypair: None,
            rpc_client,
            mock_state: Arc::new(RwLock::new(MockState::default())),
        }
    }

    /// Create a client with the server authority keypair
    pub fn with_keypair(config: ChainConfig, keypair: Keypair) -> Self {
        let rpc_client = Self::rpc_for(&config);
        Self {
            config,
            signer_keypair: Some(keypair),
            rpc_client,
            mock_state: Arc::new(RwLock::new(MockState::default())),
        }
    }

    fn rpc_for(config: &ChainConfig) -> Option<Arc<RpcClient>> {
        if config.mode == ChainMode::Live {
            Some(Arc::new(RpcClient::new_with_commitment(
                config.rpc_url.clone(),
                config.commitment_config(),
            )))
        } else {
            None
        }
    }

    /// Check if running in mock mode
    pub fn is_mock(&self) -> bool {
        self.config.mode == ChainMode::Mock
    }

    /// Get program ID as Pubkey
    pub fn program_id(&self) -> Pubkey {
        Pubkey::new_from_array(self.config.program_id)
    }

    /// The server authority public key, if a keypair is configured
    pub fn server_pubkey(&self) -> Option<Pubkey> {
        self.signer_keypair.as_ref().map(|k| k.pubkey())
    }

    fn keypair(&self) -> Result<&Keypair> {
        self.signer_keypair.as_ref().ok_or(ChainError::NotAuthorized)
    }

    fn rpc(&self) -> Result<&Arc<RpcClient>> {
        self.rpc_client
            .as_ref()
            .ok_or_else(|| ChainError::RpcError("RPC client not initialized".to_string()))
    }

    /// Derive the SPS PDA for a Discord user
    pub fn sps_pda(&self, discord_id: &str) -> Pubkey {
        pda::sps_pda(&self.program_id(), discord_id).0
    }

    /// Derive the Player PDA for a wallet
    pub fn player_pda(&self, authority: &Pubkey) -> Pubkey {
        pda::player_pda(&self.program_id(), authority).0
    }

    /// Generate mock signature (when already holding the lock)
    fn generate_mock_signature(state: &mut MockState) -> TransactionSignature {
        state.tx_counter += 1;
        let mut sig = [0u8; 64];
        sig[0..8].copy_from_slice(&state.tx_counter.to_le_bytes());
        sig[8..16].copy_from_slice(b"mocktxn!");
        sig
    }

    // ==================== Queries ====================

    /// Get the current slot
    pub async fn get_slot(&self) -> Result<u64> {
        if self.is_mock() {
            let state = self.mock_state.read().expect("chain lock poisoned");
            return Ok(state.slot);
        }
        self.rpc()?
            .get_slot()
            .await
            .map_err(|e| ChainError::RpcError(format!("get_slot: {}", e)))
    }

    /// Fetch a single SPS account, None when it does not exist
    pub async fn fetch_sps(&self, sps: &Pubkey) -> Result<Option<SpsState>> {
        debug!("Fetching SPS {}", sps);

        if self.is_mock() {
            let state = self.mock_state.read().expect("chain lock poisoned");
            return Ok(state.sps.get(sps).cloned());
        }

        match self.rpc()?.get_account(sps).await {
            Ok(account) => Ok(Some(SpsState::decode(&account.data)?)),
            Err(e) => {
                debug!("SPS account not found: {}", e);
                Ok(None)
            }
        }
    }

    /// Fetch a batch of SPS accounts in one RPC round trip.
    ///
    /// The result is index-aligned with the input; missing or undecodable
    /// accounts come back as None.
    pub async fn fetch_sps_multiple(&self, keys: &[Pubkey]) -> Result<Vec<Option<SpsState>>> {
        if self.is_mock() {
            let state = self.mock_state.read().expect("chain lock poisoned");
            return Ok(keys.iter().map(|k| state.sps.get(k).cloned()).collect());
        }

        let accounts = self
            .rpc()?
            .get_multiple_accounts(keys)
            .await
            .map_err(|e| ChainError::RpcError(format!("get_multiple_accounts: {}", e)))?;

        Ok(accounts
            .into_iter()
            .map(|account| account.and_then(|a| SpsState::decode(&a.data).ok()))
            .collect())
    }

    /// Fetch a Player account, None when it does not exist
    pub async fn fetch_player(&self, player: &Pubkey) -> Result<Option<PlayerState>> {
        if self.is_mock() {
            let state = self.mock_state.read().expect("chain lock poisoned");
            return Ok(state.players.get(player).copied());
        }

        match self.rpc()?.get_account(player).await {
            Ok(account) => Ok(Some(PlayerState::decode(&account.data)?)),
            Err(e) => {
                debug!("Player account not found: {}", e);
                Ok(None)
            }
        }
    }

    // ==================== Transaction plumbing ====================

    fn priority_fee_ix(&self) -> Instruction {
        ComputeBudgetInstruction::set_compute_unit_price(self.config.priority_fee_micro_lamports)
    }

    async fn latest_blockhash(&self) -> Result<Hash> {
        if self.is_mock() {
            return Ok(Hash::default());
        }
        self.rpc()?
            .get_latest_blockhash()
            .await
            .map_err(|e| ChainError::RpcError(format!("get_latest_blockhash: {}", e)))
    }

    /// Compile a v0 message, fee-paid by the server authority
    async fn compile_message(&self, instructions: Vec<Instruction>) -> Result<VersionedMessage> {
        let payer = self.keypair()?.pubkey();
        let blockhash = self.latest_blockhash().await?;
        let message = v0::Message::try_compile(&payer, &instructions, &[], blockhash)
            .map_err(|e| ChainError::CompileError(e.to_string()))?;
        Ok(VersionedMessage::V0(message))
    }

    /// Build a fully server-signed transaction around one instruction
    async fn build_signed(&self, instruction: Instruction) -> Result<VersionedTransaction> {
        let message = self
            .compile_message(vec![self.priority_fee_ix(), instruction])
            .await?;
        VersionedTransaction::try_new(message, &[self.keypair()?])
            .map_err(|e| ChainError::TransactionFailed(e.to_string()))
    }

    /// Submit without waiting for confirmation (resubmitted by the RPC node)
    async fn submit(&self, instruction: Instruction) -> Result<TransactionSignature> {
        let tx = self.build_signed(instruction).await?;
        let config = RpcSendTransactionConfig {
            max_retries: Some(self.config.max_retries),
            ..Default::default()
        };
        let signature = self
            .rpc()?
            .send_transaction_with_config(&tx, config)
            .await
            .map_err(|e| ChainError::TransactionFailed(e.to_string()))?;

        debug!("Transaction submitted: {}", signature);
        let mut sig_bytes = [0u8; 64];
        sig_bytes.copy_from_slice(signature.as_ref());
        Ok(sig_bytes)
    }

    /// Submit and wait for confirmed commitment
    async fn submit_and_confirm(&self, instruction: Instruction) -> Result<TransactionSignature> {
        let tx = self.build_signed(instruction).await?;
        let signature = self
            .rpc()?
            .send_and_confirm_transaction(&tx)
            .await
            .map_err(|e| ChainError::TransactionFailed(e.to_string()))?;

        info!("Transaction confirmed: {}", signature);
        let mut sig_bytes = [0u8; 64];
        sig_bytes.copy_from_slice(signature.as_ref());
        Ok(sig_bytes)
    }

    /// Serialize a transaction the way Actions clients expect it
    pub fn serialize_base64(tx: &VersionedTransaction) -> Result<String> {
        let bytes =
            bincode::serialize(tx).map_err(|e| ChainError::SerializationError(e.to_string()))?;
        Ok(BASE64.encode(bytes))
    }

    // ==================== Game operations ====================

    /// Register a new corporation for a Discord user.
    ///
    /// Returns the SPS address and the transaction signature. The send is
    /// fire-and-forget; the caller records the corporation optimistically.
    pub async fn incorporate(&self, discord_id: &str) -> Result<(Pubkey, TransactionSignature)> {
        let sps = self.sps_pda(discord_id);
        info!("Incorporating SPS {} for discord user {}", sps, discord_id);

        if self.is_mock() {
            let mut state = self.mock_state.write().expect("chain lock poisoned");
            if state.sps.contains_key(&sps) {
                return Err(ChainError::TransactionFailed(
                    "SPS account already exists".to_string(),
                ));
            }
            state
                .sps
                .insert(sps, SpsState::incorporated(discord_id.to_string()));
            let sig = Self::generate_mock_signature(&mut state);
            return Ok((sps, sig));
        }

        let server = self.keypair()?.pubkey();
        let ix = instructions::incorporate(&self.program_id(), &server, discord_id);
        let sig = self.submit(ix).await?;
        Ok((sps, sig))
    }

    /// Spend a corporation's CREDz on security forces
    pub async fn hire_security(&self, sps: &Pubkey, amount: u64) -> Result<TransactionSignature> {
        info!("Hiring {} security forces for {}", amount, sps);

        if self.is_mock() {
            let mut state = self.mock_state.write().expect("chain lock poisoned");
            let corp = state
                .sps
                .get_mut(sps)
                .ok_or_else(|| ChainError::AccountNotFound(sps.to_string()))?;

            let cost = amount
                .checked_mul(SECURITY_COST)
                .ok_or_else(|| ChainError::TransactionFailed("amount overflow".to_string()))?;
            if corp.credz < cost {
                return Err(ChainError::TransactionFailed("Insufficent CREDz".to_string()));
            }
            corp.credz -= cost;
            corp.security_forces += amount;
            return Ok(Self::generate_mock_signature(&mut state));
        }

        let server = self.keypair()?.pubkey();
        let ix = instructions::hire_security(&self.program_id(), &server, sps, amount);
        self.submit(ix).await
    }

    /// Send goblins against a corporation and wait for confirmation.
    ///
    /// The raid scheduler only trusts confirmed raids when reconciling the
    /// relational cache, so this path always waits.
    pub async fn raid(&self, sps: &Pubkey, goblins: u64) -> Result<TransactionSignature> {
        debug!("Raiding {} with {} goblins", sps, goblins);

        if self.is_mock() {
            let mut state = self.mock_state.write().expect("chain lock poisoned");
            let corp = state
                .sps
                .get_mut(sps)
                .ok_or_else(|| ChainError::AccountNotFound(sps.to_string()))?;

            if !corp.is_dead {
                if corp.security_forces > goblins {
                    corp.security_forces -= goblins;
                    corp.battle_points += goblins;
                } else {
                    // security forces wiped out
                    corp.security_forces = 0;
                    corp.is_dead = true;
                }
            }
            return Ok(Self::generate_mock_signature(&mut state));
        }

        let server = self.keypair()?.pubkey();
        let ix = instructions::raid(&self.program_id(), &server, sps, goblins);
        self.submit_and_confirm(ix).await
    }

    /// Admin: revive a destroyed corporation with starting forces
    pub async fn revive_sps(&self, sps: &Pubkey) -> Result<TransactionSignature> {
        info!("Reviving SPS {}", sps);

        if self.is_mock() {
            let mut state = self.mock_state.write().expect("chain lock poisoned");
            let corp = state
                .sps
                .get_mut(sps)
                .ok_or_else(|| ChainError::AccountNotFound(sps.to_string()))?;
            corp.is_dead = false;
            corp.security_forces = STARTING_SECURITY_FORCES;
            return Ok(Self::generate_mock_signature(&mut state));
        }

        let server = self.keypair()?.pubkey();
        let ix = instructions::revive_sps(&self.program_id(), &server, sps);
        self.submit_and_confirm(ix).await
    }

    /// Admin: clear a player's purchase cooldown
    pub async fn reset_player_timer(&self, player: &Pubkey) -> Result<TransactionSignature> {
        info!("Resetting purchase timer for player {}", player);

        if self.is_mock() {
            let mut state = self.mock_state.write().expect("chain lock poisoned");
            let record = state
                .players
                .get_mut(player)
                .ok_or_else(|| ChainError::AccountNotFound(player.to_string()))?;
            record.next_purchase_slot = 0;
            return Ok(Self::generate_mock_signature(&mut state));
        }

        let server = self.keypair()?.pubkey();
        let ix = instructions::reset_player_timer(&self.program_id(), &server, player);
        self.submit_and_confirm(ix).await
    }

    /// Build the blink buy transaction: server pays fees and signs, the
    /// purchasing wallet must co-sign as authority before submission.
    pub async fn build_buy_goods_transaction(
        &self,
        sps: &Pubkey,
        authority: &Pubkey,
        size: GoodsSize,
    ) -> Result<VersionedTransaction> {
        let keypair = self.keypair()?;
        let server = keypair.pubkey();

        let instructions = vec![
            self.priority_fee_ix(),
            instructions::buy_goods(&self.program_id(), &server, authority, sps, size),
        ];
        let message = self.compile_message(instructions).await?;

        let num_required = message.header().num_required_signatures as usize;
        let mut tx = VersionedTransaction {
            signatures: vec![Signature::default(); num_required],
            message,
        };

        // Partial sign: fill in only the server's signature slot
        let content = tx.message.serialize();
        let mut signed = false;
        for index in 0..num_required {
            if tx.message.static_account_keys()[index] == server {
                tx.signatures[index] = keypair.sign_message(&content);
                signed = true;
            }
        }
        if !signed {
            return Err(ChainError::NotAuthorized);
        }

        Ok(tx)
    }

    // ==================== Mock Helpers ====================

    /// Insert an SPS account directly (mock mode only, for testing)
    pub fn mock_add_sps(&self, sps: Pubkey, state: SpsState) -> Result<()> {
        if !self.is_mock() {
            return Err(ChainError::NotAuthorized);
        }
        let mut mock = self.mock_state.write().expect("chain lock poisoned");
        mock.sps.insert(sps, state);
        Ok(())
    }

    /// Insert a Player account directly (mock mode only, for testing)
    pub fn mock_add_player(&self, player: Pubkey, state: PlayerState) -> Result<()> {
        if !self.is_mock() {
            return Err(ChainError::NotAuthorized);
        }
        let mut mock = self.mock_state.write().expect("chain lock poisoned");
        mock.players.insert(player, state);
        Ok(())
    }

    /// Set the mock slot (mock mode only, for testing cooldowns)
    pub fn mock_set_slot(&self, slot: u64) -> Result<()> {
        if !self.is_mock() {
            return Err(ChainError::NotAuthorized);
        }
        let mut mock = self.mock_state.write().expect("chain lock poisoned");
        mock.slot = slot;
        Ok(())
    }
}

impl std::fmt::Debug for ChainClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainClient")
            .field("mode", &self.config.mode)
            .field("rpc_url", &self.config.rpc_url)
            .finish()
    }
}
