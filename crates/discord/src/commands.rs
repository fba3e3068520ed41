//! Interaction endpoint and the three game commands

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::post,
    Router,
};
use tracing::{debug, info, warn};

use spsnet_chain::ChainClient;
use spsnet_core::SECURITY_COST;
use spsnet_store::{Corporation, CorporationStore};

use crate::{
    interaction::{
        CommandData, Interaction, InteractionResponse, INTERACTION_APPLICATION_COMMAND,
        INTERACTION_PING,
    },
    verify::verify_signature,
    DiscordError, Result,
};

/// Shared state for the interactions route
#[derive(Clone)]
pub struct DiscordState {
    pub chain: Arc<ChainClient>,
    pub store: CorporationStore,
    /// Public base URL used when rendering blink links
    pub public_url: String,
    /// Only this channel may issue game commands
    pub channel: String,
    /// Hex-encoded application public key for signature verification
    pub public_key: String,
}

/// Build the Discord interactions router
pub fn router(state: DiscordState) -> Router {
    Router::new()
        .route("/discord/interactions", post(interactions))
        .with_state(state)
}

/// POST /discord/interactions
async fn interactions(
    State(state): State<DiscordState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if let Err(e) = verify_headers(&state, &headers, &body) {
        warn!("Rejected interaction: {}", e);
        return StatusCode::UNAUTHORIZED.into_response();
    }

    let interaction: Interaction = match serde_json::from_slice(&body) {
        Ok(interaction) => interaction,
        Err(e) => {
            warn!("Unparseable interaction payload: {}", e);
            return StatusCode::BAD_REQUEST.into_response();
        }
    };

    match interaction.kind {
        INTERACTION_PING => Json(InteractionResponse::pong()).into_response(),
        INTERACTION_APPLICATION_COMMAND => {
            Json(dispatch(&state, &interaction).await).into_response()
        }
        other => {
            debug!("Ignoring interaction type {}", other);
            StatusCode::BAD_REQUEST.into_response()
        }
    }
}

fn verify_headers(state: &DiscordState, headers: &HeaderMap, body: &[u8]) -> Result<()> {
    let signature = headers
        .get("x-signature-ed25519")
        .and_then(|v| v.to_str().ok())
        .ok_or(DiscordError::MissingSignature)?;
    let timestamp = headers
        .get("x-signature-timestamp")
        .and_then(|v| v.to_str().ok())
        .ok_or(DiscordError::MissingSignature)?;
    verify_signature(&state.public_key, signature, timestamp, body)
}

/// Route an application command to its handler.
///
/// Every reply is ephemeral; handler errors become "Error: ..." replies,
/// except /info which answers missing corporations in its own words.
pub async fn dispatch(state: &DiscordState, interaction: &Interaction) -> InteractionResponse {
    if interaction.channel_name() != Some(state.channel.as_str()) {
        return InteractionResponse::ephemeral("Can only call this bot in the SPS Game channel");
    }

    let Some(user_id) = interaction.user_id() else {
        return InteractionResponse::ephemeral("Error: no user on interaction");
    };
    let Some(data) = interaction.data.as_ref() else {
        return InteractionResponse::ephemeral("Error: no command on interaction");
    };

    let result = match data.name.as_str() {
        "info" => info_command(state, user_id).await,
        "incorporate" => incorporate_command(state, user_id).await,
        "hire" => hire_command(state, user_id, data).await,
        other => {
            debug!("Unknown command {} from {}", other, user_id);
            Err(DiscordError::InvalidPayload(format!(
                "unknown command: {}",
                other
            )))
        }
    };

    match result {
        Ok(content) => InteractionResponse::ephemeral(content),
        Err(e) => InteractionResponse::ephemeral(format!("Error: {}", e)),
    }
}

/// /info — corporation stats and blink URL for the caller
async fn info_command(state: &DiscordState, user_id: &str) -> Result<String> {
    let sps_key = state.chain.sps_pda(user_id);

    match state.chain.fetch_sps(&sps_key).await? {
        Some(sps) => {
            let blink = blink_url(&state.public_url, &sps_key.to_string());
            Ok(format!(
                "User ID: {}\nBattle Points: {},\nCREDz: {},\nSecurity Forces: {}\nIs Dead: {}\nBlink: {}",
                user_id, sps.battle_points, sps.credz, sps.security_forces, sps.is_dead, blink
            ))
        }
        None => Ok("Player has not incorporated yet!".to_string()),
    }
}

/// /incorporate — register a new corporation for the caller
async fn incorporate_command(state: &DiscordState, user_id: &str) -> Result<String> {
    let sps_key = state.chain.sps_pda(user_id);
    if state
        .store
        .find_by_pubkey(&sps_key.to_string())
        .await?
        .is_some()
    {
        return Err(DiscordError::AlreadyIncorporated);
    }

    // Fire-and-forget submit; the cache row is written optimistically
    let (sps, _sig) = state.chain.incorporate(user_id).await?;
    state
        .store
        .insert(&Corporation {
            publickey: sps.to_string(),
            discord_owner_id: user_id.to_string(),
            battle_points: 0,
            last_raided: now_unix(),
            is_dead: false,
        })
        .await?;

    info!("Incorporated {} for discord user {}", sps, user_id);
    let blink = blink_url(&state.public_url, &sps.to_string());
    Ok(format!("Success! Here is your corporation blink: {}", blink))
}

/// /hire <amount> — spend CREDz on security forces
async fn hire_command(state: &DiscordState, user_id: &str, data: &CommandData) -> Result<String> {
    let raw = data
        .number_option("amount")
        .ok_or(DiscordError::MissingOption("amount"))?;
    if !(raw.is_finite() && raw >= 0.0 && raw.fract() == 0.0) {
        return Err(DiscordError::InvalidAmount);
    }
    let amount = raw as u64;

    let sps_key = state.chain.sps_pda(user_id);
    let sps = state
        .chain
        .fetch_sps(&sps_key)
        .await?
        .ok_or(DiscordError::NotIncorporated)?;

    let cost = amount
        .checked_mul(SECURITY_COST)
        .ok_or(DiscordError::InvalidAmount)?;
    if sps.credz < cost {
        return Err(DiscordError::InsufficientCredz);
    }

    state.chain.hire_security(&sps_key, amount).await?;
    Ok(format!("Successfully bought {} forces!", amount))
}

fn blink_url(public_url: &str, sps_key: &str) -> String {
    format!("{}/api/corporation?q={}", public_url, sps_key)
}

fn now_unix() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use spsnet_chain::ChainConfig;

    async fn test_state() -> DiscordState {
        use solana_sdk::signature::Keypair;
        DiscordState {
            chain: Arc::new(ChainClient::with_keypair(ChainConfig::mock(), Keypair::new())),
            store: CorporationStore::connect("sqlite::memory:").await.unwrap(),
            public_url: "https://spsblink.test".to_string(),
            channel: "sps-game".to_string(),
            public_key: String::new(),
        }
    }

    fn command(name: &str, user_id: &str, channel: &str, options: serde_json::Value) -> Interaction {
        serde_json::from_value(json!({
            "type": 2,
            "data": {"name": name, "options": options},
            "member": {"user": {"id": user_id}},
            "channel": {"id": "1", "name": channel}
        }))
        .unwrap()
    }

    fn content(response: &InteractionResponse) -> &str {
        response.data.as_ref().unwrap().content.as_str()
    }

    #[tokio::test]
    async fn test_wrong_channel_is_refused() {
        let state = test_state().await;
        let interaction = command("info", "1", "general", json!([]));
        let response = dispatch(&state, &interaction).await;
        assert_eq!(
            content(&response),
            "Can only call this bot in the SPS Game channel"
        );
    }

    #[tokio::test]
    async fn test_info_before_incorporation() {
        let state = test_state().await;
        let interaction = command("info", "777", "sps-game", json!([]));
        let response = dispatch(&state, &interaction).await;
        assert_eq!(content(&response), "Player has not incorporated yet!");
    }

    #[tokio::test]
    async fn test_incorporate_then_info() {
        let state = test_state().await;

        let response = dispatch(&state, &command("incorporate", "777", "sps-game", json!([]))).await;
        assert!(content(&response).starts_with("Success! Here is your corporation blink:"));

        // The cache row exists now
        let sps_key = state.chain.sps_pda("777").to_string();
        let corp = state.store.find_by_pubkey(&sps_key).await.unwrap().unwrap();
        assert_eq!(corp.discord_owner_id, "777");
        assert!(!corp.is_dead);

        let response = dispatch(&state, &command("info", "777", "sps-game", json!([]))).await;
        let text = content(&response);
        assert!(text.contains("User ID: 777"));
        assert!(text.contains("Security Forces: 10"));
        assert!(text.contains(&sps_key));
    }

    #[tokio::test]
    async fn test_incorporate_twice_is_refused() {
        let state = test_state().await;
        dispatch(&state, &command("incorporate", "777", "sps-game", json!([]))).await;
        let response = dispatch(&state, &command("incorporate", "777", "sps-game", json!([]))).await;
        assert_eq!(content(&response), "Error: Player already has a corporation!");
    }

    #[tokio::test]
    async fn test_hire_without_credz() {
        let state = test_state().await;
        dispatch(&state, &command("incorporate", "777", "sps-game", json!([]))).await;

        let interaction = command("hire", "777", "sps-game", json!([{"name": "amount", "value": 2}]));
        let response = dispatch(&state, &interaction).await;
        assert_eq!(content(&response), "Error: You don't have enough CREDz!");
    }

    #[tokio::test]
    async fn test_hire_with_credz() {
        let state = test_state().await;
        dispatch(&state, &command("incorporate", "777", "sps-game", json!([]))).await;

        let sps_key = state.chain.sps_pda("777");
        let mut sps = state.chain.fetch_sps(&sps_key).await.unwrap().unwrap();
        sps.credz = 100;
        state.chain.mock_add_sps(sps_key, sps).unwrap();

        let interaction = command("hire", "777", "sps-game", json!([{"name": "amount", "value": 2}]));
        let response = dispatch(&state, &interaction).await;
        assert_eq!(content(&response), "Successfully bought 2 forces!");

        let sps = state.chain.fetch_sps(&sps_key).await.unwrap().unwrap();
        assert_eq!(sps.credz, 100 - 2 * SECURITY_COST);
        assert_eq!(sps.security_forces, 12);
    }

    #[tokio::test]
    async fn test_hire_rejects_fractional_amount() {
        let state = test_state().await;
        dispatch(&state, &command("incorporate", "777", "sps-game", json!([]))).await;

        let interaction =
            command("hire", "777", "sps-game", json!([{"name": "amount", "value": 1.5}]));
        let response = dispatch(&state, &interaction).await;
        assert_eq!(content(&response), "Error: Invalid amount");
    }

    #[tokio::test]
    async fn test_unknown_command() {
        let state = test_state().await;
        let response = dispatch(&state, &command("dance", "777", "sps-game", json!([]))).await;
        assert!(content(&response).starts_with("Error:"));
    }
}
