//! HTTP routes for the blinks API

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, Request, State},
    http::{header, HeaderValue, Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use solana_sdk::pubkey::Pubkey;
use tracing::{debug, warn};

use spsnet_chain::ChainClient;
use spsnet_core::{GoodsSize, SLOTS_PER_SECOND};
use spsnet_store::{Corporation, CorporationStore};

use crate::{
    ActionError, ActionGetResponse, ActionLinks, ActionPostResponse, BlinksError, LinkedAction,
    Result,
};

/// Shared state for the blinks routes
#[derive(Clone)]
pub struct BlinksState {
    pub chain: Arc<ChainClient>,
    pub store: CorporationStore,
    /// Public base URL used when rendering icon links
    pub public_url: String,
    /// Directory served under /public
    pub public_dir: String,
}

/// Build the blinks router with permissive CORS on every route
pub fn router(state: BlinksState) -> Router {
    Router::new()
        .route("/api/corporation", get(get_corporation))
        .route("/api/corporation/buy", post(post_buy_goods))
        .route("/public/{*path}", get(serve_public))
        .layer(middleware::from_fn(cors))
        .with_state(state)
}

/// Body of the buy action POST, sent by the wallet
#[derive(Debug, Deserialize)]
pub struct BuyRequest {
    pub account: String,
}

/// GET /api/corporation?q=<pubkey>
async fn get_corporation(
    State(state): State<BlinksState>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<ActionGetResponse> {
    match corporation_descriptor(&state, &params).await {
        Ok(descriptor) => Json(descriptor),
        Err(e) => {
            debug!("Corporation lookup failed: {}", e);
            // Action clients render the error descriptor; the status stays 200
            Json(error_descriptor(&state.public_url, "Corp Not Found!"))
        }
    }
}

/// POST /api/corporation/buy?q=<pubkey>&size=1|2|3
async fn post_buy_goods(
    State(state): State<BlinksState>,
    Query(params): Query<HashMap<String, String>>,
    body: std::result::Result<Json<BuyRequest>, JsonRejection>,
) -> Response {
    match build_buy_response(&state, &params, body).await {
        Ok(payload) => (StatusCode::OK, Json(payload)).into_response(),
        Err(e) => {
            debug!("Buy action failed: {}", e);
            let descriptor = error_descriptor(&state.public_url, &e.to_string());
            (StatusCode::OK, Json(descriptor)).into_response()
        }
    }
}

async fn corporation_descriptor(
    state: &BlinksState,
    params: &HashMap<String, String>,
) -> Result<ActionGetResponse> {
    let corp_key = params.get("q").ok_or(BlinksError::MissingParameter)?;
    let corp = state
        .store
        .find_by_pubkey(corp_key)
        .await?
        .ok_or(BlinksError::CorporationNotFound)?;
    Ok(describe_corporation(&state.public_url, &corp))
}

async fn build_buy_response(
    state: &BlinksState,
    params: &HashMap<String, String>,
    body: std::result::Result<Json<BuyRequest>, JsonRejection>,
) -> Result<ActionPostResponse> {
    let corp_key = params.get("q").ok_or(BlinksError::MissingParameter)?;
    let size = parse_size(params.get("size"))?;
    let Json(request) = body.map_err(|e| BlinksError::InvalidBody(e.to_string()))?;

    let account = Pubkey::from_str(&request.account)
        .map_err(|e| BlinksError::InvalidAccount(e.to_string()))?;
    debug!("user account: {}", account);

    // Purchase cooldown gate: an existing Player PDA carries the slot
    // after which the next purchase is allowed
    let player_key = state.chain.player_pda(&account);
    let player = state.chain.fetch_player(&player_key).await?;
    let slot = state.chain.get_slot().await?;
    if let Some(player) = player {
        if player.in_cooldown(slot) {
            let seconds = player.cooldown_remaining(slot) / SLOTS_PER_SECOND;
            return Err(BlinksError::PurchaseCooldown(seconds));
        }
    }

    let corp = state
        .store
        .find_by_pubkey(corp_key)
        .await?
        .ok_or(BlinksError::CorporationNotFound)?;
    let sps = Pubkey::from_str(&corp.publickey)
        .map_err(|e| BlinksError::InvalidAccount(e.to_string()))?;

    let tx = state
        .chain
        .build_buy_goods_transaction(&sps, &account, size)
        .await?;
    let transaction = ChainClient::serialize_base64(&tx)?;

    Ok(ActionPostResponse {
        transaction,
        message: None,
    })
}

/// Parse the 1-3 size query parameter
fn parse_size(raw: Option<&String>) -> Result<GoodsSize> {
    let raw = raw.ok_or(BlinksError::MissingParameter)?;
    let parsed: u8 = raw
        .parse()
        .map_err(|_| BlinksError::SizeNotAnInteger(raw.clone()))?;
    GoodsSize::from_blink_size(parsed).ok_or_else(|| BlinksError::SizeOutOfRange(raw.clone()))
}

/// Action descriptor for a living (or destroyed) corporation
fn describe_corporation(public_url: &str, corp: &Corporation) -> ActionGetResponse {
    let actions = [GoodsSize::Small, GoodsSize::Medium, GoodsSize::Large]
        .iter()
        .map(|size| LinkedAction {
            href: format!(
                "/api/corporation/buy?q={}&size={}",
                corp.publickey,
                size.variant() + 1
            ),
            label: size.label().to_string(),
            parameters: None,
        })
        .collect();

    ActionGetResponse {
        icon: format!("{}/public/01.png", public_url),
        title: "Buy Goods from Corporation".to_string(),
        description: "REQUIRES DEVNET! Times out for 1hr/3hr/6hr for Small/Medium/Large goods. \
                      Gives 10/60/120 CREDz to Corp owner."
            .to_string(),
        label: if corp.is_dead {
            "Corporation destroyed by goblins!".to_string()
        } else {
            "Buy Goods".to_string()
        },
        disabled: Some(corp.is_dead),
        links: Some(ActionLinks { actions }),
        error: None,
    }
}

/// Error descriptor rendered by action clients
fn error_descriptor(public_url: &str, message: &str) -> ActionGetResponse {
    ActionGetResponse {
        icon: format!("{}/public/error.png", public_url),
        title: "Corporation not found!".to_string(),
        description: String::new(),
        label: "Error!".to_string(),
        disabled: Some(true),
        links: None,
        error: Some(ActionError {
            message: message.to_string(),
        }),
    }
}

/// GET /public/{*path} — action icons
async fn serve_public(State(state): State<BlinksState>, Path(path): Path<String>) -> Response {
    if path.contains("..") {
        return StatusCode::NOT_FOUND.into_response();
    }

    let file_path = std::path::Path::new(&state.public_dir).join(&path);
    match tokio::fs::read(&file_path).await {
        Ok(bytes) => {
            let content_type = match file_path.extension().and_then(|e| e.to_str()) {
                Some("png") => "image/png",
                Some("jpg") | Some("jpeg") => "image/jpeg",
                Some("svg") => "image/svg+xml",
                Some("json") => "application/json",
                _ => "application/octet-stream",
            };
            ([(header::CONTENT_TYPE, content_type)], bytes).into_response()
        }
        Err(e) => {
            warn!("Static file {} not served: {}", path, e);
            StatusCode::NOT_FOUND.into_response()
        }
    }
}

/// Permissive CORS for cross-origin action clients
async fn cors(request: Request, next: Next) -> Response {
    let mut response = if request.method() == Method::OPTIONS {
        StatusCode::NO_CONTENT.into_response()
    } else {
        next.run(request).await
    };

    let headers = response.headers_mut();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET,POST,PUT,DELETE,OPTIONS"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type, Authorization, Accept-Encoding"),
    );
    headers.insert(
        header::ACCESS_CONTROL_EXPOSE_HEADERS,
        HeaderValue::from_static("Content-Type, Authorization"),
    );
    headers.insert(
        header::ACCESS_CONTROL_MAX_AGE,
        HeaderValue::from_static("86400"),
    );
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_sdk::signature::Keypair;
    use spsnet_chain::ChainConfig;

    async fn test_state() -> BlinksState {
        BlinksState {
            chain: Arc::new(ChainClient::with_keypair(ChainConfig::mock(), Keypair::new())),
            store: CorporationStore::connect("sqlite::memory:").await.unwrap(),
            public_url: "https://spsblink.test".to_string(),
            public_dir: "./public".to_string(),
        }
    }

    fn corp_row(publickey: &str, is_dead: bool) -> Corporation {
        Corporation {
            publickey: publickey.to_string(),
            discord_owner_id: "1234".to_string(),
            battle_points: 0,
            last_raided: 0,
            is_dead,
        }
    }

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size(Some(&"1".to_string())).unwrap(), GoodsSize::Small);
        assert_eq!(parse_size(Some(&"3".to_string())).unwrap(), GoodsSize::Large);
        assert!(matches!(
            parse_size(Some(&"x".to_string())),
            Err(BlinksError::SizeNotAnInteger(_))
        ));
        assert!(matches!(
            parse_size(Some(&"4".to_string())),
            Err(BlinksError::SizeOutOfRange(_))
        ));
        assert!(matches!(parse_size(None), Err(BlinksError::MissingParameter)));
    }

    #[test]
    fn test_describe_living_corporation() {
        let descriptor = describe_corporation("https://spsblink.test", &corp_row("abc", false));
        assert_eq!(descriptor.label, "Buy Goods");
        assert_eq!(descriptor.disabled, Some(false));
        let actions = &descriptor.links.unwrap().actions;
        assert_eq!(actions.len(), 3);
        assert_eq!(actions[0].href, "/api/corporation/buy?q=abc&size=1");
        assert_eq!(actions[2].href, "/api/corporation/buy?q=abc&size=3");
        assert_eq!(actions[1].label, "Medium Goods");
        assert!(descriptor.icon.starts_with("https://spsblink.test/public/"));
    }

    #[test]
    fn test_describe_dead_corporation() {
        let descriptor = describe_corporation("https://spsblink.test", &corp_row("abc", true));
        assert_eq!(descriptor.label, "Corporation destroyed by goblins!");
        assert_eq!(descriptor.disabled, Some(true));
    }

    #[tokio::test]
    async fn test_get_descriptor_for_known_corporation() {
        let state = test_state().await;
        state.store.insert(&corp_row("known", false)).await.unwrap();

        let params: HashMap<String, String> =
            [("q".to_string(), "known".to_string())].into_iter().collect();
        let descriptor = corporation_descriptor(&state, &params).await.unwrap();
        assert_eq!(descriptor.title, "Buy Goods from Corporation");
        assert!(descriptor.error.is_none());
    }

    #[tokio::test]
    async fn test_get_descriptor_unknown_corporation() {
        let state = test_state().await;
        let params: HashMap<String, String> =
            [("q".to_string(), "ghost".to_string())].into_iter().collect();
        assert!(matches!(
            corporation_descriptor(&state, &params).await,
            Err(BlinksError::CorporationNotFound)
        ));
    }

    #[tokio::test]
    async fn test_buy_returns_base64_transaction() {
        let state = test_state().await;

        // Seed a corporation whose publickey is the mock SPS PDA
        let (sps, _) = state.chain.incorporate("9876").await.unwrap();
        state
            .store
            .insert(&corp_row(&sps.to_string(), false))
            .await
            .unwrap();

        let params: HashMap<String, String> = [
            ("q".to_string(), sps.to_string()),
            ("size".to_string(), "2".to_string()),
        ]
        .into_iter()
        .collect();
        let body = Ok(Json(BuyRequest {
            account: Pubkey::new_unique().to_string(),
        }));

        let payload = build_buy_response(&state, &params, body).await.unwrap();
        assert!(!payload.transaction.is_empty());
    }

    #[tokio::test]
    async fn test_buy_rejects_cooldown() {
        let state = test_state().await;
        let (sps, _) = state.chain.incorporate("9876").await.unwrap();
        state
            .store
            .insert(&corp_row(&sps.to_string(), false))
            .await
            .unwrap();

        let account = Pubkey::new_unique();
        let player_key = state.chain.player_pda(&account);
        state
            .chain
            .mock_add_player(
                player_key,
                spsnet_core::PlayerState {
                    owner: account.to_bytes(),
                    goods_bought: 10,
                    next_purchase_slot: 10_000,
                },
            )
            .unwrap();
        state.chain.mock_set_slot(9_000).unwrap();

        let params: HashMap<String, String> = [
            ("q".to_string(), sps.to_string()),
            ("size".to_string(), "1".to_string()),
        ]
        .into_iter()
        .collect();
        let body = Ok(Json(BuyRequest {
            account: account.to_string(),
        }));

        let result = build_buy_response(&state, &params, body).await;
        // 1000 slots remaining at 2 slots/sec = 500s
        assert!(matches!(result, Err(BlinksError::PurchaseCooldown(500))));
    }

    #[tokio::test]
    async fn test_buy_rejects_bad_account() {
        let state = test_state().await;
        let params: HashMap<String, String> = [
            ("q".to_string(), "whatever".to_string()),
            ("size".to_string(), "1".to_string()),
        ]
        .into_iter()
        .collect();
        let body = Ok(Json(BuyRequest {
            account: "not-a-pubkey".to_string(),
        }));

        assert!(matches!(
            build_buy_response(&state, &params, body).await,
            Err(BlinksError::InvalidAccount(_))
        ));
    }

    #[test]
    fn test_error_descriptor_shape() {
        let descriptor = error_descriptor("https://x", "boom");
        assert_eq!(descriptor.label, "Error!");
        assert_eq!(descriptor.disabled, Some(true));
        assert_eq!(descriptor.error.unwrap().message, "boom");
    }
}
