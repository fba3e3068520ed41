//! SPSnet Server Binary
//!
//! One process for the whole backend: the blinks HTTP API, the Discord
//! interactions endpoint, and the raid scheduler. Subcommands split the
//! pieces out for deployments that run them separately.

use std::future::IntoFuture;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use solana_sdk::{pubkey::Pubkey, signature::Keypair};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use spsnet_blinks::BlinksState;
use spsnet_chain::{ChainClient, ChainConfig};
use spsnet_discord::DiscordState;
use spsnet_keystore::load_server_keypair;
use spsnet_raids::{RaidConfig, RaidScheduler};
use spsnet_settings::Settings;
use spsnet_store::CorporationStore;

/// SPSnet - backend for the SPS corporations game
#[derive(Parser)]
#[command(name = "spsnet")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API, Discord interactions, and raid scheduler
    Serve {
        /// Don't run the raid scheduler in this process
        #[arg(long)]
        no_raids: bool,
    },

    /// Run the raid scheduler only
    Raids,

    /// Register the Discord slash commands (one-shot)
    RegisterCommands,

    /// Server-authority maintenance operations
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Revive a destroyed corporation with starting security forces
    Revive {
        /// SPS account address
        sps: String,
    },

    /// Clear a player's purchase cooldown
    ResetTimer {
        /// Player account address
        player: String,
    },
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,spsnet=debug"));

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    let cli = Cli::parse();
    let settings = Settings::from_env();

    match cli.command {
        Commands::Serve { no_raids } => serve(settings, no_raids).await,
        Commands::Raids => run_raids(settings).await,
        Commands::RegisterCommands => register_commands(settings).await,
        Commands::Admin { action } => run_admin(settings, action).await,
    }
}

/// Build the chain client from settings; mock mode gets a throwaway key
/// when none is configured so development needs no secrets.
fn chain_client(settings: &Settings) -> Result<Arc<ChainClient>> {
    let config = if settings.chain.mock {
        ChainConfig::mock()
    } else {
        ChainConfig::live(settings.chain.rpc_url.clone())
    };

    let keypair = load_server_keypair(
        settings.chain.admin_key.as_deref(),
        settings.chain.keyfile.as_deref(),
    );
    let keypair = match keypair {
        Ok(keypair) => keypair,
        Err(e) if settings.chain.mock => {
            warn!("No server key configured ({}); using a throwaway key in mock mode", e);
            Keypair::new()
        }
        Err(e) => return Err(e).context("loading server keypair"),
    };

    Ok(Arc::new(ChainClient::with_keypair(config, keypair)))
}

fn raid_config(settings: &Settings) -> RaidConfig {
    RaidConfig {
        interval: Duration::from_millis(settings.raids.interval_ms),
        probability: settings.raids.probability,
        round_robin: settings.raids.round_robin,
        ..Default::default()
    }
}

async fn serve(settings: Settings, no_raids: bool) -> Result<()> {
    let chain = chain_client(&settings)?;
    let store = CorporationStore::connect(&settings.server.database_url)
        .await
        .context("opening corporation store")?;

    let mut app = spsnet_blinks::router(BlinksState {
        chain: chain.clone(),
        store: store.clone(),
        public_url: settings.server.public_url.clone(),
        public_dir: "./public".to_string(),
    });

    match settings.discord.require_public_key() {
        Ok(public_key) => {
            app = app.merge(spsnet_discord::router(DiscordState {
                chain: chain.clone(),
                store: store.clone(),
                public_url: settings.server.public_url.clone(),
                channel: settings.discord.channel.clone(),
                public_key: public_key.to_string(),
            }));

            if let (Ok(token), Ok(app_id)) = (
                settings.discord.require_bot_token(),
                settings.discord.require_application_id(),
            ) {
                if let Err(e) = spsnet_discord::register_commands(token, app_id).await {
                    warn!("Slash command registration failed: {}", e);
                }
            }
        }
        Err(e) => warn!("Discord interactions disabled: {}", e),
    }

    let raid_task = if no_raids {
        None
    } else {
        let scheduler = RaidScheduler::new(chain.clone(), store.clone(), raid_config(&settings));
        Some(tokio::spawn(async move { scheduler.run().await }))
    };

    let addr = format!("0.0.0.0:{}", settings.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    info!("spsnet listening on {}", addr);

    // Run until interrupted
    let server = axum::serve(listener, app);
    tokio::select! {
        result = server.into_future() => {
            result.context("http server")?;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal");
        }
    }

    if let Some(task) = raid_task {
        task.abort();
    }
    info!("spsnet stopped");
    Ok(())
}

async fn run_raids(settings: Settings) -> Result<()> {
    let chain = chain_client(&settings)?;
    let store = CorporationStore::connect(&settings.server.database_url)
        .await
        .context("opening corporation store")?;
    let scheduler = RaidScheduler::new(chain, store, raid_config(&settings));

    info!("Raid scheduler starting");
    tokio::select! {
        _ = scheduler.run() => {}
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal");
        }
    }
    Ok(())
}

async fn register_commands(settings: Settings) -> Result<()> {
    let token = settings.discord.require_bot_token()?;
    let app_id = settings.discord.require_application_id()?;
    spsnet_discord::register_commands(token, app_id).await?;
    println!("Slash commands registered for application {}", app_id);
    Ok(())
}

async fn run_admin(settings: Settings, action: AdminAction) -> Result<()> {
    let chain = chain_client(&settings)?;

    match action {
        AdminAction::Revive { sps } => {
            let sps = Pubkey::from_str(&sps).context("parsing SPS address")?;
            let signature = chain.revive_sps(&sps).await?;
            println!("Revived {} ({})", sps, bs58::encode(signature).into_string());
        }
        AdminAction::ResetTimer { player } => {
            let player = Pubkey::from_str(&player).context("parsing player address")?;
            let signature = chain.reset_player_timer(&player).await?;
            println!(
                "Reset purchase timer for {} ({})",
                player,
                bs58::encode(signature).into_string()
            );
        }
    }
    Ok(())
}
