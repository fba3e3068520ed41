//! Configuration types

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{Result, SettingsError};

/// Main settings structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// HTTP server settings
    #[serde(default)]
    pub server: ServerSettings,

    /// Chain access settings
    #[serde(default)]
    pub chain: ChainSettings,

    /// Discord application settings
    #[serde(default)]
    pub discord: DiscordSettings,

    /// Raid scheduler settings
    #[serde(default)]
    pub raids: RaidSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerSettings::default(),
            chain: ChainSettings::default(),
            discord: DiscordSettings::default(),
            raids: RaidSettings::default(),
        }
    }
}

impl Settings {
    /// Load settings from process environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load settings from any string lookup (tests inject a map here)
    pub fn from_lookup<F>(get: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Self::default();

        if let Some(port) = parse_or_default("PORT", get("PORT"), None) {
            settings.server.port = port;
        }
        if let Some(url) = get("PUBLIC_URL") {
            settings.server.public_url = url;
        }
        if let Some(url) = get("DATABASE_URL") {
            settings.server.database_url = url;
        }

        if let Some(rpc) = get("RPC") {
            settings.chain.rpc_url = rpc;
        }
        settings.chain.admin_key = get("SERVER_ADMIN_KEY");
        settings.chain.keyfile = get("SERVER_KEYFILE");
        if let Some(mock) = parse_or_default("CHAIN_MOCK", get("CHAIN_MOCK"), None) {
            settings.chain.mock = mock;
        }

        settings.discord.bot_token = get("DISCORD_BOT_TOKEN");
        settings.discord.application_id = get("DISCORD_BOT_ID");
        settings.discord.public_key = get("DISCORD_PUBLIC_KEY");
        if let Some(channel) = get("DISCORD_CHANNEL") {
            settings.discord.channel = channel;
        }

        if let Some(ms) = parse_or_default("MS_BETWEEN_RAIDS", get("MS_BETWEEN_RAIDS"), None) {
            settings.raids.interval_ms = ms;
        }
        if let Some(p) = parse_or_default("PROBABILITY_RAID", get("PROBABILITY_RAID"), None) {
            settings.raids.probability = p;
        }
        if let Some(rr) = parse_or_default("RAID_ROUND_ROBIN", get("RAID_ROUND_ROBIN"), None) {
            settings.raids.round_robin = rr;
        }

        settings
    }
}

/// Parse an env value, warning and falling back when it is malformed.
fn parse_or_default<T: std::str::FromStr>(
    key: &str,
    value: Option<String>,
    default: Option<T>,
) -> Option<T> {
    match value {
        None => default,
        Some(raw) => match raw.parse() {
            Ok(parsed) => Some(parsed),
            Err(_) => {
                warn!("Ignoring unparseable {}={:?}", key, raw);
                default
            }
        },
    }
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Listen port for the blinks API and Discord interactions
    #[serde(default = "default_port")]
    pub port: u16,

    /// Public base URL used when rendering blink links
    #[serde(default = "default_public_url")]
    pub public_url: String,

    /// SQLite database URL for the corporation cache
    #[serde(default = "default_database_url")]
    pub database_url: String,
}

fn default_port() -> u16 {
    3000
}

fn default_public_url() -> String {
    "https://spsblink.runepunk.gg".to_string()
}

fn default_database_url() -> String {
    "sqlite://spsnet.db?mode=rwc".to_string()
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            port: default_port(),
            public_url: default_public_url(),
            database_url: default_database_url(),
        }
    }
}

/// Chain access settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainSettings {
    /// Solana RPC endpoint
    #[serde(default = "default_rpc_url")]
    pub rpc_url: String,

    /// Base58-encoded server admin secret key (env: SERVER_ADMIN_KEY)
    #[serde(default, skip_serializing)]
    pub admin_key: Option<String>,

    /// Path to a Solana CLI JSON keyfile, used when admin_key is unset
    #[serde(default)]
    pub keyfile: Option<String>,

    /// Run against the in-memory mock chain instead of an RPC node
    #[serde(default)]
    pub mock: bool,
}

fn default_rpc_url() -> String {
    "https://api.devnet.solana.com".to_string()
}

impl Default for ChainSettings {
    fn default() -> Self {
        Self {
            rpc_url: default_rpc_url(),
            admin_key: None,
            keyfile: None,
            mock: false,
        }
    }
}

/// Discord application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscordSettings {
    /// Bot token for the REST API (env: DISCORD_BOT_TOKEN)
    #[serde(default, skip_serializing)]
    pub bot_token: Option<String>,

    /// Application id commands are registered under (env: DISCORD_BOT_ID)
    #[serde(default)]
    pub application_id: Option<String>,

    /// Hex-encoded ed25519 public key for interaction verification
    #[serde(default)]
    pub public_key: Option<String>,

    /// Only this channel may issue game commands
    #[serde(default = "default_channel")]
    pub channel: String,
}

fn default_channel() -> String {
    "sps-game".to_string()
}

impl Default for DiscordSettings {
    fn default() -> Self {
        Self {
            bot_token: None,
            application_id: None,
            public_key: None,
            channel: default_channel(),
        }
    }
}

impl DiscordSettings {
    /// Bot token, or an error naming the missing variable
    pub fn require_bot_token(&self) -> Result<&str> {
        self.bot_token
            .as_deref()
            .ok_or(SettingsError::Missing("DISCORD_BOT_TOKEN"))
    }

    /// Application id, or an error naming the missing variable
    pub fn require_application_id(&self) -> Result<&str> {
        self.application_id
            .as_deref()
            .ok_or(SettingsError::Missing("DISCORD_BOT_ID"))
    }

    /// Verification public key, or an error naming the missing variable
    pub fn require_public_key(&self) -> Result<&str> {
        self.public_key
            .as_deref()
            .ok_or(SettingsError::Missing("DISCORD_PUBLIC_KEY"))
    }
}

/// Raid scheduler settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RaidSettings {
    /// Milliseconds between raid rounds
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    /// Per-corporation raid probability per round
    #[serde(default = "default_probability")]
    pub probability: f64,

    /// Skip corporations raided within the last hour
    #[serde(default = "default_true")]
    pub round_robin: bool,
}

fn default_interval_ms() -> u64 {
    1000 * 60 * 5
}

fn default_probability() -> f64 {
    0.10
}

fn default_true() -> bool {
    true
}

impl Default for RaidSettings {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            probability: default_probability(),
            round_robin: default_true(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.server.port, 3000);
        assert_eq!(settings.raids.interval_ms, 5 * 60 * 1000);
        assert!((settings.raids.probability - 0.10).abs() < f64::EPSILON);
        assert!(settings.raids.round_robin);
        assert_eq!(settings.discord.channel, "sps-game");
        assert!(!settings.chain.mock);
    }

    #[test]
    fn test_from_lookup_overrides() {
        let settings = Settings::from_lookup(lookup(&[
            ("PORT", "8080"),
            ("RPC", "http://localhost:8899"),
            ("MS_BETWEEN_RAIDS", "60000"),
            ("PROBABILITY_RAID", "0.5"),
            ("RAID_ROUND_ROBIN", "false"),
            ("DISCORD_CHANNEL", "test-channel"),
        ]));
        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.chain.rpc_url, "http://localhost:8899");
        assert_eq!(settings.raids.interval_ms, 60_000);
        assert!((settings.raids.probability - 0.5).abs() < f64::EPSILON);
        assert!(!settings.raids.round_robin);
        assert_eq!(settings.discord.channel, "test-channel");
    }

    #[test]
    fn test_unparseable_values_fall_back() {
        let settings = Settings::from_lookup(lookup(&[
            ("MS_BETWEEN_RAIDS", "soon"),
            ("PROBABILITY_RAID", "often"),
            ("RAID_ROUND_ROBIN", "yes"),
            ("PORT", "-1"),
        ]));
        assert_eq!(settings.raids.interval_ms, 5 * 60 * 1000);
        assert!((settings.raids.probability - 0.10).abs() < f64::EPSILON);
        assert!(settings.raids.round_robin);
        assert_eq!(settings.server.port, 3000);
    }

    #[test]
    fn test_missing_discord_settings_error() {
        let settings = Settings::default();
        assert!(settings.discord.require_bot_token().is_err());
        assert!(settings.discord.require_application_id().is_err());
        assert!(settings.discord.require_public_key().is_err());
    }

    #[test]
    fn test_discord_settings_present() {
        let settings = Settings::from_lookup(lookup(&[
            ("DISCORD_BOT_TOKEN", "token"),
            ("DISCORD_BOT_ID", "12345"),
            ("DISCORD_PUBLIC_KEY", "abcdef"),
        ]));
        assert_eq!(settings.discord.require_bot_token().unwrap(), "token");
        assert_eq!(settings.discord.require_application_id().unwrap(), "12345");
        assert_eq!(settings.discord.require_public_key().unwrap(), "abcdef");
    }

    #[test]
    fn test_settings_serialization() {
        let settings = Settings::default();
        let json = serde_json::to_string(&settings);
        // admin_key and bot_token are skip_serializing; everything else roundtrips
        assert!(json.is_ok());
    }
}
