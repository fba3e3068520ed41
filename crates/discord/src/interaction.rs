//! Discord interaction wire types
//!
//! Only the fields this bot reads are modeled; Discord sends many more.

use serde::{Deserialize, Serialize};

/// Interaction types (incoming)
pub const INTERACTION_PING: u8 = 1;
pub const INTERACTION_APPLICATION_COMMAND: u8 = 2;

/// Interaction response types (outgoing)
pub const RESPONSE_PONG: u8 = 1;
pub const RESPONSE_CHANNEL_MESSAGE: u8 = 4;

/// Message flag for ephemeral replies (only the caller sees them)
pub const FLAG_EPHEMERAL: u64 = 64;

/// An incoming interaction
#[derive(Debug, Clone, Deserialize)]
pub struct Interaction {
    #[serde(rename = "type")]
    pub kind: u8,
    #[serde(default)]
    pub data: Option<CommandData>,
    #[serde(default)]
    pub member: Option<GuildMember>,
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub channel: Option<Channel>,
}

impl Interaction {
    /// The invoking user's id: `member.user` in guilds, `user` in DMs
    pub fn user_id(&self) -> Option<&str> {
        self.member
            .as_ref()
            .and_then(|m| m.user.as_ref())
            .or(self.user.as_ref())
            .map(|u| u.id.as_str())
    }

    /// The name of the channel the command was issued in
    pub fn channel_name(&self) -> Option<&str> {
        self.channel.as_ref().and_then(|c| c.name.as_deref())
    }
}

/// Slash command invocation data
#[derive(Debug, Clone, Deserialize)]
pub struct CommandData {
    pub name: String,
    #[serde(default)]
    pub options: Option<Vec<CommandOption>>,
}

impl CommandData {
    /// Look up a number option by name
    pub fn number_option(&self, name: &str) -> Option<f64> {
        self.options
            .as_ref()?
            .iter()
            .find(|option| option.name == name)?
            .value
            .as_ref()?
            .as_f64()
    }
}

/// One option on a slash command invocation
#[derive(Debug, Clone, Deserialize)]
pub struct CommandOption {
    pub name: String,
    #[serde(default)]
    pub value: Option<serde_json::Value>,
}

/// Guild member wrapper around the invoking user
#[derive(Debug, Clone, Deserialize)]
pub struct GuildMember {
    #[serde(default)]
    pub user: Option<User>,
}

/// A Discord user
#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: String,
}

/// The channel an interaction arrived in
#[derive(Debug, Clone, Deserialize)]
pub struct Channel {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// An outgoing interaction response
#[derive(Debug, Clone, Serialize)]
pub struct InteractionResponse {
    #[serde(rename = "type")]
    pub kind: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<InteractionResponseData>,
}

/// Message payload of an interaction response
#[derive(Debug, Clone, Serialize)]
pub struct InteractionResponseData {
    pub content: String,
    pub flags: u64,
}

impl InteractionResponse {
    /// Answer to a PING
    pub fn pong() -> Self {
        Self {
            kind: RESPONSE_PONG,
            data: None,
        }
    }

    /// An ephemeral channel message only the caller sees
    pub fn ephemeral(content: impl Into<String>) -> Self {
        Self {
            kind: RESPONSE_CHANNEL_MESSAGE,
            data: Some(InteractionResponseData {
                content: content.into(),
                flags: FLAG_EPHEMERAL,
            }),
        }
    }
}
