//! Slash command registration via the Discord REST API

use serde_json::{json, Value};
use tracing::info;

use crate::{DiscordError, Result};

const DISCORD_API: &str = "https://discord.com/api/v10";

/// Option type 10 = NUMBER in Discord's command schema
const OPTION_TYPE_NUMBER: u8 = 10;

/// The global command set this bot registers
pub fn commands_payload() -> Value {
    json!([
        {
            "name": "info",
            "description": "Get info about the given user",
        },
        {
            "name": "incorporate",
            "description": "Creates a new solo corporation for the user",
        },
        {
            "name": "hire",
            "description": "Hire security forces to defend against goblin raids. Cost 20 CREDz each.",
            "options": [
                {
                    "type": OPTION_TYPE_NUMBER,
                    "name": "amount",
                    "description": "amount of security forces to buy",
                    "required": true,
                }
            ],
        },
    ])
}

/// Overwrite the application's global command set.
///
/// Idempotent: Discord replaces the full set with the payload.
pub async fn register_commands(bot_token: &str, application_id: &str) -> Result<()> {
    let url = format!("{}/applications/{}/commands", DISCORD_API, application_id);

    let client = reqwest::Client::new();
    let response = client
        .put(&url)
        .header("Authorization", format!("Bot {}", bot_token))
        .json(&commands_payload())
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(DiscordError::RegistrationFailed(format!(
            "{}: {}",
            status, body
        )));
    }

    info!("Registered {} slash commands", commands_payload().as_array().map(|a| a.len()).unwrap_or(0));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commands_payload_shape() {
        let payload = commands_payload();
        let commands = payload.as_array().unwrap();
        assert_eq!(commands.len(), 3);

        let names: Vec<_> = commands.iter().map(|c| c["name"].as_str().unwrap()).collect();
        assert_eq!(names, vec!["info", "incorporate", "hire"]);
    }

    #[test]
    fn test_hire_has_required_amount_option() {
        let payload = commands_payload();
        let hire = &payload.as_array().unwrap()[2];
        let option = &hire["options"][0];
        assert_eq!(option["name"], "amount");
        assert_eq!(option["type"], 10);
        assert_eq!(option["required"], true);
    }
}
