//! Solana Actions wire types
//!
//! The JSON documents exchanged with blink clients, per the Actions spec.

use serde::{Deserialize, Serialize};

/// Descriptor returned by a GET action endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionGetResponse {
    /// URL of some descriptive image for the action
    pub icon: String,
    /// Title of the action
    pub title: String,
    /// Brief description of the action
    pub description: String,
    /// Text to be rendered on the action button
    pub label: String,
    /// Optional state for disabling the action button(s)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disabled: Option<bool>,
    /// Optional list of related actions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub links: Option<ActionLinks>,
    /// Optional (non-fatal) error message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ActionError>,
}

/// Related actions on a descriptor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionLinks {
    pub actions: Vec<LinkedAction>,
}

/// One linked action button
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkedAction {
    /// URL endpoint for the action
    pub href: String,
    /// Button text rendered to the user
    pub label: String,
    /// Parameters to accept user input within the action
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Vec<ActionParameter>>,
}

/// Parameter to accept user input within an action
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionParameter {
    /// Parameter name in the URL
    pub name: String,
    /// Placeholder text for the user input field
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Whether this field is required (defaults to false)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
}

/// Non-fatal error surfaced to the user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionError {
    /// Error message to be displayed to the user
    pub message: String,
}

/// Payload returned by a POST action endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionPostResponse {
    /// Base64-encoded transaction
    pub transaction: String,
    /// Optional message describing the nature of the transaction
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}
