//! Interaction request verification
//!
//! Discord signs every interaction POST with the application's ed25519
//! key over `timestamp || body`; endpoints must reject invalid signatures
//! or Discord disables the webhook.

use ed25519_dalek::{Signature, VerifyingKey};

use crate::{DiscordError, Result};

/// Verify the X-Signature-Ed25519 / X-Signature-Timestamp headers
pub fn verify_signature(
    public_key_hex: &str,
    signature_hex: &str,
    timestamp: &str,
    body: &[u8],
) -> Result<()> {
    let key_bytes: [u8; 32] = hex::decode(public_key_hex)
        .map_err(|_| DiscordError::InvalidSignature)?
        .try_into()
        .map_err(|_| DiscordError::InvalidSignature)?;
    let verifying_key =
        VerifyingKey::from_bytes(&key_bytes).map_err(|_| DiscordError::InvalidSignature)?;

    let signature_bytes: [u8; 64] = hex::decode(signature_hex)
        .map_err(|_| DiscordError::InvalidSignature)?
        .try_into()
        .map_err(|_| DiscordError::InvalidSignature)?;
    let signature = Signature::from_bytes(&signature_bytes);

    let mut message = Vec::with_capacity(timestamp.len() + body.len());
    message.extend_from_slice(timestamp.as_bytes());
    message.extend_from_slice(body);

    verifying_key
        .verify_strict(&message, &signature)
        .map_err(|_| DiscordError::InvalidSignature)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::{Signer, SigningKey};
    use rand::rngs::OsRng;

    fn signed_request(body: &[u8], timestamp: &str) -> (String, String) {
        let signing_key = SigningKey::generate(&mut OsRng);
        let public_key_hex = hex::encode(signing_key.verifying_key().to_bytes());

        let mut message = timestamp.as_bytes().to_vec();
        message.extend_from_slice(body);
        let signature_hex = hex::encode(signing_key.sign(&message).to_bytes());

        (public_key_hex, signature_hex)
    }

    #[test]
    fn test_valid_signature_accepted() {
        let body = br#"{"type":1}"#;
        let timestamp = "1720000000";
        let (public_key, signature) = signed_request(body, timestamp);
        assert!(verify_signature(&public_key, &signature, timestamp, body).is_ok());
    }

    #[test]
    fn test_tampered_body_rejected() {
        let body = br#"{"type":1}"#;
        let timestamp = "1720000000";
        let (public_key, signature) = signed_request(body, timestamp);
        assert!(matches!(
            verify_signature(&public_key, &signature, timestamp, br#"{"type":2}"#),
            Err(DiscordError::InvalidSignature)
        ));
    }

    #[test]
    fn test_tampered_timestamp_rejected() {
        let body = br#"{"type":1}"#;
        let (public_key, signature) = signed_request(body, "1720000000");
        assert!(verify_signature(&public_key, &signature, "1720000001", body).is_err());
    }

    #[test]
    fn test_garbage_key_rejected() {
        assert!(verify_signature("zz", "aa", "0", b"x").is_err());
        assert!(verify_signature(&hex::encode([0u8; 16]), &hex::encode([0u8; 64]), "0", b"x").is_err());
    }
}
