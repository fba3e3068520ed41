//! SPSnet Keystore
//!
//! Loading of the server admin keypair that pays for and signs every
//! server-originated transaction. Two sources are supported:
//!
//! - a base58-encoded 64-byte secret key (the SERVER_ADMIN_KEY env var)
//! - a Solana CLI JSON keyfile (an array of 64 byte values)

use std::path::Path;

use solana_sdk::signature::Keypair;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum KeystoreError {
    #[error("No key source configured: set SERVER_ADMIN_KEY or SERVER_KEYFILE")]
    NoKeySource,

    #[error("Invalid base58 encoding: {0}")]
    InvalidEncoding(String),

    #[error("Invalid key length: expected 64 bytes, got {0}")]
    InvalidLength(usize),

    #[error("Invalid keypair bytes")]
    InvalidKeypair,

    #[error("Keyfile read error: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Keyfile parse error: {0}")]
    ParseError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, KeystoreError>;

/// Decode a keypair from a base58-encoded 64-byte secret key
pub fn keypair_from_base58(encoded: &str) -> Result<Keypair> {
    let bytes = bs58::decode(encoded.trim())
        .into_vec()
        .map_err(|e| KeystoreError::InvalidEncoding(e.to_string()))?;
    keypair_from_bytes(&bytes)
}

/// Load a keypair from a Solana CLI JSON keyfile
pub fn keypair_from_json_file(path: &Path) -> Result<Keypair> {
    let content = std::fs::read_to_string(path)?;
    let bytes: Vec<u8> = serde_json::from_str(&content)?;
    let keypair = keypair_from_bytes(&bytes)?;
    info!("Loaded server keypair from {:?}", path);
    Ok(keypair)
}

/// Load the server keypair, preferring the inline key over the keyfile
pub fn load_server_keypair(
    admin_key: Option<&str>,
    keyfile: Option<&str>,
) -> Result<Keypair> {
    if let Some(encoded) = admin_key {
        return keypair_from_base58(encoded);
    }
    if let Some(path) = keyfile {
        return keypair_from_json_file(Path::new(path));
    }
    Err(KeystoreError::NoKeySource)
}

fn keypair_from_bytes(bytes: &[u8]) -> Result<Keypair> {
    if bytes.len() != 64 {
        return Err(KeystoreError::InvalidLength(bytes.len()));
    }
    Keypair::try_from(bytes).map_err(|_| KeystoreError::InvalidKeypair)
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_sdk::signer::Signer;

    #[test]
    fn test_base58_roundtrip() {
        let keypair = Keypair::new();
        let encoded = bs58::encode(keypair.to_bytes()).into_string();
        let loaded = keypair_from_base58(&encoded).unwrap();
        assert_eq!(loaded.pubkey(), keypair.pubkey());
    }

    #[test]
    fn test_base58_rejects_garbage() {
        assert!(matches!(
            keypair_from_base58("not base58 0OIl"),
            Err(KeystoreError::InvalidEncoding(_))
        ));
    }

    #[test]
    fn test_rejects_wrong_length() {
        let encoded = bs58::encode([1u8; 32]).into_string();
        assert!(matches!(
            keypair_from_base58(&encoded),
            Err(KeystoreError::InvalidLength(32))
        ));
    }

    #[test]
    fn test_json_keyfile_roundtrip() {
        let keypair = Keypair::new();
        let json = serde_json::to_string(&keypair.to_bytes().to_vec()).unwrap();
        let dir = std::env::temp_dir().join("spsnet-keystore-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("server.json");
        std::fs::write(&path, json).unwrap();

        let loaded = keypair_from_json_file(&path).unwrap();
        assert_eq!(loaded.pubkey(), keypair.pubkey());

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_no_source_is_an_error() {
        assert!(matches!(
            load_server_keypair(None, None),
            Err(KeystoreError::NoKeySource)
        ));
    }

    #[test]
    fn test_inline_key_preferred_over_keyfile() {
        let keypair = Keypair::new();
        let encoded = bs58::encode(keypair.to_bytes()).into_string();
        let loaded = load_server_keypair(Some(&encoded), Some("/nonexistent")).unwrap();
        assert_eq!(loaded.pubkey(), keypair.pubkey());
    }
}
