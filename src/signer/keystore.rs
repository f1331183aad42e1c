// Sui keystore loader
//
// File format: JSON array of base64 strings, each decoding to
// [scheme flag: 1 byte][secret key: 32 bytes]. Only Ed25519 (flag 0x00) is accepted.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::KeystoreError;
use crate::signer::{Ed25519Signer, ED25519_FLAG};

/// Keystore index of the submitting identity (owns jobs, pays for transactions)
pub const SERVICE_KEY_INDEX: usize = 0;
/// Keystore index of the attestor identity
pub const ATTESTOR_KEY_INDEX: usize = 1;

pub struct Keystore {
    entries: Vec<String>,
}

impl Keystore {
    pub fn load(path: &Path) -> Result<Self, KeystoreError> {
        let raw = std::fs::read_to_string(path).map_err(|source| KeystoreError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let keystore = Self::from_json(&raw)?;
        info!("🔑 Loaded keystore {} ({} key(s))", path.display(), keystore.len());
        Ok(keystore)
    }

    pub fn from_json(raw: &str) -> Result<Self, KeystoreError> {
        let entries: Vec<String> = serde_json::from_str(raw)?;
        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Build the signer stored at `index`
    pub fn signer(&self, index: usize) -> Result<Ed25519Signer, KeystoreError> {
        let encoded = self.entries.get(index).ok_or(KeystoreError::MissingKey {
            index,
            available: self.entries.len(),
        })?;

        let bytes = BASE64
            .decode(encoded.trim())
            .map_err(|_| KeystoreError::Encoding { index })?;

        if bytes.len() != 33 {
            return Err(KeystoreError::InvalidLength {
                index,
                len: bytes.len(),
            });
        }

        if bytes[0] != ED25519_FLAG {
            return Err(KeystoreError::UnsupportedScheme {
                index,
                flag: bytes[0],
            });
        }

        let mut secret = [0u8; 32];
        secret.copy_from_slice(&bytes[1..]);
        Ok(Ed25519Signer::from_secret_bytes(secret))
    }
}

/// `$HOME/.sui/sui_config/sui.keystore`, or `USERPROFILE` on Windows hosts
pub fn default_keystore_path() -> PathBuf {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .unwrap_or_default();
    PathBuf::from(home)
        .join(".sui")
        .join("sui_config")
        .join("sui.keystore")
}

#[cfg(test)]
pub(crate) fn encode_entry(flag: u8, secret: [u8; 32]) -> String {
    let mut bytes = vec![flag];
    bytes.extend_from_slice(&secret);
    BASE64.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keystore_json(entries: &[String]) -> String {
        serde_json::to_string(entries).unwrap()
    }

    #[test]
    fn test_loads_service_and_attestor_keys() {
        let raw = keystore_json(&[
            encode_entry(ED25519_FLAG, [1u8; 32]),
            encode_entry(ED25519_FLAG, [2u8; 32]),
        ]);
        let keystore = Keystore::from_json(&raw).unwrap();

        let service = keystore.signer(SERVICE_KEY_INDEX).unwrap();
        let attestor = keystore.signer(ATTESTOR_KEY_INDEX).unwrap();

        assert_eq!(
            service.identity(),
            Ed25519Signer::from_secret_bytes([1u8; 32]).identity()
        );
        assert_ne!(service.identity(), attestor.identity());
    }

    #[test]
    fn test_missing_index() {
        let raw = keystore_json(&[encode_entry(ED25519_FLAG, [1u8; 32])]);
        let keystore = Keystore::from_json(&raw).unwrap();

        match keystore.signer(ATTESTOR_KEY_INDEX) {
            Err(KeystoreError::MissingKey { index, available }) => {
                assert_eq!(index, 1);
                assert_eq!(available, 1);
            }
            other => panic!("unexpected result: {:?}", other.map(|s| s.identity().clone())),
        }
    }

    #[test]
    fn test_rejects_malformed_entries() {
        let raw = keystore_json(&[
            "not base64!".to_string(),
            BASE64.encode([0u8; 10]),
            encode_entry(0x01, [5u8; 32]),
        ]);
        let keystore = Keystore::from_json(&raw).unwrap();

        assert!(matches!(keystore.signer(0), Err(KeystoreError::Encoding { index: 0 })));
        assert!(matches!(
            keystore.signer(1),
            Err(KeystoreError::InvalidLength { index: 1, len: 10 })
        ));
        assert!(matches!(
            keystore.signer(2),
            Err(KeystoreError::UnsupportedScheme { index: 2, flag: 0x01 })
        ));
    }

    #[test]
    fn test_rejects_non_array_file() {
        assert!(matches!(
            Keystore::from_json(r#"{"keys": []}"#),
            Err(KeystoreError::Parse(_))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let path = std::env::temp_dir().join("job-fulfiller-missing.keystore");
        assert!(matches!(Keystore::load(&path), Err(KeystoreError::Read { .. })));
    }
}
