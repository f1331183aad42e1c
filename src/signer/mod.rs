pub mod keystore;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use blake2::{digest::consts::U32, Blake2b, Digest};
use ed25519_dalek::{Signature, Signer as _, SigningKey, VerifyingKey};
use serde::{Deserialize, Serialize};
use std::fmt;

type Blake2b256 = Blake2b<U32>;

/// Signature scheme flag for Ed25519 keys (Sui keystore and serialized signatures)
pub const ED25519_FLAG: u8 = 0x00;

/// Intent prefix for a Sui transaction: scope TransactionData, version V0, app id Sui
const TRANSACTION_INTENT: [u8; 3] = [0, 0, 0];

/// Ledger address derived from an Ed25519 public key
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SuiAddress(String);

impl SuiAddress {
    pub fn from_public_key(public_key: &[u8; 32]) -> Self {
        let mut hasher = Blake2b256::new();
        hasher.update([ED25519_FLAG]);
        hasher.update(public_key);
        Self(format!("0x{}", hex::encode(hasher.finalize())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SuiAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Ed25519 keypair held in memory for the lifetime of the process.
///
/// The same type backs both identities: the submitting service key and the
/// attestor key. Key material is read-only after construction.
pub struct Ed25519Signer {
    signing_key: SigningKey,
    address: SuiAddress,
}

impl Ed25519Signer {
    pub fn from_secret_bytes(secret: [u8; 32]) -> Self {
        let signing_key = SigningKey::from_bytes(&secret);
        let address = SuiAddress::from_public_key(signing_key.verifying_key().as_bytes());
        Self {
            signing_key,
            address,
        }
    }

    /// Raw Ed25519 signature over `payload`. Deterministic for a given key.
    pub fn sign(&self, payload: &[u8]) -> Vec<u8> {
        self.signing_key.sign(payload).to_bytes().to_vec()
    }

    pub fn identity(&self) -> &SuiAddress {
        &self.address
    }

    pub fn public_key(&self) -> [u8; 32] {
        self.signing_key.verifying_key().to_bytes()
    }

    /// Sign transaction bytes the way the ledger expects and return the
    /// serialized signature: base64(flag || signature || public key).
    pub fn sign_transaction(&self, tx_bytes: &[u8]) -> String {
        let digest = transaction_digest(tx_bytes);
        let signature = self.signing_key.sign(&digest);

        let mut serialized = Vec::with_capacity(1 + 64 + 32);
        serialized.push(ED25519_FLAG);
        serialized.extend_from_slice(&signature.to_bytes());
        serialized.extend_from_slice(self.signing_key.verifying_key().as_bytes());
        BASE64.encode(serialized)
    }
}

impl fmt::Debug for Ed25519Signer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ed25519Signer")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

/// Blake2b-256 over the intent-prefixed transaction bytes
pub fn transaction_digest(tx_bytes: &[u8]) -> [u8; 32] {
    let mut hasher = Blake2b256::new();
    hasher.update(TRANSACTION_INTENT);
    hasher.update(tx_bytes);
    let mut digest = [0u8; 32];
    digest.copy_from_slice(&hasher.finalize());
    digest
}

/// Strict Ed25519 verification. Malformed keys or signatures simply fail.
pub fn verify_ed25519(public_key: &[u8; 32], payload: &[u8], signature: &[u8]) -> bool {
    let Ok(verifying_key) = VerifyingKey::from_bytes(public_key) else {
        return false;
    };
    let Ok(signature) = Signature::from_slice(signature) else {
        return false;
    };
    verifying_key.verify_strict(payload, &signature).is_ok()
}
