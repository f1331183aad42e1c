//! Attested computation over job input.
//!
//! The attestor models a trusted execution environment: it computes the job
//! result, encodes it as a proof and signs the proof with its own key, which is
//! distinct from the key that submits and pays for transactions.

use async_trait::async_trait;
use tracing::debug;

use crate::error::AttestationError;
use crate::signer::{verify_ed25519, Ed25519Signer, SuiAddress};

/// Leading text of every proof; the on-chain verifier expects `"<label> <sum>"`
pub const PROOF_LABEL: &str = "Job result is";

/// Result of one attestation. Produced fresh for each fulfillment attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attestation {
    pub result: u64,
    /// Canonical UTF-8 encoding of the result
    pub proof: Vec<u8>,
    /// Ed25519 signature over `proof` by the attestor key
    pub signature: Vec<u8>,
}

/// Trait for attestation backends
///
/// Implementations must be pure with respect to ledger state: they read only
/// `input` and have no side effects.
#[async_trait]
pub trait Attestor: Send + Sync {
    async fn compute(&self, input: &[u64]) -> Result<Attestation, AttestationError>;

    /// Public key that verifies this attestor's signatures
    fn public_key(&self) -> [u8; 32];

    fn identity(&self) -> SuiAddress {
        SuiAddress::from_public_key(&self.public_key())
    }

    /// Backend-specific check that `proof` really encodes `result`.
    /// Backends with an opaque proof format keep the default.
    fn check_proof(&self, _attestation: &Attestation) -> Result<(), AttestationError> {
        Ok(())
    }
}

/// Mock TEE: sums the input in process and signs with a local key
pub struct MockTeeAttestor {
    signer: Ed25519Signer,
}

impl MockTeeAttestor {
    pub fn new(signer: Ed25519Signer) -> Self {
        Self { signer }
    }
}

#[async_trait]
impl Attestor for MockTeeAttestor {
    async fn compute(&self, input: &[u64]) -> Result<Attestation, AttestationError> {
        debug!("[Mock TEE] Processing job data: {:?}", input);

        let result = input
            .iter()
            .try_fold(0u64, |acc, value| acc.checked_add(*value))
            .ok_or(AttestationError::Overflow)?;

        let proof = encode_proof(result);
        let signature = self.signer.sign(&proof);

        debug!("[Mock TEE] Computation complete, result {}", result);

        Ok(Attestation {
            result,
            proof,
            signature,
        })
    }

    fn public_key(&self) -> [u8; 32] {
        self.signer.public_key()
    }

    fn identity(&self) -> SuiAddress {
        self.signer.identity().clone()
    }

    fn check_proof(&self, attestation: &Attestation) -> Result<(), AttestationError> {
        if decode_proof(&attestation.proof) == Some(attestation.result) {
            Ok(())
        } else {
            Err(AttestationError::Backend(
                "proof does not encode the computed result".to_string(),
            ))
        }
    }
}

pub fn encode_proof(result: u64) -> Vec<u8> {
    format!("{} {}", PROOF_LABEL, result).into_bytes()
}

/// Read the result back out of a proof. `None` if the framing is wrong.
pub fn decode_proof(proof: &[u8]) -> Option<u64> {
    let text = std::str::from_utf8(proof).ok()?;
    text.strip_prefix(PROOF_LABEL)?
        .strip_prefix(' ')?
        .parse()
        .ok()
}

/// Check that `signature` is the attestor's signature over exactly `proof`
pub fn verify_attestation(
    public_key: &[u8; 32],
    proof: &[u8],
    signature: &[u8],
) -> Result<(), AttestationError> {
    if verify_ed25519(public_key, proof, signature) {
        Ok(())
    } else {
        Err(AttestationError::InvalidSignature)
    }
}
