use thiserror::Error;

/// Top-level error type for startup. Anything surfacing as `AppError` ends the process.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Keystore error: {0}")]
    Keystore(#[from] KeystoreError),

    #[error("Status server error: {0}")]
    Server(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Key material errors. Only raised while loading signers at startup.
#[derive(Error, Debug)]
pub enum KeystoreError {
    #[error("Failed to read keystore {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Keystore is not a JSON array of strings: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Key at index {index} is not valid base64")]
    Encoding { index: usize },

    #[error("Key at index {index} has {len} bytes, expected 33")]
    InvalidLength { index: usize, len: usize },

    #[error("Key at index {index} uses unsupported signature scheme flag {flag:#04x}")]
    UnsupportedScheme { index: usize, flag: u8 },

    #[error("Key at index {index} not found, keystore holds {available} key(s)")]
    MissingKey { index: usize, available: usize },
}

/// Errors reported by a ledger client
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Rejected by ledger: {0}")]
    Rejected(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid ledger response: {0}")]
    InvalidResponse(String),
}

/// A job object whose fields don't match the expected layout. The scanner skips it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JobDecodeError {
    #[error("missing field `{0}`")]
    MissingField(&'static str),

    #[error("field `{field}` has unexpected value {value}")]
    InvalidField { field: &'static str, value: String },
}

/// Job discovery failed as a whole; the tick is skipped.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Failed to list objects owned by {owner}: {source}")]
    ListOwned {
        owner: String,
        #[source]
        source: LedgerError,
    },

    #[error("Ledger unreachable while fetching {object_id}: {source}")]
    Fetch {
        object_id: String,
        #[source]
        source: LedgerError,
    },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AttestationError {
    #[error("Sum of job input overflows u64")]
    Overflow,

    #[error("Attestation timed out")]
    Timeout,

    #[error("Attestation signature does not verify")]
    InvalidSignature,

    #[error("Attestation backend failure: {0}")]
    Backend(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubmissionError {
    #[error("Transaction {transaction_id} failed on ledger: {reason}")]
    Rejected {
        transaction_id: String,
        reason: String,
    },

    #[error("Submission failed: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Submission timed out")]
    Timeout,
}

/// Per-job failure carried on a `FulfillmentOutcome`
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FulfillmentError {
    #[error("Attestation failed: {0}")]
    Attestation(#[from] AttestationError),

    #[error("{0}")]
    Submission(#[from] SubmissionError),
}

impl FulfillmentError {
    pub fn code(&self) -> &'static str {
        match self {
            FulfillmentError::Attestation(_) => "ATTESTATION_ERROR",
            FulfillmentError::Submission(_) => "SUBMISSION_ERROR",
        }
    }
}

/// Result type alias for the application
pub type AppResult<T> = Result<T, AppError>;
