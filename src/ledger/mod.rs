pub mod sui;

#[cfg(test)]
pub mod memory;

pub use sui::{SuiRpcClient, SuiRpcConfig};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::LedgerError;

/// Reference to an object as returned by an ownership listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectRef {
    pub id: String,
    pub type_tag: Option<String>,
}

/// Current field snapshot of a ledger object
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerObject {
    pub id: String,
    pub type_tag: Option<String>,
    pub fields: Map<String, Value>,
}

/// Argument to an entry call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallArg {
    /// Object argument, passed by id
    Object(String),
    /// Pure `vector<u8>` argument
    Bytes(Vec<u8>),
}

impl CallArg {
    pub fn to_json(&self) -> Value {
        match self {
            CallArg::Object(id) => Value::String(id.clone()),
            CallArg::Bytes(bytes) => Value::Array(bytes.iter().map(|b| Value::from(*b)).collect()),
        }
    }
}

/// Invocation of a named on-ledger entry point
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryCall {
    pub package: String,
    pub module: String,
    pub function: String,
    pub arguments: Vec<CallArg>,
}

impl EntryCall {
    pub fn target(&self) -> String {
        format!("{}::{}::{}", self.package, self.module, self.function)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransactionResult {
    /// Transaction digest
    pub id: String,
    pub success: bool,
    pub error: Option<String>,
}

/// Capability surface over the external ledger.
///
/// Submission is NOT idempotent. Callers only submit fulfillment for jobs
/// they have just observed as pending.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// All objects owned by `owner`
    async fn list_owned_objects(&self, owner: &str) -> Result<Vec<ObjectRef>, LedgerError>;

    /// Fetch an object's fields. `LedgerError::NotFound` if it no longer exists.
    async fn get_object(&self, id: &str) -> Result<LedgerObject, LedgerError>;

    /// Build, sign and execute a transaction calling `call`
    async fn submit_entry_call(&self, call: &EntryCall) -> Result<TransactionResult, LedgerError>;
}

/// Normalize a hex address or object id to `0x` + 64 lowercase hex chars.
/// Returns the input unchanged if it is not hex.
pub fn normalize_address(address: &str) -> String {
    let hex_part = address.strip_prefix("0x").unwrap_or(address);
    if hex_part.is_empty()
        || hex_part.len() > 64
        || !hex_part.chars().all(|c| c.is_ascii_hexdigit())
    {
        return address.to_string();
    }
    format!("0x{:0>64}", hex_part.to_ascii_lowercase())
}
