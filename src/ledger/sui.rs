// Sui full node client over JSON-RPC 2.0
//
// Reads:  suix_getOwnedObjects (paginated), sui_getObject
// Writes: unsafe_moveCall builds the transaction bytes on the node,
//         the service signer signs them locally,
//         sui_executeTransactionBlock executes and reports effects.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument};

use crate::error::LedgerError;
use crate::ledger::{CallArg, EntryCall, LedgerClient, LedgerObject, ObjectRef, TransactionResult};
use crate::signer::Ed25519Signer;

#[derive(Debug, Clone)]
pub struct SuiRpcConfig {
    pub rpc_url: String,
    /// Gas budget in MIST for each fulfillment transaction
    pub gas_budget: u64,
    /// Gas coin to pay with; the node picks one when unset
    pub gas_object: Option<String>,
    pub request_timeout: Duration,
    pub page_limit: usize,
}

impl Default for SuiRpcConfig {
    fn default() -> Self {
        Self {
            rpc_url: "http://127.0.0.1:9000".to_string(),
            gas_budget: 10_000_000,
            gas_object: None,
            request_timeout: Duration::from_secs(30),
            page_limit: 50,
        }
    }
}

pub struct SuiRpcClient {
    config: SuiRpcConfig,
    http: reqwest::Client,
    /// Submitting identity: sender and signer of every transaction
    signer: Arc<Ed25519Signer>,
    next_request_id: AtomicU64,
}

#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OwnedObjectsPage {
    data: Vec<ObjectResponse>,
    next_cursor: Option<Value>,
    #[serde(default)]
    has_next_page: bool,
}

#[derive(Debug, Deserialize)]
struct ObjectResponse {
    data: Option<ObjectData>,
    error: Option<ObjectResponseError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ObjectData {
    object_id: String,
    #[serde(rename = "type")]
    type_tag: Option<String>,
    content: Option<ObjectContent>,
}

#[derive(Debug, Deserialize)]
struct ObjectContent {
    #[serde(rename = "type")]
    type_tag: Option<String>,
    fields: Option<Map<String, Value>>,
}

#[derive(Debug, Deserialize)]
struct ObjectResponseError {
    code: String,
}

#[derive(Debug, Deserialize)]
struct TransactionBytes {
    #[serde(rename = "txBytes")]
    tx_bytes: String,
}

#[derive(Debug, Deserialize)]
struct ExecuteResponse {
    digest: String,
    effects: Option<TransactionEffects>,
}

#[derive(Debug, Deserialize)]
struct TransactionEffects {
    status: EffectsStatus,
}

#[derive(Debug, Deserialize)]
struct EffectsStatus {
    status: String,
    error: Option<String>,
}

impl SuiRpcClient {
    pub fn new(config: SuiRpcConfig, signer: Arc<Ed25519Signer>) -> Result<Self, LedgerError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| LedgerError::Network(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            config,
            http,
            signer,
            next_request_id: AtomicU64::new(1),
        })
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T, LedgerError> {
        let id = self.next_request_id.fetch_add(1, Ordering::Relaxed);
        let request = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        debug!("→ {} (id {})", method, id);

        let response = self
            .http
            .post(&self.config.rpc_url)
            .json(&request)
            .send()
            .await
            .map_err(|e| LedgerError::Network(format!("{} request failed: {}", method, e)))?;

        let status = response.status();
        if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
            return Err(LedgerError::Network(format!("{} returned HTTP {}", method, status)));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LedgerError::InvalidResponse(format!(
                "{} returned HTTP {}: {}",
                method, status, body
            )));
        }

        let envelope: RpcResponse<T> = response.json().await.map_err(|e| {
            if e.is_timeout() {
                LedgerError::Network(format!("{} timed out reading response", method))
            } else {
                LedgerError::InvalidResponse(format!("{} response malformed: {}", method, e))
            }
        })?;

        if let Some(error) = envelope.error {
            return Err(LedgerError::Rejected(format!(
                "{} failed ({}): {}",
                method, error.code, error.message
            )));
        }

        envelope.result.ok_or_else(|| {
            LedgerError::InvalidResponse(format!("{} returned neither result nor error", method))
        })
    }
}

#[async_trait]
impl LedgerClient for SuiRpcClient {
    async fn list_owned_objects(&self, owner: &str) -> Result<Vec<ObjectRef>, LedgerError> {
        let mut objects = Vec::new();
        let mut cursor: Option<Value> = None;

        loop {
            let page: OwnedObjectsPage = self
                .call(
                    "suix_getOwnedObjects",
                    json!([
                        owner,
                        { "options": { "showType": true } },
                        cursor,
                        self.config.page_limit,
                    ]),
                )
                .await?;

            objects.extend(page.data.into_iter().filter_map(|entry| {
                entry.data.map(|data| ObjectRef {
                    id: data.object_id,
                    type_tag: data.type_tag,
                })
            }));

            match page.next_cursor {
                Some(next) if page.has_next_page && !next.is_null() && Some(&next) != cursor.as_ref() => {
                    cursor = Some(next);
                }
                _ => break,
            }
        }

        debug!("Owner {} holds {} object(s)", owner, objects.len());
        Ok(objects)
    }

    async fn get_object(&self, id: &str) -> Result<LedgerObject, LedgerError> {
        let response: ObjectResponse = self
            .call(
                "sui_getObject",
                json!([id, { "showType": true, "showContent": true }]),
            )
            .await?;

        if let Some(error) = response.error {
            return match error.code.as_str() {
                "notExists" | "deleted" => Err(LedgerError::NotFound(id.to_string())),
                other => Err(LedgerError::Rejected(format!("sui_getObject {}: {}", id, other))),
            };
        }

        let data = response
            .data
            .ok_or_else(|| LedgerError::InvalidResponse(format!("Object {} has no data", id)))?;
        let content = data
            .content
            .ok_or_else(|| LedgerError::InvalidResponse(format!("Object {} has no content", id)))?;
        let fields = content.fields.ok_or_else(|| {
            LedgerError::InvalidResponse(format!("Object {} is not a Move object", id))
        })?;

        Ok(LedgerObject {
            id: data.object_id,
            type_tag: data.type_tag.or(content.type_tag),
            fields,
        })
    }

    #[instrument(skip(self, call), fields(target = %call.target()))]
    async fn submit_entry_call(&self, call: &EntryCall) -> Result<TransactionResult, LedgerError> {
        let arguments: Vec<Value> = call.arguments.iter().map(CallArg::to_json).collect();

        let built: TransactionBytes = self
            .call(
                "unsafe_moveCall",
                json!([
                    self.signer.identity(),
                    call.package,
                    call.module,
                    call.function,
                    [],
                    arguments,
                    self.config.gas_object,
                    self.config.gas_budget.to_string(),
                ]),
            )
            .await?;

        let tx_bytes = BASE64.decode(&built.tx_bytes).map_err(|_| {
            LedgerError::InvalidResponse("unsafe_moveCall returned non-base64 txBytes".to_string())
        })?;
        let signature = self.signer.sign_transaction(&tx_bytes);

        let executed: ExecuteResponse = self
            .call(
                "sui_executeTransactionBlock",
                json!([
                    built.tx_bytes,
                    [signature],
                    { "showEffects": true },
                    "WaitForLocalExecution",
                ]),
            )
            .await?;

        let result = match executed.effects {
            Some(effects) => TransactionResult {
                id: executed.digest,
                success: effects.status.status == "success",
                error: effects.status.error,
            },
            None => TransactionResult {
                id: executed.digest,
                success: false,
                error: Some("Response carried no transaction effects".to_string()),
            },
        };

        info!(
            "📤 Executed {} (tx: {}, success: {})",
            call.target(),
            result.id,
            result.success
        );

        Ok(result)
    }
}
