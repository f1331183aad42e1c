// In-memory ledger used by the tests.
//
// Models object ownership, job objects and the fulfillment entry point,
// which re-validates `status == Pending` before paying out. A second
// fulfillment of the same job executes but fails, like a Move abort.

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;

use crate::error::LedgerError;
use crate::jobs::models::JobStatus;
use crate::ledger::{CallArg, EntryCall, LedgerClient, LedgerObject, ObjectRef, TransactionResult};

#[derive(Debug, Clone)]
struct StoredObject {
    owner: String,
    type_tag: String,
    fields: Map<String, Value>,
}

#[derive(Default)]
struct LedgerState {
    objects: HashMap<String, StoredObject>,
    /// Insertion order, so listings are stable
    order: Vec<String>,
    submissions: Vec<EntryCall>,
    payments: usize,
    next_tx: u64,
    failing_scans: usize,
    failing_submissions: usize,
    vanish_on_fetch: HashSet<String>,
    fetch_failures: HashMap<String, LedgerError>,
}

#[derive(Default)]
pub struct InMemoryLedger {
    state: RwLock<LedgerState>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_object(&self, id: &str, owner: &str, type_tag: &str, fields: Value) {
        let fields = fields.as_object().cloned().unwrap_or_default();
        let mut state = self.state.write().await;
        if !state.objects.contains_key(id) {
            state.order.push(id.to_string());
        }
        state.objects.insert(
            id.to_string(),
            StoredObject {
                owner: owner.to_string(),
                type_tag: type_tag.to_string(),
                fields,
            },
        );
    }

    /// Job object with u64 inputs rendered as strings, as the node renders them
    pub async fn insert_job(&self, id: &str, owner: &str, type_tag: &str, status: u64, input: &[u64]) {
        let input_data: Vec<String> = input.iter().map(|v| v.to_string()).collect();
        self.insert_object(
            id,
            owner,
            type_tag,
            json!({ "id": { "id": id }, "status": status, "input_data": input_data }),
        )
        .await;
    }

    pub async fn set_status(&self, id: &str, status: u64) {
        if let Some(object) = self.state.write().await.objects.get_mut(id) {
            object.fields.insert("status".to_string(), json!(status));
        }
    }

    pub async fn status_of(&self, id: &str) -> Option<Value> {
        self.state
            .read()
            .await
            .objects
            .get(id)
            .and_then(|o| o.fields.get("status").cloned())
    }

    pub async fn fail_next_scans(&self, count: usize) {
        self.state.write().await.failing_scans = count;
    }

    pub async fn fail_next_submissions(&self, count: usize) {
        self.state.write().await.failing_submissions = count;
    }

    /// The object stays listed but disappears when fetched
    pub async fn vanish_on_fetch(&self, id: &str) {
        self.state.write().await.vanish_on_fetch.insert(id.to_string());
    }

    /// Every fetch of `id` fails with `error` while the object stays listed
    pub async fn fail_fetch(&self, id: &str, error: LedgerError) {
        self.state
            .write()
            .await
            .fetch_failures
            .insert(id.to_string(), error);
    }

    pub async fn submissions(&self) -> Vec<EntryCall> {
        self.state.read().await.submissions.clone()
    }

    pub async fn payments(&self) -> usize {
        self.state.read().await.payments
    }
}

#[async_trait]
impl LedgerClient for InMemoryLedger {
    async fn list_owned_objects(&self, owner: &str) -> Result<Vec<ObjectRef>, LedgerError> {
        let mut state = self.state.write().await;
        if state.failing_scans > 0 {
            state.failing_scans -= 1;
            return Err(LedgerError::Network("connection refused".to_string()));
        }

        Ok(state
            .order
            .iter()
            .filter_map(|id| {
                let object = state.objects.get(id)?;
                (object.owner == owner).then(|| ObjectRef {
                    id: id.clone(),
                    type_tag: Some(object.type_tag.clone()),
                })
            })
            .collect())
    }

    async fn get_object(&self, id: &str) -> Result<LedgerObject, LedgerError> {
        let state = self.state.read().await;
        if state.vanish_on_fetch.contains(id) {
            return Err(LedgerError::NotFound(id.to_string()));
        }
        if let Some(error) = state.fetch_failures.get(id) {
            return Err(error.clone());
        }

        let object = state
            .objects
            .get(id)
            .ok_or_else(|| LedgerError::NotFound(id.to_string()))?;

        Ok(LedgerObject {
            id: id.to_string(),
            type_tag: Some(object.type_tag.clone()),
            fields: object.fields.clone(),
        })
    }

    async fn submit_entry_call(&self, call: &EntryCall) -> Result<TransactionResult, LedgerError> {
        let mut state = self.state.write().await;
        if state.failing_submissions > 0 {
            state.failing_submissions -= 1;
            return Err(LedgerError::Network("request timed out".to_string()));
        }

        state.submissions.push(call.clone());
        state.next_tx += 1;
        let tx_id = format!("tx-{}", state.next_tx);

        let job_id = match call.arguments.get(1) {
            Some(CallArg::Object(id)) => id.clone(),
            _ => return Err(LedgerError::Rejected("argument 1 must be the job object".to_string())),
        };

        let Some(job) = state.objects.get_mut(&job_id) else {
            return Err(LedgerError::Rejected(format!("job {} does not exist", job_id)));
        };

        let pending = job.fields.get("status") == Some(&json!(JobStatus::PENDING_CODE));
        if !pending {
            return Ok(TransactionResult {
                id: tx_id,
                success: false,
                error: Some("MoveAbort: job is not pending".to_string()),
            });
        }

        job.fields
            .insert("status".to_string(), json!(JobStatus::FULFILLED_CODE));
        state.payments += 1;

        Ok(TransactionResult {
            id: tx_id,
            success: true,
            error: None,
        })
    }
}
