use serde::{Serialize, Serializer};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, error, info, instrument, warn};

use crate::attestation::{verify_attestation, Attestation, Attestor};
use crate::error::{AttestationError, FulfillmentError, SubmissionError};
use crate::fulfillment::dedup::RecentSubmissions;
use crate::jobs::JobRequest;
use crate::ledger::{CallArg, EntryCall, LedgerClient, TransactionResult};

/// On-chain objects and entry point used by every fulfillment transaction
#[derive(Debug, Clone)]
pub struct FulfillmentTarget {
    pub package: String,
    pub module: String,
    pub function: String,
    /// Capability object proving this service may fulfill jobs
    pub trusted_signer_id: String,
    /// Object the payment is drawn from
    pub payment_source_id: String,
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub target: FulfillmentTarget,
    pub attestation_timeout: Duration,
    pub submission_timeout: Duration,
}

/// Lifecycle of one job within a single tick.
///
/// `Discovered -> Attested -> Submitted -> Confirmed | Rejected`, with
/// `Failed` when attestation fails. No state survives the tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobState {
    Discovered,
    Attested(Attestation),
    Submitted(TransactionResult),
    Confirmed { transaction_id: String },
    Rejected(SubmissionError),
    Failed(AttestationError),
    Skipped(&'static str),
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobState::Confirmed { .. }
                | JobState::Rejected(_)
                | JobState::Failed(_)
                | JobState::Skipped(_)
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            JobState::Discovered => "discovered",
            JobState::Attested(_) => "attested",
            JobState::Submitted(_) => "submitted",
            JobState::Confirmed { .. } => "confirmed",
            JobState::Rejected(_) => "rejected",
            JobState::Failed(_) => "failed",
            JobState::Skipped(_) => "skipped",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeState {
    Confirmed,
    Rejected,
    Failed,
    Skipped,
}

/// Operator-facing result of processing one job
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FulfillmentOutcome {
    pub job_id: String,
    pub state: OutcomeState,
    /// A fulfillment transaction reached the ledger (successful or not)
    pub submitted: bool,
    pub transaction_id: Option<String>,
    #[serde(serialize_with = "serialize_error")]
    pub error: Option<FulfillmentError>,
}

fn serialize_error<S: Serializer>(
    error: &Option<FulfillmentError>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match error {
        Some(e) => serializer.serialize_some(&serde_json::json!({
            "code": e.code(),
            "message": e.to_string(),
        })),
        None => serializer.serialize_none(),
    }
}

impl FulfillmentOutcome {
    fn from_terminal(job_id: String, state: JobState) -> Self {
        let (state, transaction_id, error) = match state {
            JobState::Confirmed { transaction_id } => {
                (OutcomeState::Confirmed, Some(transaction_id), None)
            }
            JobState::Rejected(e) => {
                let transaction_id = match &e {
                    SubmissionError::Rejected { transaction_id, .. } => Some(transaction_id.clone()),
                    _ => None,
                };
                (OutcomeState::Rejected, transaction_id, Some(FulfillmentError::from(e)))
            }
            JobState::Failed(e) => (OutcomeState::Failed, None, Some(FulfillmentError::from(e))),
            JobState::Skipped(reason) => {
                debug!("⏭️ Job {} skipped: {}", job_id, reason);
                (OutcomeState::Skipped, None, None)
            }
            pending => unreachable!(
                "job {} handed to outcome in non-terminal state {}",
                job_id,
                pending.name()
            ),
        };

        Self {
            job_id,
            state,
            submitted: transaction_id.is_some(),
            transaction_id,
            error,
        }
    }

    pub fn is_confirmed(&self) -> bool {
        self.state == OutcomeState::Confirmed
    }
}

/// Drives a single job from discovery to a terminal state.
///
/// Never retries: a failed job stays pending on the ledger and is picked up
/// again by the next scan.
pub struct FulfillmentPipeline {
    ledger: Arc<dyn LedgerClient>,
    attestor: Arc<dyn Attestor>,
    config: PipelineConfig,
    recent: Option<RecentSubmissions>,
}

impl FulfillmentPipeline {
    pub fn new(
        ledger: Arc<dyn LedgerClient>,
        attestor: Arc<dyn Attestor>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            ledger,
            attestor,
            config,
            recent: None,
        }
    }

    /// Skip jobs confirmed by this process within `ttl`
    pub fn with_recent_submissions(mut self, ttl: Duration) -> Self {
        self.recent = Some(RecentSubmissions::new(ttl));
        self
    }

    #[instrument(skip(self, job), fields(job_id = %job.id))]
    pub async fn process(&self, job: &JobRequest) -> FulfillmentOutcome {
        let mut state = self.initial_state(job).await;

        while !state.is_terminal() {
            state = self.advance(job, state).await;
            debug!("Job {} → {}", job.id, state.name());
        }

        let outcome = FulfillmentOutcome::from_terminal(job.id.clone(), state);
        self.report(&outcome);

        if outcome.is_confirmed() {
            if let Some(recent) = &self.recent {
                recent.record(&job.id).await;
            }
        }

        outcome
    }

    async fn initial_state(&self, job: &JobRequest) -> JobState {
        if !job.status.is_actionable() {
            return JobState::Skipped("job is not pending");
        }
        if let Some(recent) = &self.recent {
            if recent.contains(&job.id).await {
                return JobState::Skipped("fulfillment recently submitted");
            }
        }
        JobState::Discovered
    }

    async fn advance(&self, job: &JobRequest, state: JobState) -> JobState {
        match state {
            JobState::Discovered => {
                match timeout(
                    self.config.attestation_timeout,
                    self.attestor.compute(&job.input_data),
                )
                .await
                {
                    Ok(Ok(attestation)) => match self.check_attestation(&attestation) {
                        Ok(()) => JobState::Attested(attestation),
                        Err(e) => JobState::Failed(e),
                    },
                    Ok(Err(e)) => JobState::Failed(e),
                    Err(_) => JobState::Failed(AttestationError::Timeout),
                }
            }
            JobState::Attested(attestation) => {
                let call = self.fulfillment_call(&job.id, attestation);
                match timeout(
                    self.config.submission_timeout,
                    self.ledger.submit_entry_call(&call),
                )
                .await
                {
                    Ok(Ok(result)) => JobState::Submitted(result),
                    Ok(Err(e)) => JobState::Rejected(SubmissionError::Ledger(e)),
                    Err(_) => JobState::Rejected(SubmissionError::Timeout),
                }
            }
            JobState::Submitted(result) if result.success => JobState::Confirmed {
                transaction_id: result.id,
            },
            JobState::Submitted(result) => JobState::Rejected(SubmissionError::Rejected {
                transaction_id: result.id,
                reason: result
                    .error
                    .unwrap_or_else(|| "transaction failed without an error message".to_string()),
            }),
            terminal => terminal,
        }
    }

    /// Proof and signature must hold before any gas is spent
    fn check_attestation(&self, attestation: &Attestation) -> Result<(), AttestationError> {
        self.attestor.check_proof(attestation)?;
        verify_attestation(
            &self.attestor.public_key(),
            &attestation.proof,
            &attestation.signature,
        )
    }

    /// Entry call with the protocol's fixed argument order:
    /// trusted signer capability, job, payment source, proof, signature.
    pub fn fulfillment_call(&self, job_id: &str, attestation: Attestation) -> EntryCall {
        let target = &self.config.target;
        EntryCall {
            package: target.package.clone(),
            module: target.module.clone(),
            function: target.function.clone(),
            arguments: vec![
                CallArg::Object(target.trusted_signer_id.clone()),
                CallArg::Object(job_id.to_string()),
                CallArg::Object(target.payment_source_id.clone()),
                CallArg::Bytes(attestation.proof),
                CallArg::Bytes(attestation.signature),
            ],
        }
    }

    fn report(&self, outcome: &FulfillmentOutcome) {
        match (&outcome.state, &outcome.error) {
            (OutcomeState::Confirmed, _) => info!(
                "✅ Job {} fulfilled (tx: {})",
                outcome.job_id,
                outcome.transaction_id.as_deref().unwrap_or("-")
            ),
            (OutcomeState::Skipped, _) => {}
            (_, Some(e)) => error!("❌ Job {} not fulfilled: {}", outcome.job_id, e),
            (_, None) => warn!("⚠️ Job {} ended without a result", outcome.job_id),
        }
    }
}
