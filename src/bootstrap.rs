use std::sync::Arc;
use tracing::info;

use crate::{
    api::handler::AppState,
    attestation::{Attestor, MockTeeAttestor},
    config::Config,
    error::{AppError, AppResult},
    fulfillment::{FulfillmentPipeline, FulfillmentTarget, PipelineConfig},
    jobs::{JobScanner, JobType},
    ledger::{SuiRpcClient, SuiRpcConfig},
    scheduler::{FulfillmentScheduler, ScheduleConfig},
    signer::keystore::{Keystore, ATTESTOR_KEY_INDEX, SERVICE_KEY_INDEX},
};

/// Fully wired service, ready to start
pub struct Service {
    pub scheduler: Arc<FulfillmentScheduler>,
    pub state: AppState,
}

pub fn initialize_service(config: &Config) -> AppResult<Service> {
    info!("Initializing service components ...");

    // Key material
    let keystore = Keystore::load(&config.keystore_path)?;
    let service_signer = Arc::new(keystore.signer(SERVICE_KEY_INDEX)?);
    let attestor_signer = keystore.signer(ATTESTOR_KEY_INDEX)?;
    let service_identity = service_signer.identity().clone();
    info!("✅ Service identity: {}", service_identity);

    // Ledger client
    let ledger = Arc::new(
        SuiRpcClient::new(
            SuiRpcConfig {
                rpc_url: config.sui_rpc_url.clone(),
                gas_budget: config.gas_budget,
                gas_object: config.gas_object_id.clone(),
                request_timeout: config.request_timeout,
                ..SuiRpcConfig::default()
            },
            service_signer,
        )
        .map_err(|e| AppError::Internal(format!("Failed to build ledger client: {}", e)))?,
    );
    info!("✅ Sui RPC client initialized for {}", config.sui_rpc_url);

    // Attestation
    let attestor = Arc::new(MockTeeAttestor::new(attestor_signer));
    let attestor_identity = attestor.identity();
    info!("✅ Mock TEE attestor initialized: {}", attestor_identity);

    // Fulfillment pipeline
    let mut pipeline = FulfillmentPipeline::new(ledger.clone(), attestor, pipeline_config(config));
    if !config.recent_submission_ttl.is_zero() {
        pipeline = pipeline.with_recent_submissions(config.recent_submission_ttl);
        info!(
            "✅ Recent-submission guard enabled ({:?})",
            config.recent_submission_ttl
        );
    }

    let job_type = JobType::new(&config.package_id, &config.job_module, &config.job_type_name);
    let scheduler = Arc::new(FulfillmentScheduler::new(
        ScheduleConfig {
            interval: config.poll_interval,
            max_concurrent_jobs: config.max_concurrent_jobs,
        },
        service_identity.as_str().to_string(),
        job_type,
        JobScanner::new(ledger),
        pipeline,
    ));
    info!("✅ Fulfillment scheduler initialized");

    let state = AppState {
        status: scheduler.status(),
        service_identity,
        attestor_identity,
    };

    Ok(Service { scheduler, state })
}

/// A submission is two sequential RPCs (build, then execute), each bounded
/// by the request timeout
const SUBMISSION_ROUND_TRIPS: u32 = 2;

fn pipeline_config(config: &Config) -> PipelineConfig {
    PipelineConfig {
        target: FulfillmentTarget {
            package: config.package_id.clone(),
            module: config.job_module.clone(),
            function: config.fulfill_function.clone(),
            trusted_signer_id: config.trusted_signer_object_id.clone(),
            payment_source_id: config.payment_source_object_id.clone(),
        },
        attestation_timeout: config.request_timeout,
        submission_timeout: config.request_timeout * SUBMISSION_ROUND_TRIPS,
    }
}
