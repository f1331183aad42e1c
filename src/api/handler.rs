use axum::{extract::State, Json};
use chrono::Utc;
use std::sync::Arc;
use tracing::debug;

use super::models::*;
use crate::{scheduler::SchedulerStatus, signer::SuiAddress};

#[derive(Clone)]
pub struct AppState {
    pub status: Arc<SchedulerStatus>,
    pub service_identity: SuiAddress,
    pub attestor_identity: SuiAddress,
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let snapshot = state.status.snapshot().await;

    let last_tick_failed = snapshot
        .last_tick
        .as_ref()
        .map(|tick| tick.error.is_some())
        .unwrap_or(false);

    Json(HealthResponse {
        status: if last_tick_failed {
            "degraded".to_string()
        } else {
            "healthy".to_string()
        },
        timestamp: Utc::now(),
        ticks_run: snapshot.ticks_run,
        ticks_failed: snapshot.ticks_failed,
    })
}

/// GET /status - last tick report, counters and identities
pub async fn get_status(State(state): State<AppState>) -> Json<StatusResponse> {
    let snapshot = state.status.snapshot().await;
    debug!("Status requested after {} tick(s)", snapshot.ticks_run);

    Json(StatusResponse {
        identities: IdentityInfo {
            service: state.service_identity.clone(),
            attestor: state.attestor_identity.clone(),
        },
        counters: CounterInfo {
            ticks_run: snapshot.ticks_run,
            ticks_failed: snapshot.ticks_failed,
            jobs_confirmed: snapshot.jobs_confirmed,
            jobs_failed: snapshot.jobs_failed,
        },
        last_tick: snapshot.last_tick,
    })
}
