use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::scheduler::TickReport;
use crate::signer::SuiAddress;

// ========== RESPONSE MODELS ==========

/// Liveness of the fulfillment loop
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// "healthy", or "degraded" while the most recent tick failed
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub ticks_run: u64,
    pub ticks_failed: u64,
}

#[derive(Debug, Serialize)]
pub struct IdentityInfo {
    pub service: SuiAddress,
    pub attestor: SuiAddress,
}

#[derive(Debug, Serialize)]
pub struct CounterInfo {
    pub ticks_run: u64,
    pub ticks_failed: u64,
    pub jobs_confirmed: u64,
    pub jobs_failed: u64,
}

/// Operator view of the last tick
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub identities: IdentityInfo,
    pub counters: CounterInfo,
    pub last_tick: Option<TickReport>,
}
