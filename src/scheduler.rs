// Fulfillment scheduler - drives scan + fulfill on a fixed interval
//
// Each tick:
// - Re-derives the pending job set from the ledger
// - Runs every job through the pipeline, failures isolated per job
// - Publishes a tick report for operators
//
// A failed scan skips the tick; the loop only ends on shutdown.

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{watch, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{error, info, info_span, Instrument};
use uuid::Uuid;

use crate::error::ScanError;
use crate::fulfillment::{FulfillmentOutcome, FulfillmentPipeline, OutcomeState};
use crate::jobs::{JobScanner, JobType};

/// Scheduler configuration
#[derive(Debug, Clone)]
pub struct ScheduleConfig {
    /// Time between tick starts
    pub interval: Duration,
    /// Jobs processed at once within a tick (1 = sequential)
    pub max_concurrent_jobs: usize,
}

/// What happened during one tick
#[derive(Debug, Clone, Serialize)]
pub struct TickReport {
    pub tick_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub jobs_found: usize,
    pub outcomes: Vec<FulfillmentOutcome>,
    pub error: Option<String>,
}

/// Counters and last tick, shared with the status API
#[derive(Debug, Default)]
pub struct SchedulerStatus {
    last_tick: RwLock<Option<TickReport>>,
    ticks_run: AtomicU64,
    ticks_failed: AtomicU64,
    jobs_confirmed: AtomicU64,
    jobs_failed: AtomicU64,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusSnapshot {
    pub ticks_run: u64,
    pub ticks_failed: u64,
    pub jobs_confirmed: u64,
    pub jobs_failed: u64,
    pub last_tick: Option<TickReport>,
}

impl SchedulerStatus {
    pub async fn record(&self, report: TickReport) {
        self.ticks_run.fetch_add(1, Ordering::Relaxed);
        if report.error.is_some() {
            self.ticks_failed.fetch_add(1, Ordering::Relaxed);
        }

        for outcome in &report.outcomes {
            match outcome.state {
                OutcomeState::Confirmed => {
                    self.jobs_confirmed.fetch_add(1, Ordering::Relaxed);
                }
                OutcomeState::Rejected | OutcomeState::Failed => {
                    self.jobs_failed.fetch_add(1, Ordering::Relaxed);
                }
                OutcomeState::Skipped => {}
            }
        }

        *self.last_tick.write().await = Some(report);
    }

    pub async fn snapshot(&self) -> StatusSnapshot {
        StatusSnapshot {
            ticks_run: self.ticks_run.load(Ordering::Relaxed),
            ticks_failed: self.ticks_failed.load(Ordering::Relaxed),
            jobs_confirmed: self.jobs_confirmed.load(Ordering::Relaxed),
            jobs_failed: self.jobs_failed.load(Ordering::Relaxed),
            last_tick: self.last_tick.read().await.clone(),
        }
    }
}

/// Fulfillment scheduler - one periodic task, no state carried between ticks
pub struct FulfillmentScheduler {
    config: ScheduleConfig,
    owner: String,
    job_type: JobType,
    scanner: JobScanner,
    pipeline: FulfillmentPipeline,
    status: Arc<SchedulerStatus>,
}

impl FulfillmentScheduler {
    pub fn new(
        config: ScheduleConfig,
        owner: String,
        job_type: JobType,
        scanner: JobScanner,
        pipeline: FulfillmentPipeline,
    ) -> Self {
        Self {
            config,
            owner,
            job_type,
            scanner,
            pipeline,
            status: Arc::new(SchedulerStatus::default()),
        }
    }

    pub fn status(&self) -> Arc<SchedulerStatus> {
        self.status.clone()
    }

    /// Start the scheduler (runs in background) until `shutdown` turns true.
    /// A tick in flight when shutdown arrives is allowed to finish.
    pub fn start(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = interval(self.config.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            info!(
                "⏰ Watching for {} jobs every {:?}",
                self.job_type, self.config.interval
            );

            loop {
                if *shutdown.borrow() {
                    break;
                }

                tokio::select! {
                    biased;
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            break;
                        }
                    }
                    _ = ticker.tick() => {
                        self.tick().await;
                    }
                }
            }

            info!("🛑 Scheduler stopped");
        })
    }

    /// Run one tick, log it, publish the report
    pub async fn tick(&self) -> TickReport {
        let tick_id = Uuid::new_v4();
        let started_at = Utc::now();

        let result = self
            .run_tick()
            .instrument(info_span!("tick", %tick_id))
            .await;

        let report = match result {
            Ok(outcomes) => {
                let confirmed = outcomes.iter().filter(|o| o.is_confirmed()).count();
                info!(
                    "✓ Tick {} completed: {} job(s), {} fulfilled",
                    tick_id,
                    outcomes.len(),
                    confirmed
                );
                TickReport {
                    tick_id,
                    started_at,
                    finished_at: Utc::now(),
                    jobs_found: outcomes.len(),
                    outcomes,
                    error: None,
                }
            }
            Err(e) => {
                error!("❌ Tick {} skipped: {}", tick_id, e);
                TickReport {
                    tick_id,
                    started_at,
                    finished_at: Utc::now(),
                    jobs_found: 0,
                    outcomes: Vec::new(),
                    error: Some(e.to_string()),
                }
            }
        };

        self.status.record(report.clone()).await;
        report
    }

    /// Scan, then process every pending job. Only a failed scan is an error;
    /// per-job failures are reported in the outcomes.
    pub async fn run_tick(&self) -> Result<Vec<FulfillmentOutcome>, ScanError> {
        let jobs = self.scanner.scan(&self.owner, &self.job_type).await?;

        let pipeline = &self.pipeline;
        let outcomes = stream::iter(jobs)
            .map(move |job| async move { pipeline.process(&job).await })
            .buffer_unordered(self.config.max_concurrent_jobs.max(1))
            .collect::<Vec<_>>()
            .await;

        Ok(outcomes)
    }
}
