use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::debug;

/// Short-lived record of jobs this process fulfilled recently.
///
/// Guards against resubmitting a job that a node still reports as pending
/// because the fulfillment has not reached it yet.
pub struct RecentSubmissions {
    ttl: Duration,
    entries: RwLock<HashMap<String, Instant>>,
}

impl RecentSubmissions {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub async fn contains(&self, job_id: &str) -> bool {
        let entries = self.entries.read().await;
        entries
            .get(job_id)
            .map(|recorded| recorded.elapsed() < self.ttl)
            .unwrap_or(false)
    }

    pub async fn record(&self, job_id: &str) {
        let mut entries = self.entries.write().await;
        let ttl = self.ttl;
        entries.retain(|_, recorded| recorded.elapsed() < ttl);
        entries.insert(job_id.to_string(), Instant::now());
        debug!("Recorded submission for {} ({} tracked)", job_id, entries.len());
    }
}
