use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::{LedgerError, ScanError};
use crate::jobs::models::{JobRequest, JobType};
use crate::ledger::LedgerClient;

/// Discovers pending jobs owned by the service identity.
///
/// Every call re-derives the pending set from the ledger; nothing is
/// remembered between scans.
pub struct JobScanner {
    ledger: Arc<dyn LedgerClient>,
}

impl JobScanner {
    pub fn new(ledger: Arc<dyn LedgerClient>) -> Self {
        Self { ledger }
    }

    /// Pending jobs of `job_type` owned by `owner`. Ordering is unspecified.
    ///
    /// Objects that vanish between listing and fetching are dropped silently.
    /// Losing the ledger altogether fails the whole scan.
    pub async fn scan(&self, owner: &str, job_type: &JobType) -> Result<Vec<JobRequest>, ScanError> {
        let owned = self
            .ledger
            .list_owned_objects(owner)
            .await
            .map_err(|source| ScanError::ListOwned {
                owner: owner.to_string(),
                source,
            })?;

        let candidates: Vec<_> = owned
            .into_iter()
            .filter(|object| {
                object
                    .type_tag
                    .as_deref()
                    .map(|tag| job_type.matches(tag))
                    .unwrap_or(false)
            })
            .collect();

        debug!("{} candidate {} object(s)", candidates.len(), job_type);

        let mut pending = Vec::new();
        for candidate in candidates {
            let object = match self.ledger.get_object(&candidate.id).await {
                Ok(object) => object,
                Err(LedgerError::NotFound(_)) => {
                    debug!("Job {} vanished before it could be read", candidate.id);
                    continue;
                }
                Err(source @ LedgerError::Network(_)) => {
                    return Err(ScanError::Fetch {
                        object_id: candidate.id,
                        source,
                    });
                }
                Err(e) => {
                    warn!("⚠️ Skipping job {}: {}", candidate.id, e);
                    continue;
                }
            };

            match JobRequest::decode_status(&object) {
                Ok(status) if status.is_actionable() => {}
                Ok(status) => {
                    debug!("Job {} is {:?}, not actionable", object.id, status);
                    continue;
                }
                Err(e) => {
                    warn!("⚠️ Skipping job {}: {}", object.id, e);
                    continue;
                }
            }

            match JobRequest::from_object(&object) {
                Ok(job) => pending.push(job),
                Err(e) => warn!("⚠️ Skipping job {}: {}", object.id, e),
            }
        }

        info!("🔍 Found {} pending job(s)", pending.len());
        Ok(pending)
    }
}
