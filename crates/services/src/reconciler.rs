//! Repairs drift between attachment rows and blobs.
//!
//! An uncleared intent marks a `(post_id, name)` pair whose row and blob may
//! disagree. The pair is kept only when both sides exist; otherwise the
//! surviving side is removed and the intent cleared.

use std::sync::Arc;

use chrono::{Duration, Utc};
use domains::{AttachmentRepository, BlobIntent, BlobIntentLog, DomainResult, ObjectStore};
use serde::Serialize;
use tracing::{info, warn};

pub struct BlobReconciler {
    attachments: Arc<dyn AttachmentRepository>,
    intents: Arc<dyn BlobIntentLog>,
    store: Arc<dyn ObjectStore>,
    /// Intents younger than this belong to requests that may still be running.
    grace: Duration,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    pub resolved: u64,
    pub failed: u64,
}

impl BlobReconciler {
    pub fn new(
        attachments: Arc<dyn AttachmentRepository>,
        intents: Arc<dyn BlobIntentLog>,
        store: Arc<dyn ObjectStore>,
        grace: Duration,
    ) -> Self {
        Self {
            attachments,
            intents,
            store,
            grace,
        }
    }

    /// Processes up to `batch` stale intents. Failures on one intent are
    /// recorded on it and do not stop the batch.
    #[tracing::instrument(skip(self))]
    pub async fn run_once(&self, batch: i64) -> DomainResult<ReconcileReport> {
        let cutoff = Utc::now() - self.grace;
        let mut report = ReconcileReport::default();

        for intent in self.intents.pending(cutoff, batch).await? {
            match self.settle(&intent).await {
                Ok(()) => {
                    self.intents.clear(intent.id).await?;
                    report.resolved += 1;
                }
                Err(e) => {
                    warn!(intent = intent.id, key = %intent.object_key, error = %e, "reconcile failed");
                    self.intents.mark_failed(intent.id, &e.to_string()).await?;
                    report.failed += 1;
                }
            }
        }

        if report.resolved + report.failed > 0 {
            info!(resolved = report.resolved, failed = report.failed, "reconcile pass finished");
        }
        Ok(report)
    }

    async fn settle(&self, intent: &BlobIntent) -> DomainResult<()> {
        let row = self.attachments.exists(intent.post_id, &intent.name).await?;
        let blob = self.store.exists(&intent.object_key).await?;

        match (row, blob) {
            (true, false) => {
                self.attachments.delete(intent.post_id, &intent.name).await?;
            }
            (false, true) => self.store.delete(&intent.object_key).await?,
            _ => {}
        }
        Ok(())
    }
}
