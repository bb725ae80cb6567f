//! Attachment Synchronizer.
//!
//! Turns "new uploads + names to delete" into attachment rows and blobs at
//! `prefix/board/{post_id}/{name}`. Every blob mutation is bracketed by an
//! intent row so that a crash or failure between the relational change and
//! the blob call can be repaired by [`crate::BlobReconciler`].

use std::sync::Arc;

use domains::{
    attachment_key, validate_attachment_name, AttachmentRepository, BlobIntentLog, BlobOp,
    DomainError, DomainResult, FileView, ObjectStore, PostId, UploadedFile,
};
use tracing::{debug, warn};

pub struct AttachmentSynchronizer {
    attachments: Arc<dyn AttachmentRepository>,
    intents: Arc<dyn BlobIntentLog>,
    store: Arc<dyn ObjectStore>,
    key_prefix: String,
}

/// Result of removing every attachment of a post.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RemovalTally {
    pub removed: u64,
    pub pending: u64,
}

impl AttachmentSynchronizer {
    pub fn new(
        attachments: Arc<dyn AttachmentRepository>,
        intents: Arc<dyn BlobIntentLog>,
        store: Arc<dyn ObjectStore>,
        key_prefix: impl Into<String>,
    ) -> Self {
        Self {
            attachments,
            intents,
            store,
            key_prefix: key_prefix.into(),
        }
    }

    pub fn key_for(&self, post_id: PostId, name: &str) -> String {
        attachment_key(&self.key_prefix, post_id, name)
    }

    /// Checks every name in a batch without touching either store.
    pub fn validate_batch(files: &[UploadedFile], delete_names: &[String]) -> DomainResult<()> {
        for name in delete_names {
            validate_attachment_name(name)?;
        }
        for file in files.iter().filter(|f| !f.is_empty()) {
            validate_attachment_name(&file.name)?;
        }
        Ok(())
    }

    /// Deletions first, then uploads; sequential per file.
    ///
    /// Zero-byte files are skipped. The first blob failure aborts the rest of
    /// the batch with [`DomainError::Storage`].
    #[tracing::instrument(skip(self, files, delete_names), fields(uploads = files.len(), deletes = delete_names.len()))]
    pub async fn sync(
        &self,
        post_id: PostId,
        files: &[UploadedFile],
        delete_names: &[String],
    ) -> DomainResult<()> {
        Self::validate_batch(files, delete_names)?;

        for name in delete_names {
            self.remove(post_id, name).await?;
        }
        for file in files {
            if file.is_empty() {
                debug!(name = %file.name, "skipping empty upload");
                continue;
            }
            self.add(post_id, file).await?;
        }
        Ok(())
    }

    /// Row first, then blob. A missing row counts as already deleted, but the
    /// blob delete is still issued.
    pub async fn remove(&self, post_id: PostId, name: &str) -> DomainResult<()> {
        let key = self.key_for(post_id, name);
        let intent = self
            .intents
            .record(BlobOp::Delete, post_id, name, &key)
            .await?;

        if let Err(e) = self.attachments.delete(post_id, name).await {
            self.discard_intent(intent).await;
            return Err(e);
        }

        match self.store.delete(&key).await {
            Ok(()) => self.intents.clear(intent).await,
            Err(e) => {
                warn!(%key, error = %e, "blob delete failed; left for reconciler");
                self.note_failure(intent, &e).await;
                Err(e)
            }
        }
    }

    /// Row first, then blob. A second upload under the same name keeps the
    /// single row and replaces the blob.
    pub async fn add(&self, post_id: PostId, file: &UploadedFile) -> DomainResult<()> {
        let key = self.key_for(post_id, &file.name);
        let intent = self
            .intents
            .record(BlobOp::Put, post_id, &file.name, &key)
            .await?;

        let created = match self.attachments.upsert(post_id, &file.name).await {
            Ok(created) => created,
            Err(e) => {
                self.discard_intent(intent).await;
                return Err(e);
            }
        };

        let upload = self
            .store
            .put(&key, file.data.clone(), file.content_type.as_ref())
            .await;

        match upload {
            Ok(()) => self.intents.clear(intent).await,
            Err(e) => {
                warn!(%key, error = %e, created, "blob upload failed");
                if created {
                    // the row must not outlive a blob that never arrived
                    match self.attachments.delete(post_id, &file.name).await {
                        Ok(_) => self.discard_intent(intent).await,
                        Err(cleanup) => {
                            warn!(%key, error = %cleanup, "compensating row delete failed");
                            self.note_failure(intent, &e).await;
                        }
                    }
                } else {
                    // previous blob under this key is still in place
                    self.discard_intent(intent).await;
                }
                Err(e)
            }
        }
    }

    /// Removes every attachment of `post_id`. Blob failures do not stop the
    /// loop; they are counted as pending and left for the reconciler.
    /// Relational failures abort immediately.
    pub async fn remove_all(&self, post_id: PostId) -> DomainResult<RemovalTally> {
        let mut tally = RemovalTally::default();
        for name in self.attachments.list_names(post_id).await? {
            match self.remove(post_id, &name).await {
                Ok(()) => tally.removed += 1,
                Err(DomainError::Storage(_)) => {
                    tally.removed += 1;
                    tally.pending += 1;
                }
                Err(e) => return Err(e),
            }
        }
        Ok(tally)
    }

    pub async fn file_views(&self, post_id: PostId) -> DomainResult<Vec<FileView>> {
        let names = self.attachments.list_names(post_id).await?;
        Ok(names
            .into_iter()
            .map(|name| FileView {
                src: self.store.public_url(&self.key_for(post_id, &name)),
                name,
            })
            .collect())
    }

    async fn discard_intent(&self, intent: i64) {
        if let Err(e) = self.intents.clear(intent).await {
            warn!(intent, error = %e, "failed to clear blob intent");
        }
    }

    async fn note_failure(&self, intent: i64, cause: &DomainError) {
        if let Err(e) = self.intents.mark_failed(intent, &cause.to_string()).await {
            warn!(intent, error = %e, "failed to record blob intent failure");
        }
    }
}
