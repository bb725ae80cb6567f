//! # services
//!
//! Use cases of the post/attachment/comment/like subsystem.
//! Every service holds its ports as `Arc<dyn Port>` and performs its
//! relational writes first, then object-storage calls, in the order
//! documented on each operation.

pub mod attachments;
pub mod comments;
pub mod likes;
pub mod posts;
pub mod reconciler;

pub use attachments::AttachmentSynchronizer;
pub use comments::CommentService;
pub use likes::LikeService;
pub use posts::PostService;
pub use reconciler::{BlobReconciler, ReconcileReport};

use domains::{DomainError, DomainResult, Identity};

/// Trims `value` and rejects it when nothing is left.
pub(crate) fn required_text(field: &str, value: &str) -> DomainResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DomainError::Validation(format!("{field} must not be blank")));
    }
    Ok(trimmed.to_string())
}

pub(crate) fn require_identity(identity: Option<&Identity>) -> DomainResult<&Identity> {
    identity.ok_or(DomainError::Unauthenticated)
}

/// Author-only gate: the caller must be present and equal to `owner_email`.
pub(crate) fn ensure_owner<'a>(
    identity: Option<&'a Identity>,
    owner_email: &str,
    entity: &str,
) -> DomainResult<&'a Identity> {
    let identity = require_identity(identity)?;
    if identity.email() != owner_email {
        return Err(DomainError::Unauthorized(format!(
            "only the author may modify this {entity}"
        )));
    }
    Ok(identity)
}
