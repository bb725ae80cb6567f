//! Object-storage key layout and attachment name rules.

use crate::error::{DomainError, DomainResult};
use crate::models::PostId;

/// Deterministic key of an attachment blob: `{prefix}/board/{post_id}/{name}`.
pub fn attachment_key(prefix: &str, post_id: PostId, name: &str) -> String {
    let prefix = prefix.trim_end_matches('/');
    if prefix.is_empty() {
        format!("board/{post_id}/{name}")
    } else {
        format!("{prefix}/board/{post_id}/{name}")
    }
}

/// Public link of `key` below `base_url`, each key segment percent-encoded.
pub fn public_link(base_url: &str, key: &str) -> String {
    let path: Vec<_> = key.split('/').map(urlencoding::encode).collect();
    format!("{}/{}", base_url.trim_end_matches('/'), path.join("/"))
}

/// Rejects names that cannot be used verbatim as the last key segment.
pub fn validate_attachment_name(name: &str) -> DomainResult<()> {
    if name.trim().is_empty() {
        return Err(DomainError::Validation("file name must not be blank".into()));
    }
    if name == "." || name == ".." || name.contains(['/', '\\']) {
        return Err(DomainError::Validation(format!(
            "illegal file name: {name}"
        )));
    }
    Ok(())
}
