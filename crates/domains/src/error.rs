//! # DomainError
//!
//! Centralized error taxonomy for the petboard core.
//! Adapters translate their own failures into one of these variants so the
//! HTTP layer can map them to a status without knowing where they came from.

use thiserror::Error;

/// The primary error type for every port and service operation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Blank or malformed input (e.g. empty title, illegal attachment name)
    #[error("validation error: {0}")]
    Validation(String),

    /// A referenced post, comment or member does not exist
    #[error("{entity} not found with id {id}")]
    NotFound { entity: &'static str, id: String },

    /// No identity was presented (or the presented one could not be resolved)
    #[error("authentication required")]
    Unauthenticated,

    /// The identity does not own the resource
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Object-storage failure (upload, delete, existence check)
    #[error("storage error: {0}")]
    Storage(String),

    /// A uniqueness constraint was hit in a way the caller must resolve
    #[error("conflict: {0}")]
    Conflict(String),

    /// Relational store or other infrastructure failure
    #[error("internal service error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// True when the failure means "no identity at all" rather than "wrong identity".
    pub fn is_missing_identity(&self) -> bool {
        matches!(self, Self::Unauthenticated)
    }
}

/// A specialized Result type for petboard logic.
pub type DomainResult<T> = std::result::Result<T, DomainError>;
