//! petboard/crates/domains/src/lib.rs
//!
//! Entities, error taxonomy and port definitions for petboard.
//! Nothing in this crate performs I/O.

pub mod error;
pub mod keys;
pub mod models;
pub mod ports;

// Re-exporting for easier access in other crates
pub use error::*;
pub use keys::*;
pub use models::*;
pub use ports::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_identity_is_distinguished_from_wrong_owner() {
        assert!(DomainError::Unauthenticated.is_missing_identity());
        assert!(!DomainError::Unauthorized("not the author".into()).is_missing_identity());
        // the wording of an ownership failure never changes its kind
        assert!(!DomainError::Unauthorized("authentication required".into()).is_missing_identity());
    }

    #[test]
    fn not_found_message_names_entity() {
        let err = DomainError::not_found("post", 42);
        assert_eq!(err.to_string(), "post not found with id 42");
    }
}
