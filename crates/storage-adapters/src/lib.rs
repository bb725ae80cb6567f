//! # storage-adapters
//!
//! Relational and object-storage adapters for the ports in `domains`.
//! Each backend sits behind its own cargo feature.

#[cfg(feature = "db-sqlite")]
pub mod sqlite;

pub mod media;

#[cfg(feature = "db-sqlite")]
pub use sqlite::SqliteStore;

#[cfg(feature = "media-local")]
pub use media::LocalObjectStore;
#[cfg(feature = "media-s3")]
pub use media::S3ObjectStore;
