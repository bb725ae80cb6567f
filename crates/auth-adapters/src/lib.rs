//! # auth-adapters
//!
//! Identity Gate implementations. The core only consumes
//! "current principal email or none"; everything about credentials stays here.

#[cfg(feature = "auth-jwt")]
pub mod jwt;

#[cfg(feature = "auth-jwt")]
pub use jwt::{Claims, JwtIdentityGate, TokenError};
