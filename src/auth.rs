//! Caller identity verification seam.
//!
//! Token issuance lives outside this crate; the core only needs verified
//! claims, so the seam is a trait the handler layer implements against its
//! identity provider. Verification failure is the unauthorized kind,
//! distinct from validation failures.

use async_trait::async_trait;

use crate::error::Result;

/// Verified caller identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Partition identity for every store and index operation.
    pub user_id: String,
}

/// Verifies a bearer token and extracts the caller's claims.
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    /// Fails with the unauthorized kind for invalid or expired tokens.
    async fn verify(&self, token: &str) -> Result<Claims>;
}
