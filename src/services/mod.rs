// src/services/mod.rs
//
// Clients for external systems the API depends on

pub mod firebase;

// Re-export commonly used types for convenience
pub use firebase::{FirebaseVerifier, IdentityVerifier, VerifiedClaims, VerifyError};
