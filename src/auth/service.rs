//! Exchanges a verified identity token for the application's user record

use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::models::{AuthResponse, CoupleStateDto, UserProfileDto};
use crate::common::{safe_optional_email_log, safe_token_log};
use crate::couples::CoupleRepository;
use crate::services::{IdentityVerifier, VerifiedClaims};
use crate::users::{Provider, RepositoryError, UserRepository, UserUpsert};

/// Substring of the issuer of every Firebase ID token
const FIREBASE_ISSUER_MARKER: &str = "securetoken.google.com";

/// Claim describing how the user signed in
const PROVIDER_HINT_CLAIM: &str = "firebase";

/// Sign-in provider id Firebase uses for Google accounts
const GOOGLE_SIGN_IN_MARKER: &str = "google.com";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{0}")]
    VerificationFailed(String),

    #[error(transparent)]
    Store(#[from] RepositoryError),
}

/// Decides which provider the user signed in with.
///
/// Total over any claim set: anything that is not clearly a Google sign-in
/// through Firebase is `Email`.
pub fn determine_provider(claims: &VerifiedClaims) -> Provider {
    if !claims.issuer.contains(FIREBASE_ISSUER_MARKER) {
        return Provider::Email;
    }

    let hint = match claims.claims.get(PROVIDER_HINT_CLAIM) {
        None | Some(Value::Null) => return Provider::Email,
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    };

    if hint.contains(GOOGLE_SIGN_IN_MARKER) {
        Provider::Google
    } else {
        Provider::Email
    }
}

pub struct AuthService {
    verifier: Arc<dyn IdentityVerifier>,
    users: Arc<dyn UserRepository>,
    couples: Arc<dyn CoupleRepository>,
}

impl AuthService {
    pub fn new(
        verifier: Arc<dyn IdentityVerifier>,
        users: Arc<dyn UserRepository>,
        couples: Arc<dyn CoupleRepository>,
    ) -> Self {
        Self {
            verifier,
            users,
            couples,
        }
    }

    /// Verifies `id_token`, upserts its user and reports the couple state.
    ///
    /// Performs one user lookup and one user write per successful call and
    /// nothing at all when verification fails.
    pub async fn authenticate(&self, id_token: &str) -> Result<AuthResponse, AuthError> {
        let claims = self.verifier.verify(id_token).await.map_err(|e| {
            warn!(error = %e, token = %safe_token_log(id_token), "Failed to verify Firebase token");
            AuthError::VerificationFailed(e.to_string())
        })?;

        let provider = determine_provider(&claims);
        debug!(
            firebase_uid = %claims.subject_id,
            provider = %provider,
            "Resolved sign-in provider"
        );

        let existing = self.users.find_by_firebase_uid(&claims.subject_id).await?;
        let now = Utc::now();

        let upsert = match existing {
            Some(user) => {
                info!(
                    user_id = user.id,
                    firebase_uid = %user.firebase_uid,
                    "Updating existing user"
                );
                UserUpsert {
                    firebase_uid: user.firebase_uid,
                    email: claims.email,
                    name: claims.name,
                    photo_url: claims.picture_url,
                    provider,
                    created_at: user.created_at,
                    updated_at: now,
                }
            }
            None => {
                info!(
                    firebase_uid = %claims.subject_id,
                    email = %safe_optional_email_log(claims.email.as_deref()),
                    "Creating new user"
                );
                UserUpsert {
                    firebase_uid: claims.subject_id,
                    email: claims.email,
                    name: claims.name,
                    photo_url: claims.picture_url,
                    provider,
                    created_at: now,
                    updated_at: now,
                }
            }
        };

        let user = self.users.upsert(&upsert).await?;
        let couple = self.couples.find_by_user(&user).await?;

        Ok(AuthResponse {
            user: UserProfileDto::from(&user),
            couple_state: CoupleStateDto::from(couple.as_ref()),
        })
    }
}
